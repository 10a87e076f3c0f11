use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

/// Hook for the external identity provider; the engine only needs a yes/no plus a name.
pub trait CallerAuthenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing caller credentials")]
    MissingCredentials,
    #[error("invalid caller credentials")]
    InvalidCredentials,
}

/// Accepts bearer tokens from a fixed allow-list (`COMMISSION_API_TOKENS`).
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: Vec<String>,
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl CallerAuthenticator for StaticTokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError> {
        let raw = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?
            .to_str()
            .map_err(|_| AuthError::InvalidCredentials)?;

        let token = raw
            .strip_prefix("Bearer ")
            .or_else(|| raw.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidCredentials)?;

        self.tokens
            .iter()
            .position(|known| known == token)
            .map(|index| CallerIdentity(format!("token-{}", index + 1)))
            .ok_or(AuthError::InvalidCredentials)
    }
}
