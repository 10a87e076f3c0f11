use chrono::NaiveDate;

use super::domain::{
    CalculatedCommission, ClosingPeriod, ClosingPeriodId, CommissionTier,
    ConfigurationParameter, MonthlyGoal, PeriodSummary, SaleRecord,
};

/// Closing period lookup and summary write-back.
pub trait ClosingPeriodRepository: Send + Sync {
    fn fetch(&self, id: &ClosingPeriodId) -> Result<Option<ClosingPeriod>, RepositoryError>;
    fn update_summary(
        &self,
        id: &ClosingPeriodId,
        summary: PeriodSummary,
    ) -> Result<(), RepositoryError>;
}

/// Read-only view over imported sales.
pub trait SaleRecordRepository: Send + Sync {
    fn sales_for_period(&self, id: &ClosingPeriodId) -> Result<Vec<SaleRecord>, RepositoryError>;
}

/// Tiers, generic parameters and monthly goal overrides.
pub trait CommissionSettingsRepository: Send + Sync {
    /// Only tiers flagged active.
    fn active_tiers(&self) -> Result<Vec<CommissionTier>, RepositoryError>;
    fn parameters(&self) -> Result<Vec<ConfigurationParameter>, RepositoryError>;
    fn monthly_goal(&self, reference_month: NaiveDate)
        -> Result<Option<MonthlyGoal>, RepositoryError>;
}

/// Persisted commission rows, replaced as a whole per period.
pub trait CalculatedCommissionRepository: Send + Sync {
    /// Swap the period's row set for `rows`. Implementations must make the swap
    /// atomic: readers see either the old set or the new one, never a partial or empty set,
    /// and a failed call leaves the old set in place.
    fn replace_for_period(
        &self,
        id: &ClosingPeriodId,
        rows: Vec<CalculatedCommission>,
    ) -> Result<(), RepositoryError>;
    fn commissions_for_period(
        &self,
        id: &ClosingPeriodId,
    ) -> Result<Vec<CalculatedCommission>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl RepositoryError {
    /// Worth another attempt within the same run.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}
