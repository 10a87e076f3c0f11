use crate::cli::ServeArgs;
use crate::infra::{load_store, AppState};
use crate::routes::with_commission_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use commission_engine::commission::{
    CommissionApi, CommissionService, CommissionStores, StaticTokenAuthenticator,
};
use commission_engine::config::AppConfig;
use commission_engine::error::AppError;
use commission_engine::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(load_store(config.engine.fixture_path.as_deref())?);
    if let Some(path) = &config.engine.fixture_path {
        info!(fixture = %path.display(), "seeded commission store from fixture");
    }

    let authenticator = StaticTokenAuthenticator::new(config.engine.api_tokens.clone());
    if authenticator.is_empty() {
        warn!("COMMISSION_API_TOKENS is empty; every commission request will be rejected");
    }

    let service = Arc::new(CommissionService::new(
        CommissionStores::shared(store),
        config.engine.persist_attempts,
    ));
    let api = CommissionApi {
        service,
        auth: Arc::new(authenticator),
    };

    let app = with_commission_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "commission engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
