use commission_engine::commission::{CommissionFixture, InMemoryCommissionStore};
use commission_engine::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seed an in-memory store from a fixture file, or start empty when none is configured.
pub(crate) fn load_store(path: Option<&Path>) -> Result<InMemoryCommissionStore, AppError> {
    match path {
        Some(path) => {
            let fixture = CommissionFixture::from_path(path)?;
            Ok(InMemoryCommissionStore::from_fixture(fixture))
        }
        None => Ok(InMemoryCommissionStore::default()),
    }
}
