use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::auth::{CallerAuthenticator, CallerIdentity};
use super::service::{CommissionRunError, CommissionService, RunSummary};
use crate::error::AppError;

/// Shared state behind the commission routes.
#[derive(Clone)]
pub struct CommissionApi {
    pub service: Arc<CommissionService>,
    pub auth: Arc<dyn CallerAuthenticator>,
}

/// Invocation payload: the closing period key and nothing else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub closing_period_id: Option<String>,
}

/// Summary returned synchronously after a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationSummaryView {
    pub closing_period_id: String,
    pub salespeople: usize,
    pub sales_processed: u64,
    pub total_mrr: Decimal,
    pub goal_met: bool,
}

impl From<RunSummary> for CalculationSummaryView {
    fn from(summary: RunSummary) -> Self {
        Self {
            closing_period_id: summary.closing_period_id.0,
            salespeople: summary.salespeople,
            sales_processed: summary.sales_processed,
            total_mrr: summary.total_mrr,
            goal_met: summary.goal_met,
        }
    }
}

/// Router builder exposing the calculation trigger and the read-back endpoint.
pub fn commission_router(api: CommissionApi) -> Router {
    Router::new()
        .route("/api/v1/commissions/calculate", post(calculate_handler))
        .route(
            "/api/v1/commissions/:closing_period_id",
            get(commissions_handler),
        )
        .with_state(api)
}

fn authenticate(api: &CommissionApi, headers: &HeaderMap) -> Result<CallerIdentity, AppError> {
    api.auth.authenticate(headers).map_err(|error| {
        warn!(error = %error, "rejected commission request");
        AppError::from(error)
    })
}

/// The service is synchronous and may block on the period lock or store I/O.
async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, CommissionRunError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(task).await??)
}

pub(crate) async fn calculate_handler(
    State(api): State<CommissionApi>,
    headers: HeaderMap,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let caller = authenticate(&api, &headers)?;
    let Json(request) = payload?;

    let closing_period_id = request.closing_period_id.unwrap_or_default();
    info!(caller = %caller.0, closing_period = %closing_period_id, "commission calculation requested");

    let service = api.service.clone();
    let summary = run_blocking(move || service.calculate(&closing_period_id)).await?;

    Ok(Json(json!({
        "success": true,
        "summary": CalculationSummaryView::from(summary),
    })))
}

pub(crate) async fn commissions_handler(
    State(api): State<CommissionApi>,
    headers: HeaderMap,
    Path(closing_period_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authenticate(&api, &headers)?;

    let service = api.service.clone();
    let key = closing_period_id.clone();
    let commissions = run_blocking(move || service.commissions(&key)).await?;

    Ok(Json(json!({
        "success": true,
        "closing_period_id": closing_period_id,
        "commissions": commissions,
    })))
}
