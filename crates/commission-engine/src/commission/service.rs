use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::domain::{CalculatedCommission, ClosingPeriod, ClosingPeriodId, PeriodSummary};
use super::engine::{CommissionEngine, RunStage};
use super::parameters::ResolvedParameters;
use super::repository::{
    CalculatedCommissionRepository, ClosingPeriodRepository, CommissionSettingsRepository,
    RepositoryError, SaleRecordRepository,
};
use crate::telemetry::commission_run_span;

/// The collaborators a run reads from and writes to.
#[derive(Clone)]
pub struct CommissionStores {
    pub periods: Arc<dyn ClosingPeriodRepository>,
    pub sales: Arc<dyn SaleRecordRepository>,
    pub settings: Arc<dyn CommissionSettingsRepository>,
    pub commissions: Arc<dyn CalculatedCommissionRepository>,
}

impl CommissionStores {
    /// Back every collaborator with one store.
    pub fn shared<T>(store: Arc<T>) -> Self
    where
        T: ClosingPeriodRepository
            + SaleRecordRepository
            + CommissionSettingsRepository
            + CalculatedCommissionRepository
            + 'static,
    {
        Self {
            periods: store.clone(),
            sales: store.clone(),
            settings: store.clone(),
            commissions: store,
        }
    }
}

/// Compact result handed back to the caller; the per-salesperson breakdown stays persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub closing_period_id: ClosingPeriodId,
    pub salespeople: usize,
    pub sales_processed: u64,
    pub total_mrr: Decimal,
    pub goal_met: bool,
    pub total_payout: Decimal,
    pub used_default_parameters: bool,
}

/// Service composing the stores, the engine and the per-period serialization.
pub struct CommissionService {
    stores: CommissionStores,
    persist_attempts: u32,
    period_locks: Mutex<HashMap<ClosingPeriodId, Arc<Mutex<()>>>>,
}

static COMMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_commission_id() -> String {
    let id = COMMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("cc-{id:06}")
}

impl CommissionService {
    pub fn new(stores: CommissionStores, persist_attempts: u32) -> Self {
        Self {
            stores,
            persist_attempts: persist_attempts.max(1),
            period_locks: Mutex::new(HashMap::new()),
        }
    }

    fn period_lock(&self, id: &ClosingPeriodId) -> Arc<Mutex<()>> {
        let mut locks = self
            .period_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(id.clone()).or_default().clone()
    }

    fn release_lock(&self, id: &ClosingPeriodId, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .period_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // one reference in the map, one here: nobody else is queued on this period
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
    }

    /// Recompute and replace the commissions of one closing period.
    ///
    /// Runs for the same period are serialized; nothing is written until the whole
    /// result set has been computed. Unknown periods are rejected before a lock is taken.
    pub fn calculate(
        &self,
        closing_period_id: &str,
    ) -> Result<RunSummary, CommissionRunError> {
        let key = closing_period_id.trim();
        if key.is_empty() {
            return Err(CommissionRunError::MissingPeriodKey);
        }
        let id = ClosingPeriodId(key.to_string());

        let span = commission_run_span(key);
        let _entered = span.enter();

        debug!(stage = ?RunStage::LoadInputs, "loading inputs");
        let period = self
            .stores
            .periods
            .fetch(&id)
            .map_err(load_error("closing period"))?
            .ok_or_else(|| CommissionRunError::PeriodNotFound(id.clone()))?;

        let lock = self.period_lock(&id);
        let result = {
            let _serialized = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.run_locked(&period)
        };
        self.release_lock(&id, lock);

        if let Err(err) = &result {
            error!(error = %err, "commission run failed");
        }
        result
    }

    fn run_locked(&self, period: &ClosingPeriod) -> Result<RunSummary, CommissionRunError> {
        let id = &period.id;
        let sales = self
            .stores
            .sales
            .sales_for_period(id)
            .map_err(load_error("sale records"))?;
        let tiers = self
            .stores
            .settings
            .active_tiers()
            .map_err(load_error("commission tiers"))?;
        let parameters = self
            .stores
            .settings
            .parameters()
            .map_err(load_error("configuration parameters"))?;
        let goal = self
            .stores
            .settings
            .monthly_goal(period.reference_month)
            .map_err(load_error("monthly goal"))?;

        let parameters = ResolvedParameters::resolve(&parameters, goal.as_ref());
        if parameters.used_defaults() {
            debug!(missing = ?parameters.used_defaults, "parameters fell back to defaults");
        }

        let engine = CommissionEngine::new(parameters, tiers);
        let run = engine.run(&sales);

        let calculated_at = Utc::now();
        let rows = run.rows(id, calculated_at, next_commission_id);

        debug!(stage = ?RunStage::ReplacePersisted, rows = rows.len(), "replacing rows");
        self.replace_with_retry(id, rows)?;

        debug!(stage = ?RunStage::UpdatePeriodSummary, "updating period summary");
        self.stores
            .periods
            .update_summary(
                id,
                PeriodSummary {
                    total_recurring_sales: run.totals.recurring_sales,
                    total_mrr: run.totals.goal_mrr,
                    goal_met: run.goal.met,
                    calculated_at: Some(calculated_at),
                },
            )
            .map_err(|source| CommissionRunError::Summary { source })?;

        let summary = RunSummary {
            closing_period_id: id.clone(),
            salespeople: run.aggregates.len(),
            sales_processed: run.totals.sales_processed,
            total_mrr: run.totals.goal_mrr,
            goal_met: run.goal.met,
            total_payout: run.total_payout(),
            used_default_parameters: run.parameters.used_defaults(),
        };

        info!(
            salespeople = summary.salespeople,
            sales = summary.sales_processed,
            total_mrr = %summary.total_mrr,
            goal_met = summary.goal_met,
            payout = %summary.total_payout,
            "commission run completed"
        );

        Ok(summary)
    }

    fn replace_with_retry(
        &self,
        id: &ClosingPeriodId,
        rows: Vec<CalculatedCommission>,
    ) -> Result<(), CommissionRunError> {
        let mut attempt = 1;
        loop {
            match self.stores.commissions.replace_for_period(id, rows.clone()) {
                Ok(()) => return Ok(()),
                Err(source) if source.is_transient() && attempt < self.persist_attempts => {
                    warn!(attempt, error = %source, "replacing commissions failed, retrying");
                    attempt += 1;
                }
                Err(source) => {
                    return Err(CommissionRunError::Persist {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    /// Persisted rows of a period, for reporting collaborators.
    pub fn commissions(
        &self,
        closing_period_id: &str,
    ) -> Result<Vec<CalculatedCommission>, CommissionRunError> {
        let key = closing_period_id.trim();
        if key.is_empty() {
            return Err(CommissionRunError::MissingPeriodKey);
        }
        let id = ClosingPeriodId(key.to_string());
        self.stores
            .periods
            .fetch(&id)
            .map_err(load_error("closing period"))?
            .ok_or_else(|| CommissionRunError::PeriodNotFound(id.clone()))?;
        self.stores
            .commissions
            .commissions_for_period(&id)
            .map_err(load_error("calculated commissions"))
    }
}

fn load_error(input: &'static str) -> impl Fn(RepositoryError) -> CommissionRunError {
    move |source| CommissionRunError::Load { input, source }
}

/// Error raised by a commission run.
#[derive(Debug, thiserror::Error)]
pub enum CommissionRunError {
    #[error("closing period key is required")]
    MissingPeriodKey,
    #[error("closing period {0} not found")]
    PeriodNotFound(ClosingPeriodId),
    #[error("failed to load {input}: {source}")]
    Load {
        input: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error("failed to persist calculated commissions after {attempts} attempt(s): {source}")]
    Persist {
        attempts: u32,
        #[source]
        source: RepositoryError,
    },
    #[error("commissions persisted but the period summary update failed: {source}")]
    Summary {
        #[source]
        source: RepositoryError,
    },
}

impl CommissionRunError {
    /// Input errors are reported before any store is read for computation.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CommissionRunError::MissingPeriodKey | CommissionRunError::PeriodNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::memory::InMemoryCommissionStore;
    use chrono::NaiveDate;

    fn lock_count(service: &CommissionService) -> usize {
        service
            .period_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    #[test]
    fn unknown_periods_never_take_a_lock() {
        let service = CommissionService::new(
            CommissionStores::shared(Arc::new(InMemoryCommissionStore::default())),
            1,
        );

        for index in 0..1_000 {
            let result = service.calculate(&format!("bogus-{index}"));
            assert!(matches!(result, Err(CommissionRunError::PeriodNotFound(_))));
        }

        assert_eq!(lock_count(&service), 0);
    }

    #[test]
    fn finished_runs_release_their_period_lock() {
        let store = InMemoryCommissionStore::default();
        store
            .insert_period(ClosingPeriod {
                id: ClosingPeriodId("2025-03".to_string()),
                reference_month: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
                summary: Default::default(),
            })
            .expect("period inserted");
        let service = CommissionService::new(CommissionStores::shared(Arc::new(store)), 1);

        service.calculate("2025-03").expect("empty run completes");
        service.calculate("2025-03").expect("second run completes");

        assert_eq!(lock_count(&service), 0);
    }
}
