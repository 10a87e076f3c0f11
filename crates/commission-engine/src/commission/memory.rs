use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use super::domain::{
    month_start, CalculatedCommission, ClosingPeriod, ClosingPeriodId, CommissionTier,
    ConfigurationParameter, MonthlyGoal, PeriodSummary, SaleRecord,
};
use super::fixture::CommissionFixture;
use super::repository::{
    CalculatedCommissionRepository, ClosingPeriodRepository, CommissionSettingsRepository,
    RepositoryError, SaleRecordRepository,
};

#[derive(Debug, Default)]
struct StoreState {
    periods: HashMap<ClosingPeriodId, ClosingPeriod>,
    sales: Vec<SaleRecord>,
    tiers: Vec<CommissionTier>,
    parameters: Vec<ConfigurationParameter>,
    goals: HashMap<NaiveDate, MonthlyGoal>,
}

/// Process-local store backing every repository trait.
///
/// Calculated rows sit behind their own lock so a replace is a single swap under one
/// write guard.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCommissionStore {
    state: Arc<RwLock<StoreState>>,
    commissions: Arc<RwLock<HashMap<ClosingPeriodId, Vec<CalculatedCommission>>>>,
}

fn poisoned(_: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable("store lock poisoned".to_string())
}

impl InMemoryCommissionStore {
    pub fn from_fixture(fixture: CommissionFixture) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.write().unwrap_or_else(|err| err.into_inner());
            for period in fixture.closing_periods {
                state.periods.insert(period.id.clone(), period);
            }
            state.sales = fixture.sales.into_iter().map(SaleRecord::from).collect();
            state.tiers = fixture.tiers;
            state.parameters = fixture.parameters;
            for goal in fixture.monthly_goals {
                state.goals.insert(month_start(goal.reference_month), goal);
            }
        }
        store
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, RepositoryError> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, RepositoryError> {
        self.state.write().map_err(poisoned)
    }

    pub fn insert_period(&self, period: ClosingPeriod) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        if state.periods.contains_key(&period.id) {
            return Err(RepositoryError::Conflict);
        }
        state.periods.insert(period.id.clone(), period);
        Ok(())
    }

    pub fn insert_sale(&self, sale: SaleRecord) -> Result<(), RepositoryError> {
        self.write()?.sales.push(sale);
        Ok(())
    }

    /// Replace sales matching `predicate` with `corrected`; returns how many were replaced.
    pub fn correct_sales(
        &self,
        predicate: impl Fn(&SaleRecord) -> bool,
        corrected: SaleRecord,
    ) -> Result<usize, RepositoryError> {
        let mut state = self.write()?;
        let mut replaced = 0;
        for sale in state.sales.iter_mut().filter(|sale| predicate(sale)) {
            *sale = corrected.clone();
            replaced += 1;
        }
        Ok(replaced)
    }

    pub fn insert_tier(&self, tier: CommissionTier) -> Result<(), RepositoryError> {
        self.write()?.tiers.push(tier);
        Ok(())
    }

    pub fn set_parameter(&self, parameter: ConfigurationParameter) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        state.parameters.retain(|existing| existing.key != parameter.key);
        state.parameters.push(parameter);
        Ok(())
    }

    pub fn insert_goal(&self, goal: MonthlyGoal) -> Result<(), RepositoryError> {
        self.write()?
            .goals
            .insert(month_start(goal.reference_month), goal);
        Ok(())
    }
}

impl ClosingPeriodRepository for InMemoryCommissionStore {
    fn fetch(&self, id: &ClosingPeriodId) -> Result<Option<ClosingPeriod>, RepositoryError> {
        Ok(self.read()?.periods.get(id).cloned())
    }

    fn update_summary(
        &self,
        id: &ClosingPeriodId,
        summary: PeriodSummary,
    ) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        let period = state.periods.get_mut(id).ok_or(RepositoryError::NotFound)?;
        period.summary = summary;
        Ok(())
    }
}

impl SaleRecordRepository for InMemoryCommissionStore {
    fn sales_for_period(&self, id: &ClosingPeriodId) -> Result<Vec<SaleRecord>, RepositoryError> {
        Ok(self
            .read()?
            .sales
            .iter()
            .filter(|sale| &sale.closing_period_id == id)
            .cloned()
            .collect())
    }
}

impl CommissionSettingsRepository for InMemoryCommissionStore {
    fn active_tiers(&self) -> Result<Vec<CommissionTier>, RepositoryError> {
        Ok(self
            .read()?
            .tiers
            .iter()
            .filter(|tier| tier.active)
            .cloned()
            .collect())
    }

    fn parameters(&self) -> Result<Vec<ConfigurationParameter>, RepositoryError> {
        Ok(self.read()?.parameters.clone())
    }

    fn monthly_goal(
        &self,
        reference_month: NaiveDate,
    ) -> Result<Option<MonthlyGoal>, RepositoryError> {
        Ok(self
            .read()?
            .goals
            .get(&month_start(reference_month))
            .cloned())
    }
}

impl CalculatedCommissionRepository for InMemoryCommissionStore {
    fn replace_for_period(
        &self,
        id: &ClosingPeriodId,
        rows: Vec<CalculatedCommission>,
    ) -> Result<(), RepositoryError> {
        if let Some(stray) = rows.iter().find(|row| &row.closing_period_id != id) {
            return Err(RepositoryError::Malformed(format!(
                "row {} belongs to period {}",
                stray.id, stray.closing_period_id
            )));
        }
        let mut commissions = self.commissions.write().map_err(poisoned)?;
        commissions.insert(id.clone(), rows);
        Ok(())
    }

    fn commissions_for_period(
        &self,
        id: &ClosingPeriodId,
    ) -> Result<Vec<CalculatedCommission>, RepositoryError> {
        let commissions = self.commissions.read().map_err(poisoned)?;
        Ok(commissions.get(id).cloned().unwrap_or_default())
    }
}
