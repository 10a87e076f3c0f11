use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::aggregator::{aggregate_sales, CompanyTotals, SalespersonAggregate};
use super::bonus::{distribute_bonuses, BonusPools, GoalEvaluation};
use super::calculator::apply_commission;
use super::domain::{CalculatedCommission, ClosingPeriodId, CommissionTier, SaleRecord};
use super::parameters::ResolvedParameters;
use super::tiers::TierTable;

/// Steps of a single run, in order. The middle three happen inside [`CommissionEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    LoadInputs,
    Aggregate,
    ResolveTiers,
    Distribute,
    ReplacePersisted,
    UpdatePeriodSummary,
}

impl RunStage {
    pub const ORDERED: [RunStage; 6] = [
        RunStage::LoadInputs,
        RunStage::Aggregate,
        RunStage::ResolveTiers,
        RunStage::Distribute,
        RunStage::ReplacePersisted,
        RunStage::UpdatePeriodSummary,
    ];
}

/// Stateless, in-memory commission pass over one period's sales.
pub struct CommissionEngine {
    parameters: ResolvedParameters,
    tiers: TierTable,
}

/// Everything one pass produced, before persistence.
#[derive(Debug, Clone, Serialize)]
pub struct CommissionRun {
    pub parameters: ResolvedParameters,
    pub totals: CompanyTotals,
    pub goal: GoalEvaluation,
    pub pools: BonusPools,
    pub aggregates: Vec<SalespersonAggregate>,
}

impl CommissionEngine {
    pub fn new(parameters: ResolvedParameters, tiers: Vec<CommissionTier>) -> Self {
        Self {
            parameters,
            tiers: TierTable::new(tiers),
        }
    }

    pub fn parameters(&self) -> &ResolvedParameters {
        &self.parameters
    }

    pub fn run(&self, sales: &[SaleRecord]) -> CommissionRun {
        let (mut aggregates, totals) = aggregate_sales(sales);
        debug!(
            stage = ?RunStage::Aggregate,
            salespeople = aggregates.len(),
            sales = totals.sales_processed,
            "sales aggregated"
        );

        for aggregate in aggregates.iter_mut() {
            let tier = self.tiers.resolve(aggregate.tier_mrr);
            apply_commission(aggregate, tier, self.parameters.one_time_sale_fraction);
        }
        debug!(
            stage = ?RunStage::ResolveTiers,
            tiers = self.tiers.len(),
            unmatched = aggregates.iter().filter(|a| a.tier_name.is_none()).count(),
            "tiers resolved"
        );

        let goal = GoalEvaluation::evaluate(&totals, &self.parameters);
        let pools = distribute_bonuses(&mut aggregates, &goal, &self.parameters);
        debug!(
            stage = ?RunStage::Distribute,
            goal_met = goal.met,
            goal_mrr = %goal.mrr,
            team_pool = %pools.team_pool,
            "bonuses distributed"
        );

        CommissionRun {
            parameters: self.parameters.clone(),
            totals,
            goal,
            pools,
            aggregates,
        }
    }
}

impl CommissionRun {
    /// Materialize persisted rows; `next_id` supplies row identifiers.
    pub fn rows(
        &self,
        closing_period_id: &ClosingPeriodId,
        calculated_at: DateTime<Utc>,
        mut next_id: impl FnMut() -> String,
    ) -> Vec<CalculatedCommission> {
        self.aggregates
            .iter()
            .map(|aggregate| CalculatedCommission {
                id: next_id(),
                closing_period_id: closing_period_id.clone(),
                salesperson: aggregate.salesperson.clone(),
                sale_count: aggregate.sale_count,
                tier_mrr: aggregate.tier_mrr,
                commission_mrr: aggregate.commission_mrr,
                annual_mrr: aggregate.annual_mrr,
                one_time_fees: aggregate.one_time_fees,
                tier_name: aggregate.tier_name.clone(),
                tier_percent: aggregate.tier_percent,
                base_commission: aggregate.base_commission,
                annual_bonus: aggregate.annual_bonus,
                team_bonus: aggregate.team_bonus,
                company_bonus: aggregate.company_bonus,
                one_time_commission: aggregate.one_time_commission,
                total: aggregate.total(),
                calculated_at,
            })
            .collect()
    }

    pub fn total_payout(&self) -> Decimal {
        self.aggregates.iter().map(SalespersonAggregate::total).sum()
    }
}
