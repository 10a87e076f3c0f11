use rust_decimal::Decimal;
use serde::Serialize;

use super::aggregator::{CompanyTotals, SalespersonAggregate};
use super::parameters::ResolvedParameters;

/// Company goal outcome for the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalEvaluation {
    pub mrr: Decimal,
    pub sale_count: u64,
    pub target_mrr: Decimal,
    pub target_quantity: Decimal,
    pub met: bool,
}

impl GoalEvaluation {
    /// Both thresholds must be reached.
    pub fn evaluate(totals: &CompanyTotals, parameters: &ResolvedParameters) -> Self {
        let met = totals.goal_mrr >= parameters.goal_mrr
            && Decimal::from(totals.goal_sale_count) >= parameters.goal_quantity;

        Self {
            mrr: totals.goal_mrr,
            sale_count: totals.goal_sale_count,
            target_mrr: parameters.goal_mrr,
            target_quantity: parameters.goal_quantity,
            met,
        }
    }
}

/// Pool sizes computed when the goal is met; all zero otherwise.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BonusPools {
    pub commission_base: Decimal,
    pub team_pool: Decimal,
    pub tier_mrr_sum: Decimal,
    pub company_bonus_per_head: Decimal,
}

/// Split the team pool by tier-qualifying MRR share and the company pool evenly
/// across headcount. The pool sizes themselves come from commission-qualifying MRR.
pub fn distribute_bonuses(
    aggregates: &mut [SalespersonAggregate],
    goal: &GoalEvaluation,
    parameters: &ResolvedParameters,
) -> BonusPools {
    if !goal.met {
        for aggregate in aggregates.iter_mut() {
            aggregate.team_bonus = Decimal::ZERO;
            aggregate.company_bonus = Decimal::ZERO;
        }
        return BonusPools::default();
    }

    let commission_base: Decimal = aggregates.iter().map(|a| a.commission_mrr).sum();
    let tier_mrr_sum: Decimal = aggregates.iter().map(|a| a.tier_mrr).sum();
    let team_pool = commission_base * parameters.team_bonus_fraction;
    let company_bonus_per_head = commission_base * parameters.company_bonus_fraction
        / Decimal::from(parameters.headcount.max(1));

    for aggregate in aggregates.iter_mut() {
        aggregate.team_bonus = if tier_mrr_sum.is_zero() {
            Decimal::ZERO
        } else {
            team_pool * aggregate.tier_mrr / tier_mrr_sum
        };
        aggregate.company_bonus = company_bonus_per_head;
    }

    BonusPools {
        commission_base,
        team_pool,
        tier_mrr_sum,
        company_bonus_per_head,
    }
}
