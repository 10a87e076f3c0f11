use rust_decimal::Decimal;

use super::aggregator::SalespersonAggregate;
use super::tiers::TierMatch;

/// Fill in the goal-independent outputs: base commission, annual bonus and
/// one-time-sale commission.
///
/// The annual bonus reuses the tier rate of the base commission.
pub fn apply_commission(
    aggregate: &mut SalespersonAggregate,
    tier: Option<TierMatch<'_>>,
    one_time_sale_fraction: Decimal,
) {
    let rate = match tier {
        Some(found) => {
            aggregate.tier_name = Some(found.tier.name.clone());
            aggregate.tier_percent = found.tier.commission_percent;
            found.rate
        }
        None => {
            aggregate.tier_name = None;
            aggregate.tier_percent = Decimal::ZERO;
            Decimal::ZERO
        }
    };

    aggregate.base_commission = aggregate.commission_mrr * rate;
    aggregate.annual_bonus = aggregate.annual_mrr * rate;
    aggregate.one_time_commission = aggregate.one_time_fees * one_time_sale_fraction;
}
