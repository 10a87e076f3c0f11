use rust_decimal::Decimal;

use super::domain::CommissionTier;
use super::parameters::percent_to_fraction;

/// Commission tiers sorted once by rank, highest first.
///
/// Overlapping or gapped ranges are tolerated: the first tier in rank order that
/// contains the MRR wins, and an MRR outside every range resolves to no tier.
#[derive(Debug, Clone, Default)]
pub struct TierTable {
    tiers: Vec<CommissionTier>,
}

/// Tier picked for a salesperson. `percent` stays whole-number; `rate` is the fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct TierMatch<'a> {
    pub tier: &'a CommissionTier,
    pub rate: Decimal,
}

impl TierTable {
    pub fn new(mut tiers: Vec<CommissionTier>) -> Self {
        // stable: equal ranks keep store order
        tiers.sort_by(|a, b| b.rank.cmp(&a.rank));
        Self { tiers }
    }

    pub fn resolve(&self, mrr: Decimal) -> Option<TierMatch<'_>> {
        self.tiers
            .iter()
            .find(|tier| tier.contains(mrr))
            .map(|tier| TierMatch {
                tier,
                rate: percent_to_fraction(Some(tier.commission_percent)),
            })
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str, min: i64, max: Option<i64>, percent: i64, rank: i32) -> CommissionTier {
        CommissionTier {
            name: name.to_string(),
            min_mrr: Decimal::from(min),
            max_mrr: max.map(Decimal::from),
            commission_percent: Decimal::from(percent),
            rank,
            active: true,
        }
    }

    fn table() -> TierTable {
        TierTable::new(vec![
            tier("Starter", 0, Some(2_500), 5, 1),
            tier("Elite", 10_000, None, 15, 3),
            tier("Pro", 2_500, Some(9_999), 10, 2),
        ])
    }

    #[test]
    fn picks_the_bracket_containing_the_mrr() {
        let table = table();
        let pro = table.resolve(Decimal::from(3_000)).expect("pro matches");
        assert_eq!(pro.tier.name, "Pro");
        assert_eq!(pro.rate, Decimal::new(10, 2));

        let elite = table.resolve(Decimal::from(50_000)).expect("unbounded max");
        assert_eq!(elite.tier.name, "Elite");
    }

    #[test]
    fn boundaries_are_inclusive_and_higher_rank_wins_overlaps() {
        let table = table();
        // 2500 is inside both Starter and Pro; Pro outranks Starter.
        let overlap = table.resolve(Decimal::from(2_500)).expect("matches");
        assert_eq!(overlap.tier.name, "Pro");
        let edge = table.resolve(Decimal::from(9_999)).expect("max inclusive");
        assert_eq!(edge.tier.name, "Pro");
    }

    #[test]
    fn gaps_resolve_to_no_tier() {
        let table = table();
        assert!(table
            .resolve(Decimal::new(99995, 1))
            .is_none());
        assert!(table.resolve(Decimal::from(-1)).is_none());
        assert!(TierTable::default().resolve(Decimal::from(100)).is_none());
    }

    #[test]
    fn rate_never_decreases_as_mrr_grows() {
        let table = table();
        let mut previous = Decimal::ZERO;
        for mrr in (0..=20_000).step_by(250) {
            let rate = table
                .resolve(Decimal::from(mrr))
                .map(|found| found.rate)
                .unwrap_or(Decimal::ZERO);
            assert!(rate >= previous, "rate dropped at {mrr}");
            previous = rate;
        }
    }
}
