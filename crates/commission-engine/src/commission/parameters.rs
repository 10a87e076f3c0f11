use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{ConfigurationParameter, MonthlyGoal, ParameterKey};

/// Parameter set for one run: generic defaults merged with the month's goal record.
///
/// Percent inputs are already converted to fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParameters {
    pub goal_mrr: Decimal,
    pub goal_quantity: Decimal,
    pub team_bonus_fraction: Decimal,
    pub company_bonus_fraction: Decimal,
    pub headcount: u32,
    pub one_time_sale_fraction: Decimal,
    pub monthly_goal_applied: bool,
    /// Keys that had no value in either source and fell back to the neutral default.
    pub used_defaults: Vec<ParameterKey>,
}

impl ResolvedParameters {
    pub fn resolve(parameters: &[ConfigurationParameter], goal: Option<&MonthlyGoal>) -> Self {
        let mut used_defaults = Vec::new();
        let mut lookup = |key: ParameterKey| -> Option<Decimal> {
            let value = goal.and_then(|goal| goal.override_for(key)).or_else(|| {
                parameters
                    .iter()
                    .rev()
                    .find(|parameter| parameter.key == key)
                    .map(|parameter| parameter.value)
            });
            if value.is_none() {
                used_defaults.push(key);
            }
            value
        };

        let goal_mrr = lookup(ParameterKey::GoalMrr).unwrap_or(Decimal::ZERO);
        let goal_quantity = lookup(ParameterKey::GoalQuantity).unwrap_or(Decimal::ZERO);
        let team_bonus_fraction = percent_to_fraction(lookup(ParameterKey::TeamBonusPercent));
        let company_bonus_fraction =
            percent_to_fraction(lookup(ParameterKey::CompanyBonusPercent));
        let headcount = lookup(ParameterKey::Headcount)
            .and_then(|value| value.trunc().to_u32())
            .filter(|value| *value > 0)
            .unwrap_or(1);
        let one_time_sale_fraction =
            percent_to_fraction(lookup(ParameterKey::OneTimeSaleCommissionPercent));

        Self {
            goal_mrr,
            goal_quantity,
            team_bonus_fraction,
            company_bonus_fraction,
            headcount,
            one_time_sale_fraction,
            monthly_goal_applied: goal.is_some(),
            used_defaults,
        }
    }

    pub fn used_defaults(&self) -> bool {
        !self.used_defaults.is_empty()
    }
}

pub(crate) fn percent_to_fraction(percent: Option<Decimal>) -> Decimal {
    percent.unwrap_or(Decimal::ZERO) / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parameter(key: ParameterKey, value: i64) -> ConfigurationParameter {
        ConfigurationParameter {
            key,
            value: Decimal::from(value),
        }
    }

    fn defaults() -> Vec<ConfigurationParameter> {
        vec![
            parameter(ParameterKey::GoalMrr, 50_000),
            parameter(ParameterKey::GoalQuantity, 20),
            parameter(ParameterKey::TeamBonusPercent, 10),
            parameter(ParameterKey::CompanyBonusPercent, 5),
            parameter(ParameterKey::Headcount, 4),
            parameter(ParameterKey::OneTimeSaleCommissionPercent, 8),
        ]
    }

    #[test]
    fn converts_percentages_to_fractions() {
        let resolved = ResolvedParameters::resolve(&defaults(), None);
        assert_eq!(resolved.goal_mrr, Decimal::from(50_000));
        assert_eq!(resolved.goal_quantity, Decimal::from(20));
        assert_eq!(resolved.team_bonus_fraction, Decimal::new(10, 2));
        assert_eq!(resolved.company_bonus_fraction, Decimal::new(5, 2));
        assert_eq!(resolved.headcount, 4);
        assert_eq!(resolved.one_time_sale_fraction, Decimal::new(8, 2));
        assert!(!resolved.used_defaults());
        assert!(!resolved.monthly_goal_applied);
    }

    #[test]
    fn monthly_goal_overrides_only_the_fields_it_sets() {
        let goal = MonthlyGoal {
            reference_month: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
            goal_mrr: Some(Decimal::from(80_000)),
            headcount: Some(6),
            ..MonthlyGoal::default()
        };
        let resolved = ResolvedParameters::resolve(&defaults(), Some(&goal));
        assert_eq!(resolved.goal_mrr, Decimal::from(80_000));
        assert_eq!(resolved.headcount, 6);
        assert_eq!(resolved.goal_quantity, Decimal::from(20));
        assert_eq!(resolved.team_bonus_fraction, Decimal::new(10, 2));
        assert!(resolved.monthly_goal_applied);
    }

    #[test]
    fn missing_parameters_fall_back_to_neutral_defaults() {
        let resolved = ResolvedParameters::resolve(&[], None);
        assert_eq!(resolved.goal_mrr, Decimal::ZERO);
        assert_eq!(resolved.team_bonus_fraction, Decimal::ZERO);
        assert_eq!(resolved.headcount, 1);
        assert!(resolved.used_defaults());
        assert_eq!(resolved.used_defaults, ParameterKey::ordered().to_vec());
    }

    #[test]
    fn non_positive_headcount_is_clamped_to_one() {
        let goal = MonthlyGoal {
            reference_month: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
            headcount: Some(0),
            ..MonthlyGoal::default()
        };
        let resolved = ResolvedParameters::resolve(&defaults(), Some(&goal));
        assert_eq!(resolved.headcount, 1);

        let negative = vec![parameter(ParameterKey::Headcount, -3)];
        assert_eq!(ResolvedParameters::resolve(&negative, None).headcount, 1);
    }
}
