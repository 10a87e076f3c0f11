use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{
    ClosingPeriod, CommissionTier, ConfigurationParameter, ImportedSale, MonthlyGoal,
};

/// JSON snapshot of every input store, used to seed the in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionFixture {
    #[serde(default)]
    pub closing_periods: Vec<ClosingPeriod>,
    #[serde(default)]
    pub sales: Vec<ImportedSale>,
    #[serde(default)]
    pub tiers: Vec<CommissionTier>,
    #[serde(default)]
    pub parameters: Vec<ConfigurationParameter>,
    #[serde(default)]
    pub monthly_goals: Vec<MonthlyGoal>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommissionFixture {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FixtureError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn parses_raw_labels_and_defaults() {
        let raw = r#"{
            "closing_periods": [{"id": "2025-03", "reference_month": "2025-03-01"}],
            "sales": [
                {"closing_period_id": "2025-03", "salesperson": "ana", "mrr": "1200.50",
                 "interval": "Anual", "sale_type": "Normal",
                 "counts_toward_tier": true, "counts_toward_commission": true},
                {"closing_period_id": "2025-03", "one_time_fee": 300, "interval": "Venda única"}
            ],
            "tiers": [{"name": "Pro", "min_mrr": 0, "commission_percent": 10, "rank": 1}],
            "parameters": [{"key": "team_bonus_percent", "value": 10}]
        }"#;

        let fixture = CommissionFixture::from_reader(raw.as_bytes()).expect("fixture parses");
        assert_eq!(fixture.closing_periods.len(), 1);
        assert!(!fixture.closing_periods[0].summary.goal_met);
        assert_eq!(fixture.sales[0].mrr, Decimal::new(120050, 2));
        assert!(fixture.sales[1].salesperson.is_none());
        assert!(fixture.tiers[0].active);
        assert!(fixture.tiers[0].max_mrr.is_none());
        assert!(fixture.monthly_goals.is_empty());
    }

    #[test]
    fn reports_invalid_json() {
        let err = CommissionFixture::from_reader("{".as_bytes()).expect_err("invalid json");
        assert!(matches!(err, FixtureError::Json(_)));
    }
}
