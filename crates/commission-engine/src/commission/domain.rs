use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::classifier::{classify_sale, BillingInterval};

/// Identifier wrapper for closing periods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClosingPeriodId(pub String);

impl fmt::Display for ClosingPeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grouping key for a salesperson. Sales without an owner collapse onto [`SalespersonKey::UNASSIGNED`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SalespersonKey(pub String);

impl SalespersonKey {
    pub const UNASSIGNED: &'static str = "unassigned";

    pub fn resolve(owner: Option<&str>) -> Self {
        match owner.map(str::trim) {
            Some(name) if !name.is_empty() => Self(name.to_string()),
            _ => Self(Self::UNASSIGNED.to_string()),
        }
    }
}

impl fmt::Display for SalespersonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sale category decided once at import time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    Recurring,
    OneTime,
    Service,
}

impl SaleKind {
    /// Only recurring sales move sale-count metrics.
    pub fn is_recurring(self) -> bool {
        matches!(self, SaleKind::Recurring)
    }
}

/// The three independent eligibility flags carried by every imported sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleEligibility {
    pub counts_toward_tier: bool,
    pub counts_toward_commission: bool,
    pub counts_toward_goal: bool,
}

/// Sale line as handed over by the import pipeline, labels still raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedSale {
    pub closing_period_id: ClosingPeriodId,
    #[serde(default)]
    pub salesperson: Option<String>,
    #[serde(default)]
    pub mrr: Decimal,
    #[serde(default)]
    pub one_time_fee: Decimal,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub sale_type: Option<String>,
    #[serde(default)]
    pub counts_toward_tier: bool,
    #[serde(default)]
    pub counts_toward_commission: bool,
    #[serde(default)]
    pub counts_toward_goal: bool,
}

/// Immutable sale record consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub closing_period_id: ClosingPeriodId,
    pub salesperson: Option<String>,
    pub mrr: Decimal,
    pub one_time_fee: Decimal,
    pub interval: BillingInterval,
    pub kind: SaleKind,
    pub eligibility: SaleEligibility,
}

impl SaleRecord {
    pub fn salesperson_key(&self) -> SalespersonKey {
        SalespersonKey::resolve(self.salesperson.as_deref())
    }

    pub fn is_recurring(&self) -> bool {
        self.kind.is_recurring()
    }
}

impl From<ImportedSale> for SaleRecord {
    fn from(sale: ImportedSale) -> Self {
        let kind = classify_sale(sale.sale_type.as_deref(), sale.interval.as_deref());
        let interval = sale
            .interval
            .as_deref()
            .map(BillingInterval::from_label)
            .unwrap_or(BillingInterval::Other(String::new()));

        Self {
            closing_period_id: sale.closing_period_id,
            salesperson: sale.salesperson,
            mrr: sale.mrr,
            one_time_fee: sale.one_time_fee,
            interval,
            kind,
            eligibility: SaleEligibility {
                counts_toward_tier: sale.counts_toward_tier,
                counts_toward_commission: sale.counts_toward_commission,
                counts_toward_goal: sale.counts_toward_goal,
            },
        }
    }
}

/// Commission bracket keyed by an inclusive MRR range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionTier {
    pub name: String,
    pub min_mrr: Decimal,
    #[serde(default)]
    pub max_mrr: Option<Decimal>,
    /// Whole-number percentage, e.g. `10` for 10%.
    pub commission_percent: Decimal,
    pub rank: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl CommissionTier {
    pub fn contains(&self, mrr: Decimal) -> bool {
        mrr >= self.min_mrr && self.max_mrr.map_or(true, |max| mrr <= max)
    }
}

/// Keys understood by the generic parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKey {
    GoalMrr,
    GoalQuantity,
    TeamBonusPercent,
    CompanyBonusPercent,
    Headcount,
    OneTimeSaleCommissionPercent,
}

impl ParameterKey {
    pub fn ordered() -> [ParameterKey; 6] {
        [
            ParameterKey::GoalMrr,
            ParameterKey::GoalQuantity,
            ParameterKey::TeamBonusPercent,
            ParameterKey::CompanyBonusPercent,
            ParameterKey::Headcount,
            ParameterKey::OneTimeSaleCommissionPercent,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ParameterKey::GoalMrr => "goal_mrr",
            ParameterKey::GoalQuantity => "goal_quantity",
            ParameterKey::TeamBonusPercent => "team_bonus_percent",
            ParameterKey::CompanyBonusPercent => "company_bonus_percent",
            ParameterKey::Headcount => "headcount",
            ParameterKey::OneTimeSaleCommissionPercent => "one_time_sale_commission_percent",
        }
    }
}

/// Process-wide default value for a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParameter {
    pub key: ParameterKey,
    pub value: Decimal,
}

/// Period-specific overrides; unset fields fall back to the generic parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyGoal {
    pub reference_month: NaiveDate,
    #[serde(default)]
    pub goal_mrr: Option<Decimal>,
    #[serde(default)]
    pub goal_quantity: Option<u64>,
    #[serde(default)]
    pub team_bonus_percent: Option<Decimal>,
    #[serde(default)]
    pub company_bonus_percent: Option<Decimal>,
    #[serde(default)]
    pub headcount: Option<i64>,
    #[serde(default)]
    pub one_time_sale_commission_percent: Option<Decimal>,
}

impl MonthlyGoal {
    pub fn override_for(&self, key: ParameterKey) -> Option<Decimal> {
        match key {
            ParameterKey::GoalMrr => self.goal_mrr,
            ParameterKey::GoalQuantity => self.goal_quantity.map(Decimal::from),
            ParameterKey::TeamBonusPercent => self.team_bonus_percent,
            ParameterKey::CompanyBonusPercent => self.company_bonus_percent,
            ParameterKey::Headcount => self.headcount.map(Decimal::from),
            ParameterKey::OneTimeSaleCommissionPercent => self.one_time_sale_commission_percent,
        }
    }
}

/// First day of the month containing `date`; goals and periods are keyed on it.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Period-level totals written back after each run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub total_recurring_sales: u64,
    pub total_mrr: Decimal,
    pub goal_met: bool,
    #[serde(default)]
    pub calculated_at: Option<DateTime<Utc>>,
}

/// Monthly unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingPeriod {
    pub id: ClosingPeriodId,
    pub reference_month: NaiveDate,
    #[serde(default)]
    pub summary: PeriodSummary,
}

/// Persisted per-salesperson outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedCommission {
    pub id: String,
    pub closing_period_id: ClosingPeriodId,
    pub salesperson: SalespersonKey,
    pub sale_count: u64,
    pub tier_mrr: Decimal,
    pub commission_mrr: Decimal,
    pub annual_mrr: Decimal,
    pub one_time_fees: Decimal,
    pub tier_name: Option<String>,
    pub tier_percent: Decimal,
    pub base_commission: Decimal,
    pub annual_bonus: Decimal,
    pub team_bonus: Decimal,
    pub company_bonus: Decimal,
    pub one_time_commission: Decimal,
    pub total: Decimal,
    pub calculated_at: DateTime<Utc>,
}

impl CalculatedCommission {
    /// Compares the computed values, ignoring row identity and timestamp.
    pub fn same_values(&self, other: &CalculatedCommission) -> bool {
        self.closing_period_id == other.closing_period_id
            && self.salesperson == other.salesperson
            && self.sale_count == other.sale_count
            && self.tier_mrr == other.tier_mrr
            && self.commission_mrr == other.commission_mrr
            && self.annual_mrr == other.annual_mrr
            && self.one_time_fees == other.one_time_fees
            && self.tier_name == other.tier_name
            && self.tier_percent == other.tier_percent
            && self.base_commission == other.base_commission
            && self.annual_bonus == other.annual_bonus
            && self.team_bonus == other.team_bonus
            && self.company_bonus == other.company_bonus
            && self.one_time_commission == other.one_time_commission
            && self.total == other.total
    }
}
