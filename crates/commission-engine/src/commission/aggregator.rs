use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{SaleRecord, SalespersonKey};

/// Running totals for one salesperson, plus the outputs filled in by later stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalespersonAggregate {
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
}

impl SalespersonAggregate {
    pub fn new(salesperson: SalespersonKey) -> Self {
        Self {
            salesperson,
            sale_count: 0,
            tier_mrr: Decimal::ZERO,
            commission_mrr: Decimal::ZERO,
            annual_mrr: Decimal::ZERO,
            one_time_fees: Decimal::ZERO,
            tier_name: None,
            tier_percent: Decimal::ZERO,
            base_commission: Decimal::ZERO,
            annual_bonus: Decimal::ZERO,
            team_bonus: Decimal::ZERO,
            company_bonus: Decimal::ZERO,
            one_time_commission: Decimal::ZERO,
        }
    }

    /// Fold one sale in. Eligibility flags and interval routing gate independently:
    /// a one-time-sale interval only ever feeds the fee total.
    pub fn absorb(&mut self, sale: &SaleRecord) {
        if sale.is_recurring() {
            self.sale_count += 1;
        }

        if sale.eligibility.counts_toward_tier {
            self.tier_mrr += sale.mrr;
        }

        if sale.eligibility.counts_toward_commission {
            if sale.interval.is_one_time_sale() {
                self.one_time_fees += sale.one_time_fee;
            } else {
                self.commission_mrr += sale.mrr;
                self.one_time_fees += sale.one_time_fee;
                if sale.interval.is_annual() {
                    self.annual_mrr += sale.mrr;
                }
            }
        }
    }

    pub fn total(&self) -> Decimal {
        self.base_commission
            + self.annual_bonus
            + self.team_bonus
            + self.company_bonus
            + self.one_time_commission
    }
}

/// Company-wide figures, accumulated independently of the per-salesperson pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompanyTotals {
    pub sales_processed: u64,
    pub recurring_sales: u64,
    pub goal_mrr: Decimal,
    pub goal_sale_count: u64,
}

impl CompanyTotals {
    pub fn absorb(&mut self, sale: &SaleRecord) {
        self.sales_processed += 1;
        if sale.is_recurring() {
            self.recurring_sales += 1;
        }
        if sale.eligibility.counts_toward_goal {
            self.goal_mrr += sale.mrr;
            if sale.is_recurring() {
                self.goal_sale_count += 1;
            }
        }
    }
}

/// Group sales by owner, ordered by salesperson key.
pub fn aggregate_sales(sales: &[SaleRecord]) -> (Vec<SalespersonAggregate>, CompanyTotals) {
    let mut by_salesperson: BTreeMap<SalespersonKey, SalespersonAggregate> = BTreeMap::new();
    let mut totals = CompanyTotals::default();

    for sale in sales {
        let key = sale.salesperson_key();
        by_salesperson
            .entry(key.clone())
            .or_insert_with(|| SalespersonAggregate::new(key))
            .absorb(sale);
        totals.absorb(sale);
    }

    (by_salesperson.into_values().collect(), totals)
}
