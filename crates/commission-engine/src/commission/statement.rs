//! CSV commission statements for payroll hand-off.

use std::io::Write;

use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::CalculatedCommission;

/// Amounts are rounded to cents here and only here.
#[derive(Debug, Serialize)]
struct StatementLine<'a> {
    closing_period: &'a str,
    salesperson: &'a str,
    tier: &'a str,
    tier_percent: Decimal,
    recurring_sales: u64,
    tier_mrr: Decimal,
    commission_mrr: Decimal,
    annual_mrr: Decimal,
    one_time_fees: Decimal,
    base_commission: Decimal,
    annual_bonus: Decimal,
    team_bonus: Decimal,
    company_bonus: Decimal,
    one_time_commission: Decimal,
    total: Decimal,
}

impl<'a> From<&'a CalculatedCommission> for StatementLine<'a> {
    fn from(row: &'a CalculatedCommission) -> Self {
        Self {
            closing_period: &row.closing_period_id.0,
            salesperson: &row.salesperson.0,
            tier: row.tier_name.as_deref().unwrap_or("-"),
            tier_percent: row.tier_percent,
            recurring_sales: row.sale_count,
            tier_mrr: cents(row.tier_mrr),
            commission_mrr: cents(row.commission_mrr),
            annual_mrr: cents(row.annual_mrr),
            one_time_fees: cents(row.one_time_fees),
            base_commission: cents(row.base_commission),
            annual_bonus: cents(row.annual_bonus),
            team_bonus: cents(row.team_bonus),
            company_bonus: cents(row.company_bonus),
            one_time_commission: cents(row.one_time_commission),
            total: cents(row.total),
        }
    }
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    #[error("failed to write statement: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush statement: {0}")]
    Io(#[from] std::io::Error),
}

/// Write one CSV line per salesperson, ordered as given.
pub fn write_statement<W: Write>(
    rows: &[CalculatedCommission],
    writer: W,
) -> Result<(), StatementError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(StatementLine::from(row))?;
    }
    csv.flush()?;
    Ok(())
}
