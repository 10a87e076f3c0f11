use crate::infra::load_store;
use clap::Args;
use commission_engine::commission::{
    write_statement, CalculatedCommission, CommissionService, CommissionStores, RunSummary,
};
use commission_engine::config::EngineConfig;
use commission_engine::error::AppError;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// JSON fixture with closing periods, sales, tiers, parameters and monthly goals
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Closing period key to calculate
    #[arg(long)]
    pub(crate) period: String,
    /// Print one line per salesperson after the summary
    #[arg(long)]
    pub(crate) breakdown: bool,
}

#[derive(Args, Debug)]
pub(crate) struct StatementArgs {
    /// JSON fixture with closing periods, sales, tiers, parameters and monthly goals
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Closing period key to calculate
    #[arg(long)]
    pub(crate) period: String,
    /// Write the CSV statement here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

fn calculate_from_fixture(
    fixture: &Path,
    period: &str,
) -> Result<(RunSummary, Vec<CalculatedCommission>), AppError> {
    let store = load_store(Some(fixture))?;
    let service = CommissionService::new(
        CommissionStores::shared(Arc::new(store)),
        EngineConfig::default().persist_attempts,
    );
    let summary = service.calculate(period)?;
    let rows = service.commissions(period)?;
    Ok((summary, rows))
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let CalculateArgs {
        fixture,
        period,
        breakdown,
    } = args;

    let (summary, rows) = calculate_from_fixture(&fixture, &period)?;
    render_summary(&summary);
    if breakdown {
        render_breakdown(&rows);
    }
    Ok(())
}

pub(crate) fn run_statement(args: StatementArgs) -> Result<(), AppError> {
    let StatementArgs {
        fixture,
        period,
        output,
    } = args;

    let (_, rows) = calculate_from_fixture(&fixture, &period)?;
    match output {
        Some(path) => {
            let file = File::create(&path)?;
            write_statement(&rows, BufWriter::new(file))?;
            println!("Wrote {} statement line(s) to {}", rows.len(), path.display());
        }
        None => write_statement(&rows, io::stdout().lock())?,
    }
    Ok(())
}

fn render_summary(summary: &RunSummary) {
    println!("Commission run for closing period {}", summary.closing_period_id);
    println!(
        "- {} salespeople | {} sales processed",
        summary.salespeople, summary.sales_processed
    );
    println!(
        "- Goal-eligible MRR {} | company goal {}",
        summary.total_mrr.round_dp(2),
        if summary.goal_met { "met" } else { "not met" }
    );
    println!("- Total payout {}", summary.total_payout.round_dp(2));
    if summary.used_default_parameters {
        println!("  Some configuration parameters were missing; zero defaults applied.");
    }
}

fn render_breakdown(rows: &[CalculatedCommission]) {
    println!("Breakdown:");
    for row in rows {
        println!(
            "  - {}: tier {} ({}%) | base {} | annual {} | team {} | company {} | one-time {} | total {}",
            row.salesperson,
            row.tier_name.as_deref().unwrap_or("-"),
            row.tier_percent,
            row.base_commission.round_dp(2),
            row.annual_bonus.round_dp(2),
            row.team_bonus.round_dp(2),
            row.company_bonus.round_dp(2),
            row.one_time_commission.round_dp(2),
            row.total.round_dp(2),
        );
    }
}
