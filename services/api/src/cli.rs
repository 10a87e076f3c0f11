use crate::commands::{run_calculate, run_statement, CalculateArgs, StatementArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use commission_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Commission Engine",
    about = "Calculate sales commissions per closing period, over HTTP or from a fixture",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a commission calculation against a fixture and print the summary
    Calculate(CalculateArgs),
    /// Export the calculated commissions of a period as a CSV statement
    Statement(StatementArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calculate(args) => run_calculate(args),
        Command::Statement(args) => run_statement(args),
    }
}
