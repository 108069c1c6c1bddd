mod commands;
mod input;
mod logger;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::fx::ProjectFxArgs;
use commands::wacc::{CalculateArgs, ComputeArgs, SummaryArgs};

/// Weighted average cost of capital calculations
#[derive(Parser)]
#[command(
    name = "wacc",
    version,
    about = "Weighted average cost of capital calculations",
    long_about = "A CLI for computing the weighted average cost of capital with decimal \
                  precision. Supports any number of equity and debt sources, foreign \
                  currency conversion, FX growth projections and CSV export."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the WACC engine on one equity figure and a list of debt sources
    Compute(ComputeArgs),
    /// Full calculation over multi-currency equity and debt sources
    Calculate(CalculateArgs),
    /// Metric/value summary of a calculation (export with --output csv)
    Summary(SummaryArgs),
    /// Project an FX rate forward at a constant annual growth rate
    ProjectFx(ProjectFxArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compute(args) => commands::wacc::run_compute(args),
        Commands::Calculate(args) => commands::wacc::run_calculate(args),
        Commands::Summary(args) => commands::wacc::run_summary(args),
        Commands::ProjectFx(args) => commands::fx::run_project_fx(args),
        Commands::Version => {
            println!("wacc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
