mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::construction::{BuildIndexArgs, NormalizeWeightsArgs};
use commands::returns::PeriodReturnArgs;

/// Synthetic index construction and period-return analytics
#[derive(Parser)]
#[command(
    name = "sidx",
    version,
    about = "Synthetic index construction and period-return analytics",
    long_about = "Builds a buy-and-hold synthetic price index from a weighted basket of \
                  constituents and computes trailing period returns (1D through 5Y) \
                  over any index series."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter (e.g. "debug", "synthdex_core=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize constituent weights to percentages of 100
    NormalizeWeights(NormalizeWeightsArgs),
    /// Construct a synthetic index from a definition and price series
    BuildIndex(BuildIndexArgs),
    /// Trailing period returns for an index series
    PeriodReturn(PeriodReturnArgs),
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

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::NormalizeWeights(args) => commands::construction::run_normalize_weights(args),
        Commands::BuildIndex(args) => commands::construction::run_build_index(args),
        Commands::PeriodReturn(args) => commands::returns::run_period_return(args),
        Commands::Version => {
            println!("sidx {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
