mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::cash_flows::{IrrArgs, NpvArgs};
use commands::rates::RateArgs;
use commands::simulate::SimulateArgs;

/// Mortgage loan simulations with decimal precision
#[derive(Parser)]
#[command(
    name = "loansim",
    version,
    about = "Mortgage loan simulations with decimal precision",
    long_about = "A CLI for simulating fixed-rate mortgage loans under the French \
                  amortization system. Produces the payment schedule, the TCEA \
                  (effective annual cost to the borrower), VAN and TIR, with optional \
                  total or partial grace periods."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Emit solver diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full loan simulation (schedule, TCEA, VAN, TIR)
    Simulate(SimulateArgs),
    /// Print only the amortization schedule
    Schedule(SimulateArgs),
    /// Convert a TEA or TNA quote to effective monthly and annual rates
    Rate(RateArgs),
    /// Net present value of a periodic cash-flow vector
    Npv(NpvArgs),
    /// Internal rate of return of a periodic cash-flow vector
    Irr(IrrArgs),
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

/// Log directives when `RUST_LOG` is unset: the engine (`loan_sim_core`)
/// and this binary (`loansim`).
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "loan_sim_core=debug,loansim=debug"
    } else {
        "loan_sim_core=warn,loansim=warn"
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(cli.verbose)));

    // stdout carries the result; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Schedule(args) => commands::simulate::run_schedule(args),
        Commands::Rate(args) => commands::rates::run_rate(args),
        Commands::Npv(args) => commands::cash_flows::run_npv(args),
        Commands::Irr(args) => commands::cash_flows::run_irr(args),
        Commands::Version => {
            println!("loansim {}", env!("CARGO_PKG_VERSION"));
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
