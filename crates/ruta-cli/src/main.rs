//! Ruta CLI - route table tooling for the ruta routing engine.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ruta")]
#[command(author, version, about = "Ruta audio route table tools", long_about = None)]
struct Cli {
    /// Log routing decisions (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a platform table and report every problem
    Validate(commands::validate::ValidateArgs),

    /// Show the ports, groups and routes of a platform table
    Inspect(commands::inspect::InspectArgs),

    /// List bundled and installed platform tables
    Platforms(commands::platforms::PlatformsArgs),

    /// Run a scenario against a platform table with simulated hardware
    Simulate(commands::simulate::SimulateArgs),
}

/// Installs the `log` bridge, then the stderr subscriber.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Platforms(args) => commands::platforms::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
    }
}
