//! Platform table validation command.

use clap::Args;
use ruta_config::platform_errors;
use ruta_core::Direction;

use super::common::load_table;

#[derive(Args)]
pub struct ValidateArgs {
    /// Table path, installed name, or bundled name
    table: String,
}

pub fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let platform = load_table(&args.table)?;
    let errors = platform_errors(&platform);

    if errors.is_empty() {
        println!(
            "{}: ok ({} ports, {} playback routes, {} capture routes, {} criteria)",
            platform.name,
            platform.ports.len(),
            platform.route_count(Direction::Output),
            platform.route_count(Direction::Input),
            platform.criteria.len(),
        );
        return Ok(());
    }

    for error in &errors {
        eprintln!("  error: {error}");
    }
    tracing::warn!(platform = %platform.name, problems = errors.len(), "table rejected");
    anyhow::bail!(
        "{}: {} problem(s) found",
        platform.name,
        errors.len()
    );
}
