//! Helpers shared by the commands.

use anyhow::Context;
use ruta_config::{PlatformConfig, load_platform};
use ruta_core::RoutingEngine;
use ruta_core::sim::{Journal, SimulatedDeviceFactory, simulated_engine};

/// Loads a table by path, installed name or bundled name.
pub fn load_table(name: &str) -> anyhow::Result<PlatformConfig> {
    let platform =
        load_platform(name).with_context(|| format!("Failed to load platform table '{name}'"))?;
    tracing::debug!(table = name, platform = %platform.name, "platform table loaded");
    Ok(platform)
}

/// Engine with simulated hardware and `platform` applied, not started.
pub fn simulated_platform(
    platform: &PlatformConfig,
) -> anyhow::Result<(RoutingEngine, Journal, SimulatedDeviceFactory)> {
    let (mut engine, journal, devices) = simulated_engine();
    platform
        .apply(&mut engine)
        .with_context(|| format!("Failed to apply platform '{}'", platform.name))?;
    Ok((engine, journal, devices))
}
