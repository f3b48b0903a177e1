//! Scenario simulation command.
//!
//! Runs a scripted sequence of stream and rule changes against a platform
//! table, with simulated hardware standing in for the criterion backend,
//! the PCM devices and the streams. Every routing pass is printed.
//!
//! Scenario format (TOML):
//!
//! ```toml
//! [[streams]]
//! name = "music"
//! direction = "output"
//! mask = 2
//!
//! [[steps]]
//! action = "start"
//! stream = "music"
//!
//! [[steps]]
//! action = "criterion"
//! name = "Mode"
//! value = "InCall"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use ruta_core::sim::{JournalEntry, SimulatedStream};
use ruta_core::{CriterionValue, Direction, Effect, RouteInterface, RoutingEngine, RoutingReport};
use serde::{Deserialize, Serialize};

use super::common::{load_table, simulated_platform};

#[derive(Args)]
pub struct SimulateArgs {
    /// Table path, installed name, or bundled name
    table: String,

    /// Scenario file
    scenario: PathBuf,

    /// Emit the passes as JSON
    #[arg(long)]
    json: bool,

    /// Also print the simulated hardware calls of each pass
    #[arg(long)]
    journal: bool,
}

/// A scripted run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Streams registered before the first step, all stopped.
    #[serde(default)]
    pub streams: Vec<StreamSpec>,
    /// Steps, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A simulated stream.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSpec {
    pub name: String,
    pub direction: Direction,
    /// Use-case mask (output flags or input source bits).
    pub mask: u32,
    /// Requested pre-processing.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

fn yes() -> bool {
    true
}

/// One scenario step. Stream start/stop and `reconsider` run a routing pass;
/// the other steps only change state for the next pass.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Start {
        stream: String,
    },
    Stop {
        stream: String,
    },
    Applicable {
        route: String,
        #[serde(default = "yes")]
        applicable: bool,
    },
    Criterion {
        name: String,
        value: CriterionValue,
    },
    BlockPort {
        port: String,
        #[serde(default = "yes")]
        blocked: bool,
    },
    Reroute {
        route: String,
    },
    Reconfigure {
        route: String,
    },
    Reconsider,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Start { stream } => write!(f, "start {stream}"),
            Step::Stop { stream } => write!(f, "stop {stream}"),
            Step::Applicable { route, applicable } => {
                write!(f, "set {route} applicable={applicable}")
            }
            Step::Criterion { name, value } => match value {
                CriterionValue::Numeric(v) => write!(f, "set {name}={v}"),
                CriterionValue::Literal(v) => write!(f, "set {name}={v}"),
            },
            Step::BlockPort { port, blocked } => write!(f, "set {port} blocked={blocked}"),
            Step::Reroute { route } => write!(f, "request reroute of {route}"),
            Step::Reconfigure { route } => write!(f, "request reconfigure of {route}"),
            Step::Reconsider => f.write_str("reconsider"),
        }
    }
}

impl Scenario {
    /// Parses a scenario document.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// One routing pass and what triggered it.
#[derive(Debug, Serialize)]
struct Pass {
    step: usize,
    trigger: String,
    report: RoutingReport,
    journal: Vec<JournalEntry>,
}

#[derive(Debug, Serialize)]
struct Outcome {
    platform: String,
    passes: Vec<Pass>,
    playback_routes: String,
    capture_routes: String,
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let platform = load_table(&args.table)?;
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read scenario {}", args.scenario.display()))?;
    let scenario = Scenario::from_toml(&text)
        .with_context(|| format!("Invalid scenario {}", args.scenario.display()))?;

    let (mut engine, journal, _devices) = simulated_platform(&platform)?;
    engine
        .start_backend()
        .context("Simulated backend failed to start")?;
    journal.clear();

    let mut streams: HashMap<String, Arc<SimulatedStream>> = HashMap::new();
    for spec in &scenario.streams {
        if streams.contains_key(&spec.name) {
            anyhow::bail!("Stream '{}' is declared twice", spec.name);
        }
        let stream = SimulatedStream::new(&spec.name, spec.direction, spec.mask, journal.clone());
        stream.set_effects_requested(spec.effects.iter().fold(0, |m, e| m | e.mask()));
        engine.add_stream(stream.clone());
        streams.insert(spec.name.clone(), stream);
    }

    let mut passes = Vec::new();
    for (index, step) in scenario.steps.iter().enumerate() {
        let number = index + 1;
        let run_pass = apply_step(&mut engine, &streams, step)
            .with_context(|| format!("Step {number} ({step}) failed"))?;
        if !run_pass {
            continue;
        }
        let report = engine.reconsider_routing();
        let pass = Pass {
            step: number,
            trigger: step.to_string(),
            report,
            journal: journal.take(),
        };
        if !args.json {
            print_pass(&pass, args.journal);
        }
        passes.push(pass);
    }

    let graph = engine.graph();
    let outcome = Outcome {
        platform: platform.name.clone(),
        passes,
        playback_routes: graph
            .format_route_mask(Direction::Output, engine.masks(Direction::Output).enabled),
        capture_routes: graph
            .format_route_mask(Direction::Input, engine.masks(Direction::Input).enabled),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Playback routes: {}", outcome.playback_routes);
        println!("Capture routes:  {}", outcome.capture_routes);
    }

    Ok(())
}

/// Applies one step. Returns whether it triggers a routing pass.
fn apply_step(
    engine: &mut RoutingEngine,
    streams: &HashMap<String, Arc<SimulatedStream>>,
    step: &Step,
) -> anyhow::Result<bool> {
    let stream = |name: &str| {
        streams
            .get(name)
            .cloned()
            .with_context(|| format!("Unknown stream '{name}'"))
    };

    match step {
        Step::Start { stream: name } => {
            stream(name)?.start();
            Ok(true)
        }
        Step::Stop { stream: name } => {
            stream(name)?.stop();
            Ok(true)
        }
        Step::Applicable { route, applicable } => {
            engine.set_route_applicable(route, *applicable)?;
            Ok(false)
        }
        Step::Criterion { name, value } => {
            engine.set_criterion(name, value.clone())?;
            Ok(false)
        }
        Step::BlockPort { port, blocked } => {
            engine.set_port_blocked(port, *blocked)?;
            Ok(false)
        }
        Step::Reroute { route } => {
            engine.set_route_need_reroute(route, true)?;
            Ok(false)
        }
        Step::Reconfigure { route } => {
            engine.set_route_need_reconfigure(route, true)?;
            Ok(false)
        }
        Step::Reconsider => Ok(true),
    }
}

fn print_pass(pass: &Pass, with_journal: bool) {
    println!("#{} {}", pass.step, pass.trigger);
    print!("{}", pass.report);
    if with_journal {
        for entry in &pass.journal {
            println!("    hw: {entry:?}");
        }
    }
    println!();
}
