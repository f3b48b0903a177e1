//! Platform table inspection command.
//!
//! The table is applied to an engine with simulated hardware, so route bits
//! and port group membership are shown as the engine sees them.

use clap::Args;
use ruta_core::{Direction, Effect, RoutingElement, RoutingGraph};

use super::common::{load_table, simulated_platform};

#[derive(Args)]
pub struct InspectArgs {
    /// Table path, installed name, or bundled name
    table: String,

    /// Only show routes of this direction (input or output)
    #[arg(short, long)]
    direction: Option<String>,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let directions = match args.direction.as_deref() {
        None => Direction::ALL.to_vec(),
        Some(d) if d.eq_ignore_ascii_case("output") || d.eq_ignore_ascii_case("playback") => {
            vec![Direction::Output]
        }
        Some(d) if d.eq_ignore_ascii_case("input") || d.eq_ignore_ascii_case("capture") => {
            vec![Direction::Input]
        }
        Some(other) => anyhow::bail!("Unknown direction '{other}'. Use 'input' or 'output'."),
    };

    let platform = load_table(&args.table)?;
    let (engine, _journal, _devices) = simulated_platform(&platform)?;
    let graph = engine.graph();

    println!("Platform: {}", platform.name);
    println!("{}", "=".repeat(10 + platform.name.len()));
    if let Some(desc) = &platform.description {
        println!("{desc}");
    }
    println!();

    print_ports(graph);
    for direction in directions {
        print_routes(graph, direction);
    }

    let criteria: Vec<_> = engine.criteria().collect();
    println!("Criteria ({}):", criteria.len());
    for criterion in criteria {
        println!(
            "  {:28} {:24} = {}",
            criterion.name(),
            criterion.type_name(),
            engine.criterion(criterion.name()).unwrap_or_default()
        );
    }

    Ok(())
}

fn print_ports(graph: &RoutingGraph) {
    println!("Ports ({}):", graph.ports().count());
    for (_, port) in graph.ports() {
        let groups: Vec<&str> = port
            .groups()
            .iter()
            .map(|&g| graph.port_group(g).name())
            .collect();
        let blocked = if port.is_rule_blocked() { " [BLOCKED]" } else { "" };
        if groups.is_empty() {
            println!("  {}{}", port.name(), blocked);
        } else {
            println!("  {:20} groups: {}{}", port.name(), groups.join(", "), blocked);
        }
    }
    println!();

    println!("Port groups ({}):", graph.port_groups().count());
    for (_, group) in graph.port_groups() {
        let members: Vec<&str> = group
            .members()
            .iter()
            .map(|&p| graph.port(p).name())
            .collect();
        println!("  {:20} {}", group.name(), members.join(" | "));
    }
    println!();
}

fn print_routes(graph: &RoutingGraph, direction: Direction) {
    println!(
        "{} routes ({}):",
        direction.label(),
        graph.route_count(direction)
    );
    for (_, route) in graph.routes().filter(|(_, r)| r.direction() == direction) {
        let ports: Vec<&str> = route.ports().iter().map(|&p| graph.port(p).name()).collect();
        let ports = if ports.is_empty() {
            "-".to_string()
        } else {
            ports.join(" -> ")
        };
        let applicable = if route.is_applicable() { " [APPLICABLE]" } else { "" };
        println!(
            "  bit {:2}  {:16} {:7} {}{}",
            route.mask().trailing_zeros(),
            route.name(),
            if route.is_stream_route() { "stream" } else { "plain" },
            ports,
            applicable
        );

        if let Some(stream_route) = route.stream_route() {
            let config = stream_route.config();
            println!(
                "           device {}:{}  {} ch  {} Hz  period {} x {}  mask {:#x}",
                config.card_name,
                config.device_id,
                config.channels,
                config.rate,
                config.period_size,
                config.period_count,
                config.applicability_mask
            );
            let effects: Vec<&str> = Effect::ALL
                .iter()
                .filter(|e| stream_route.effects_supported() & e.mask() != 0)
                .map(|e| e.name())
                .collect();
            if !effects.is_empty() {
                println!("           effects {}", effects.join(", "));
            }
        }
    }
    println!();
}
