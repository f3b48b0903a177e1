//! Criterion benchmarks for routing reconsideration
//!
//! Run with: cargo bench -p ruta-core
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ruta_core::sim::{Journal, SimulatedStream, simulated_engine};
use ruta_core::{Direction, RouteInterface, RoutingEngine, StreamRouteConfig};

const ROUTE_COUNTS: &[usize] = &[4, 16, 32];

/// `count` output stream routes over `count / 2` ports grouped in pairs,
/// one stream per route.
fn build(count: usize) -> (RoutingEngine, Vec<Arc<SimulatedStream>>, Journal) {
    let (mut engine, journal, _) = simulated_engine();
    let ports = count.div_ceil(2);
    for p in 0..ports {
        engine.add_port(&format!("SSP{p}")).unwrap();
        engine
            .add_port_group(&format!("Bus{}", p / 2), &format!("SSP{p}"))
            .unwrap();
    }
    let mut streams = Vec::with_capacity(count);
    for r in 0..count {
        let name = format!("Route{r}");
        engine
            .add_audio_stream_route(&name, &format!("SSP{}", r % ports), "", Direction::Output)
            .unwrap();
        let key = format!("{name}_Playback");
        engine
            .update_stream_route_config(
                &key,
                StreamRouteConfig {
                    applicability_mask: 1 << r,
                    ..Default::default()
                },
            )
            .unwrap();
        engine.set_route_applicable(&key, true).unwrap();

        let stream = SimulatedStream::new(format!("s{r}"), Direction::Output, 1 << r, journal.clone());
        engine.add_stream(stream.clone());
        streams.push(stream);
    }
    engine.start_backend().unwrap();
    (engine, streams, journal)
}

fn bench_reconsider(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reconsider");

    for &count in ROUTE_COUNTS {
        // Steady state: nothing changes, criteria commit only.
        group.bench_with_input(BenchmarkId::new("unchanged", count), &count, |b, &count| {
            let (mut engine, streams, journal) = build(count);
            for s in &streams {
                s.start();
            }
            engine.reconsider_routing();
            b.iter(|| {
                journal.clear();
                black_box(engine.reconsider_routing())
            });
        });

        // Alternate between two stream sets: full five-phase pass every time.
        group.bench_with_input(BenchmarkId::new("toggle", count), &count, |b, &count| {
            let (mut engine, streams, journal) = build(count);
            let mut odd = false;
            b.iter(|| {
                journal.clear();
                for (i, s) in streams.iter().enumerate() {
                    if (i % 2 == 1) == odd {
                        s.start();
                    } else {
                        s.stop();
                    }
                }
                odd = !odd;
                black_box(engine.reconsider_routing())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconsider);
criterion_main!(benches);
