//! End-to-end routing passes over simulated collaborators.

use std::sync::Arc;

use ruta_core::sim::{Journal, JournalEntry, SimulatedDeviceFactory, SimulatedStream, simulated_engine};
use ruta_core::{
    Direction, IoStream, Phase, ROUTING_STAGE_CRITERION, RouteInterface, RoutingAction, RoutingEngine,
    RoutingError, StreamRouteConfig, VOICE_VOLUME_PARAMETER, closing_routes_criterion,
    opened_routes_criterion,
};

const MEDIA: &str = "Media_Playback";
const MEDIA_FLAG: u32 = 0x2;

struct Rig {
    engine: RoutingEngine,
    journal: Journal,
    devices: SimulatedDeviceFactory,
}

impl Rig {
    /// One output stream route "Media" on port SSP0.
    fn media(config: StreamRouteConfig) -> Self {
        let (mut engine, journal, devices) = simulated_engine();
        engine.add_port("SSP0").unwrap();
        engine
            .add_audio_stream_route("Media", "SSP0", "", Direction::Output)
            .unwrap();
        engine
            .update_stream_route_config(
                MEDIA,
                StreamRouteConfig {
                    applicability_mask: MEDIA_FLAG,
                    ..config
                },
            )
            .unwrap();
        engine.set_route_applicable(MEDIA, true).unwrap();
        engine.start_backend().unwrap();
        Self {
            engine,
            journal,
            devices,
        }
    }

    fn stream(&mut self, name: &str, direction: Direction, mask: u32) -> Arc<SimulatedStream> {
        let stream = SimulatedStream::new(name, direction, mask, self.journal.clone());
        self.engine.add_stream(stream.clone());
        stream
    }
}

fn stream_route_calls(report: &ruta_core::RoutingReport, key: &str) -> Vec<RoutingAction> {
    report.route_actions(key).cloned().collect()
}

// ----------------------------------------------------------------------------
// Scenarios
// ----------------------------------------------------------------------------

#[test]
fn simple_enable() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();

    let report = rig.engine.reconsider_routing();
    assert!(report.changed);
    let m = report.masks(Direction::Output);
    assert_eq!(m.prev_enabled, 0);
    assert_eq!(m.enabled, 1);
    assert_eq!(m.need_repath, 1);
    assert_eq!(m.need_reflow, 0);

    assert_eq!(
        stream_route_calls(&report, MEDIA),
        vec![
            RoutingAction::Route {
                route: MEDIA.into(),
                pre_enable: true
            },
            RoutingAction::Route {
                route: MEDIA.into(),
                pre_enable: false
            },
        ]
    );
    assert_eq!(music.current_route().as_deref(), Some("Media"));
    assert!(report.failures.is_empty());
}

#[test]
fn simple_disable() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();
    rig.engine.reconsider_routing();

    music.stop();
    let report = rig.engine.reconsider_routing();
    assert!(report.changed);
    let m = report.masks(Direction::Output);
    assert_eq!(m.prev_enabled, 1);
    assert_eq!(m.enabled, 0);
    assert_eq!(
        stream_route_calls(&report, MEDIA),
        vec![
            RoutingAction::Unroute {
                route: MEDIA.into(),
                post_disable: false
            },
            RoutingAction::Unroute {
                route: MEDIA.into(),
                post_disable: true
            },
        ]
    );
    assert_eq!(music.current_route(), None);
}

#[test]
fn stream_swap_only_reconfigures() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let first = rig.stream("first", Direction::Output, MEDIA_FLAG);
    let second = rig.stream("second", Direction::Output, MEDIA_FLAG);
    first.start();
    rig.engine.reconsider_routing();
    rig.journal.clear();

    first.stop();
    second.start();
    let report = rig.engine.reconsider_routing();
    assert!(report.changed);
    let m = report.masks(Direction::Output);
    assert_eq!(m.need_reflow, 1);
    assert_eq!(m.need_repath, 0);
    assert_eq!(
        stream_route_calls(&report, MEDIA),
        vec![RoutingAction::Configure {
            route: MEDIA.into()
        }]
    );
    assert_eq!(first.current_route(), None);
    assert_eq!(second.current_route().as_deref(), Some("Media"));
    // no close/reopen cycle
    assert_eq!(
        rig.journal.count(|e| matches!(
            e,
            JournalEntry::DeviceOpen { .. } | JournalEntry::DeviceClose { .. }
        )),
        0
    );
}

#[test]
fn first_started_stream_wins() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let s1 = rig.stream("s1", Direction::Output, MEDIA_FLAG);
    let s2 = rig.stream("s2", Direction::Output, MEDIA_FLAG);
    s2.start();
    s1.start();

    rig.engine.reconsider_routing();
    assert_eq!(s1.current_route().as_deref(), Some("Media"));
    assert_eq!(s2.current_route(), None);
}

#[test]
fn unchanged_routing_only_commits() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();
    rig.engine.reconsider_routing();
    rig.journal.clear();

    let report = rig.engine.reconsider_routing();
    assert!(!report.changed);
    assert!(report.phases().is_empty());
    assert_eq!(report.commit_count(), 1);
    assert_eq!(report.apply_count(), 1);
    assert_eq!(rig.journal.count(|e| matches!(e, JournalEntry::Apply)), 1);
    assert_eq!(music.current_route().as_deref(), Some("Media"));
}

#[test]
fn phases_apply_in_order_even_when_empty() {
    let (mut engine, journal, _) = simulated_engine();
    engine
        .add_audio_route("Speaker", "", "", Direction::Output)
        .unwrap();
    engine.set_route_applicable("Speaker_Playback", true).unwrap();
    engine.start_backend().unwrap();
    journal.clear();

    let report = engine.reconsider_routing();
    assert_eq!(report.phases(), Phase::ALL.to_vec());
    assert_eq!(report.apply_count(), 5);
    assert_eq!(report.commit_count(), 1);

    // stage criterion set once per phase, before that phase's apply
    let stages: Vec<u32> = journal
        .entries()
        .into_iter()
        .filter_map(|e| match e {
            JournalEntry::SetCriterion { name, value } if name == ROUTING_STAGE_CRITERION => {
                Some(value)
            }
            _ => None,
        })
        .collect();
    // the configure commit pushes the stage value again
    assert_eq!(stages, vec![1, 2, 4, 4, 6, 7]);
    assert_eq!(journal.count(|e| matches!(e, JournalEntry::Apply)), 5);
}

#[test]
fn route_criteria_follow_phase_masks() {
    let (mut engine, journal, _) = simulated_engine();
    engine
        .add_audio_route("Speaker", "", "", Direction::Output)
        .unwrap();
    engine
        .add_audio_route("Headset", "", "", Direction::Output)
        .unwrap();
    engine.set_route_applicable("Speaker_Playback", true).unwrap();
    engine.start_backend().unwrap();
    engine.reconsider_routing();

    engine.set_route_applicable("Speaker_Playback", false).unwrap();
    engine.set_route_applicable("Headset_Playback", true).unwrap();
    journal.clear();
    engine.reconsider_routing();

    let closing: Vec<u32> = journal
        .entries()
        .into_iter()
        .filter_map(|e| match e {
            JournalEntry::SetCriterion { name, value }
                if name == closing_routes_criterion(Direction::Output) =>
            {
                Some(value)
            }
            _ => None,
        })
        .collect();
    // mute: Speaker, disable: Speaker + newly used Headset, configure: 0 (twice, commit)
    assert_eq!(closing, vec![1, 0b11, 0, 0]);
    assert_eq!(
        journal.last_criterion(opened_routes_criterion(Direction::Output)),
        Some(0b10)
    );
    assert_eq!(
        engine.criterion(opened_routes_criterion(Direction::Output)).as_deref(),
        Some("Headset")
    );
}

#[test]
fn disable_detaches_before_apply_and_closes_after() {
    let mut rig = Rig::media(StreamRouteConfig {
        require_post_disable: true,
        ..Default::default()
    });
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();
    rig.engine.reconsider_routing();
    music.stop();
    rig.journal.clear();
    rig.engine.reconsider_routing();

    let entries = rig.journal.entries();
    let detach = entries
        .iter()
        .position(|e| matches!(e, JournalEntry::Detach { .. }))
        .unwrap();
    let close = entries
        .iter()
        .position(|e| matches!(e, JournalEntry::DeviceClose { .. }))
        .unwrap();
    let applies: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, JournalEntry::Apply))
        .map(|(i, _)| i)
        .collect();
    // second apply is the disable apply
    assert!(detach < applies[1]);
    assert!(close > applies[1] && close < applies[2]);
}

#[test]
fn pre_enable_opens_before_apply_and_attaches_after() {
    let mut rig = Rig::media(StreamRouteConfig {
        require_pre_enable: true,
        ..Default::default()
    });
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();
    rig.journal.clear();
    rig.engine.reconsider_routing();

    let entries = rig.journal.entries();
    let open = entries
        .iter()
        .position(|e| matches!(e, JournalEntry::DeviceOpen { .. }))
        .unwrap();
    let attach = entries
        .iter()
        .position(|e| matches!(e, JournalEntry::Attach { .. }))
        .unwrap();
    let applies: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, JournalEntry::Apply))
        .map(|(i, _)| i)
        .collect();
    // fourth apply is the enable apply
    assert!(open > applies[2] && open < applies[3]);
    assert!(attach > applies[3] && attach < applies[4]);
}

#[test]
fn reroute_request_cycles_the_device() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();
    rig.engine.reconsider_routing();

    rig.engine.set_route_need_reroute(MEDIA, true).unwrap();
    let report = rig.engine.reconsider_routing();
    let m = report.masks(Direction::Output);
    assert_eq!(m.need_repath, 1);
    assert_eq!(m.need_reflow, 1);
    let calls = stream_route_calls(&report, MEDIA);
    assert_eq!(calls.len(), 5);
    assert!(matches!(calls[0], RoutingAction::Unroute { post_disable: false, .. }));
    assert!(matches!(calls[2], RoutingAction::Configure { .. }));
    assert!(matches!(calls[4], RoutingAction::Route { pre_enable: false, .. }));
    assert!(report.failures.is_empty());
    assert_eq!(music.current_route().as_deref(), Some("Media"));

    // the request is consumed by one pass
    let report = rig.engine.reconsider_routing();
    assert!(!report.changed);
}

#[test]
fn device_open_failure_is_reported_and_pass_completes() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    rig.devices.fail_open("Media");
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();

    let report = rig.engine.reconsider_routing();
    assert_eq!(report.phases(), Phase::ALL.to_vec());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].phase, Phase::Enable);
    assert_eq!(report.failures[0].route, MEDIA);
    assert_eq!(music.current_route(), None);
}

#[test]
fn port_group_keeps_routes_exclusive() {
    let (mut engine, _, _) = simulated_engine();
    engine.add_port("SSP0").unwrap();
    engine.add_port("SSP1").unwrap();
    engine.add_port_group("SSP", "SSP0").unwrap();
    engine.add_port_group("SSP", "SSP1").unwrap();
    engine
        .add_audio_route("Bt", "SSP0", "", Direction::Output)
        .unwrap();
    engine
        .add_audio_route("Modem", "SSP1", "", Direction::Output)
        .unwrap();
    engine.set_route_applicable("Bt_Playback", true).unwrap();
    engine.set_route_applicable("Modem_Playback", true).unwrap();
    engine.start_backend().unwrap();

    let report = engine.reconsider_routing();
    assert_eq!(report.masks(Direction::Output).enabled, 0b01);
    let graph = engine.graph();
    let ssp1 = graph.port_id("SSP1").unwrap();
    assert!(graph.port(ssp1).is_blocked());
    assert!(!graph.port(ssp1).is_used());
}

#[test]
fn full_duplex_voice_shares_modem_port() {
    let (mut engine, _, _) = simulated_engine();
    engine.add_port("Modem").unwrap();
    engine
        .add_audio_route("Voice", "Modem", "", Direction::Output)
        .unwrap();
    engine
        .add_audio_route("Voice", "Modem", "", Direction::Input)
        .unwrap();
    engine
        .add_audio_route("FmRadio", "Modem", "", Direction::Output)
        .unwrap();
    for key in ["Voice_Playback", "Voice_Capture", "FmRadio_Playback"] {
        engine.set_route_applicable(key, true).unwrap();
    }
    engine.start_backend().unwrap();

    let report = engine.reconsider_routing();
    assert_eq!(report.masks(Direction::Output).enabled, 0b01);
    assert_eq!(report.masks(Direction::Input).enabled, 0b01);
}

#[test]
fn rule_blocked_port_disables_its_routes() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    let music = rig.stream("music", Direction::Output, MEDIA_FLAG);
    music.start();
    rig.engine.reconsider_routing();

    rig.engine.set_port_blocked("SSP0", true).unwrap();
    let report = rig.engine.reconsider_routing();
    assert_eq!(report.masks(Direction::Output).enabled, 0);
    assert_eq!(music.current_route(), None);

    rig.engine.set_port_blocked("SSP0", false).unwrap();
    let report = rig.engine.reconsider_routing();
    assert_eq!(report.masks(Direction::Output).enabled, 1);
}

#[test]
fn effects_must_be_supported_by_the_route() {
    let (mut engine, journal, _) = simulated_engine();
    engine
        .add_audio_stream_route("Record", "", "", Direction::Input)
        .unwrap();
    engine
        .update_stream_route_config(
            "Record_Capture",
            StreamRouteConfig {
                applicability_mask: 1,
                ..Default::default()
            },
        )
        .unwrap();
    engine
        .add_route_supported_effect("Record_Capture", "ns")
        .unwrap();
    engine.set_route_applicable("Record_Capture", true).unwrap();
    engine.start_backend().unwrap();

    let mic = SimulatedStream::new("mic", Direction::Input, 1, journal);
    engine.add_stream(mic.clone());
    mic.start();
    mic.set_effects_requested(ruta_core::Effect::Aec.mask());
    let report = engine.reconsider_routing();
    assert!(!report.changed);

    mic.set_effects_requested(ruta_core::Effect::Ns.mask());
    let report = engine.reconsider_routing();
    assert!(report.changed);
    assert_eq!(mic.current_route().as_deref(), Some("Record"));
}

// ----------------------------------------------------------------------------
// Runtime surface
// ----------------------------------------------------------------------------

#[test]
fn voice_volume_bounds() {
    let (mut engine, journal, _) = simulated_engine();
    engine.start_backend().unwrap();
    journal.clear();

    for gain in [-0.1, 1.1] {
        assert!(matches!(
            engine.set_voice_volume(gain),
            Err(RoutingError::VolumeOutOfRange(_))
        ));
    }
    assert!(journal.entries().is_empty());

    engine.set_voice_volume(0.0).unwrap();
    engine.set_voice_volume(1.0).unwrap();
    assert_eq!(
        engine.audio_parameter(VOICE_VOLUME_PARAMETER).unwrap(),
        ruta_core::ParameterValue::DoubleArray(vec![1.0, 1.0])
    );
}

#[test]
fn configuration_is_frozen_after_start() {
    let (mut engine, _, _) = simulated_engine();
    engine.add_port("SSP0").unwrap();
    engine.start_backend().unwrap();

    assert!(matches!(
        engine.add_port("SSP1"),
        Err(RoutingError::ConfigurationFrozen { .. })
    ));
    assert!(matches!(
        engine.add_audio_route("Late", "", "", Direction::Output),
        Err(RoutingError::ConfigurationFrozen { .. })
    ));
    assert!(engine.add_criterion_type("Mode", false).is_err());
    // runtime rules still apply
    assert!(engine.set_port_blocked("SSP0", true).is_ok());
    // starting twice bails out
    assert!(engine.start_backend().is_ok());
}

#[test]
fn duplicate_and_missing_elements_are_rejected() {
    let (mut engine, _, _) = simulated_engine();
    engine.add_port("SSP0").unwrap();
    assert!(matches!(
        engine.add_port("SSP0"),
        Err(RoutingError::DuplicateElement { .. })
    ));
    assert!(matches!(
        engine.set_route_applicable("Ghost_Playback", true),
        Err(RoutingError::NotFound { .. })
    ));
    engine
        .add_audio_route("Speaker", "SSP0", "", Direction::Output)
        .unwrap();
    assert!(matches!(
        engine.update_stream_route_config("Speaker_Playback", StreamRouteConfig::default()),
        Err(RoutingError::NotFound {
            kind: "stream route",
            ..
        })
    ));
}

#[test]
fn criteria_are_committed_on_unchanged_pass() {
    let (mut engine, journal, _) = simulated_engine();
    assert!(!engine.add_criterion_type("Mode", false).unwrap());
    assert!(engine.add_criterion_type("Mode", false).unwrap());
    engine
        .add_criterion_type_value_pair("Mode", "Normal", 0)
        .unwrap();
    engine
        .add_criterion_type_value_pair("Mode", "InCall", 2)
        .unwrap();
    engine.add_criterion("AndroidMode", "Mode", "Normal").unwrap();
    engine.start_backend().unwrap();

    assert!(engine.set_criterion("AndroidMode", "InCall").unwrap());
    assert!(engine.set_criterion("AndroidMode", "Ringtone").is_err());
    assert_eq!(engine.criterion("AndroidMode").as_deref(), Some("InCall"));

    let report = engine.reconsider_routing();
    assert!(!report.changed);
    assert_eq!(journal.last_criterion("AndroidMode"), Some(2));
}

#[test]
fn criteria_are_declared_with_their_default() {
    let (mut engine, journal, _) = simulated_engine();
    engine.add_criterion_type("Mode", false).unwrap();
    engine
        .add_criterion_type_value_pair("Mode", "Normal", 0)
        .unwrap();
    engine
        .add_criterion_type_value_pair("Mode", "InCall", 2)
        .unwrap();
    engine.add_criterion("AndroidMode", "Mode", "InCall").unwrap();
    engine.add_criterion("TelephonyMode", "Mode", "").unwrap();
    engine.start_backend().unwrap();

    let declared = |wanted: &str| {
        journal.entries().into_iter().find_map(|e| match e {
            JournalEntry::DeclareCriterion {
                name,
                type_name,
                default,
            } if name == wanted => Some((type_name, default)),
            _ => None,
        })
    };
    assert_eq!(declared("AndroidMode"), Some(("Mode".to_string(), 2)));
    assert_eq!(declared("TelephonyMode"), Some(("Mode".to_string(), 0)));
}

#[test]
fn latency_and_period_queries() {
    let rig = Rig::media(StreamRouteConfig {
        rate: 48000,
        period_size: 1152,
        period_count: 2,
        ..Default::default()
    });
    assert_eq!(rig.engine.period_us(Direction::Output, 0), 24000);
    assert_eq!(rig.engine.latency_us(Direction::Output, MEDIA_FLAG), 48000);
    // no matching route
    assert_eq!(rig.engine.latency_us(Direction::Input, 0), 0);
    assert_eq!(rig.engine.period_us(Direction::Output, 0x100), 0);
}

#[test]
fn voice_output_stream_is_first_output_stream() {
    let mut rig = Rig::media(StreamRouteConfig::default());
    assert!(rig.engine.voice_output_stream().is_none());
    let first = rig.stream("first", Direction::Output, MEDIA_FLAG);
    let _mic = rig.stream("mic", Direction::Input, 1);
    let _second = rig.stream("second", Direction::Output, MEDIA_FLAG);

    let voice = rig.engine.voice_output_stream().unwrap();
    let first: ruta_core::StreamRef = first;
    assert!(ruta_core::same_stream(&voice, &first));

    assert!(rig.engine.remove_stream(&first));
    assert!(!rig.engine.remove_stream(&first));
    assert_eq!(rig.engine.voice_output_stream().unwrap().name(), "second");
}

#[test]
fn streams_trading_routes_end_attached_to_both() {
    let (mut engine, journal, _) = simulated_engine();
    engine.add_port("SSP0").unwrap();
    engine.add_port("SSP1").unwrap();
    for (name, port, mask) in [("Deep", "SSP0", 0x1), ("Media", "SSP1", 0x2)] {
        engine
            .add_audio_stream_route(name, port, "", Direction::Output)
            .unwrap();
        let key = format!("{name}_Playback");
        engine
            .update_stream_route_config(
                &key,
                StreamRouteConfig {
                    applicability_mask: mask,
                    ..StreamRouteConfig::default()
                },
            )
            .unwrap();
        engine.set_route_applicable(&key, true).unwrap();
    }
    engine.start_backend().unwrap();

    let first = SimulatedStream::new("first", Direction::Output, 0x1, journal.clone());
    let second = SimulatedStream::new("second", Direction::Output, 0x2, journal);
    engine.add_stream(first.clone());
    engine.add_stream(second.clone());
    first.start();
    second.start();
    engine.reconsider_routing();
    assert_eq!(first.current_route().as_deref(), Some("Deep"));
    assert_eq!(second.current_route().as_deref(), Some("Media"));

    first.set_applicability_mask(0x2);
    second.set_applicability_mask(0x1);
    let report = engine.reconsider_routing();
    assert!(report.changed);
    assert_eq!(report.masks(Direction::Output).need_reflow, 0b11);
    assert!(report.failures.is_empty());

    assert_eq!(first.current_route().as_deref(), Some("Media"));
    assert_eq!(second.current_route().as_deref(), Some("Deep"));
    let graph = engine.graph();
    for (key, stream) in [("Deep_Playback", "second"), ("Media_Playback", "first")] {
        let id = graph.route_id(key).unwrap();
        let current = graph.route(id).stream_route().unwrap().current_stream();
        assert_eq!(current.map(|s| s.name()), Some(stream), "{key}");
    }
}
