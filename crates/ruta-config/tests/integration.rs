//! Integration tests for ruta-config.
//!
//! Tables are applied to engines wired to simulated collaborators.

use ruta_config::{
    ConfigError, PlatformConfig, RouteConfig, ValidationError, builtin_platform, builtin_platforms,
    load_platform,
};
use ruta_core::sim::simulated_engine;
use ruta_core::{Direction, RouteInterface, RoutingEngine, RoutingError};
use tempfile::TempDir;

fn is_used(engine: &RoutingEngine, name: &str, direction: Direction) -> bool {
    let graph = engine.graph();
    let id = graph.find_route(name, direction).unwrap();
    graph.route(id).is_used()
}

#[test]
fn builtin_platforms_apply_cleanly() {
    for platform in builtin_platforms() {
        let (mut engine, _, _) = simulated_engine();
        platform
            .apply(&mut engine)
            .unwrap_or_else(|e| panic!("{} failed to apply: {e}", platform.name));
        engine.start_backend().unwrap();
        assert_eq!(engine.criterion("Mode").as_deref(), Some("Normal"));
        assert_eq!(
            engine.criterion("SelectedOutputDevices").as_deref(),
            Some("Speaker")
        );
    }
}

#[test]
fn route_bits_follow_file_order() {
    let platform = builtin_platform("redhookbay").unwrap();
    let (mut engine, _, _) = simulated_engine();
    platform.apply(&mut engine).unwrap();

    let graph = engine.graph();
    let bit = |name: &str, direction| {
        let id = graph.find_route(name, direction).unwrap();
        graph.route(id).mask()
    };
    assert_eq!(bit("Media", Direction::Output), 1 << 0);
    assert_eq!(bit("DeepMedia", Direction::Output), 1 << 1);
    assert_eq!(bit("VirtualASP", Direction::Output), 1 << 8);
    assert_eq!(bit("Media", Direction::Input), 1 << 0);
    assert_eq!(bit("HwCodecFm", Direction::Input), 1 << 5);
}

#[test]
fn redhookbay_port_groups_arbitrate_external_routes() {
    let mut platform = builtin_platform("redhookbay").unwrap();
    for route in &mut platform.routes {
        if ["HwCodecMedia", "HwCodecCSV", "BtCSV"].contains(&route.name.as_str()) {
            route.applicable = true;
        }
    }
    let (mut engine, _, _) = simulated_engine();
    platform.apply(&mut engine).unwrap();
    engine.start_backend().unwrap();
    engine.reconsider_routing();

    // The codec media port excludes the codec voice port, which frees the
    // modem port for the Bluetooth path.
    assert!(is_used(&engine, "HwCodecMedia", Direction::Output));
    assert!(!is_used(&engine, "HwCodecCSV", Direction::Output));
    assert!(is_used(&engine, "BtCSV", Direction::Output));

    engine
        .set_route_applicable("HwCodecMedia_Playback", false)
        .unwrap();
    engine
        .set_route_applicable("HwCodecMedia_Capture", false)
        .unwrap();
    engine.reconsider_routing();
    assert!(is_used(&engine, "HwCodecCSV", Direction::Output));
    assert!(!is_used(&engine, "BtCSV", Direction::Output));
}

#[test]
fn blocked_ports_are_applied() {
    let mut platform = builtin_platform("redhookbay").unwrap();
    platform.blocked_ports.push("FM_I2S_PORT".to_string());
    for route in &mut platform.routes {
        if route.name == "HwCodecFm" {
            route.applicable = true;
        }
    }
    let (mut engine, _, _) = simulated_engine();
    platform.apply(&mut engine).unwrap();
    engine.start_backend().unwrap();
    engine.reconsider_routing();
    assert!(!is_used(&engine, "HwCodecFm", Direction::Input));

    engine.set_port_blocked("FM_I2S_PORT", false).unwrap();
    engine.reconsider_routing();
    assert!(is_used(&engine, "HwCodecFm", Direction::Input));
}

#[test]
fn invalid_table_is_rejected_before_discovery() {
    let mut platform = PlatformConfig::new("broken");
    platform.routes.push(RouteConfig::external(
        "Ghost",
        &["NOWHERE"],
        &[Direction::Output],
    ));
    let (mut engine, _, _) = simulated_engine();
    let err = platform.apply(&mut engine).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::UnknownPort { .. })
    ));
    assert_eq!(engine.graph().route_count(Direction::Output), 0);
}

#[test]
fn applying_to_started_engine_is_refused() {
    let platform = builtin_platform("saltbay").unwrap();
    let (mut engine, _, _) = simulated_engine();
    engine.start_backend().unwrap();
    let err = platform.apply(&mut engine).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Apply(RoutingError::ConfigurationFrozen { .. })
    ));
}

#[test]
fn save_and_load_through_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("saltbay.toml");

    let platform = builtin_platform("saltbay").unwrap();
    platform.save(&path).unwrap();
    let loaded = PlatformConfig::load(&path).unwrap();
    assert_eq!(loaded, platform);

    let by_path = load_platform(path.to_str().unwrap()).unwrap();
    assert_eq!(by_path.name, "saltbay");
}

#[test]
fn load_platform_falls_back_to_builtins() {
    assert_eq!(load_platform("redhookbay").unwrap().name, "redhookbay");
    assert!(matches!(
        load_platform("no_such_platform_12345"),
        Err(ConfigError::PlatformNotFound(_))
    ));
}

#[test]
fn load_reports_parse_errors() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "name = [").unwrap();
    assert!(matches!(
        PlatformConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
    assert!(matches!(
        PlatformConfig::load(temp_dir.path().join("missing.toml")),
        Err(ConfigError::ReadFile { .. })
    ));
}
