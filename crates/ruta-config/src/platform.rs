//! Platform route table format and operations.

use std::path::Path;

use ruta_core::{Direction, RouteInterface, StreamRouteConfig, route_key};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::validation::validate_platform;

/// Route table of one hardware platform.
///
/// Tables are TOML documents. Declaration order matters: routes get their
/// criterion bit in file order, per direction.
///
/// # TOML Format
///
/// ```toml
/// name = "devboard"
/// description = "Single codec board"
/// ports = ["SSP0", "SSP1"]
///
/// [[port_groups]]
/// name = "CodecBus"
/// ports = ["SSP0", "SSP1"]
///
/// [[routes]]
/// name = "Media"
/// kind = "stream"
/// ports = ["SSP0"]
/// directions = ["output"]
/// applicable = true
///
/// [routes.playback]
/// card_name = "codec"
/// rate = 48000
/// period_size = 1152
/// applicability_mask = 2
///
/// [[criterion_types]]
/// name = "ModeType"
/// values = [{ literal = "Normal", value = 0 }, { literal = "InCall", value = 2 }]
///
/// [[criteria]]
/// name = "Mode"
/// type = "ModeType"
/// default = "Normal"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlatformConfig {
    /// Platform name.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Port names.
    #[serde(default)]
    pub ports: Vec<String>,

    /// Ports blocked when the table is applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_ports: Vec<String>,

    /// Mutually exclusive port sets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_groups: Vec<PortGroupConfig>,

    /// Routes, in discovery order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Criterion types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criterion_types: Vec<CriterionTypeConfig>,

    /// Criteria.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<CriterionConfig>,
}

/// A named port group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortGroupConfig {
    /// Group name.
    pub name: String,
    /// Member ports.
    pub ports: Vec<String>,
}

/// Kind of route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Path between hardware blocks, no PCM device.
    #[default]
    External,
    /// Route owning a PCM device that streams attach to.
    Stream,
}

/// One route, declared once per listed direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    /// Route name; the element key adds a direction suffix.
    pub name: String,

    /// Plain or stream route.
    #[serde(default)]
    pub kind: RouteKind,

    /// Up to two ports: source then destination.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,

    /// Directions the route is declared in.
    pub directions: Vec<Direction>,

    /// Initial applicability, in every direction.
    #[serde(default)]
    pub applicable: bool,

    /// Stream settings for the output direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback: Option<StreamSettings>,

    /// Stream settings for the input direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<StreamSettings>,
}

impl RouteConfig {
    /// Creates an external route over `ports`.
    pub fn external(name: impl Into<String>, ports: &[&str], directions: &[Direction]) -> Self {
        Self {
            name: name.into(),
            kind: RouteKind::External,
            ports: ports.iter().map(|p| (*p).to_owned()).collect(),
            directions: directions.to_vec(),
            applicable: false,
            playback: None,
            capture: None,
        }
    }

    /// Creates a stream route with the given per-direction settings.
    pub fn stream(
        name: impl Into<String>,
        ports: &[&str],
        playback: Option<StreamSettings>,
        capture: Option<StreamSettings>,
    ) -> Self {
        let directions = [
            capture.as_ref().map(|_| Direction::Input),
            playback.as_ref().map(|_| Direction::Output),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self {
            name: name.into(),
            kind: RouteKind::Stream,
            ports: ports.iter().map(|p| (*p).to_owned()).collect(),
            directions,
            applicable: false,
            playback,
            capture,
        }
    }

    /// Marks the route applicable when the table is applied.
    pub fn applicable(mut self) -> Self {
        self.applicable = true;
        self
    }

    /// Stream settings for `direction`.
    pub fn settings(&self, direction: Direction) -> Option<&StreamSettings> {
        match direction {
            Direction::Output => self.playback.as_ref(),
            Direction::Input => self.capture.as_ref(),
        }
    }

    /// Source port, or `""`.
    pub fn source(&self) -> &str {
        self.ports.first().map_or("", String::as_str)
    }

    /// Destination port, or `""`.
    pub fn destination(&self) -> &str {
        self.ports.get(1).map_or("", String::as_str)
    }
}

/// Device configuration and effects of a stream route in one direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StreamSettings {
    /// PCM device configuration.
    #[serde(flatten)]
    pub device: StreamRouteConfig,

    /// Supported effect names (`aec`, `ns`, `agc`, `bmf`, `wnr`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
}

impl StreamSettings {
    /// Settings with the given device configuration and no effects.
    pub fn new(device: StreamRouteConfig) -> Self {
        Self {
            device,
            effects: Vec::new(),
        }
    }

    /// Adds a supported effect.
    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effects.push(effect.into());
        self
    }
}

/// A criterion type and its value pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionTypeConfig {
    /// Type name.
    pub name: String,
    /// Bit set type.
    #[serde(default)]
    pub inclusive: bool,
    /// Value pairs.
    #[serde(default)]
    pub values: Vec<ValuePairConfig>,
}

/// One `literal <-> numeric` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuePairConfig {
    /// Literal.
    pub literal: String,
    /// Numeric value.
    pub value: u32,
}

/// A criterion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionConfig {
    /// Criterion name.
    pub name: String,
    /// Type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Default literal; empty means 0.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
}

impl PlatformConfig {
    /// Create a new empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load a table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a table from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the table to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Convert the table to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of routes declared in `direction`.
    pub fn route_count(&self, direction: Direction) -> usize {
        self.routes
            .iter()
            .filter(|r| r.directions.contains(&direction))
            .count()
    }

    /// Validates the table, then performs discovery on `target`: ports,
    /// port groups, routes with their stream settings and effects, criterion
    /// types, criteria, then initial applicability and blocked ports.
    pub fn apply<T: RouteInterface + ?Sized>(&self, target: &mut T) -> Result<(), ConfigError> {
        validate_platform(self)?;

        for port in &self.ports {
            target.add_port(port)?;
        }
        for group in &self.port_groups {
            for port in &group.ports {
                target.add_port_group(&group.name, port)?;
            }
        }
        for route in &self.routes {
            for &direction in &route.directions {
                self.apply_route(target, route, direction)?;
            }
        }
        for ty in &self.criterion_types {
            target.add_criterion_type(&ty.name, ty.inclusive)?;
            for pair in &ty.values {
                target.add_criterion_type_value_pair(&ty.name, &pair.literal, pair.value)?;
            }
        }
        for criterion in &self.criteria {
            target.add_criterion(&criterion.name, &criterion.type_name, &criterion.default)?;
        }
        for route in self.routes.iter().filter(|r| r.applicable) {
            for &direction in &route.directions {
                target.set_route_applicable(&route_key(&route.name, direction), true)?;
            }
        }
        for port in &self.blocked_ports {
            target.set_port_blocked(port, true)?;
        }

        debug!(
            platform = %self.name,
            ports = self.ports.len(),
            routes = self.routes.len(),
            criteria = self.criteria.len(),
            "platform table applied"
        );
        Ok(())
    }

    fn apply_route<T: RouteInterface + ?Sized>(
        &self,
        target: &mut T,
        route: &RouteConfig,
        direction: Direction,
    ) -> Result<(), ConfigError> {
        let (source, destination) = (route.source(), route.destination());
        match route.kind {
            RouteKind::External => {
                target.add_audio_route(&route.name, source, destination, direction)?;
            }
            RouteKind::Stream => {
                target.add_audio_stream_route(&route.name, source, destination, direction)?;
                let key = route_key(&route.name, direction);
                if let Some(settings) = route.settings(direction) {
                    target.update_stream_route_config(&key, settings.device.clone())?;
                    for effect in &settings.effects {
                        target.add_route_supported_effect(&key, effect)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVBOARD: &str = r#"
name = "devboard"
ports = ["SSP0", "SSP1"]

[[port_groups]]
name = "CodecBus"
ports = ["SSP0", "SSP1"]

[[routes]]
name = "Media"
kind = "stream"
ports = ["SSP0"]
directions = ["output", "input"]
applicable = true

[routes.playback]
card_name = "codec"
period_size = 1152
applicability_mask = 2

[routes.capture]
card_name = "codec"
applicability_mask = 1
effects = ["aec", "ns"]

[[routes]]
name = "Modem"
ports = ["SSP1"]
directions = ["output"]

[[criterion_types]]
name = "ModeType"
values = [{ literal = "Normal", value = 0 }, { literal = "InCall", value = 2 }]

[[criteria]]
name = "Mode"
type = "ModeType"
default = "Normal"
"#;

    #[test]
    fn parses_full_table() {
        let platform = PlatformConfig::from_toml(DEVBOARD).unwrap();
        assert_eq!(platform.name, "devboard");
        assert_eq!(platform.routes.len(), 2);

        let media = &platform.routes[0];
        assert_eq!(media.kind, RouteKind::Stream);
        assert_eq!(media.directions, vec![Direction::Output, Direction::Input]);
        let playback = media.settings(Direction::Output).unwrap();
        assert_eq!(playback.device.card_name, "codec");
        assert_eq!(playback.device.period_size, 1152);
        // Unset fields fall back to the device defaults.
        assert_eq!(playback.device.rate, 48000);
        assert_eq!(playback.device.period_count, 4);
        let capture = media.settings(Direction::Input).unwrap();
        assert_eq!(capture.effects, vec!["aec", "ns"]);

        let modem = &platform.routes[1];
        assert_eq!(modem.kind, RouteKind::External);
        assert_eq!(modem.source(), "SSP1");
        assert_eq!(modem.destination(), "");
        assert!(!modem.applicable);
    }

    #[test]
    fn toml_round_trip_preserves_table() {
        let platform = PlatformConfig::from_toml(DEVBOARD).unwrap();
        let text = platform.to_toml().unwrap();
        assert_eq!(PlatformConfig::from_toml(&text).unwrap(), platform);
    }

    #[test]
    fn route_count_per_direction() {
        let platform = PlatformConfig::from_toml(DEVBOARD).unwrap();
        assert_eq!(platform.route_count(Direction::Output), 2);
        assert_eq!(platform.route_count(Direction::Input), 1);
    }

    #[test]
    fn stream_builder_derives_directions() {
        let route = RouteConfig::stream(
            "Voice",
            &[],
            Some(StreamSettings::default()),
            Some(StreamSettings::default().with_effect("aec")),
        )
        .applicable();
        assert_eq!(route.directions, vec![Direction::Input, Direction::Output]);
        assert!(route.applicable);
        assert_eq!(route.capture.unwrap().effects, vec!["aec"]);
    }

    #[test]
    fn missing_directions_is_a_parse_error() {
        let err = PlatformConfig::from_toml("name = \"x\"\n[[routes]]\nname = \"R\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
