//! Platform table validation.
//!
//! Checks a [`PlatformConfig`] against what the routing engine will accept,
//! and reports every problem at once instead of stopping at the first
//! rejected discovery call.
//!
//! # Example
//!
//! ```rust
//! use ruta_config::{PlatformConfig, validate_platform};
//!
//! let platform = PlatformConfig::from_toml(r#"
//! name = "broken"
//! ports = ["SSP0", "SSP0"]
//! "#).unwrap();
//! assert!(validate_platform(&platform).is_err());
//! ```

use std::collections::{HashMap, HashSet};

use ruta_core::{CriterionType, Direction, Effect, MAX_ROUTES_PER_DIRECTION};
use thiserror::Error;

use crate::platform::{PlatformConfig, RouteConfig, RouteKind};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Name declared twice.
    #[error("duplicate {kind} '{name}'")]
    Duplicate {
        /// Element kind.
        kind: &'static str,
        /// Offending name.
        name: String,
    },

    /// Reference to an undeclared port.
    #[error("{context} references unknown port '{port}'")]
    UnknownPort {
        /// Where the reference appears.
        context: String,
        /// Port name.
        port: String,
    },

    /// Route with more than two ports.
    #[error("route '{route}' lists {count} ports (2 max)")]
    TooManyPorts {
        /// Route name.
        route: String,
        /// Port count.
        count: usize,
    },

    /// Route declared in no direction.
    #[error("route '{0}' has no direction")]
    NoDirection(String),

    /// Too many routes in one direction.
    #[error("{count} {direction} routes declared ({max} max)")]
    TooManyRoutes {
        /// Direction.
        direction: Direction,
        /// Declared count.
        count: usize,
        /// Limit.
        max: usize,
    },

    /// Route whose two ports exclude each other.
    #[error("route '{route}' uses ports '{first}' and '{second}' which share port group '{group}'")]
    ExclusivePorts {
        /// Route name.
        route: String,
        /// First port.
        first: String,
        /// Second port.
        second: String,
        /// Shared group.
        group: String,
    },

    /// Stream route without device settings in a declared direction.
    #[error("stream route '{route}' has no {direction} device settings")]
    MissingStreamSettings {
        /// Route name.
        route: String,
        /// Direction lacking settings.
        direction: Direction,
    },

    /// Stream device settings that cannot open a device.
    #[error("stream route '{route}' {direction} settings: {reason}")]
    InvalidStreamSettings {
        /// Route name.
        route: String,
        /// Direction.
        direction: Direction,
        /// What is wrong.
        reason: String,
    },

    /// Effect name outside `aec`, `ns`, `agc`, `bmf`, `wnr`.
    #[error("route '{route}' lists unknown effect '{effect}'")]
    UnknownEffect {
        /// Route name.
        route: String,
        /// Effect name.
        effect: String,
    },

    /// Criterion of an undeclared type.
    #[error("criterion '{criterion}' has unknown type '{type_name}'")]
    UnknownCriterionType {
        /// Criterion name.
        criterion: String,
        /// Type name.
        type_name: String,
    },

    /// Default literal not declared by the criterion type.
    #[error("criterion '{criterion}' default '{literal}' is not a value of '{type_name}'")]
    UnknownLiteral {
        /// Criterion name.
        criterion: String,
        /// Type name.
        type_name: String,
        /// Default literal.
        literal: String,
    },

    /// Two literals of an exclusive type share a value.
    #[error("criterion type '{type_name}' maps '{first}' and '{second}' to {value}")]
    DuplicateValue {
        /// Type name.
        type_name: String,
        /// First literal.
        first: String,
        /// Second literal.
        second: String,
        /// Shared value.
        value: u32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// The individual errors, flattening [`ValidationError::Multiple`].
    pub fn errors(&self) -> Vec<&ValidationError> {
        match self {
            ValidationError::Multiple(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            other => vec![other],
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a platform table.
///
/// Returns the single problem found, or [`ValidationError::Multiple`].
pub fn validate_platform(platform: &PlatformConfig) -> ValidationResult<()> {
    let mut errors = platform_errors(platform);
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Every problem found in a platform table, in table order.
pub fn platform_errors(platform: &PlatformConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let ports = check_ports(platform, &mut errors);
    let groups = check_port_groups(platform, &ports, &mut errors);
    check_routes(platform, &ports, &groups, &mut errors);
    check_criteria(platform, &mut errors);

    for port in &platform.blocked_ports {
        if !ports.contains(port.as_str()) {
            errors.push(ValidationError::UnknownPort {
                context: "blocked ports".to_string(),
                port: port.clone(),
            });
        }
    }

    errors
}

fn check_ports<'a>(
    platform: &'a PlatformConfig,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut ports = HashSet::new();
    for port in &platform.ports {
        if !ports.insert(port.as_str()) {
            errors.push(ValidationError::Duplicate {
                kind: "port",
                name: port.clone(),
            });
        }
    }
    ports
}

/// Port name to the groups it belongs to.
fn check_port_groups<'a>(
    platform: &'a PlatformConfig,
    ports: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) -> HashMap<&'a str, Vec<&'a str>> {
    let mut names = HashSet::new();
    let mut membership: HashMap<&str, Vec<&str>> = HashMap::new();
    for group in &platform.port_groups {
        if !names.insert(group.name.as_str()) {
            errors.push(ValidationError::Duplicate {
                kind: "port group",
                name: group.name.clone(),
            });
        }
        for port in &group.ports {
            if !ports.contains(port.as_str()) {
                errors.push(ValidationError::UnknownPort {
                    context: format!("port group '{}'", group.name),
                    port: port.clone(),
                });
            }
            membership
                .entry(port.as_str())
                .or_default()
                .push(group.name.as_str());
        }
    }
    membership
}

fn check_routes(
    platform: &PlatformConfig,
    ports: &HashSet<&str>,
    groups: &HashMap<&str, Vec<&str>>,
    errors: &mut Vec<ValidationError>,
) {
    let mut keys = HashSet::new();
    for route in &platform.routes {
        if route.directions.is_empty() {
            errors.push(ValidationError::NoDirection(route.name.clone()));
        }
        for &direction in &route.directions {
            if !keys.insert(ruta_core::route_key(&route.name, direction)) {
                errors.push(ValidationError::Duplicate {
                    kind: "route",
                    name: ruta_core::route_key(&route.name, direction),
                });
            }
        }

        if route.ports.len() > 2 {
            errors.push(ValidationError::TooManyPorts {
                route: route.name.clone(),
                count: route.ports.len(),
            });
        }
        for port in route.ports.iter().filter(|p| !p.is_empty()) {
            if !ports.contains(port.as_str()) {
                errors.push(ValidationError::UnknownPort {
                    context: format!("route '{}'", route.name),
                    port: port.clone(),
                });
            }
        }
        let (first, second) = (route.source(), route.destination());
        if !first.is_empty() && !second.is_empty() {
            let shared = if first == second {
                Some(first)
            } else {
                groups.get(first).and_then(|of_first| {
                    groups
                        .get(second)
                        .and_then(|of_second| of_first.iter().find(|g| of_second.contains(*g)))
                        .copied()
                })
            };
            if let Some(group) = shared {
                errors.push(ValidationError::ExclusivePorts {
                    route: route.name.clone(),
                    first: first.to_string(),
                    second: second.to_string(),
                    group: group.to_string(),
                });
            }
        }

        if route.kind == RouteKind::Stream {
            check_stream_settings(route, errors);
        }
    }

    let max = MAX_ROUTES_PER_DIRECTION as usize;
    for direction in Direction::ALL {
        let count = platform.route_count(direction);
        if count > max {
            errors.push(ValidationError::TooManyRoutes {
                direction,
                count,
                max,
            });
        }
    }
}

fn check_stream_settings(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    for &direction in &route.directions {
        let Some(settings) = route.settings(direction) else {
            errors.push(ValidationError::MissingStreamSettings {
                route: route.name.clone(),
                direction,
            });
            continue;
        };
        let invalid = |reason: &str| ValidationError::InvalidStreamSettings {
            route: route.name.clone(),
            direction,
            reason: reason.to_string(),
        };
        let device = &settings.device;
        if device.rate == 0 {
            errors.push(invalid("rate must be non-zero"));
        }
        if device.period_size == 0 || device.period_count == 0 {
            errors.push(invalid("period size and count must be non-zero"));
        }
        if device.channels == 0 {
            errors.push(invalid("channel count must be non-zero"));
        }
        for effect in &settings.effects {
            if Effect::from_name(effect).is_err() {
                errors.push(ValidationError::UnknownEffect {
                    route: route.name.clone(),
                    effect: effect.clone(),
                });
            }
        }
    }
}

fn check_criteria(platform: &PlatformConfig, errors: &mut Vec<ValidationError>) {
    let mut types: HashMap<&str, CriterionType> = HashMap::new();
    for config in &platform.criterion_types {
        if types.contains_key(config.name.as_str()) {
            errors.push(ValidationError::Duplicate {
                kind: "criterion type",
                name: config.name.clone(),
            });
            continue;
        }
        let mut ty = CriterionType::new(config.name.as_str(), config.inclusive);
        for pair in &config.values {
            if !config.inclusive
                && let Some((first, _)) = ty.value_pairs().iter().find(|(_, v)| *v == pair.value)
            {
                errors.push(ValidationError::DuplicateValue {
                    type_name: config.name.clone(),
                    first: first.clone(),
                    second: pair.literal.clone(),
                    value: pair.value,
                });
            }
            if !ty.add_value_pair(pair.literal.as_str(), pair.value) {
                errors.push(ValidationError::Duplicate {
                    kind: "literal",
                    name: format!("{}.{}", config.name, pair.literal),
                });
            }
        }
        types.insert(config.name.as_str(), ty);
    }

    let mut names = HashSet::new();
    for criterion in &platform.criteria {
        if !names.insert(criterion.name.as_str()) {
            errors.push(ValidationError::Duplicate {
                kind: "criterion",
                name: criterion.name.clone(),
            });
        }
        let Some(ty) = types.get(criterion.type_name.as_str()) else {
            errors.push(ValidationError::UnknownCriterionType {
                criterion: criterion.name.clone(),
                type_name: criterion.type_name.clone(),
            });
            continue;
        };
        if !criterion.default.is_empty() && ty.numerical_value(&criterion.default).is_err() {
            errors.push(ValidationError::UnknownLiteral {
                criterion: criterion.name.clone(),
                type_name: criterion.type_name.clone(),
                literal: criterion.default.clone(),
            });
        }
    }
}
