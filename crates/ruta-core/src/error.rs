//! Error types for the routing engine and its collaborators.
//!
//! Only recoverable conditions are represented here. Invariant violations
//! (using a blocked route, internal lookup misses, staging a second stream on a
//! stream route) panic instead.

use thiserror::Error;

use crate::direction::Direction;

/// Errors returned by the configuration and runtime API of the engine.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// An element with the same key already exists.
    #[error("{kind} '{name}' already added")]
    DuplicateElement {
        /// Element kind ("port", "route", ...).
        kind: &'static str,
        /// Element key.
        name: String,
    },

    /// Configuration calls are rejected once the criterion backend runs.
    #[error("{operation} not allowed while the criterion backend is running")]
    ConfigurationFrozen {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// A configuration call referenced an element that does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Element kind.
        kind: &'static str,
        /// Requested key.
        name: String,
    },

    /// Route masks are 32 bits wide per direction.
    #[error("route table full for {direction} direction (32 routes max)")]
    RouteTableFull {
        /// Direction whose table is full.
        direction: Direction,
    },

    /// A literal or numeric value does not belong to the criterion type.
    #[error("invalid value '{value}' for criterion '{criterion}'")]
    InvalidCriterionValue {
        /// Criterion or criterion type name.
        criterion: String,
        /// Rejected value, as given.
        value: String,
    },

    /// Effect name is not one of the supported effect identifiers.
    #[error("unknown effect '{0}'")]
    UnknownEffect(String),

    /// Voice volume outside `[0.0, 1.0]`.
    #[error("voice volume {0} out of range [0.0 .. 1.0]")]
    VolumeOutOfRange(f32),

    /// The backend rejected a call.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RoutingError {
    /// Create a not-found error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        RoutingError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a duplicate element error.
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        RoutingError::DuplicateElement {
            kind,
            name: name.into(),
        }
    }
}

/// Errors reported by an [`AudioDevice`](crate::AudioDevice).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not be opened.
    #[error("failed to open {card}:{device}: {reason}")]
    Open {
        /// Sound card name.
        card: String,
        /// PCM device index.
        device: u32,
        /// Driver-provided reason.
        reason: String,
    },

    /// The device could not be closed.
    #[error("failed to close device: {0}")]
    Close(String),
}

/// Errors raised by stream route transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Device open or close failed.
    #[error("route '{route}': {source}")]
    Device {
        /// Route name.
        route: String,
        /// Device failure.
        #[source]
        source: DeviceError,
    },

    /// A stream operation needed an opened device.
    #[error("route '{0}': device not opened")]
    DeviceNotOpened(String),

    /// The stream refused the route.
    #[error("route '{route}': stream attach failed: {reason}")]
    Attach {
        /// Route name.
        route: String,
        /// Stream-provided reason.
        reason: String,
    },
}

/// Errors reported by a [`CriterionBackend`](crate::CriterionBackend).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend failed to start.
    #[error("criterion backend start error: {0}")]
    Start(String),

    /// Parameter path unknown to the backend.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Parameter exists but holds a different type.
    #[error("parameter '{path}' type mismatch: expected {expected}")]
    ParameterType {
        /// Parameter path.
        path: String,
        /// Expected value kind.
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_messages() {
        let err = RoutingError::duplicate("port", "SSP0");
        assert_eq!(err.to_string(), "port 'SSP0' already added");

        let err = RoutingError::RouteTableFull {
            direction: Direction::Output,
        };
        assert!(err.to_string().contains("output"));

        let err = RoutingError::VolumeOutOfRange(1.5);
        assert_eq!(err.to_string(), "voice volume 1.5 out of range [0.0 .. 1.0]");
    }

    #[test]
    fn route_error_keeps_device_source() {
        let err = RouteError::Device {
            route: "Media".into(),
            source: DeviceError::Close("busy".into()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Media"));
    }

    #[test]
    fn backend_error_is_transparent() {
        let err: RoutingError = BackendError::UnknownParameter("/a/b".into()).into();
        assert_eq!(err.to_string(), "unknown parameter '/a/b'");
    }
}
