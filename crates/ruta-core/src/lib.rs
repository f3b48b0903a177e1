//! Core of the ruta audio routing engine.
//!
//! The engine decides, at every audio system state change, which hardware
//! paths ("routes") must be muted, disabled, reconfigured, enabled and
//! unmuted, and in which order, so that mutually exclusive paths are never
//! active together and transitions stay glitch free.
//!
//! # Elements
//!
//! - [`AudioPort`]: a hardware access point, owned by at most one route per
//!   direction per pass.
//! - [`AudioPortGroup`]: ports of which at most one may be used at a time.
//! - [`AudioRoute`]: a directed edge over up to two ports.
//! - [`AudioStreamRoute`]: the device-owning part of a stream route, matched
//!   against live streams by use-case mask and effects.
//!
//! All elements live in the [`RoutingGraph`] arenas and refer to each other
//! by id.
//!
//! # Collaborators
//!
//! The engine talks to hardware only through traits: [`CriterionBackend`]
//! (the rules engine applying criteria), [`AudioDevice`] / [`DeviceFactory`]
//! (PCM devices) and [`IoStream`] (live streams). [`sim`] provides
//! deterministic implementations of all three.
//!
//! # Example
//!
//! ```
//! use ruta_core::sim::{SimulatedStream, simulated_engine};
//! use ruta_core::{Direction, RouteInterface, StreamRouteConfig};
//!
//! let (mut engine, journal, _devices) = simulated_engine();
//! engine.add_port("SSP0").unwrap();
//! engine
//!     .add_audio_stream_route("Media", "SSP0", "", Direction::Output)
//!     .unwrap();
//! engine
//!     .update_stream_route_config(
//!         "Media_Playback",
//!         StreamRouteConfig { applicability_mask: 0x2, ..Default::default() },
//!     )
//!     .unwrap();
//! engine.set_route_applicable("Media_Playback", true).unwrap();
//! engine.start_backend().unwrap();
//!
//! let stream = SimulatedStream::new("music", Direction::Output, 0x2, journal);
//! engine.add_stream(stream.clone());
//! stream.start();
//!
//! let report = engine.reconsider_routing();
//! assert!(report.changed);
//! assert_eq!(stream.current_route().as_deref(), Some("Media"));
//! ```

pub mod backend;
pub mod criterion;
pub mod device;
pub mod direction;
pub mod element;
pub mod engine;
pub mod error;
pub mod graph;
pub mod interface;
pub mod port;
pub mod port_group;
pub mod report;
pub mod route;
pub mod sim;
pub mod stream;
pub mod stream_route;

pub use backend::{CriterionBackend, ParameterValue};
pub use criterion::{Criterion, CriterionType, CriterionValue};
pub use device::{AudioDevice, DeviceFactory, PcmConfig, SampleFormat};
pub use direction::{Direction, PerDirection};
pub use element::{Availability, ElementMap, PortGroupId, PortId, RouteId, RoutingElement};
pub use engine::{
    INPUT_SOURCE_DEFAULT_MASK, OUTPUT_FLAG_PRIMARY, ROUTING_STAGE_CRITERION,
    RoutingEngine, VOICE_VOLUME_PARAMETER, closing_routes_criterion, opened_routes_criterion,
    route_criterion_type,
};
pub use error::{BackendError, DeviceError, RouteError, RoutingError};
pub use graph::{MAX_ROUTES_PER_DIRECTION, RoutingGraph, route_key};
pub use interface::RouteInterface;
pub use port::AudioPort;
pub use port_group::AudioPortGroup;
pub use report::{Phase, RouteFailure, RouteMasks, RoutingAction, RoutingReport};
pub use route::{AudioRoute, StageMask};
pub use stream::{IoStream, StreamRef, same_stream};
pub use stream_route::{AudioStreamRoute, ChannelPolicy, Effect, StreamRouteConfig};
