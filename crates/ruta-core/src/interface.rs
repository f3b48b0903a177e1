//! Discovery-time configuration surface.

use crate::backend::ParameterValue;
use crate::direction::Direction;
use crate::error::RoutingError;
use crate::stream_route::StreamRouteConfig;

/// Calls used by route table loaders to populate an engine, and by the
/// criterion rules to steer routes at runtime.
///
/// Element-creating calls fail with
/// [`RoutingError::ConfigurationFrozen`] once the criterion backend runs.
/// Routes are addressed by key: `<name>_Playback` or `<name>_Capture`.
pub trait RouteInterface {
    /// Declares a port.
    fn add_port(&mut self, name: &str) -> Result<(), RoutingError>;

    /// Adds `member` to port group `name`, creating the group if needed.
    fn add_port_group(&mut self, name: &str, member: &str) -> Result<(), RoutingError>;

    /// Declares a plain route. Empty port names mean no port.
    fn add_audio_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), RoutingError>;

    /// Declares a stream route. Empty port names mean no port.
    fn add_audio_stream_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), RoutingError>;

    /// Replaces the device configuration of a stream route.
    fn update_stream_route_config(
        &mut self,
        key: &str,
        config: StreamRouteConfig,
    ) -> Result<(), RoutingError>;

    /// Adds a supported effect (`aec`, `ns`, `agc`, `bmf`, `wnr`) to a stream route.
    fn add_route_supported_effect(&mut self, key: &str, effect: &str) -> Result<(), RoutingError>;

    /// Sets the applicability of a route for the next pass.
    fn set_route_applicable(&mut self, key: &str, applicable: bool) -> Result<(), RoutingError>;

    /// Requests mute and reconfiguration of a route on the next pass.
    fn set_route_need_reconfigure(&mut self, key: &str, need: bool) -> Result<(), RoutingError>;

    /// Requests disable, enable and reconfiguration of a route on the next pass.
    fn set_route_need_reroute(&mut self, key: &str, need: bool) -> Result<(), RoutingError>;

    /// Sets or clears the external block of a port.
    fn set_port_blocked(&mut self, name: &str, blocked: bool) -> Result<(), RoutingError>;

    /// Declares a criterion type. Returns `true` if it already existed.
    fn add_criterion_type(&mut self, name: &str, inclusive: bool) -> Result<bool, RoutingError>;

    /// Adds a value pair to a criterion type. Known literals are ignored.
    fn add_criterion_type_value_pair(
        &mut self,
        type_name: &str,
        literal: &str,
        value: u32,
    ) -> Result<(), RoutingError>;

    /// Declares a criterion. An empty default literal means 0.
    fn add_criterion(
        &mut self,
        name: &str,
        type_name: &str,
        default_literal: &str,
    ) -> Result<(), RoutingError>;

    /// Writes a backend parameter.
    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> Result<(), RoutingError>;
}
