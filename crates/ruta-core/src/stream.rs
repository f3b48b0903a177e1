//! Live audio stream collaborator.

use std::sync::Arc;

use crate::direction::Direction;
use crate::error::RouteError;
use crate::stream_route::StreamRouteConfig;

/// A playback or capture stream as seen by the routing engine.
///
/// Streams are owned by the audio HAL; the engine only keeps shared handles
/// ([`StreamRef`]) in its per-direction stream lists. Every method takes
/// `&self`: implementations hold their routing state behind interior
/// mutability since they are shared with the HAL threads.
pub trait IoStream: Send + Sync {
    /// Stream name, for logs and reports.
    fn name(&self) -> &str;

    /// Stream direction.
    fn direction(&self) -> Direction;

    /// Returns `true` for playback streams.
    fn is_out(&self) -> bool {
        self.direction().is_out()
    }

    /// Whether the stream is started and wants a route.
    fn is_started(&self) -> bool;

    /// Whether a route has already been staged for the stream in this pass.
    fn is_new_route_available(&self) -> bool;

    /// Use-case bits matched against stream route applicability masks
    /// (output flags for playback, `1 << input_source` for capture).
    fn applicability_mask(&self) -> u32;

    /// Effect bits the stream requires from its route.
    fn effects_requested(&self) -> u32;

    /// Stages `route` as the stream's route for the pass being computed.
    fn set_new_stream_route(&self, route: &str);

    /// Drops the staged route.
    fn reset_new_stream_route(&self);

    /// Binds the stream to its staged route, whose device is open.
    fn attach_route(&self, route: &str, config: &StreamRouteConfig) -> Result<(), RouteError>;

    /// Unbinds the stream from its current route.
    fn detach_route(&self);
}

/// Shared handle on a stream.
pub type StreamRef = Arc<dyn IoStream>;

/// Identity comparison of two stream handles.
#[inline]
pub fn same_stream(a: &StreamRef, b: &StreamRef) -> bool {
    core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Identity comparison of two optional stream handles.
pub(crate) fn same_slot(a: Option<&StreamRef>, b: Option<&StreamRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_stream(a, b),
        (None, None) => true,
        _ => false,
    }
}
