//! Error types for the routing service.

use ruta_core::RoutingError;
use thiserror::Error;

/// Errors returned by [`RouteManager`](crate::RouteManager).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The routing worker thread could not be spawned.
    #[error("failed to spawn routing worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The routing worker exited while a request was in flight.
    #[error("routing worker is gone")]
    WorkerGone,

    /// Engine-level failure (backend start, unknown element, invalid value).
    #[error(transparent)]
    Routing(#[from] RoutingError),
}
