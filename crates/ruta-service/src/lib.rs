//! Threaded route manager service for the ruta routing engine.
//!
//! [`RouteManager`] wraps a [`RoutingEngine`](ruta_core::RoutingEngine)
//! behind a reader/writer lock and serializes every reconsideration pass on
//! one routing worker thread. The audio HAL drives it through
//! [`StreamInterface`]; route table loaders populate it through
//! [`RouteInterface`](ruta_core::RouteInterface) before the service starts.

mod error;
mod manager;
mod stream_interface;
mod worker;

pub use error::ServiceError;
pub use manager::RouteManager;
pub use stream_interface::StreamInterface;
pub use worker::WORKER_THREAD_NAME;
