//! Runtime surface used by the audio HAL.

use ruta_core::{CriterionValue, Direction, ParameterValue, StreamRef};

use crate::ServiceError;

/// Calls issued by the audio HAL while streams come and go.
pub trait StreamInterface {
    /// Starts the routing worker and the criterion backend. Idempotent.
    fn start_service(&self) -> Result<(), ServiceError>;

    /// Stops the routing worker after pending passes are served. Idempotent.
    fn stop_service(&self);

    /// Registers a stream.
    fn add_stream(&self, stream: StreamRef);

    /// Unregisters a stream.
    fn remove_stream(&self, stream: &StreamRef);

    /// Called once a stream started; reroutes synchronously.
    fn start_stream(&self);

    /// Called once a stream stopped; reroutes synchronously.
    fn stop_stream(&self);

    /// Schedules a pass without waiting for it.
    fn reconsider_routing(&self);

    /// Sets the voice volume, `gain` in `[0.0, 1.0]`.
    fn set_voice_volume(&self, gain: f32) -> Result<(), ServiceError>;

    /// Output stream used as echo reference.
    fn voice_output_stream(&self) -> Option<StreamRef>;

    /// Latency in µs of the first stream route matching `flags`.
    fn latency_in_us(&self, direction: Direction, flags: u32) -> u32;

    /// Period in µs of the first stream route matching `flags`.
    fn period_in_us(&self, direction: Direction, flags: u32) -> u32;

    /// Sets a criterion; the value is pushed at the next pass.
    fn set_criterion(&self, name: &str, value: CriterionValue) -> Result<bool, ServiceError>;

    /// Formatted value of a criterion.
    fn criterion(&self, name: &str) -> Option<String>;

    /// Writes a backend parameter.
    fn set_audio_parameter(&self, path: &str, value: ParameterValue) -> Result<(), ServiceError>;

    /// Reads a backend parameter.
    fn audio_parameter(&self, path: &str) -> Result<ParameterValue, ServiceError>;
}
