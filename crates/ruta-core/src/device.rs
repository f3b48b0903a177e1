//! Hardware device collaborator.
//!
//! Stream routes drive a PCM device through [`AudioDevice`]. The engine never
//! touches hardware directly; a [`DeviceFactory`] supplies one device per
//! stream route when the route is declared.

use crate::direction::Direction;
use crate::error::DeviceError;

/// PCM sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SampleFormat {
    /// Signed 16 bit little endian.
    #[default]
    S16,
    /// Signed 24 bit in 32 bit container.
    S24,
    /// Signed 32 bit.
    S32,
}

impl SampleFormat {
    /// Bytes per sample.
    pub const fn bytes(self) -> u32 {
        match self {
            SampleFormat::S16 => 2,
            SampleFormat::S24 | SampleFormat::S32 => 4,
        }
    }
}

/// PCM parameters a device is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmConfig {
    /// Interleaved channel count.
    pub channels: u32,
    /// Sample rate in Hz.
    pub rate: u32,
    /// Frames per period.
    pub period_size: u32,
    /// Periods in the ring buffer.
    pub period_count: u32,
    /// Sample format.
    pub format: SampleFormat,
}

impl PcmConfig {
    /// Bytes in one period.
    pub fn period_bytes(&self) -> u32 {
        self.period_size * self.channels * self.format.bytes()
    }
}

/// A PCM device bound to one stream route.
pub trait AudioDevice: Send + Sync {
    /// Opens the device.
    fn open(
        &mut self,
        card: &str,
        device: u32,
        config: &PcmConfig,
        direction: Direction,
    ) -> Result<(), DeviceError>;

    /// Closes the device. Closing a closed device is a no-op.
    fn close(&mut self) -> Result<(), DeviceError>;

    /// Whether the device is open.
    fn is_opened(&self) -> bool;
}

/// Creates the device of each stream route at declaration time.
pub trait DeviceFactory: Send + Sync {
    /// Returns the device for stream route `route`.
    fn create_device(&mut self, route: &str, direction: Direction) -> Box<dyn AudioDevice>;
}
