//! Stream routes: routes that own a PCM device and carry a live stream.
//!
//! A stream route is matched against started streams each pass (first match
//! in stream list order wins), stages the matched stream as its *new* stream,
//! and during the routing phases moves its device and stream binding through
//! the transitions below.
//!
//! | call                      | device                                       | stream                 |
//! |---------------------------|----------------------------------------------|------------------------|
//! | `route(pre_enable)`       | open when `pre_enable == require_pre_enable` | attach when `!pre_enable` |
//! | `unroute(post_disable)`   | close when `post_disable == require_post_disable` | detach when `!post_disable` |
//! | `release_stream()`        | untouched                                    | detach current         |
//! | `attach_staged_stream()`  | untouched                                    | attach new             |
//!
//! The configure phase releases the outgoing streams of every reflowing route
//! before attaching any incoming one, so streams can move between routes.

use core::fmt;

use tracing::{debug, error, warn};

use crate::device::{AudioDevice, PcmConfig, SampleFormat};
use crate::direction::Direction;
use crate::error::{RouteError, RoutingError};
use crate::stream::{StreamRef, same_slot};

/// Audio pre-processing effects a capture route may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Effect {
    /// Acoustic echo cancellation.
    Aec,
    /// Noise suppression.
    Ns,
    /// Automatic gain control.
    Agc,
    /// Beam forming.
    Bmf,
    /// Wind noise reduction.
    Wnr,
}

impl Effect {
    /// All effects, in bit order.
    pub const ALL: [Effect; 5] = [Effect::Aec, Effect::Ns, Effect::Agc, Effect::Bmf, Effect::Wnr];

    /// Identifier used in route tables.
    pub const fn name(self) -> &'static str {
        match self {
            Effect::Aec => "aec",
            Effect::Ns => "ns",
            Effect::Agc => "agc",
            Effect::Bmf => "bmf",
            Effect::Wnr => "wnr",
        }
    }

    /// Bit of this effect in supported/requested effect masks.
    pub const fn mask(self) -> u32 {
        1 << (self as u32)
    }

    /// Parses a route table identifier.
    pub fn from_name(name: &str) -> Result<Self, RoutingError> {
        Effect::ALL
            .into_iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| RoutingError::UnknownEffect(name.to_owned()))
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-channel remapping applied by the stream when attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChannelPolicy {
    /// Copy the source channel.
    #[default]
    Copy,
    /// Drop the channel.
    Ignore,
    /// Average all source channels into this one.
    Average,
}

/// Device configuration of a stream route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamRouteConfig {
    /// Open the device before the enable-phase criteria are applied.
    pub require_pre_enable: bool,
    /// Close the device after the disable-phase criteria are applied.
    pub require_post_disable: bool,
    /// Sound card name.
    pub card_name: String,
    /// PCM device index on the card.
    pub device_id: u32,
    /// Channel count.
    pub channels: u32,
    /// Sample rate in Hz.
    pub rate: u32,
    /// Frames per period.
    pub period_size: u32,
    /// Periods in the ring buffer.
    pub period_count: u32,
    /// Sample format.
    pub format: SampleFormat,
    /// Use-case bits this route serves.
    pub applicability_mask: u32,
    /// Silence written on attach, in milliseconds.
    pub silence_prolog_ms: u32,
    /// Per-channel policy, empty for straight copy.
    pub channel_policy: Vec<ChannelPolicy>,
}

impl Default for StreamRouteConfig {
    fn default() -> Self {
        Self {
            require_pre_enable: false,
            require_post_disable: false,
            card_name: String::new(),
            device_id: 0,
            channels: 2,
            rate: 48000,
            period_size: 960,
            period_count: 4,
            format: SampleFormat::S16,
            applicability_mask: 0,
            silence_prolog_ms: 0,
            channel_policy: Vec::new(),
        }
    }
}

impl StreamRouteConfig {
    /// PCM parameters for opening the device.
    pub fn pcm_config(&self) -> PcmConfig {
        PcmConfig {
            channels: self.channels,
            rate: self.rate,
            period_size: self.period_size,
            period_count: self.period_count,
            format: self.format,
        }
    }

    /// Period duration in microseconds, 0 if the rate is unset.
    pub fn period_us(&self) -> u32 {
        if self.rate == 0 {
            return 0;
        }
        (u64::from(self.period_size) * 1_000_000 / u64::from(self.rate)) as u32
    }

    /// Ring buffer duration in microseconds.
    pub fn latency_us(&self) -> u32 {
        self.period_count.saturating_mul(self.period_us())
    }
}

/// The device-owning part of a stream route.
pub struct AudioStreamRoute {
    name: String,
    direction: Direction,
    config: StreamRouteConfig,
    effects_supported: u32,
    current: Option<StreamRef>,
    new: Option<StreamRef>,
    device: Box<dyn AudioDevice>,
}

impl fmt::Debug for AudioStreamRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStreamRoute")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("config", &self.config)
            .field("effects_supported", &self.effects_supported)
            .field("current", &self.current.as_ref().map(|s| s.name().to_owned()))
            .field("new", &self.new.as_ref().map(|s| s.name().to_owned()))
            .field("device_opened", &self.device.is_opened())
            .finish()
    }
}

impl AudioStreamRoute {
    pub(crate) fn new(
        name: impl Into<String>,
        direction: Direction,
        device: Box<dyn AudioDevice>,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            config: StreamRouteConfig::default(),
            effects_supported: 0,
            current: None,
            new: None,
            device,
        }
    }

    /// Device configuration.
    pub fn config(&self) -> &StreamRouteConfig {
        &self.config
    }

    pub(crate) fn update_config(&mut self, config: StreamRouteConfig) {
        self.config = config;
    }

    /// Mask of supported effects.
    pub fn effects_supported(&self) -> u32 {
        self.effects_supported
    }

    pub(crate) fn add_effect_supported(&mut self, effect: Effect) {
        self.effects_supported |= effect.mask();
    }

    /// Stream currently attached.
    pub fn current_stream(&self) -> Option<&StreamRef> {
        self.current.as_ref()
    }

    /// Stream staged for the pass being computed.
    pub fn new_stream(&self) -> Option<&StreamRef> {
        self.new.as_ref()
    }

    /// Whether the device is open.
    pub fn is_device_opened(&self) -> bool {
        self.device.is_opened()
    }

    /// Whether the attached stream differs from the staged one.
    pub fn stream_changes(&self) -> bool {
        !same_slot(self.current.as_ref(), self.new.as_ref())
    }

    /// Use-case and effect match against `stream`. Base applicability and
    /// availability are checked by the owning route.
    pub fn matches(&self, stream: &StreamRef) -> bool {
        let requested = stream.effects_requested();
        stream.applicability_mask() & self.config.applicability_mask != 0
            && self.effects_supported & requested == requested
    }

    /// Stages `stream` as the new stream.
    ///
    /// # Panics
    ///
    /// Panics on a direction mismatch or if a stream is already staged.
    pub(crate) fn set_stream(&mut self, stream: StreamRef) {
        assert_eq!(
            stream.direction(),
            self.direction,
            "stream {} direction does not match route {}",
            stream.name(),
            self.name
        );
        assert!(
            self.new.is_none(),
            "route {} already has a new stream staged",
            self.name
        );
        stream.set_new_stream_route(&self.name);
        self.new = Some(stream);
    }

    pub(crate) fn reset_new_stream(&mut self) {
        if let Some(stream) = self.new.take() {
            stream.reset_new_stream_route();
        }
    }

    /// Enable-phase transition.
    pub(crate) fn route(&mut self, pre_enable: bool) -> Result<(), RouteError> {
        if pre_enable == self.config.require_pre_enable {
            debug!(route = %self.name, card = %self.config.card_name, device = self.config.device_id, "opening device");
            self.device
                .open(
                    &self.config.card_name,
                    self.config.device_id,
                    &self.config.pcm_config(),
                    self.direction,
                )
                .map_err(|source| RouteError::Device {
                    route: self.name.clone(),
                    source,
                })?;
        }
        if !pre_enable {
            if !self.device.is_opened() {
                return Err(RouteError::DeviceNotOpened(self.name.clone()));
            }
            self.attach_new_stream()?;
        }
        Ok(())
    }

    /// Disable-phase transition. Failures are logged and the transition carries on.
    pub(crate) fn unroute(&mut self, post_disable: bool) -> Result<(), RouteError> {
        let mut result = Ok(());
        if !post_disable {
            if self.device.is_opened() {
                self.detach_current_stream();
            } else {
                error!(route = %self.name, "unroute: device not opened");
                result = Err(RouteError::DeviceNotOpened(self.name.clone()));
            }
        }
        if post_disable == self.config.require_post_disable {
            debug!(route = %self.name, "closing device");
            if let Err(source) = self.device.close() {
                error!(route = %self.name, %source, "device close failed");
                result = Err(RouteError::Device {
                    route: self.name.clone(),
                    source,
                });
            }
        }
        result
    }

    /// First half of the configure-phase stream swap: detaches the outgoing
    /// stream. Returns whether the staged stream must be attached afterwards.
    pub(crate) fn release_stream(&mut self) -> Result<bool, RouteError> {
        if !self.stream_changes() {
            return Ok(false);
        }
        if self.current.is_none() {
            // Torn down in the disable phase; enable attaches the new stream.
            return Ok(false);
        }
        if !self.device.is_opened() {
            return Err(RouteError::DeviceNotOpened(self.name.clone()));
        }
        self.detach_current_stream();
        Ok(true)
    }

    /// Second half of the configure-phase stream swap.
    pub(crate) fn attach_staged_stream(&mut self) -> Result<(), RouteError> {
        self.attach_new_stream()
    }

    fn attach_new_stream(&mut self) -> Result<(), RouteError> {
        let Some(stream) = self.new.clone() else {
            warn!(route = %self.name, "no new stream to attach");
            return Ok(());
        };
        debug!(route = %self.name, stream = stream.name(), "attaching stream");
        stream.attach_route(&self.name, &self.config)?;
        self.current = Some(stream);
        Ok(())
    }

    fn detach_current_stream(&mut self) {
        match self.current.take() {
            Some(stream) => {
                debug!(route = %self.name, stream = stream.name(), "detaching stream");
                stream.detach_route();
            }
            None => warn!(route = %self.name, "no current stream to detach"),
        }
    }
}
