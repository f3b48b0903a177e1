//! Routes: directed edges between ports.

use crate::direction::Direction;
use crate::element::{Availability, PortId, RoutingElement};
use crate::stream_route::AudioStreamRoute;

/// Routing stages a route may ask to have re-run.
///
/// Same bit layout as the `RoutageState` criterion: Flow = 1, Path = 2,
/// Configure = 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageMask(u8);

impl StageMask {
    /// No stage.
    pub const NONE: Self = Self(0);
    /// Mute / unmute.
    pub const FLOW: Self = Self(1 << 0);
    /// Disable / enable.
    pub const PATH: Self = Self(1 << 1);
    /// Reset / set configuration.
    pub const CONFIGURE: Self = Self(1 << 2);
    /// All three stages.
    pub const ALL: Self = Self(0b111);

    /// Literal names of each bit, in bit order.
    pub const LITERALS: [(&'static str, u32); 3] = [("Flow", 1), ("Path", 2), ("Configure", 4)];

    /// Returns `true` if all bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two masks.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Numeric value as pushed to the stage criterion.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0 as u32
    }
}

impl core::ops::BitOr for StageMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for StageMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A named route between up to two ports, in one direction.
///
/// Plain routes are switched purely through criteria. Stream routes
/// additionally own a device binding and carry an [`AudioStreamRoute`].
#[derive(Debug)]
pub struct AudioRoute {
    name: String,
    direction: Direction,
    mask: u32,
    ports: Vec<PortId>,
    pub(crate) used: bool,
    pub(crate) previously_used: bool,
    pub(crate) blocked: bool,
    applicable: bool,
    pending: StageMask,
    requested: StageMask,
    rolled_over: bool,
    pub(crate) stream: Option<Box<AudioStreamRoute>>,
}

impl AudioRoute {
    pub(crate) fn new(name: impl Into<String>, direction: Direction, mask: u32) -> Self {
        Self {
            name: name.into(),
            direction,
            mask,
            ports: Vec::with_capacity(2),
            used: false,
            previously_used: false,
            blocked: false,
            applicable: false,
            pending: StageMask::NONE,
            requested: StageMask::NONE,
            rolled_over: false,
            stream: None,
        }
    }

    pub(crate) fn with_stream(mut self, stream: AudioStreamRoute) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }

    pub(crate) fn add_port(&mut self, port: PortId) {
        debug_assert!(self.ports.len() < 2, "route {} already has two ports", self.name);
        self.ports.push(port);
    }

    /// Route direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` for a playback route.
    pub fn is_out(&self) -> bool {
        self.direction.is_out()
    }

    /// Single-bit mask of this route within its direction.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Ports protected by this route (0, 1 or 2).
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Whether this route carries a device binding.
    pub fn is_stream_route(&self) -> bool {
        self.stream.is_some()
    }

    /// Stream route part, for stream routes.
    pub fn stream_route(&self) -> Option<&AudioStreamRoute> {
        self.stream.as_deref()
    }

    pub(crate) fn stream_route_mut(&mut self) -> Option<&mut AudioStreamRoute> {
        self.stream.as_deref_mut()
    }

    /// Applicability as set by the external rules.
    pub fn is_applicable(&self) -> bool {
        !self.blocked && self.applicable
    }

    /// Not blocked and not yet claimed in this pass.
    pub fn available(&self) -> bool {
        !self.blocked && !self.used
    }

    /// Whether the route is used in the current pass.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Whether the route was used in the previous pass.
    pub fn previously_used(&self) -> bool {
        self.previously_used
    }

    /// Whether the route is blocked in the current pass.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Stage requests waiting for the next pass.
    pub fn pending_stages(&self) -> StageMask {
        self.pending
    }

    /// Stage requests consumed by the current pass.
    pub fn requested_stages(&self) -> StageMask {
        self.requested
    }

    pub(crate) fn set_applicable(&mut self, applicable: bool) {
        self.applicable = applicable;
    }

    /// Requests mute/unmute and reconfiguration on the next pass.
    pub(crate) fn set_need_reconfigure(&mut self, need: bool) {
        if need {
            self.pending |= StageMask::FLOW | StageMask::CONFIGURE;
        }
    }

    /// Requests disable/enable and reconfiguration on the next pass.
    pub(crate) fn set_need_reroute(&mut self, need: bool) {
        if need {
            self.pending |= StageMask::PATH | StageMask::CONFIGURE;
        }
    }

    pub(crate) fn set_blocked(&mut self) {
        self.blocked = true;
    }

    /// Marks the route used. Returns `true` on the first claim of the pass,
    /// in which case the caller must claim the route's ports.
    ///
    /// # Panics
    ///
    /// Panics when claiming a blocked route: applicability must have excluded it.
    pub(crate) fn set_used(&mut self, used: bool) -> bool {
        self.rolled_over = false;
        if !used {
            return false;
        }
        assert!(
            !self.blocked,
            "route {}{} is blocked and cannot be used",
            self.name,
            self.direction.key_suffix()
        );
        if self.used {
            return false;
        }
        self.used = true;
        true
    }

    /// Previously used, still used, and either a mute-level stage was
    /// requested or the bound stream changes.
    pub fn need_reflow(&self) -> bool {
        let stream_swap = self
            .stream
            .as_deref()
            .is_some_and(AudioStreamRoute::stream_changes);
        self.previously_used
            && self.used
            && (self.requested.intersects(StageMask::FLOW | StageMask::PATH) || stream_swap)
    }

    /// Newly used, or still used with a path-level stage requested.
    pub fn need_repath(&self) -> bool {
        self.used
            && (!self.previously_used
                || self
                    .requested
                    .intersects(StageMask::PATH | StageMask::CONFIGURE))
    }
}

impl RoutingElement for AudioRoute {
    const KIND: &'static str = "route";

    fn name(&self) -> &str {
        &self.name
    }
}

impl Availability for AudioRoute {
    fn reset_availability(&mut self) {
        // Usage and stage requests roll over once per evaluation.
        if !self.rolled_over {
            self.rolled_over = true;
            self.previously_used = self.used;
            self.requested = core::mem::take(&mut self.pending);
        }
        if let Some(stream) = self.stream.as_deref_mut() {
            stream.reset_new_stream();
        }
        self.blocked = false;
        self.used = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> AudioRoute {
        AudioRoute::new("Media", Direction::Output, 1)
    }

    #[test]
    fn stage_mask_ops() {
        let m = StageMask::FLOW | StageMask::CONFIGURE;
        assert!(m.contains(StageMask::FLOW));
        assert!(!m.contains(StageMask::PATH));
        assert!(m.intersects(StageMask::PATH | StageMask::FLOW));
        assert_eq!(m.bits(), 5);
        assert_eq!(StageMask::ALL.bits(), 7);
        assert!(StageMask::default().is_empty());
    }

    #[test]
    fn applicability_and_availability() {
        let mut r = route();
        assert!(!r.is_applicable());
        r.set_applicable(true);
        assert!(r.is_applicable());
        assert!(r.available());
        r.set_blocked();
        assert!(!r.is_applicable());
        assert!(!r.available());
    }

    #[test]
    fn set_used_reports_first_claim_only() {
        let mut r = route();
        assert!(!r.set_used(false));
        assert!(r.set_used(true));
        assert!(!r.set_used(true));
        assert!(r.is_used());
    }

    #[test]
    #[should_panic(expected = "Media_Playback is blocked")]
    fn using_blocked_route_panics() {
        let mut r = route();
        r.set_blocked();
        r.set_used(true);
    }

    #[test]
    fn reset_rolls_usage_and_consumes_requests() {
        let mut r = route();
        r.set_blocked();
        r.set_need_reroute(true);
        r.reset_availability();
        assert!(!r.is_blocked());
        assert_eq!(r.requested_stages(), StageMask::PATH | StageMask::CONFIGURE);
        assert!(r.pending_stages().is_empty());

        r.set_used(true);
        r.reset_availability();
        assert!(r.previously_used());
        assert!(!r.is_used());
        assert!(r.requested_stages().is_empty());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut r = route();
        r.set_used(true);
        r.set_need_reroute(true);
        r.reset_availability();
        r.reset_availability();
        assert!(r.previously_used());
        assert!(!r.is_used());
        assert!(r.requested_stages().contains(StageMask::PATH));

        r.set_used(false);
        r.reset_availability();
        assert!(!r.previously_used());
    }

    #[test]
    fn every_reset_clears_blocking() {
        let mut r = route();
        r.reset_availability();
        r.set_blocked();
        r.reset_availability();
        assert!(!r.is_blocked());
        assert!(r.available());
    }

    #[test]
    fn reflow_and_repath_predicates() {
        let mut r = route();
        r.set_used(true);
        // newly used
        assert!(r.need_repath());
        assert!(!r.need_reflow());

        r.reset_availability();
        r.set_used(true);
        // steady state
        assert!(!r.need_repath());
        assert!(!r.need_reflow());

        r.set_need_reconfigure(true);
        r.reset_availability();
        r.set_used(true);
        assert!(r.need_reflow());
        assert!(r.need_repath());

        r.reset_availability();
        // dropped
        assert!(!r.need_reflow());
        assert!(!r.need_repath());
    }
}
