//! Hardware access points.

use crate::direction::{Direction, PerDirection};
use crate::element::{Availability, PortGroupId, RouteId, RoutingElement};

/// A named hardware access point (SSP bus, codec interface, modem link).
///
/// A port is owned by at most one route per direction at a time. Blocking and
/// ownership propagation across groups and routes is driven by
/// [`RoutingGraph`](crate::RoutingGraph); the port itself only records state.
#[derive(Debug, Clone)]
pub struct AudioPort {
    name: String,
    pub(crate) blocked: bool,
    pub(crate) rule_blocked: bool,
    pub(crate) used: bool,
    pub(crate) attached: PerDirection<Option<RouteId>>,
    pub(crate) groups: Vec<PortGroupId>,
    pub(crate) potential_users: Vec<RouteId>,
}

impl AudioPort {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocked: false,
            rule_blocked: false,
            used: false,
            attached: PerDirection::default(),
            groups: Vec::new(),
            potential_users: Vec::new(),
        }
    }

    /// Whether the port is blocked for the current pass, either by an
    /// external rule or by a mutually exclusive port in use.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Whether an external rule currently blocks this port.
    pub fn is_rule_blocked(&self) -> bool {
        self.rule_blocked
    }

    /// Whether a route owns the port in the current pass.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Route owning the port for `dir`, if any.
    pub fn attached_route(&self, dir: Direction) -> Option<RouteId> {
        self.attached[dir]
    }

    /// Groups this port belongs to, in discovery order.
    pub fn groups(&self) -> &[PortGroupId] {
        &self.groups
    }

    /// Routes that declare this port.
    pub fn potential_users(&self) -> &[RouteId] {
        &self.potential_users
    }

    pub(crate) fn add_group(&mut self, group: PortGroupId) {
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
    }

    pub(crate) fn add_potential_user(&mut self, route: RouteId) {
        if !self.potential_users.contains(&route) {
            self.potential_users.push(route);
        }
    }
}

impl RoutingElement for AudioPort {
    const KIND: &'static str = "port";

    fn name(&self) -> &str {
        &self.name
    }
}

impl Availability for AudioPort {
    fn reset_availability(&mut self) {
        self.used = false;
        self.attached = PerDirection::default();
        self.blocked = false;
    }
}
