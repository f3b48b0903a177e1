//! Sets of mutually exclusive ports.

use crate::element::{PortId, RoutingElement};

/// A named set of ports of which at most one may be used at a time.
///
/// Membership is fixed after discovery. A port may belong to several groups.
#[derive(Debug, Clone)]
pub struct AudioPortGroup {
    name: String,
    members: Vec<PortId>,
}

impl AudioPortGroup {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Member ports, in discovery order.
    pub fn members(&self) -> &[PortId] {
        &self.members
    }

    /// Returns `true` if `port` is a member.
    pub fn contains(&self, port: PortId) -> bool {
        self.members.contains(&port)
    }

    pub(crate) fn add_member(&mut self, port: PortId) -> bool {
        if self.contains(port) {
            return false;
        }
        self.members.push(port);
        true
    }

    /// Members that must be blocked when `port` is claimed.
    pub fn mutually_exclusive_with(&self, port: PortId) -> impl Iterator<Item = PortId> + '_ {
        self.members.iter().copied().filter(move |&m| m != port)
    }
}

impl RoutingElement for AudioPortGroup {
    const KIND: &'static str = "port group";

    fn name(&self) -> &str {
        &self.name
    }
}
