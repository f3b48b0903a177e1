//! The static element graph and its blocking propagation.
//!
//! Ports, port groups and routes live in discovery-ordered arenas. The graph
//! owns the propagation rules between them:
//!
//! - claiming a route claims its ports;
//! - claiming a port blocks every other member of each of its groups, and
//!   blocks every other route that could use it, except a route sharing the
//!   claimer's name (the other half of a full-duplex pair);
//! - blocking a port blocks every route that could use it.

use tracing::trace;

use crate::direction::{Direction, PerDirection};
use crate::element::{Availability, ElementMap, PortGroupId, PortId, RouteId, RoutingElement};
use crate::error::RoutingError;
use crate::port::AudioPort;
use crate::port_group::AudioPortGroup;
use crate::route::AudioRoute;
use crate::stream_route::AudioStreamRoute;

/// Maximum routes per direction (width of the route masks).
pub const MAX_ROUTES_PER_DIRECTION: u32 = 32;

/// Element arenas of one engine.
#[derive(Debug, Default)]
pub struct RoutingGraph {
    ports: ElementMap<AudioPort>,
    groups: ElementMap<AudioPortGroup>,
    routes: ElementMap<AudioRoute>,
    route_count: PerDirection<u32>,
}

impl RoutingGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// Declares a port.
    pub fn add_port(&mut self, name: &str) -> Result<PortId, RoutingError> {
        self.ports
            .insert(name, AudioPort::new(name))
            .map(PortId::from_index)
            .ok_or_else(|| RoutingError::duplicate(AudioPort::KIND, name))
    }

    /// Adds `member` to group `name`, creating the group on first use.
    pub fn add_port_group(&mut self, name: &str, member: &str) -> Result<PortGroupId, RoutingError> {
        let port = self
            .port_id(member)
            .ok_or_else(|| RoutingError::not_found(AudioPort::KIND, member))?;
        let group = match self.groups.position(name) {
            Some(slot) => PortGroupId::from_index(slot),
            None => {
                let slot = self
                    .groups
                    .insert(name, AudioPortGroup::new(name))
                    .ok_or_else(|| RoutingError::duplicate(AudioPortGroup::KIND, name))?;
                PortGroupId::from_index(slot)
            }
        };
        self.groups.get_mut(group.index()).add_member(port);
        self.ports.get_mut(port.index()).add_group(group);
        Ok(group)
    }

    /// Declares a route between up to two ports. Empty port names mean no
    /// port. The route gets the next free bit of its direction.
    pub fn add_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
        stream: Option<AudioStreamRoute>,
    ) -> Result<RouteId, RoutingError> {
        let key = route_key(name, direction);
        if self.routes.contains(&key) {
            return Err(RoutingError::duplicate(AudioRoute::KIND, key));
        }
        let count = self.route_count[direction];
        if count >= MAX_ROUTES_PER_DIRECTION {
            return Err(RoutingError::RouteTableFull { direction });
        }
        let mut ports = Vec::with_capacity(2);
        for port in [source, destination] {
            if port.is_empty() {
                continue;
            }
            ports.push(
                self.port_id(port)
                    .ok_or_else(|| RoutingError::not_found(AudioPort::KIND, port))?,
            );
        }

        let mut route = AudioRoute::new(name, direction, 1 << count);
        if let Some(stream) = stream {
            route = route.with_stream(stream);
        }
        for &port in &ports {
            route.add_port(port);
        }
        let slot = self
            .routes
            .insert(key.clone(), route)
            .ok_or_else(|| RoutingError::duplicate(AudioRoute::KIND, key))?;
        let id = RouteId::from_index(slot);
        for port in ports {
            self.ports.get_mut(port.index()).add_potential_user(id);
        }
        self.route_count[direction] = count + 1;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Port id by name.
    pub fn port_id(&self, name: &str) -> Option<PortId> {
        self.ports.position(name).map(PortId::from_index)
    }

    /// Group id by name.
    pub fn port_group_id(&self, name: &str) -> Option<PortGroupId> {
        self.groups.position(name).map(PortGroupId::from_index)
    }

    /// Route id by key (`<name>_Playback` / `<name>_Capture`).
    pub fn route_id(&self, key: &str) -> Option<RouteId> {
        self.routes.position(key).map(RouteId::from_index)
    }

    /// Route id by name and direction.
    pub fn find_route(&self, name: &str, direction: Direction) -> Option<RouteId> {
        self.route_id(&route_key(name, direction))
    }

    /// Port by id.
    pub fn port(&self, id: PortId) -> &AudioPort {
        self.ports.get(id.index())
    }

    /// Group by id.
    pub fn port_group(&self, id: PortGroupId) -> &AudioPortGroup {
        self.groups.get(id.index())
    }

    /// Route by id.
    pub fn route(&self, id: RouteId) -> &AudioRoute {
        self.routes.get(id.index())
    }

    pub(crate) fn route_mut(&mut self, id: RouteId) -> &mut AudioRoute {
        self.routes.get_mut(id.index())
    }

    /// Element key of a route.
    pub fn route_key(&self, id: RouteId) -> &str {
        self.routes.key(id.index())
    }

    /// Ports in discovery order.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, &AudioPort)> {
        self.ports
            .iter()
            .enumerate()
            .map(|(i, p)| (PortId::from_index(i), p))
    }

    /// Groups in discovery order.
    pub fn port_groups(&self) -> impl Iterator<Item = (PortGroupId, &AudioPortGroup)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (PortGroupId::from_index(i), g))
    }

    /// Routes in discovery order.
    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &AudioRoute)> {
        self.routes
            .iter()
            .enumerate()
            .map(|(i, r)| (RouteId::from_index(i), r))
    }

    /// Route ids in discovery order.
    pub fn route_ids(&self) -> impl Iterator<Item = RouteId> + use<> {
        (0..self.routes.len()).map(RouteId::from_index)
    }

    /// Number of routes in `direction`.
    pub fn route_count(&self, direction: Direction) -> u32 {
        self.route_count[direction]
    }

    /// Name of the route owning bit `mask` in `direction`.
    pub fn route_name_for_bit(&self, direction: Direction, mask: u32) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.direction() == direction && r.mask() == mask)
            .map(RoutingElement::name)
    }

    /// Literal form of a route mask: route names joined with `|`.
    pub fn format_route_mask(&self, direction: Direction, mask: u32) -> String {
        let names: Vec<&str> = self
            .routes
            .iter()
            .filter(|r| r.direction() == direction && mask & r.mask() != 0)
            .map(RoutingElement::name)
            .collect();
        if names.is_empty() {
            "none".to_owned()
        } else {
            names.join("|")
        }
    }

    // ------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------

    /// Clears the per-pass state: routes first, then ports. Ports blocked by
    /// an external rule block their routes again.
    pub fn reset_availability(&mut self) {
        self.routes.reset_availability();
        self.ports.reset_availability();
        for slot in 0..self.ports.len() {
            if self.ports.get(slot).rule_blocked {
                self.block_port(PortId::from_index(slot));
            }
        }
    }

    /// Sets or clears the external block of a port. Blocking takes effect
    /// immediately; clearing takes effect at the next reset.
    pub fn set_port_blocked(&mut self, id: PortId, blocked: bool) {
        let port = self.ports.get_mut(id.index());
        if port.rule_blocked == blocked {
            return;
        }
        port.rule_blocked = blocked;
        if blocked {
            self.block_port(id);
        }
    }

    /// Blocks a port and every route that could use it.
    pub fn block_port(&mut self, id: PortId) {
        let port = self.ports.get_mut(id.index());
        if port.blocked {
            return;
        }
        port.blocked = true;
        trace!(port = port.name(), "port blocked");
        let users = port.potential_users.clone();
        for route in users {
            self.routes.get_mut(route.index()).set_blocked();
        }
    }

    /// Marks a route used (or evaluated but unused) for this pass and
    /// propagates the claim to its ports.
    ///
    /// # Panics
    ///
    /// Panics if `used` is set on a blocked route.
    pub fn use_route(&mut self, id: RouteId, used: bool) {
        if !self.routes.get_mut(id.index()).set_used(used) {
            return;
        }
        let ports = self.route(id).ports().to_vec();
        for port in ports {
            self.claim_port(port, id);
        }
    }

    fn claim_port(&mut self, id: PortId, route: RouteId) {
        let direction = self.route(route).direction();
        let port = self.ports.get_mut(id.index());
        if port.used {
            port.attached[direction].get_or_insert(route);
            return;
        }
        port.used = true;
        port.attached[direction] = Some(route);
        trace!(port = port.name(), route = %route, "port claimed");

        let groups = port.groups.clone();
        let users = port.potential_users.clone();
        for group in groups {
            let others: Vec<PortId> = self
                .groups
                .get(group.index())
                .mutually_exclusive_with(id)
                .collect();
            for other in others {
                self.block_port(other);
            }
        }

        let claimer = self.routes.get(route.index()).name().to_owned();
        for user in users {
            if user == route {
                continue;
            }
            let candidate = self.routes.get_mut(user.index());
            if candidate.name() != claimer {
                candidate.set_blocked();
            }
        }
    }
}

/// Element key of a route: name plus direction suffix.
pub fn route_key(name: &str, direction: Direction) -> String {
    format!("{name}{}", direction.key_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ports A, B in group G; routes RA (A) and RB (B), both outputs.
    fn grouped() -> (RoutingGraph, RouteId, RouteId) {
        let mut g = RoutingGraph::new();
        g.add_port("A").unwrap();
        g.add_port("B").unwrap();
        g.add_port_group("G", "A").unwrap();
        g.add_port_group("G", "B").unwrap();
        let ra = g.add_route("RA", "A", "", Direction::Output, None).unwrap();
        let rb = g.add_route("RB", "", "B", Direction::Output, None).unwrap();
        (g, ra, rb)
    }

    #[test]
    fn route_bits_follow_discovery_order_per_direction() {
        let mut g = RoutingGraph::new();
        let a = g.add_route("A", "", "", Direction::Output, None).unwrap();
        let b = g.add_route("B", "", "", Direction::Input, None).unwrap();
        let c = g.add_route("C", "", "", Direction::Output, None).unwrap();
        assert_eq!(g.route(a).mask(), 1);
        assert_eq!(g.route(b).mask(), 1);
        assert_eq!(g.route(c).mask(), 2);
        assert_eq!(g.route_key(c), "C_Playback");
        assert_eq!(g.find_route("B", Direction::Input), Some(b));
        assert_eq!(g.format_route_mask(Direction::Output, 3), "A|C");
        assert_eq!(g.format_route_mask(Direction::Input, 0), "none");
    }

    #[test]
    fn same_name_allowed_once_per_direction() {
        let mut g = RoutingGraph::new();
        g.add_route("Voice", "", "", Direction::Output, None).unwrap();
        g.add_route("Voice", "", "", Direction::Input, None).unwrap();
        let err = g
            .add_route("Voice", "", "", Direction::Input, None)
            .unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateElement { .. }));
    }

    #[test]
    fn unknown_port_rejected() {
        let mut g = RoutingGraph::new();
        let err = g
            .add_route("Media", "SSP9", "", Direction::Output, None)
            .unwrap_err();
        assert!(matches!(err, RoutingError::NotFound { kind: "port", .. }));
        assert!(g.add_port_group("G", "SSP9").is_err());
    }

    #[test]
    fn route_table_is_limited_to_32_per_direction() {
        let mut g = RoutingGraph::new();
        for i in 0..32 {
            g.add_route(&format!("R{i}"), "", "", Direction::Output, None)
                .unwrap();
        }
        assert!(matches!(
            g.add_route("R32", "", "", Direction::Output, None),
            Err(RoutingError::RouteTableFull { .. })
        ));
        assert!(g.add_route("R32", "", "", Direction::Input, None).is_ok());
    }

    #[test]
    fn claiming_a_port_blocks_group_members_and_their_routes() {
        let (mut g, ra, rb) = grouped();
        g.use_route(ra, true);
        let b = g.port_id("B").unwrap();
        let a = g.port_id("A").unwrap();
        assert!(g.port(a).is_used());
        assert_eq!(g.port(a).attached_route(Direction::Output), Some(ra));
        assert!(g.port(b).is_blocked());
        assert!(!g.route(rb).available());
    }

    #[test]
    fn full_duplex_pair_shares_a_port() {
        let mut g = RoutingGraph::new();
        g.add_port("Modem").unwrap();
        let out = g.add_route("Voice", "Modem", "", Direction::Output, None).unwrap();
        let inp = g.add_route("Voice", "Modem", "", Direction::Input, None).unwrap();
        let other = g.add_route("Fm", "Modem", "", Direction::Output, None).unwrap();
        g.use_route(out, true);
        assert!(g.route(inp).available());
        assert!(!g.route(other).available());
        g.use_route(inp, true);
        let modem = g.port_id("Modem").unwrap();
        assert_eq!(g.port(modem).attached_route(Direction::Input), Some(inp));
    }

    #[test]
    fn rule_block_survives_reset_until_cleared() {
        let (mut g, ra, _) = grouped();
        let a = g.port_id("A").unwrap();
        g.set_port_blocked(a, true);
        assert!(g.route(ra).is_blocked());
        g.reset_availability();
        assert!(g.route(ra).is_blocked());

        g.set_port_blocked(a, false);
        // still blocked for the ongoing pass
        assert!(g.route(ra).is_blocked());
        g.reset_availability();
        assert!(!g.route(ra).is_blocked());
    }

    #[test]
    #[should_panic(expected = "is blocked")]
    fn using_a_blocked_route_is_fatal() {
        let (mut g, ra, rb) = grouped();
        g.use_route(ra, true);
        g.use_route(rb, true);
    }
}
