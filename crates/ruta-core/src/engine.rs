//! The routing engine: element ownership and the 5-phase routing protocol.
//!
//! Each call to [`RoutingEngine::reconsider_routing`] re-derives routing from
//! scratch:
//!
//! 1. reset the per-pass state of every route and port;
//! 2. walk the routes in discovery order, bind streams to stream routes
//!    (first started stream in list order wins), claim used routes and
//!    compute the `enabled`, `need_reflow` and `need_repath` masks;
//! 3. if nothing changed, commit every criterion and apply once;
//! 4. otherwise run Mute, Disable, Configure, Enable and Unmute, each phase
//!    setting the routing stage and route criteria and applying them.
//!
//! Device transitions straddle the backend apply of their phase: streams
//! are detached before the disable apply and devices closed after it;
//! devices are opened before the enable apply and streams attached after it.

use tracing::{debug, error, info, trace, warn};

use crate::backend::{CriterionBackend, ParameterValue};
use crate::criterion::{Criterion, CriterionType, CriterionValue};
use crate::device::DeviceFactory;
use crate::direction::{Direction, PerDirection};
use crate::element::{ElementMap, RouteId, RoutingElement};
use crate::error::{RouteError, RoutingError};
use crate::graph::RoutingGraph;
use crate::interface::RouteInterface;
use crate::report::{Phase, RouteFailure, RouteMasks, RoutingAction, RoutingReport};
use crate::route::{AudioRoute, StageMask};
use crate::stream::{StreamRef, same_stream};
use crate::stream_route::{AudioStreamRoute, Effect, StreamRouteConfig};

/// Backend parameter holding the voice volume.
pub const VOICE_VOLUME_PARAMETER: &str = "/Audio/CONFIGURATION/VOICE_VOLUME_CTRL_PARAMETER";

/// Criterion carrying the current routing stage.
pub const ROUTING_STAGE_CRITERION: &str = "RoutageState";

/// Default output flag used by latency queries (primary output).
pub const OUTPUT_FLAG_PRIMARY: u32 = 0x2;

/// Default input mask used by latency queries (`1 << default source`).
pub const INPUT_SOURCE_DEFAULT_MASK: u32 = 1 << 0;

/// Inclusive criterion type listing the routes of a direction.
pub const fn route_criterion_type(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => "RouteCaptureType",
        Direction::Output => "RoutePlaybackType",
    }
}

/// Criterion listing the routes being closed in the current stage.
pub const fn closing_routes_criterion(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => "ClosingCaptureRoutes",
        Direction::Output => "ClosingPlaybackRoutes",
    }
}

/// Criterion listing the routes open in the current stage.
pub const fn opened_routes_criterion(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => "OpenedCaptureRoutes",
        Direction::Output => "OpenedPlaybackRoutes",
    }
}

/// Owner of the routing graph, the criteria and the collaborator bindings.
pub struct RoutingEngine {
    graph: RoutingGraph,
    criterion_types: ElementMap<CriterionType>,
    criteria: ElementMap<Criterion>,
    streams: PerDirection<Vec<StreamRef>>,
    masks: PerDirection<RouteMasks>,
    backend: Box<dyn CriterionBackend>,
    devices: Box<dyn DeviceFactory>,
}

impl core::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("graph", &self.graph)
            .field("criteria", &self.criteria)
            .field("masks", &self.masks)
            .field("backend_started", &self.backend.is_started())
            .finish_non_exhaustive()
    }
}

impl RoutingEngine {
    /// Creates an engine bound to a criterion backend and a device factory.
    ///
    /// The route criterion types, the opened/closing route criteria and the
    /// routing stage criterion exist from the start; the stage criterion
    /// starts at `Configure|Path|Flow` so the first apply sets everything.
    pub fn new(backend: Box<dyn CriterionBackend>, devices: Box<dyn DeviceFactory>) -> Self {
        let mut engine = Self {
            graph: RoutingGraph::new(),
            criterion_types: ElementMap::new(),
            criteria: ElementMap::new(),
            streams: PerDirection::default(),
            masks: PerDirection::default(),
            backend,
            devices,
        };

        for dir in Direction::ALL {
            let type_name = route_criterion_type(dir);
            engine
                .criterion_types
                .insert(type_name, CriterionType::new(type_name, true));
            for name in [opened_routes_criterion(dir), closing_routes_criterion(dir)] {
                engine
                    .criteria
                    .insert(name, Criterion::new(name, type_name, 0));
            }
        }

        let mut stage = CriterionType::new(ROUTING_STAGE_CRITERION, true);
        for (literal, value) in StageMask::LITERALS {
            stage.add_value_pair(literal, value);
        }
        engine.criterion_types.insert(ROUTING_STAGE_CRITERION, stage);
        engine.criteria.insert(
            ROUTING_STAGE_CRITERION,
            Criterion::new(
                ROUTING_STAGE_CRITERION,
                ROUTING_STAGE_CRITERION,
                StageMask::ALL.bits(),
            ),
        );
        engine
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The element graph.
    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    /// Masks computed by the last pass.
    pub fn masks(&self, direction: Direction) -> RouteMasks {
        self.masks[direction]
    }

    /// Streams registered for `direction`, in registration order.
    pub fn streams(&self, direction: Direction) -> &[StreamRef] {
        &self.streams[direction]
    }

    /// Criterion types in declaration order.
    pub fn criterion_types(&self) -> impl Iterator<Item = &CriterionType> {
        self.criterion_types.iter()
    }

    /// Criteria in declaration order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    /// Whether the criterion backend runs (configuration is frozen).
    pub fn is_backend_started(&self) -> bool {
        self.backend.is_started()
    }

    fn ensure_configurable(&self, operation: &'static str) -> Result<(), RoutingError> {
        if self.backend.is_started() {
            warn!(operation, "not allowed while the criterion backend is running");
            return Err(RoutingError::ConfigurationFrozen { operation });
        }
        Ok(())
    }

    fn route_by_key(&self, key: &str) -> Result<RouteId, RoutingError> {
        self.graph
            .route_id(key)
            .ok_or_else(|| RoutingError::not_found("route", key))
    }

    fn stream_route_mut(&mut self, key: &str) -> Result<&mut AudioStreamRoute, RoutingError> {
        let id = self.route_by_key(key)?;
        self.graph
            .route_mut(id)
            .stream_route_mut()
            .ok_or_else(|| RoutingError::not_found("stream route", key))
    }

    // ------------------------------------------------------------------
    // Backend lifecycle
    // ------------------------------------------------------------------

    /// Declares every criterion type, value pair and criterion to the
    /// backend, then starts it. Does nothing if the backend already runs.
    pub fn start_backend(&mut self) -> Result<(), RoutingError> {
        if self.backend.is_started() {
            debug!("criterion backend already started, bailing out");
            return Ok(());
        }
        for ty in self.criterion_types.iter() {
            self.backend
                .declare_criterion_type(ty.name(), ty.is_inclusive());
            for (literal, value) in ty.value_pairs() {
                self.backend.declare_value_pair(ty.name(), literal, *value);
            }
        }
        for criterion in self.criteria.iter() {
            self.backend.declare_criterion(
                criterion.name(),
                criterion.type_name(),
                criterion.value(),
            );
        }
        self.backend.start().map_err(|err| {
            error!(%err, "criterion backend start failed");
            RoutingError::from(err)
        })?;
        info!(
            routes = self.graph.routes().count(),
            criteria = self.criteria.len(),
            "criterion backend started"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------

    /// Registers a stream at the end of its direction's list.
    pub fn add_stream(&mut self, stream: StreamRef) {
        debug!(stream = stream.name(), direction = %stream.direction(), "stream added");
        self.streams[stream.direction()].push(stream);
    }

    /// Unregisters a stream. Returns `false` if it was not registered.
    pub fn remove_stream(&mut self, stream: &StreamRef) -> bool {
        let list = &mut self.streams[stream.direction()];
        let before = list.len();
        list.retain(|s| !same_stream(s, stream));
        let removed = list.len() != before;
        if removed {
            debug!(stream = stream.name(), "stream removed");
        }
        removed
    }

    /// First registered output stream, used as echo reference.
    pub fn voice_output_stream(&self) -> Option<StreamRef> {
        let stream = self.streams.output.first().cloned();
        if stream.is_none() {
            error!("voice output stream not found");
        }
        stream
    }

    // ------------------------------------------------------------------
    // Criteria and parameters
    // ------------------------------------------------------------------

    /// Sets the pending value of a criterion; pushed at the next commit.
    /// Returns `true` if the value changed.
    pub fn set_criterion(
        &mut self,
        name: &str,
        value: impl Into<CriterionValue>,
    ) -> Result<bool, RoutingError> {
        let slot = self
            .criteria
            .position(name)
            .ok_or_else(|| RoutingError::not_found(Criterion::KIND, name))?;
        let type_name = self.criteria.get(slot).type_name();
        let ty = self.criterion_types.expect(type_name);
        let numeric = match value.into() {
            CriterionValue::Numeric(v) => ty.check_numeric(v)?,
            CriterionValue::Literal(l) => ty.numerical_value(&l)?,
        };
        trace!(criterion = name, value = numeric, "criterion set");
        Ok(self.criteria.get_mut(slot).set_value(numeric))
    }

    /// Formatted value of a criterion.
    pub fn criterion(&self, name: &str) -> Option<String> {
        let Some(criterion) = self.criteria.find(name) else {
            warn!(criterion = name, "criterion does not exist");
            return None;
        };
        let ty = self.criterion_types.expect(criterion.type_name());
        Some(ty.formatted_state(criterion.value()))
    }

    /// Numeric value of a criterion.
    pub fn criterion_value(&self, name: &str) -> Option<u32> {
        self.criteria.find(name).map(Criterion::value)
    }

    /// Writes a backend parameter.
    pub fn set_audio_parameter(
        &mut self,
        path: &str,
        value: ParameterValue,
    ) -> Result<(), RoutingError> {
        self.backend.set_parameter(path, value).map_err(|err| {
            warn!(path, %err, "parameter write failed");
            RoutingError::from(err)
        })
    }

    /// Reads a backend parameter.
    pub fn audio_parameter(&self, path: &str) -> Result<ParameterValue, RoutingError> {
        Ok(self.backend.parameter(path)?)
    }

    /// Sets the voice volume, `gain` in `[0.0, 1.0]`.
    pub fn set_voice_volume(&mut self, gain: f32) -> Result<(), RoutingError> {
        if !(0.0..=1.0).contains(&gain) {
            warn!(gain, "voice volume out of range [0.0 .. 1.0]");
            return Err(RoutingError::VolumeOutOfRange(gain));
        }
        debug!(gain, "voice volume");
        self.backend
            .set_parameter(VOICE_VOLUME_PARAMETER, ParameterValue::Double(f64::from(gain)))
            .map_err(|err| {
                error!(%err, "unable to set voice volume");
                RoutingError::from(err)
            })
    }

    // ------------------------------------------------------------------
    // Latency
    // ------------------------------------------------------------------

    fn find_matching_route(&self, direction: Direction, flags: u32) -> Option<&AudioStreamRoute> {
        let mask = match (flags, direction) {
            (0, Direction::Output) => OUTPUT_FLAG_PRIMARY,
            (0, Direction::Input) => INPUT_SOURCE_DEFAULT_MASK,
            (flags, _) => flags,
        };
        self.graph
            .routes()
            .filter(|(_, r)| r.direction() == direction)
            .filter_map(|(_, r)| r.stream_route())
            .find(|sr| sr.config().applicability_mask & mask != 0)
    }

    /// Period of the first stream route matching `flags`, in µs; 0 if none.
    pub fn period_us(&self, direction: Direction, flags: u32) -> u32 {
        match self.find_matching_route(direction, flags) {
            Some(route) => route.config().period_us(),
            None => {
                error!(%direction, flags, "no route found, audio might not be functional");
                0
            }
        }
    }

    /// Latency of the first stream route matching `flags`, in µs; 0 if none.
    pub fn latency_us(&self, direction: Direction, flags: u32) -> u32 {
        match self.find_matching_route(direction, flags) {
            Some(route) => route.config().latency_us(),
            None => {
                error!(%direction, flags, "no route found, audio might not be functional");
                0
            }
        }
    }

    // ------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------

    /// Runs one reconsideration pass.
    pub fn reconsider_routing(&mut self) -> RoutingReport {
        let mut report = RoutingReport::default();
        report.changed = self.check_and_prepare_routing();
        report.masks = self.masks;

        if !report.changed {
            // Criteria may still carry glitch-free tuning changes.
            self.commit_criteria_and_apply(&mut report);
            return report;
        }

        for (dir, m) in self.masks.iter() {
            debug!(
                direction = %dir,
                previously_enabled = %self.graph.format_route_mask(dir, m.prev_enabled),
                enabled = %self.graph.format_route_mask(dir, m.enabled),
                need_reflow = %self.graph.format_route_mask(dir, m.need_reflow),
                need_repath = %self.graph.format_route_mask(dir, m.need_repath),
                "route state"
            );
        }
        self.execute_routing(&mut report);
        debug!(actions = report.actions.len(), failures = report.failures.len(), "routing done");
        report
    }

    fn reset_routing(&mut self) {
        for dir in Direction::ALL {
            let m = &mut self.masks[dir];
            *m = RouteMasks {
                prev_enabled: m.enabled,
                ..RouteMasks::default()
            };
        }
        self.graph.reset_availability();
    }

    /// Resets and recomputes the route masks. Returns whether routing changed.
    fn check_and_prepare_routing(&mut self) -> bool {
        self.reset_routing();

        let ids: Vec<RouteId> = self.graph.route_ids().collect();
        for id in ids {
            let applicable = if self.graph.route(id).is_stream_route() {
                self.set_stream_for_route(id)
            } else {
                self.graph.route(id).is_applicable()
            };
            self.graph.use_route(id, applicable);

            let route = self.graph.route(id);
            let m = &mut self.masks[route.direction()];
            if applicable {
                m.enabled |= route.mask();
            }
            if route.need_reflow() {
                m.need_reflow |= route.mask();
            }
            if route.need_repath() {
                m.need_repath |= route.mask();
            }
            trace!(
                route = self.graph.route_key(id),
                applicable,
                reflow = route.need_reflow(),
                repath = route.need_repath(),
                "route prepared"
            );
        }

        self.masks.input.has_changed() | self.masks.output.has_changed()
    }

    /// Binds the first started, not yet routed, matching stream.
    fn set_stream_for_route(&mut self, id: RouteId) -> bool {
        let route = self.graph.route(id);
        if !route.is_applicable() || route.is_used() {
            return false;
        }
        let direction = route.direction();
        let Some(stream_route) = route.stream_route() else {
            return false;
        };
        let candidate = self.streams[direction]
            .iter()
            .find(|s| s.is_started() && !s.is_new_route_available() && stream_route.matches(s))
            .cloned();
        let Some(stream) = candidate else {
            return false;
        };
        trace!(route = self.graph.route_key(id), stream = stream.name(), "stream route is applicable");
        if let Some(stream_route) = self.graph.route_mut(id).stream_route_mut() {
            stream_route.set_stream(stream);
        }
        true
    }

    fn execute_routing(&mut self, report: &mut RoutingReport) {
        self.execute_mute_stage(report);
        self.execute_disable_stage(report);
        self.execute_configure_stage(report);
        self.execute_enable_stage(report);
        self.execute_unmute_stage(report);
    }

    fn execute_mute_stage(&mut self, report: &mut RoutingReport) {
        self.enter_phase(Phase::Mute, StageMask::FLOW, report);
        for dir in Direction::ALL {
            let m = self.masks[dir];
            self.push_route_criteria(dir, m.routes_to_mute(), m.unmuted_routes());
        }
        self.apply(report);
    }

    fn execute_disable_stage(&mut self, report: &mut RoutingReport) {
        self.enter_phase(Phase::Disable, StageMask::PATH, report);
        for dir in Direction::ALL {
            let m = self.masks[dir];
            self.push_route_criteria(dir, m.routes_to_disable(), m.opened_routes());
        }
        let routes = self.stream_routes_where(|r| r.previously_used() && (!r.is_used() || r.need_repath()));
        self.unroute_all(&routes, false, report);
        self.apply(report);
        self.unroute_all(&routes, true, report);
    }

    fn execute_configure_stage(&mut self, report: &mut RoutingReport) {
        self.enter_phase(Phase::Configure, StageMask::CONFIGURE, report);
        // Every outgoing stream is released before any incoming one attaches.
        let mut released = Vec::new();
        for id in self.stream_routes_where(|r| r.need_reflow()) {
            let key = self.graph.route_key(id).to_owned();
            report.push(RoutingAction::Configure { route: key.clone() });
            let result = self
                .graph
                .route_mut(id)
                .stream_route_mut()
                .map_or(Ok(false), AudioStreamRoute::release_stream);
            match result {
                Ok(true) => released.push(id),
                Ok(false) => {}
                Err(err) => self.record_failure(Phase::Configure, key, Err(err), report),
            }
        }
        for id in released {
            let key = self.graph.route_key(id).to_owned();
            let result = self
                .graph
                .route_mut(id)
                .stream_route_mut()
                .map_or(Ok(()), AudioStreamRoute::attach_staged_stream);
            self.record_failure(Phase::Configure, key, result, report);
        }
        for dir in Direction::ALL {
            let enabled = self.masks[dir].enabled;
            self.push_route_criteria(dir, 0, enabled);
        }
        self.commit_criteria_and_apply(report);
    }

    fn execute_enable_stage(&mut self, report: &mut RoutingReport) {
        self.enter_phase(Phase::Enable, StageMask::PATH | StageMask::CONFIGURE, report);
        let routes =
            self.stream_routes_where(|r| (!r.previously_used() && r.is_used()) || r.need_repath());
        self.route_all(&routes, true, report);
        self.apply(report);
        self.route_all(&routes, false, report);
    }

    fn execute_unmute_stage(&mut self, report: &mut RoutingReport) {
        self.enter_phase(Phase::Unmute, StageMask::ALL, report);
        self.apply(report);
    }

    fn stream_routes_where(
        &self,
        filter: impl Fn(&AudioRoute) -> bool,
    ) -> Vec<RouteId> {
        self.graph
            .routes()
            .filter(|(_, r)| r.is_stream_route() && filter(r))
            .map(|(id, _)| id)
            .collect()
    }

    fn unroute_all(&mut self, routes: &[RouteId], post_disable: bool, report: &mut RoutingReport) {
        for &id in routes {
            let key = self.graph.route_key(id).to_owned();
            trace!(route = %key, post_disable, "route to be disabled");
            report.push(RoutingAction::Unroute {
                route: key.clone(),
                post_disable,
            });
            let result = self
                .graph
                .route_mut(id)
                .stream_route_mut()
                .map_or(Ok(()), |sr| sr.unroute(post_disable));
            self.record_failure(Phase::Disable, key, result, report);
        }
    }

    fn route_all(&mut self, routes: &[RouteId], pre_enable: bool, report: &mut RoutingReport) {
        for &id in routes {
            let key = self.graph.route_key(id).to_owned();
            trace!(route = %key, pre_enable, "route to be enabled");
            report.push(RoutingAction::Route {
                route: key.clone(),
                pre_enable,
            });
            let result = self
                .graph
                .route_mut(id)
                .stream_route_mut()
                .map_or(Ok(()), |sr| sr.route(pre_enable));
            self.record_failure(Phase::Enable, key, result, report);
        }
    }

    fn record_failure(
        &self,
        phase: Phase,
        route: String,
        result: Result<(), RouteError>,
        report: &mut RoutingReport,
    ) {
        if let Err(err) = result {
            error!(%phase, %route, %err, "error while routing");
            report.failures.push(RouteFailure {
                phase,
                route,
                error: err.to_string(),
            });
        }
    }

    fn enter_phase(&mut self, phase: Phase, stage: StageMask, report: &mut RoutingReport) {
        debug!(%phase, "routing stage");
        report.push(RoutingAction::EnterPhase { phase });
        self.push_criterion(ROUTING_STAGE_CRITERION, stage.bits());
    }

    fn push_route_criteria(&mut self, dir: Direction, closing: u32, opened: u32) {
        self.push_criterion(closing_routes_criterion(dir), closing);
        self.push_criterion(opened_routes_criterion(dir), opened);
    }

    /// Sets a criterion and pushes it to the backend immediately.
    fn push_criterion(&mut self, name: &str, value: u32) {
        self.criteria.expect_mut(name).set_value(value);
        self.backend.set_criterion_state(name, value);
    }

    fn apply(&mut self, report: &mut RoutingReport) {
        self.backend.apply_configurations();
        report.push(RoutingAction::Apply);
    }

    /// Pushes every criterion to the backend, then applies.
    fn commit_criteria_and_apply(&mut self, report: &mut RoutingReport) {
        for criterion in self.criteria.iter() {
            self.backend
                .set_criterion_state(criterion.name(), criterion.value());
        }
        report.push(RoutingAction::Commit);
        self.apply(report);
    }

    fn add_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
        stream: bool,
    ) -> Result<(), RoutingError> {
        self.ensure_configurable("add route")?;
        let stream_route = stream.then(|| {
            let device = self.devices.create_device(name, direction);
            AudioStreamRoute::new(name, direction, device)
        });
        let id = self
            .graph
            .add_route(name, source, destination, direction, stream_route)
            .inspect_err(|err| warn!(%err, "route rejected"))?;
        let mask = self.graph.route(id).mask();
        debug!(
            route = self.graph.route_key(id),
            source, destination, stream, mask, "route added"
        );
        let type_name = route_criterion_type(direction);
        self.criterion_types
            .expect_mut(type_name)
            .add_value_pair(name, mask);
        Ok(())
    }
}

impl RouteInterface for RoutingEngine {
    fn add_port(&mut self, name: &str) -> Result<(), RoutingError> {
        self.ensure_configurable("add port")?;
        self.graph.add_port(name)?;
        debug!(port = name, "port added");
        Ok(())
    }

    fn add_port_group(&mut self, name: &str, member: &str) -> Result<(), RoutingError> {
        self.ensure_configurable("add port group")?;
        self.graph.add_port_group(name, member)?;
        debug!(group = name, member, "port group member added");
        Ok(())
    }

    fn add_audio_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), RoutingError> {
        self.add_route(name, source, destination, direction, false)
    }

    fn add_audio_stream_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), RoutingError> {
        self.add_route(name, source, destination, direction, true)
    }

    fn update_stream_route_config(
        &mut self,
        key: &str,
        config: StreamRouteConfig,
    ) -> Result<(), RoutingError> {
        debug!(route = key, card = %config.card_name, device = config.device_id, "stream route config");
        self.stream_route_mut(key)?.update_config(config);
        Ok(())
    }

    fn add_route_supported_effect(&mut self, key: &str, effect: &str) -> Result<(), RoutingError> {
        let effect = Effect::from_name(effect)?;
        self.stream_route_mut(key)?.add_effect_supported(effect);
        debug!(route = key, %effect, "effect supported");
        Ok(())
    }

    fn set_route_applicable(&mut self, key: &str, applicable: bool) -> Result<(), RoutingError> {
        trace!(route = key, applicable, "set route applicable");
        let id = self.route_by_key(key)?;
        self.graph.route_mut(id).set_applicable(applicable);
        Ok(())
    }

    fn set_route_need_reconfigure(&mut self, key: &str, need: bool) -> Result<(), RoutingError> {
        trace!(route = key, need, "set route need reconfigure");
        let id = self.route_by_key(key)?;
        self.graph.route_mut(id).set_need_reconfigure(need);
        Ok(())
    }

    fn set_route_need_reroute(&mut self, key: &str, need: bool) -> Result<(), RoutingError> {
        trace!(route = key, need, "set route need reroute");
        let id = self.route_by_key(key)?;
        self.graph.route_mut(id).set_need_reroute(need);
        Ok(())
    }

    fn set_port_blocked(&mut self, name: &str, blocked: bool) -> Result<(), RoutingError> {
        trace!(port = name, blocked, "set port blocked");
        let id = self
            .graph
            .port_id(name)
            .ok_or_else(|| RoutingError::not_found("port", name))?;
        self.graph.set_port_blocked(id, blocked);
        Ok(())
    }

    fn add_criterion_type(&mut self, name: &str, inclusive: bool) -> Result<bool, RoutingError> {
        self.ensure_configurable("add criterion type")?;
        if self.criterion_types.contains(name) {
            trace!(criterion_type = name, inclusive, "criterion type already added");
            return Ok(true);
        }
        debug!(criterion_type = name, inclusive, "criterion type added");
        self.criterion_types
            .insert(name, CriterionType::new(name, inclusive));
        Ok(false)
    }

    fn add_criterion_type_value_pair(
        &mut self,
        type_name: &str,
        literal: &str,
        value: u32,
    ) -> Result<(), RoutingError> {
        self.ensure_configurable("add criterion type value pair")?;
        let ty = self
            .criterion_types
            .find_mut(type_name)
            .ok_or_else(|| RoutingError::not_found(CriterionType::KIND, type_name))?;
        if ty.add_value_pair(literal, value) {
            trace!(criterion_type = type_name, literal, value, "value pair added");
        } else {
            trace!(criterion_type = type_name, literal, "value pair already added");
        }
        Ok(())
    }

    fn add_criterion(
        &mut self,
        name: &str,
        type_name: &str,
        default_literal: &str,
    ) -> Result<(), RoutingError> {
        self.ensure_configurable("add criterion")?;
        if self.criteria.contains(name) {
            return Err(RoutingError::duplicate(Criterion::KIND, name));
        }
        let ty = self
            .criterion_types
            .find(type_name)
            .ok_or_else(|| RoutingError::not_found(CriterionType::KIND, type_name))?;
        let value = if default_literal.is_empty() {
            0
        } else {
            ty.numerical_value(default_literal)?
        };
        debug!(criterion = name, criterion_type = type_name, value, "criterion added");
        self.criteria
            .insert(name, Criterion::new(name, type_name, value));
        Ok(())
    }

    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> Result<(), RoutingError> {
        self.set_audio_parameter(path, value)
    }
}
