//! The route manager service.

use std::sync::Arc;

use crossbeam_channel::bounded;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use ruta_core::{
    CriterionBackend, CriterionValue, DeviceFactory, Direction, ParameterValue, RouteInterface,
    RoutingEngine, RoutingError, RoutingReport, StreamRef, StreamRouteConfig,
};
use tracing::{error, info, warn};

use crate::worker::{Request, Worker};
use crate::{ServiceError, StreamInterface};

/// Thread-safe owner of a [`RoutingEngine`] and its routing worker.
///
/// Passes run on the worker thread under the engine write lock; queries take
/// the read lock. Discovery goes through [`RouteInterface`], which is only
/// accepted until [`start_service`](StreamInterface::start_service).
///
/// ```
/// use ruta_core::sim::{Journal, SimulatedBackend, SimulatedDeviceFactory};
/// use ruta_core::{Direction, RouteInterface};
/// use ruta_service::{RouteManager, StreamInterface};
///
/// let journal = Journal::new();
/// let mut manager = RouteManager::new(
///     Box::new(SimulatedBackend::new(journal.clone())),
///     Box::new(SimulatedDeviceFactory::new(journal)),
/// );
/// manager.add_port("SSP0").unwrap();
/// manager.add_audio_route("Speaker", "SSP0", "", Direction::Output).unwrap();
/// manager.start_service().unwrap();
/// assert!(manager.reconsider(true).is_some());
/// manager.stop_service();
/// ```
pub struct RouteManager {
    engine: Arc<RwLock<RoutingEngine>>,
    worker: Mutex<Option<Worker>>,
}

impl core::fmt::Debug for RouteManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteManager")
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

impl RouteManager {
    /// Creates a stopped manager over the given collaborators.
    pub fn new(backend: Box<dyn CriterionBackend>, devices: Box<dyn DeviceFactory>) -> Self {
        Self::with_engine(RoutingEngine::new(backend, devices))
    }

    /// Creates a stopped manager over an existing engine.
    pub fn with_engine(engine: RoutingEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            worker: Mutex::new(None),
        }
    }

    /// Whether the worker runs.
    pub fn is_started(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Read access to the engine.
    pub fn engine(&self) -> RwLockReadGuard<'_, RoutingEngine> {
        self.engine.read()
    }

    /// Requests a pass.
    ///
    /// Does nothing (with a warning) while the service is stopped. When
    /// `sync` is set, blocks until the pass ran and returns its report.
    ///
    /// # Panics
    ///
    /// Panics on a synchronous request issued from the routing worker itself.
    pub fn reconsider(&self, sync: bool) -> Option<RoutingReport> {
        let guard = self.worker.lock();
        let Some(worker) = guard.as_ref() else {
            warn!("route manager not started, ignoring reconsider request");
            return None;
        };
        if !sync {
            if !worker.send(Request::Reconsider { done: None }) {
                error!("routing worker is gone");
            }
            return None;
        }
        assert!(
            !worker.is_current_thread(),
            "synchronous reconsider requested from the routing worker"
        );
        let (done, reply) = bounded(1);
        let sent = worker.send(Request::Reconsider { done: Some(done) });
        drop(guard);
        if !sent {
            error!("routing worker is gone");
            return None;
        }
        match reply.recv() {
            Ok(report) => Some(report),
            Err(_) => {
                error!("routing worker exited before replying");
                None
            }
        }
    }
}

impl Drop for RouteManager {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.stop();
        }
    }
}

impl StreamInterface for RouteManager {
    fn start_service(&self) -> Result<(), ServiceError> {
        let mut guard = self.worker.lock();
        if guard.is_some() {
            return Ok(());
        }
        let worker = Worker::spawn(Arc::clone(&self.engine)).map_err(ServiceError::Spawn)?;
        if let Err(err) = self.engine.write().start_backend() {
            error!(%err, "route manager start failed");
            worker.stop();
            return Err(err.into());
        }
        *guard = Some(worker);
        info!("route manager started");
        Ok(())
    }

    fn stop_service(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.stop();
            info!("route manager stopped");
        }
    }

    fn add_stream(&self, stream: StreamRef) {
        self.engine.write().add_stream(stream);
    }

    fn remove_stream(&self, stream: &StreamRef) {
        self.engine.write().remove_stream(stream);
    }

    fn start_stream(&self) {
        self.reconsider(true);
    }

    fn stop_stream(&self) {
        self.reconsider(true);
    }

    fn reconsider_routing(&self) {
        self.reconsider(false);
    }

    fn set_voice_volume(&self, gain: f32) -> Result<(), ServiceError> {
        Ok(self.engine.write().set_voice_volume(gain)?)
    }

    fn voice_output_stream(&self) -> Option<StreamRef> {
        self.engine.read().voice_output_stream()
    }

    fn latency_in_us(&self, direction: Direction, flags: u32) -> u32 {
        self.engine.read().latency_us(direction, flags)
    }

    fn period_in_us(&self, direction: Direction, flags: u32) -> u32 {
        self.engine.read().period_us(direction, flags)
    }

    fn set_criterion(&self, name: &str, value: CriterionValue) -> Result<bool, ServiceError> {
        Ok(self.engine.write().set_criterion(name, value)?)
    }

    fn criterion(&self, name: &str) -> Option<String> {
        self.engine.read().criterion(name)
    }

    fn set_audio_parameter(&self, path: &str, value: ParameterValue) -> Result<(), ServiceError> {
        Ok(self.engine.write().set_audio_parameter(path, value)?)
    }

    fn audio_parameter(&self, path: &str) -> Result<ParameterValue, ServiceError> {
        Ok(self.engine.read().audio_parameter(path)?)
    }
}

impl RouteInterface for RouteManager {
    fn add_port(&mut self, name: &str) -> Result<(), RoutingError> {
        self.engine.write().add_port(name)
    }

    fn add_port_group(&mut self, name: &str, member: &str) -> Result<(), RoutingError> {
        self.engine.write().add_port_group(name, member)
    }

    fn add_audio_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), RoutingError> {
        self.engine
            .write()
            .add_audio_route(name, source, destination, direction)
    }

    fn add_audio_stream_route(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
        direction: Direction,
    ) -> Result<(), RoutingError> {
        self.engine
            .write()
            .add_audio_stream_route(name, source, destination, direction)
    }

    fn update_stream_route_config(
        &mut self,
        key: &str,
        config: StreamRouteConfig,
    ) -> Result<(), RoutingError> {
        self.engine.write().update_stream_route_config(key, config)
    }

    fn add_route_supported_effect(&mut self, key: &str, effect: &str) -> Result<(), RoutingError> {
        self.engine.write().add_route_supported_effect(key, effect)
    }

    fn set_route_applicable(&mut self, key: &str, applicable: bool) -> Result<(), RoutingError> {
        self.engine.write().set_route_applicable(key, applicable)
    }

    fn set_route_need_reconfigure(&mut self, key: &str, need: bool) -> Result<(), RoutingError> {
        self.engine.write().set_route_need_reconfigure(key, need)
    }

    fn set_route_need_reroute(&mut self, key: &str, need: bool) -> Result<(), RoutingError> {
        self.engine.write().set_route_need_reroute(key, need)
    }

    fn set_port_blocked(&mut self, name: &str, blocked: bool) -> Result<(), RoutingError> {
        self.engine.write().set_port_blocked(name, blocked)
    }

    fn add_criterion_type(&mut self, name: &str, inclusive: bool) -> Result<bool, RoutingError> {
        self.engine.write().add_criterion_type(name, inclusive)
    }

    fn add_criterion_type_value_pair(
        &mut self,
        type_name: &str,
        literal: &str,
        value: u32,
    ) -> Result<(), RoutingError> {
        self.engine
            .write()
            .add_criterion_type_value_pair(type_name, literal, value)
    }

    fn add_criterion(
        &mut self,
        name: &str,
        type_name: &str,
        default_literal: &str,
    ) -> Result<(), RoutingError> {
        self.engine
            .write()
            .add_criterion(name, type_name, default_literal)
    }

    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> Result<(), RoutingError> {
        self.engine.write().set_parameter(path, value)
    }
}
