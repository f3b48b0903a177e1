//! Deterministic in-memory collaborators.
//!
//! Used by the test suites, the benchmarks and `ruta simulate`. Every
//! collaborator records what it is asked to do into one shared [`Journal`],
//! so the relative order of backend applies, device opens and stream
//! attachments can be checked.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::backend::{CriterionBackend, ParameterValue};
use crate::device::{AudioDevice, DeviceFactory, PcmConfig};
use crate::direction::Direction;
use crate::error::{BackendError, DeviceError, RouteError};
use crate::stream::IoStream;
use crate::stream_route::StreamRouteConfig;

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum JournalEntry {
    /// Criterion type declared.
    DeclareType {
        /// Type name.
        name: String,
        /// Inclusive type.
        inclusive: bool,
    },
    /// Value pair declared.
    DeclarePair {
        /// Type name.
        type_name: String,
        /// Literal.
        literal: String,
        /// Numeric value.
        value: u32,
    },
    /// Criterion declared.
    DeclareCriterion {
        /// Criterion name.
        name: String,
        /// Type name.
        type_name: String,
        /// Value held until the first state change.
        default: u32,
    },
    /// Backend started.
    Start,
    /// Criterion state set.
    SetCriterion {
        /// Criterion name.
        name: String,
        /// New value.
        value: u32,
    },
    /// Configurations applied.
    Apply,
    /// Parameter written.
    SetParameter {
        /// Parameter path.
        path: String,
        /// Written value.
        value: ParameterValue,
    },
    /// Device opened.
    DeviceOpen {
        /// Owning route.
        route: String,
        /// Card name.
        card: String,
        /// PCM device.
        device: u32,
    },
    /// Device closed.
    DeviceClose {
        /// Owning route.
        route: String,
    },
    /// Stream attached to a route.
    Attach {
        /// Stream name.
        stream: String,
        /// Route name.
        route: String,
    },
    /// Stream detached from its route.
    Detach {
        /// Stream name.
        stream: String,
    },
}

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<JournalEntry>>>);

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: JournalEntry) {
        self.0.lock().push(entry);
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.0.lock().clone()
    }

    /// Removes and returns all entries.
    pub fn take(&self) -> Vec<JournalEntry> {
        std::mem::take(&mut *self.0.lock())
    }

    /// Clears the journal.
    pub fn clear(&self) {
        self.0.lock().clear();
    }

    /// Number of entries matching `pred`.
    pub fn count(&self, pred: impl Fn(&JournalEntry) -> bool) -> usize {
        self.0.lock().iter().filter(|e| pred(e)).count()
    }

    /// Last value set on criterion `name`.
    pub fn last_criterion(&self, name: &str) -> Option<u32> {
        self.0.lock().iter().rev().find_map(|e| match e {
            JournalEntry::SetCriterion { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }
}

// ----------------------------------------------------------------------------
// Criterion backend
// ----------------------------------------------------------------------------

/// Recording criterion backend with an in-memory parameter store.
#[derive(Debug)]
pub struct SimulatedBackend {
    journal: Journal,
    started: bool,
    start_failure: Option<String>,
    parameters: HashMap<String, ParameterValue>,
}

impl SimulatedBackend {
    /// Creates a backend recording into `journal`. The voice volume
    /// parameter exists as a stereo pair.
    pub fn new(journal: Journal) -> Self {
        let mut parameters = HashMap::new();
        parameters.insert(
            crate::engine::VOICE_VOLUME_PARAMETER.to_owned(),
            ParameterValue::DoubleArray(vec![0.0, 0.0]),
        );
        Self {
            journal,
            started: false,
            start_failure: None,
            parameters,
        }
    }

    /// Makes [`start`](CriterionBackend::start) fail with `reason`.
    pub fn with_start_failure(mut self, reason: impl Into<String>) -> Self {
        self.start_failure = Some(reason.into());
        self
    }
}

impl CriterionBackend for SimulatedBackend {
    fn declare_criterion_type(&mut self, name: &str, inclusive: bool) {
        self.journal.record(JournalEntry::DeclareType {
            name: name.to_owned(),
            inclusive,
        });
    }

    fn declare_value_pair(&mut self, type_name: &str, literal: &str, numeric: u32) {
        self.journal.record(JournalEntry::DeclarePair {
            type_name: type_name.to_owned(),
            literal: literal.to_owned(),
            value: numeric,
        });
    }

    fn declare_criterion(&mut self, name: &str, type_name: &str, default: u32) {
        self.journal.record(JournalEntry::DeclareCriterion {
            name: name.to_owned(),
            type_name: type_name.to_owned(),
            default,
        });
    }

    fn set_criterion_state(&mut self, name: &str, value: u32) {
        self.journal.record(JournalEntry::SetCriterion {
            name: name.to_owned(),
            value,
        });
    }

    fn apply_configurations(&mut self) {
        self.journal.record(JournalEntry::Apply);
    }

    fn start(&mut self) -> Result<(), BackendError> {
        if let Some(reason) = &self.start_failure {
            return Err(BackendError::Start(reason.clone()));
        }
        self.started = true;
        self.journal.record(JournalEntry::Start);
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> Result<(), BackendError> {
        let stored = match (self.parameters.get(path), value) {
            (Some(ParameterValue::DoubleArray(current)), ParameterValue::Double(v)) => {
                ParameterValue::DoubleArray(vec![v; current.len()])
            }
            (Some(current), value) if current.kind() != value.kind() => {
                return Err(BackendError::ParameterType {
                    path: path.to_owned(),
                    expected: current.kind(),
                });
            }
            (_, value) => value,
        };
        self.journal.record(JournalEntry::SetParameter {
            path: path.to_owned(),
            value: stored.clone(),
        });
        self.parameters.insert(path.to_owned(), stored);
        Ok(())
    }

    fn parameter(&self, path: &str) -> Result<ParameterValue, BackendError> {
        self.parameters
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::UnknownParameter(path.to_owned()))
    }
}

// ----------------------------------------------------------------------------
// Devices
// ----------------------------------------------------------------------------

/// Factory of [`SimulatedDevice`]s. Clones share the failure set, so
/// failures can be injected after the factory was handed to an engine.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDeviceFactory {
    journal: Journal,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl SimulatedDeviceFactory {
    /// Creates a factory recording into `journal`.
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            failing: Arc::default(),
        }
    }

    /// Makes the device of route `route` fail to open.
    pub fn fail_open(&self, route: &str) {
        self.failing.lock().insert(route.to_owned());
    }

    /// Lets the device of route `route` open again.
    pub fn clear_failure(&self, route: &str) {
        self.failing.lock().remove(route);
    }
}

impl DeviceFactory for SimulatedDeviceFactory {
    fn create_device(&mut self, route: &str, _direction: Direction) -> Box<dyn AudioDevice> {
        Box::new(SimulatedDevice {
            route: route.to_owned(),
            opened: false,
            journal: self.journal.clone(),
            failing: Arc::clone(&self.failing),
        })
    }
}

/// A PCM device that only records its transitions.
#[derive(Debug)]
pub struct SimulatedDevice {
    route: String,
    opened: bool,
    journal: Journal,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl AudioDevice for SimulatedDevice {
    fn open(
        &mut self,
        card: &str,
        device: u32,
        _config: &PcmConfig,
        _direction: Direction,
    ) -> Result<(), DeviceError> {
        let failure = if self.failing.lock().contains(&self.route) {
            Some("injected failure")
        } else if self.opened {
            Some("already opened")
        } else {
            None
        };
        if let Some(reason) = failure {
            return Err(DeviceError::Open {
                card: card.to_owned(),
                device,
                reason: reason.to_owned(),
            });
        }
        self.opened = true;
        self.journal.record(JournalEntry::DeviceOpen {
            route: self.route.clone(),
            card: card.to_owned(),
            device,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        if self.opened {
            self.opened = false;
            self.journal.record(JournalEntry::DeviceClose {
                route: self.route.clone(),
            });
        }
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.opened
    }
}

// ----------------------------------------------------------------------------
// Streams
// ----------------------------------------------------------------------------

/// A stream with externally driven state.
#[derive(Debug)]
pub struct SimulatedStream {
    name: String,
    direction: Direction,
    started: AtomicBool,
    applicability_mask: AtomicU32,
    effects_requested: AtomicU32,
    new_route: Mutex<Option<String>>,
    current_route: Mutex<Option<String>>,
    journal: Journal,
}

impl SimulatedStream {
    /// Creates a stopped stream.
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        applicability_mask: u32,
        journal: Journal,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            direction,
            started: AtomicBool::new(false),
            applicability_mask: AtomicU32::new(applicability_mask),
            effects_requested: AtomicU32::new(0),
            new_route: Mutex::new(None),
            current_route: Mutex::new(None),
            journal,
        })
    }

    /// Marks the stream started.
    pub fn start(&self) {
        self.started.store(true, Ordering::Release);
    }

    /// Marks the stream stopped.
    pub fn stop(&self) {
        self.started.store(false, Ordering::Release);
    }

    /// Changes the requested effects mask.
    pub fn set_effects_requested(&self, mask: u32) {
        self.effects_requested.store(mask, Ordering::Release);
    }

    /// Changes the use-case mask.
    pub fn set_applicability_mask(&self, mask: u32) {
        self.applicability_mask.store(mask, Ordering::Release);
    }

    /// Route the stream is attached to.
    pub fn current_route(&self) -> Option<String> {
        self.current_route.lock().clone()
    }

    /// Route staged for the stream.
    pub fn new_route(&self) -> Option<String> {
        self.new_route.lock().clone()
    }
}

impl IoStream for SimulatedStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn is_new_route_available(&self) -> bool {
        self.new_route.lock().is_some()
    }

    fn applicability_mask(&self) -> u32 {
        self.applicability_mask.load(Ordering::Acquire)
    }

    fn effects_requested(&self) -> u32 {
        self.effects_requested.load(Ordering::Acquire)
    }

    fn set_new_stream_route(&self, route: &str) {
        *self.new_route.lock() = Some(route.to_owned());
    }

    fn reset_new_stream_route(&self) {
        *self.new_route.lock() = None;
    }

    fn attach_route(&self, route: &str, _config: &StreamRouteConfig) -> Result<(), RouteError> {
        *self.current_route.lock() = Some(route.to_owned());
        self.journal.record(JournalEntry::Attach {
            stream: self.name.clone(),
            route: route.to_owned(),
        });
        Ok(())
    }

    fn detach_route(&self) {
        *self.current_route.lock() = None;
        self.journal.record(JournalEntry::Detach {
            stream: self.name.clone(),
        });
    }
}

/// Engine wired to simulated collaborators sharing one journal.
pub fn simulated_engine() -> (crate::RoutingEngine, Journal, SimulatedDeviceFactory) {
    let journal = Journal::new();
    let devices = SimulatedDeviceFactory::new(journal.clone());
    let engine = crate::RoutingEngine::new(
        Box::new(SimulatedBackend::new(journal.clone())),
        Box::new(devices.clone()),
    );
    (engine, journal, devices)
}
