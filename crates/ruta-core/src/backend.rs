//! Criterion backend collaborator.
//!
//! The backend is the rules engine that maps criteria to mixer and GPIO
//! settings. The routing engine declares every criterion type, value pair and
//! criterion when it starts the backend, then only sets criterion states and
//! asks for configurations to be applied.

use core::fmt;

use crate::error::BackendError;

/// Value of a backend parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParameterValue {
    /// Integer parameter.
    Integer(u32),
    /// Floating point parameter.
    Double(f64),
    /// Pair of floating point values (stereo gains).
    DoubleArray(Vec<f64>),
    /// String parameter.
    Text(String),
}

impl ParameterValue {
    /// Short kind name used in errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Integer(_) => "integer",
            ParameterValue::Double(_) => "double",
            ParameterValue::DoubleArray(_) => "double array",
            ParameterValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Integer(v) => write!(f, "{v}"),
            ParameterValue::Double(v) => write!(f, "{v}"),
            ParameterValue::DoubleArray(v) => {
                let parts: Vec<String> = v.iter().map(f64::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ParameterValue::Text(v) => f.write_str(v),
        }
    }
}

/// The rules engine applying criteria to hardware.
///
/// Object safe; the engine holds it as `Box<dyn CriterionBackend>`.
pub trait CriterionBackend: Send + Sync {
    /// Declares a criterion type.
    fn declare_criterion_type(&mut self, name: &str, inclusive: bool);

    /// Declares a `literal <-> numeric` pair of a criterion type.
    fn declare_value_pair(&mut self, type_name: &str, literal: &str, numeric: u32);

    /// Declares a criterion of a declared type, holding `default` until
    /// its first state change.
    fn declare_criterion(&mut self, name: &str, type_name: &str, default: u32);

    /// Sets the state of a criterion. Takes effect at the next apply.
    fn set_criterion_state(&mut self, name: &str, value: u32);

    /// Applies the configurations selected by the current criteria.
    ///
    /// Fire and forget: failures stay inside the backend.
    fn apply_configurations(&mut self);

    /// Starts the backend. Declarations are frozen afterwards.
    fn start(&mut self) -> Result<(), BackendError>;

    /// Whether the backend runs.
    fn is_started(&self) -> bool;

    /// Writes a parameter. When the parameter holds an array, a scalar
    /// double is replicated to every element.
    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> Result<(), BackendError>;

    /// Reads a parameter.
    fn parameter(&self, path: &str) -> Result<ParameterValue, BackendError>;
}
