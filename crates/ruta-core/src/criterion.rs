//! Named criteria pushed to the criterion backend.
//!
//! A criterion type is a set of `literal <-> numeric` value pairs. Exclusive
//! types hold a single value; inclusive types hold a bit set whose literal
//! form joins the set bits with `|`.

use crate::element::RoutingElement;
use crate::error::RoutingError;

/// Separator between literals of an inclusive value.
pub const INCLUSIVE_SEPARATOR: char = '|';

/// A criterion type and its value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionType {
    name: String,
    inclusive: bool,
    pairs: Vec<(String, u32)>,
}

impl CriterionType {
    /// Creates an empty type.
    pub fn new(name: impl Into<String>, inclusive: bool) -> Self {
        Self {
            name: name.into(),
            inclusive,
            pairs: Vec::new(),
        }
    }

    /// Whether values are bit sets.
    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    /// Value pairs in declaration order.
    pub fn value_pairs(&self) -> &[(String, u32)] {
        &self.pairs
    }

    /// Whether `literal` is declared.
    pub fn has_literal(&self, literal: &str) -> bool {
        self.pairs.iter().any(|(l, _)| l == literal)
    }

    /// Adds a pair. Returns `false` if the literal already exists.
    pub fn add_value_pair(&mut self, literal: impl Into<String>, numeric: u32) -> bool {
        let literal = literal.into();
        if self.has_literal(&literal) {
            return false;
        }
        self.pairs.push((literal, numeric));
        true
    }

    /// Numeric value of a literal. Inclusive types accept `A|B`; the empty
    /// literal is 0 for inclusive types.
    pub fn numerical_value(&self, literal: &str) -> Result<u32, RoutingError> {
        let lookup = |lit: &str| {
            self.pairs
                .iter()
                .find(|(l, _)| l == lit)
                .map(|(_, v)| *v)
                .ok_or_else(|| self.invalid(literal))
        };
        if !self.inclusive {
            return lookup(literal);
        }
        literal
            .split(INCLUSIVE_SEPARATOR)
            .filter(|part| !part.is_empty())
            .try_fold(0, |acc, part| Ok(acc | lookup(part)?))
    }

    /// Checks that `value` can be expressed with the declared pairs.
    pub fn check_numeric(&self, value: u32) -> Result<u32, RoutingError> {
        let known = if self.inclusive {
            let all = self.pairs.iter().fold(0, |acc, (_, v)| acc | v);
            value & !all == 0
        } else {
            self.pairs.iter().any(|(_, v)| *v == value)
        };
        if known {
            Ok(value)
        } else {
            Err(self.invalid(&value.to_string()))
        }
    }

    /// Literal form of a value: `A|B` for inclusive types (`none` when
    /// empty), the pair literal for exclusive ones, the number otherwise.
    pub fn formatted_state(&self, value: u32) -> String {
        if self.inclusive {
            let literals: Vec<&str> = self
                .pairs
                .iter()
                .filter(|(_, v)| *v != 0 && value & v == *v)
                .map(|(l, _)| l.as_str())
                .collect();
            if literals.is_empty() {
                return "none".to_owned();
            }
            return literals.join("|");
        }
        self.pairs
            .iter()
            .find(|(_, v)| *v == value)
            .map_or_else(|| value.to_string(), |(l, _)| l.clone())
    }

    fn invalid(&self, value: &str) -> RoutingError {
        RoutingError::InvalidCriterionValue {
            criterion: self.name.clone(),
            value: value.to_owned(),
        }
    }
}

impl RoutingElement for CriterionType {
    const KIND: &'static str = "criterion type";

    fn name(&self) -> &str {
        &self.name
    }
}

/// Value given to [`RoutingEngine::set_criterion`](crate::RoutingEngine::set_criterion).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CriterionValue {
    /// Raw numeric value.
    Numeric(u32),
    /// Literal, `A|B` for inclusive types.
    Literal(String),
}

impl From<u32> for CriterionValue {
    fn from(v: u32) -> Self {
        CriterionValue::Numeric(v)
    }
}

impl From<&str> for CriterionValue {
    fn from(v: &str) -> Self {
        CriterionValue::Literal(v.to_owned())
    }
}

/// A named criterion and its pending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    name: String,
    type_name: String,
    value: u32,
}

impl Criterion {
    pub(crate) fn new(name: impl Into<String>, type_name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value,
        }
    }

    /// Name of the criterion type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Current numeric value.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Sets the value. Returns `true` if it changed.
    pub(crate) fn set_value(&mut self, value: u32) -> bool {
        let changed = self.value != value;
        self.value = value;
        changed
    }
}

impl RoutingElement for Criterion {
    const KIND: &'static str = "criterion";

    fn name(&self) -> &str {
        &self.name
    }
}
