//! Stream direction and per-direction storage.
//!
//! Every route, stream and routing mask in the engine belongs to exactly one
//! [`Direction`]. [`PerDirection`] is a two-slot array indexed by direction,
//! used for the route masks, the stream lists and the port attachments.

use core::fmt;
use core::ops::{Index, IndexMut};

/// Audio flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Capture path (microphones, modem uplink, ...).
    Input,
    /// Playback path (speakers, headsets, modem downlink, ...).
    Output,
}

impl Direction {
    /// Both directions, input first.
    pub const ALL: [Direction; 2] = [Direction::Input, Direction::Output];

    /// Slot index used by [`PerDirection`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Direction::Input => 0,
            Direction::Output => 1,
        }
    }

    /// Returns `true` for [`Direction::Output`].
    #[inline]
    pub const fn is_out(self) -> bool {
        matches!(self, Direction::Output)
    }

    /// Builds a direction from the "is output" convention used by stream APIs.
    #[inline]
    pub const fn from_is_out(is_out: bool) -> Self {
        if is_out {
            Direction::Output
        } else {
            Direction::Input
        }
    }

    /// Suffix appended to a route name to build its element key.
    pub const fn key_suffix(self) -> &'static str {
        match self {
            Direction::Input => "_Capture",
            Direction::Output => "_Playback",
        }
    }

    /// Human readable label ("Capture" / "Playback").
    pub const fn label(self) -> &'static str {
        match self {
            Direction::Input => "Capture",
            Direction::Output => "Playback",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// A value stored once per [`Direction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerDirection<T> {
    /// Input slot.
    pub input: T,
    /// Output slot.
    pub output: T,
}

impl<T> PerDirection<T> {
    /// Creates a pair from explicit values.
    pub const fn new(input: T, output: T) -> Self {
        Self { input, output }
    }

    /// Iterates `(direction, value)` pairs, input first.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        [(Direction::Input, &self.input), (Direction::Output, &self.output)].into_iter()
    }
}

impl<T> Index<Direction> for PerDirection<T> {
    type Output = T;

    #[inline]
    fn index(&self, dir: Direction) -> &T {
        match dir {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }
}

impl<T> IndexMut<Direction> for PerDirection<T> {
    #[inline]
    fn index_mut(&mut self, dir: Direction) -> &mut T {
        match dir {
            Direction::Input => &mut self.input,
            Direction::Output => &mut self.output,
        }
    }
}
