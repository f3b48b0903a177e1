//! Routing element identity and name-keyed arenas.
//!
//! Every element of the routing graph (ports, port groups, routes, criteria)
//! is created once at discovery time and lives until the engine is dropped.
//! Elements are stored in an [`ElementMap`]: a vector in discovery order plus a
//! key index. Relationships between elements are plain indices ([`PortId`],
//! [`PortGroupId`], [`RouteId`]) into those vectors, never references.

use std::collections::HashMap;

/// Identifier of an [`AudioPort`](crate::AudioPort) within its engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub(crate) u32);

/// Identifier of an [`AudioPortGroup`](crate::AudioPortGroup) within its engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortGroupId(pub(crate) u32);

/// Identifier of an [`AudioRoute`](crate::AudioRoute) within its engine.
///
/// Plain routes and stream routes share one id space, in discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) u32);

macro_rules! impl_id {
    ($($id:ident),*) => {
        $(
            impl $id {
                /// Returns the raw arena index.
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }

                #[inline]
                pub(crate) fn from_index(index: usize) -> Self {
                    Self(index as u32)
                }
            }

            impl core::fmt::Display for $id {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    write!(f, "{}({})", stringify!($id), self.0)
                }
            }
        )*
    };
}

impl_id!(PortId, PortGroupId, RouteId);

/// A named, non-copyable node of the routing graph.
///
/// The name is the immutable identity of the element; it is unique within the
/// element's own map (routes are keyed by name plus direction suffix).
pub trait RoutingElement {
    /// Element kind, used in diagnostics ("port", "route", ...).
    const KIND: &'static str;

    /// Returns the element name.
    fn name(&self) -> &str;
}

/// Elements whose per-pass state is cleared at the start of every
/// reconsideration.
pub trait Availability: RoutingElement {
    /// Clears the per-pass state. Calling it twice is the same as calling it once.
    fn reset_availability(&mut self);
}

/// Discovery-ordered arena of routing elements, addressable by key.
#[derive(Debug)]
pub struct ElementMap<T> {
    items: Vec<T>,
    keys: Vec<String>,
    index: HashMap<String, usize>,
}

impl<T> Default for ElementMap<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            keys: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: RoutingElement> ElementMap<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `element` under `key`. Returns `None` if the key is taken.
    pub fn insert(&mut self, key: impl Into<String>, element: T) -> Option<usize> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return None;
        }
        let slot = self.items.len();
        self.items.push(element);
        self.keys.push(key.clone());
        self.index.insert(key, slot);
        Some(slot)
    }

    /// Looks up the slot of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up an element by key.
    pub fn find(&self, key: &str) -> Option<&T> {
        self.position(key).map(|slot| &self.items[slot])
    }

    /// Looks up an element by key, mutably.
    pub fn find_mut(&mut self, key: &str) -> Option<&mut T> {
        self.position(key).map(move |slot| &mut self.items[slot])
    }

    /// Looks up an element that must exist.
    ///
    /// # Panics
    ///
    /// Panics if `key` is absent: the element graph is validated at
    /// configuration time, so a miss here is a logic error.
    pub fn expect(&self, key: &str) -> &T {
        match self.find(key) {
            Some(element) => element,
            None => panic!("{} {key} not found", T::KIND),
        }
    }

    /// Mutable variant of [`expect`](Self::expect).
    pub fn expect_mut(&mut self, key: &str) -> &mut T {
        match self.position(key) {
            Some(slot) => &mut self.items[slot],
            None => panic!("{} {key} not found", T::KIND),
        }
    }

    /// Element at a slot.
    #[inline]
    pub fn get(&self, slot: usize) -> &T {
        &self.items[slot]
    }

    /// Mutable element at a slot.
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> &mut T {
        &mut self.items[slot]
    }

    /// Key of the element at a slot.
    pub fn key(&self, slot: usize) -> &str {
        &self.keys[slot]
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the map holds no element.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates elements in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Iterates elements mutably in discovery order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Iterates `(key, element)` pairs in discovery order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &T)> {
        self.keys.iter().map(String::as_str).zip(self.items.iter())
    }
}

impl<T: Availability> ElementMap<T> {
    /// Resets the per-pass state of every element, in discovery order.
    pub fn reset_availability(&mut self) {
        for element in &mut self.items {
            element.reset_availability();
        }
    }
}
