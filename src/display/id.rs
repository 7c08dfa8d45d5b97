//! Display Identity
//!
//! Stable 64-bit display identifiers. "No display" is expressed as
//! `Option<DisplayId>` rather than a reserved sentinel value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First id handed out for displays synthesized from spec strings
pub const SYNTHESIZED_DISPLAY_ID_START: u64 = 2_200_000_000;

/// Opaque, stable identifier of a physical or logical display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct DisplayId(u64);

impl DisplayId {
    /// Wrap a raw id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DisplayId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<DisplayId> for u64 {
    fn from(id: DisplayId) -> Self {
        id.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An unordered pair of display ids
///
/// Equality and hashing ignore construction order. `first` and `second`
/// still keep the order they were created with, which callers use as the
/// reference orientation of a stored layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DisplayIdPair {
    /// Reference display of the pair
    pub first: DisplayId,
    /// The other display
    pub second: DisplayId,
}

impl DisplayIdPair {
    /// Create a pair
    pub fn new(first: DisplayId, second: DisplayId) -> Self {
        debug_assert_ne!(first, second, "a display pair needs two distinct ids");
        Self { first, second }
    }

    /// Order-independent key
    pub fn canonical(&self) -> (DisplayId, DisplayId) {
        if self.first <= self.second {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        }
    }

    /// True if `id` is one of the pair
    pub fn contains(&self, id: DisplayId) -> bool {
        self.first == id || self.second == id
    }

    /// The member that is not `id`
    pub fn other(&self, id: DisplayId) -> Option<DisplayId> {
        if id == self.first {
            Some(self.second)
        } else if id == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    /// Same pair with the reference display swapped
    pub fn swapped(&self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }
}

impl PartialEq for DisplayIdPair {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for DisplayIdPair {}

impl std::hash::Hash for DisplayIdPair {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for DisplayIdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Hands out ids for displays that do not come from hardware
#[derive(Debug, Clone)]
pub struct DisplayIdAllocator {
    next: u64,
}

impl Default for DisplayIdAllocator {
    fn default() -> Self {
        Self::starting_at(SYNTHESIZED_DISPLAY_ID_START)
    }
}

impl DisplayIdAllocator {
    /// Allocator whose first id is `start`
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    /// Take the next id
    pub fn allocate(&mut self) -> DisplayId {
        let id = DisplayId(self.next);
        self.next += 1;
        id
    }
}
