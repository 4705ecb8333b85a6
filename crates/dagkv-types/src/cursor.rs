use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Namespace ids below this value are reserved for system and registry keys.
pub const RESERVED_CURSORS: u64 = 100;

/// A namespace id: the integer that prefixes every stored entry of one piece.
///
/// A `Cursor` is always `>= RESERVED_CURSORS`; the reserved range is never
/// handed out as a namespace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Cursor(u64);

impl Cursor {
    /// The first namespace id outside the reserved range.
    pub const FIRST: Self = Self(RESERVED_CURSORS);

    /// Create a cursor, rejecting ids in the reserved range.
    pub fn new(id: u64) -> Result<Self, TypeError> {
        if id < RESERVED_CURSORS {
            return Err(TypeError::ReservedCursor(id));
        }
        Ok(Self(id))
    }

    /// The raw namespace id.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The cursor immediately after this one.
    pub fn next(&self) -> Result<Self, TypeError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(TypeError::CursorOverflow)
    }
}

impl TryFrom<u64> for Cursor {
    type Error = TypeError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<Cursor> for u64 {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({})", self.0)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
