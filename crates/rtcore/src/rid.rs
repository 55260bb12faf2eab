// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource handle identifiers.
//!
//! Guest code only ever sees a `Rid`. It encodes a slot index and a
//! generation counter so a worn slot can't be mistaken for a freshly issued
//! one even after the index is reused (see the arena-with-indices design
//! note: free slot reuse is gated by generation, not avoided outright).

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque handle to a native resource owned by the `ResourceTable`.
///
/// Serializes as a single `u64` on the wire: the low 32 bits are the slot
/// index, the high 32 bits are the generation. Guest code must treat this as
/// opaque; only the table interprets the halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rid(u64);

impl Rid {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    pub(crate) fn index(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    pub(crate) fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rid:{}:{}", self.index(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(index: u32, generation: u32) {
        let rid = Rid::new(index, generation);
        assert_eq!(rid.index(), index);
        assert_eq!(rid.generation(), generation);
    }

    #[test]
    fn round_trips_index_and_generation() {
        case(0, 0);
        case(1, 0);
        case(u32::MAX, 0);
        case(0, u32::MAX);
        case(42, 7);
    }

    #[test]
    fn distinct_generations_are_distinct_rids() {
        let a = Rid::new(3, 0);
        let b = Rid::new(3, 1);
        assert_ne!(a, b);
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn serializes_as_a_single_integer() {
        let rid = Rid::new(5, 2);
        let json = serde_json::to_string(&rid).unwrap();
        let back: Rid = serde_json::from_str(&json).unwrap();
        assert_eq!(rid, back);
    }
}
