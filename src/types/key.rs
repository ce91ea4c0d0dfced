//! Variable keys
//!
//! Keys carry no structure beyond equality and ordering. The [`symbol`]
//! helper packs a character and an index into a key so that test graphs
//! read like `x1, x2, l1` and sort by character first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a random variable
pub type Key = u64;

const CHR_BITS: u32 = 8;
const INDEX_BITS: u32 = u64::BITS - CHR_BITS;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// Build a key from a character and an index, e.g. `symbol('x', 1)`
pub fn symbol(chr: char, index: u64) -> Key {
    ((chr as u64 & 0xff) << INDEX_BITS) | (index & INDEX_MASK)
}

/// Formats a key as `x1` when it was built with [`symbol`], else as a number
#[derive(Debug, Clone, Copy)]
pub struct KeyDisplay(pub Key);

impl KeyDisplay {
    /// Wrap a borrowed key for display
    pub fn of(key: &Key) -> Self {
        Self(*key)
    }
}

impl fmt::Display for KeyDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chr = (self.0 >> INDEX_BITS) as u8;
        if chr.is_ascii_alphabetic() {
            write!(f, "{}{}", chr as char, self.0 & INDEX_MASK)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Key of a discrete variable together with its number of states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiscreteKey {
    /// Variable key
    pub key: Key,
    /// Number of states
    pub cardinality: usize,
}

impl DiscreteKey {
    /// Create a new discrete key
    pub fn new(key: Key, cardinality: usize) -> Self {
        Self { key, cardinality }
    }
}
