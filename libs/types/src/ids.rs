//! Identifier types for margin instruments
//!
//! Addresses are 20-byte ledger values. The "any taker" wildcard is a
//! reserved sentinel in the address domain so every instrument encodes to
//! a fixed width.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard taker: an instrument with this taker may be filled by anyone.
pub const ANY_TAKER: Address = Address::ZERO;

/// Whether `taker` is the wildcard sentinel.
pub fn is_any_taker(taker: &Address) -> bool {
    *taker == ANY_TAKER
}

/// Content-derived identifier of a short position.
///
/// Computed from the lender address and a position-sequence discriminant.
/// Only used as a lookup key against the ledger; the position itself is
/// owned by the settlement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(B256);

impl ShortId {
    /// Wrap an already computed digest.
    pub fn from_digest(digest: B256) -> Self {
        Self(digest)
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
