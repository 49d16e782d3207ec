//! Recoverable ECDSA signature as consumed by the on-chain verifier

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::errors::SigningError;

/// Length of the packed `r ‖ s ‖ v` form.
pub const SIGNATURE_LENGTH: usize = 65;

/// `{v, r, s}` triple.
///
/// `v` is the public-key-recovery discriminant with the ledger's offset
/// already applied (27/28 under the default convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EcSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl EcSignature {
    pub fn new(v: u8, r: B256, s: B256) -> Self {
        Self { v, r, s }
    }

    /// Packed `r ‖ s ‖ v` bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    /// Parse packed `r ‖ s ‖ v` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SigningError::MalformedSignature {
                reason: format!("expected {SIGNATURE_LENGTH} bytes, got {}", bytes.len()),
            });
        }
        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }

    /// `0x`-prefixed hex of the packed form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse `0x`-prefixed (or bare) hex of the packed form.
    pub fn from_hex(value: &str) -> Result<Self, SigningError> {
        let stripped = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(stripped).map_err(|err| SigningError::MalformedSignature {
            reason: err.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}
