//! Signature Engine — recoverable secp256k1 signing and recovery
//!
//! Produces `{v, r, s}` signatures over 32-byte digests and recovers the
//! signer address from them. Signing is RFC-6979 deterministic: the same
//! digest and key always yield the same signature.
//!
//! `v` carries the ledger's offset convention (27/28 by default). The
//! offset used to sign must match the one the verifier subtracts.

use alloy_primitives::{Address, PrimitiveSignature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use margin_types::errors::SigningError;
use margin_types::signature::EcSignature;
use tracing::debug;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Offset added to the recovery id by `ecrecover`-based verifiers.
pub const DEFAULT_V_OFFSET: u8 = 27;

// ---------------------------------------------------------------------------
// Signing / Recovery
// ---------------------------------------------------------------------------

/// Sign `digest` with `key`, adding `v_offset` to the recovery id.
pub fn sign(digest: &B256, key: &PrivateKeySigner, v_offset: u8) -> Result<EcSignature, SigningError> {
    let signature = key
        .sign_hash_sync(digest)
        .map_err(|err| SigningError::Rejected {
            reason: err.to_string(),
        })?;

    let v = v_offset
        .checked_add(u8::from(signature.v()))
        .ok_or_else(|| SigningError::Rejected {
            reason: format!("v offset {v_offset} overflows u8"),
        })?;

    Ok(EcSignature::new(
        v,
        B256::new(signature.r().to_be_bytes::<32>()),
        B256::new(signature.s().to_be_bytes::<32>()),
    ))
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover(digest: &B256, signature: &EcSignature, v_offset: u8) -> Result<Address, SigningError> {
    let y_parity = match signature.v.checked_sub(v_offset) {
        Some(0) => false,
        Some(1) => true,
        _ => {
            return Err(SigningError::MalformedSignature {
                reason: format!(
                    "v = {} is not {} or {}",
                    signature.v,
                    v_offset,
                    u16::from(v_offset) + 1
                ),
            })
        }
    };

    let primitive = PrimitiveSignature::new(
        U256::from_be_bytes(signature.r.0),
        U256::from_be_bytes(signature.s.0),
        y_parity,
    );
    primitive
        .recover_address_from_prehash(digest)
        .map_err(|err| SigningError::MalformedSignature {
            reason: err.to_string(),
        })
}

/// Whether `signature` over `digest` recovers to `expected`.
///
/// A malformed signature is reported as an error rather than `false`.
pub fn is_valid_signature(
    digest: &B256,
    signature: &EcSignature,
    expected: &Address,
    v_offset: u8,
) -> Result<bool, SigningError> {
    Ok(recover(digest, signature, v_offset)? == *expected)
}

// ---------------------------------------------------------------------------
// Signing collaborator
// ---------------------------------------------------------------------------

/// A signer the instrument builder delegates to.
///
/// Implementations may be remote (key service, hardware wallet) and are
/// awaited; they hold no state shared between calls, so any number of
/// signatures may be requested concurrently.
#[async_trait]
pub trait DigestSigner: Send + Sync {
    /// Address the produced signatures recover to.
    fn address(&self) -> Address;

    /// Sign a 32-byte digest.
    async fn sign_digest(&self, digest: &B256) -> Result<EcSignature, SigningError>;
}

/// In-process signer holding a secp256k1 private key.
#[derive(Debug, Clone)]
pub struct LocalKeySigner {
    key: PrivateKeySigner,
    v_offset: u8,
}

impl LocalKeySigner {
    pub fn new(key: PrivateKeySigner) -> Self {
        Self {
            key,
            v_offset: DEFAULT_V_OFFSET,
        }
    }

    /// Build from a 32-byte big-endian secret scalar.
    pub fn from_bytes(secret: &[u8]) -> Result<Self, SigningError> {
        if secret.len() != 32 {
            return Err(SigningError::InvalidKey {
                reason: format!("expected 32 bytes, got {}", secret.len()),
            });
        }
        let key = PrivateKeySigner::from_slice(secret).map_err(|err| SigningError::InvalidKey {
            reason: err.to_string(),
        })?;
        Ok(Self::new(key))
    }

    /// Build from a `0x`-prefixed (or bare) hex secret.
    pub fn from_hex(secret: &str) -> Result<Self, SigningError> {
        let stripped = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = hex::decode(stripped).map_err(|err| SigningError::InvalidKey {
            reason: err.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Use a different `v` offset convention.
    pub fn with_v_offset(mut self, v_offset: u8) -> Self {
        self.v_offset = v_offset;
        self
    }

    pub fn v_offset(&self) -> u8 {
        self.v_offset
    }

    /// Synchronous signing, for callers outside an async context.
    pub fn sign_digest_sync(&self, digest: &B256) -> Result<EcSignature, SigningError> {
        sign(digest, &self.key, self.v_offset)
    }
}

#[async_trait]
impl DigestSigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign_digest(&self, digest: &B256) -> Result<EcSignature, SigningError> {
        debug!(signer = %self.key.address(), digest = %digest, "Signing digest locally");
        self.sign_digest_sync(digest)
    }
}

/// Signer standing in for a remote or hardware signer that cannot be reached.
///
/// Every request fails with `SigningError::Unavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableSigner {
    address: Address,
    reason: String,
}

impl UnavailableSigner {
    pub fn new(address: Address, reason: impl Into<String>) -> Self {
        Self {
            address,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DigestSigner for UnavailableSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_digest(&self, _digest: &B256) -> Result<EcSignature, SigningError> {
        Err(SigningError::Unavailable {
            reason: self.reason.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
