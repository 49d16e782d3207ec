//! Margin Core — off-chain authorization layer
//!
//! Provides the deterministic encode → hash → sign pipeline for margin
//! loan offerings and exchange orders:
//! - Fixed-point partial amounts with floor rounding
//! - Canonical packed encoding matching the on-chain verifier byte for byte
//! - Keccak-256 digests and recoverable secp256k1 signatures
//! - Instrument building and signature verification
//!
//! # Determinism
//! Everything except the signing collaborator is a pure function of its
//! inputs. Signing is RFC-6979 deterministic, so identical terms, salt and
//! key produce byte-identical instruments.
//!
//! # Version
//! v1.0.0

pub mod builder;
pub mod digest;
pub mod encoding;
pub mod math;
pub mod signing;

pub use builder::{BuilderConfig, ExchangeOrderTerms, InstrumentBuilder, LoanOfferingTerms};
pub use signing::{DigestSigner, LocalKeySigner, UnavailableSigner};

/// Crate version constant
pub const MARGIN_CORE_VERSION: &str = "1.0.0";
