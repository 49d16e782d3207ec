//! Error types for the margin authorization layer
//!
//! Comprehensive error taxonomy using thiserror. Every variant names the
//! instrument kind (and field, where one is involved) so a failure can be
//! reproduced from the error alone.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kind of instrument an operation was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentKind {
    LoanOffering,
    ExchangeOrder,
    ShortPosition,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstrumentKind::LoanOffering => "loan offering",
            InstrumentKind::ExchangeOrder => "exchange order",
            InstrumentKind::ShortPosition => "short position",
        };
        f.write_str(label)
    }
}

/// Top-level instrument error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("Invalid {kind} terms: {reason}")]
    InvalidTerms { kind: InstrumentKind, reason: String },

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Signature mismatch on {kind}: expected {expected}, recovered {recovered}")]
    SignatureMismatch {
        kind: InstrumentKind,
        expected: Address,
        recovered: Address,
    },
}

impl InstrumentError {
    /// Shorthand for an `InvalidTerms` error.
    pub fn invalid_terms(kind: InstrumentKind, reason: impl Into<String>) -> Self {
        InstrumentError::InvalidTerms {
            kind,
            reason: reason.into(),
        }
    }
}

/// Fixed-point math errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result does not fit in 256 bits")]
    Overflow,
}

/// Canonical encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Field {field} of {kind} does not fit in uint{bits}")]
    FieldOutOfRange {
        kind: InstrumentKind,
        field: &'static str,
        bits: usize,
    },

    #[error("Field {field} of {kind} uses unsupported width uint{bits}")]
    UnsupportedWidth {
        kind: InstrumentKind,
        field: &'static str,
        bits: usize,
    },
}

/// Signing collaborator and signature errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("Invalid signing key: {reason}")]
    InvalidKey { reason: String },

    #[error("Signer unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Signer rejected digest: {reason}")]
    Rejected { reason: String },

    #[error("Malformed signature: {reason}")]
    MalformedSignature { reason: String },
}
