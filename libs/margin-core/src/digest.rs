//! Digest Engine — Keccak-256 over canonical encodings
//!
//! The hash primitive is the ledger's own Keccak-256 (not SHA3-256: the
//! padding differs). Instrument hashes are what the external verifier
//! recomputes; the signing digest is derived from them by a `HashScheme`.

use alloy_primitives::{keccak256, Address, B256, U256};
use margin_types::ids::ShortId;
use margin_types::loan::LoanOffering;
use margin_types::order::ExchangeOrder;
use serde::{Deserialize, Serialize};

use crate::encoding::{
    encode_exchange_order, encode_loan_offering, encode_loan_rates, encode_short_id,
};

/// Prefix prepended by `eth_sign`-style signers before hashing a 32-byte message.
pub const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Keccak-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> B256 {
    keccak256(bytes)
}

/// Inner loan offering digest over rates, timing and salt.
pub fn loan_rates_hash(offering: &LoanOffering) -> B256 {
    digest(&encode_loan_rates(offering))
}

/// Loan offering hash as computed by the margin contract at `margin_contract`.
pub fn loan_offering_hash(margin_contract: &Address, offering: &LoanOffering) -> B256 {
    let rates_hash = loan_rates_hash(offering);
    digest(&encode_loan_offering(margin_contract, offering, &rates_hash))
}

/// Exchange order hash as computed by the order's exchange contract.
pub fn exchange_order_hash(order: &ExchangeOrder) -> B256 {
    digest(&encode_exchange_order(order))
}

/// Identifier of the `sequence`-th short position funded by `lender`.
pub fn short_id(lender: &Address, sequence: &U256) -> ShortId {
    ShortId::from_digest(digest(&encode_short_id(lender, sequence)))
}

/// `keccak256("\x19Ethereum Signed Message:\n32" ‖ hash)`.
pub fn eth_signed_message_hash(hash: &B256) -> B256 {
    let mut preimage = Vec::with_capacity(ETH_SIGNED_MESSAGE_PREFIX.len() + 32);
    preimage.extend_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
    preimage.extend_from_slice(hash.as_slice());
    digest(&preimage)
}

/// How an instrument hash becomes the digest that is actually signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashScheme {
    /// Sign the instrument hash itself
    Raw,
    /// Sign the `eth_sign` prefixed hash; verifiers apply the same prefix
    /// before `ecrecover`
    #[default]
    EthSignedMessage,
}

impl HashScheme {
    pub fn signing_digest(&self, instrument_hash: &B256) -> B256 {
        match self {
            HashScheme::Raw => *instrument_hash,
            HashScheme::EthSignedMessage => eth_signed_message_hash(instrument_hash),
        }
    }
}
