//! Exchange order types
//!
//! An exchange order is a maker's signed offer to trade one token for
//! another. Two orders of this shape take part in a short sale: the buy
//! order (the short seller acquires the base token) and the sell order
//! (the short seller closes the position). They differ only in role.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::errors::{InstrumentError, InstrumentKind};
use crate::ids::is_any_taker;
use crate::signature::EcSignature;

/// A maker's terms for a token trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOrder {
    /// Exchange instance that will settle the order
    pub exchange_contract: Address,
    pub maker: Address,
    /// `ANY_TAKER` accepts every taker
    pub taker: Address,
    pub maker_token: Address,
    pub taker_token: Address,
    pub fee_recipient: Address,
    pub maker_token_amount: U256,
    pub taker_token_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub expiration_timestamp_sec: U256,
    pub salt: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec_signature: Option<EcSignature>,
}

impl ExchangeOrder {
    pub const KIND: InstrumentKind = InstrumentKind::ExchangeOrder;

    /// Check the data-model invariants.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.maker.is_zero() {
            return Err(InstrumentError::invalid_terms(Self::KIND, "maker is the zero address"));
        }
        if self.maker_token == self.taker_token {
            return Err(InstrumentError::invalid_terms(
                Self::KIND,
                "maker_token and taker_token are identical",
            ));
        }
        if self.maker_token_amount.is_zero() || self.taker_token_amount.is_zero() {
            return Err(InstrumentError::invalid_terms(Self::KIND, "token amounts must be non-zero"));
        }
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.ec_signature.is_some()
    }

    /// Whether `taker` may fill this order.
    pub fn allows_taker(&self, taker: &Address) -> bool {
        is_any_taker(&self.taker) || self.taker == *taker
    }

    /// Expired at `now` (seconds); expiry is inclusive.
    pub fn is_expired(&self, now: U256) -> bool {
        now >= self.expiration_timestamp_sec
    }
}
