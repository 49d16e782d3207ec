//! Loan offering types
//!
//! A loan offering is a lender's signed commitment to fund a margin
//! position. Once signed it is immutable: changing any field requires a
//! new salt and a new signature.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::errors::{InstrumentError, InstrumentKind};
use crate::ids::is_any_taker;
use crate::signature::EcSignature;

/// Negotiable rate terms of a loan offering.
///
/// All values are token base units or rate scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rates {
    pub minimum_deposit: U256,
    pub max_amount: U256,
    pub min_amount: U256,
    pub interest_rate: U256,
    pub lender_fee: U256,
    pub taker_fee: U256,
}

/// A lender's terms for extending a margin loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOffering {
    /// Token being lent and sold short
    pub underlying_token: Address,
    /// Token the short sale is settled in
    pub base_token: Address,
    pub lender: Address,
    /// `ANY_TAKER` accepts every taker
    pub taker: Address,
    pub fee_recipient: Address,
    pub rates: Rates,
    /// Absolute, seconds
    pub expiration_timestamp: U256,
    /// Duration, seconds
    pub lockout_time: U256,
    /// Duration, seconds
    pub call_time_limit: U256,
    pub salt: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<EcSignature>,
}

impl LoanOffering {
    pub const KIND: InstrumentKind = InstrumentKind::LoanOffering;

    /// Check the data-model invariants.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.lender.is_zero() {
            return Err(InstrumentError::invalid_terms(Self::KIND, "lender is the zero address"));
        }
        if self.underlying_token.is_zero() || self.base_token.is_zero() {
            return Err(InstrumentError::invalid_terms(Self::KIND, "token address is zero"));
        }
        if self.underlying_token == self.base_token {
            return Err(InstrumentError::invalid_terms(
                Self::KIND,
                "underlying_token and base_token are identical",
            ));
        }
        if self.rates.min_amount > self.rates.max_amount {
            return Err(InstrumentError::invalid_terms(
                Self::KIND,
                format!(
                    "min_amount {} exceeds max_amount {}",
                    self.rates.min_amount, self.rates.max_amount
                ),
            ));
        }
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Whether `taker` may take this offering.
    pub fn allows_taker(&self, taker: &Address) -> bool {
        is_any_taker(&self.taker) || self.taker == *taker
    }

    /// Expired at `now` (seconds); expiry is inclusive.
    pub fn is_expired(&self, now: U256) -> bool {
        now >= self.expiration_timestamp
    }

    /// Check a requested short amount against the offering's band.
    pub fn validate_short_amount(&self, short_amount: U256) -> Result<(), InstrumentError> {
        if short_amount < self.rates.min_amount || short_amount > self.rates.max_amount {
            return Err(InstrumentError::invalid_terms(
                Self::KIND,
                format!(
                    "short amount {} outside [{}, {}]",
                    short_amount, self.rates.min_amount, self.rates.max_amount
                ),
            ));
        }
        Ok(())
    }
}
