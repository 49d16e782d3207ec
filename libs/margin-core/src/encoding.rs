//! Canonical Encoder — tightly packed instrument serialization
//!
//! Reproduces the external verifier's packed layout exactly: addresses
//! take 20 bytes, `uint<N>` takes N/8 bytes big-endian, `bytes32` takes 32
//! bytes, and nothing is padded or length-prefixed. Field order is fixed
//! per instrument kind and must never be reordered.
//!
//! Loan offerings are encoded in two levels: the negotiable terms
//! (`encode_loan_rates`) are hashed first and the resulting `bytes32` is
//! appended to the identity fields (`encode_loan_offering`). Exchange
//! orders use a single flat layout.

use alloy_primitives::{Address, B256, U256};
use margin_types::errors::{EncodingError, InstrumentKind};
use margin_types::loan::LoanOffering;
use margin_types::order::ExchangeOrder;

/// Packed length of the loan offering rate terms.
pub const LOAN_RATES_ENCODED_LEN: usize = 10 * 32;

/// Packed length of the loan offering identity fields.
pub const LOAN_OFFERING_ENCODED_LEN: usize = 6 * 20 + 32;

/// Packed length of an exchange order.
pub const EXCHANGE_ORDER_ENCODED_LEN: usize = 6 * 20 + 6 * 32;

/// Packed length of a short position identifier preimage.
pub const SHORT_ID_ENCODED_LEN: usize = 20 + 32;

// ---------------------------------------------------------------------------
// Packed writer
// ---------------------------------------------------------------------------

/// Writer for the packed (`encodePacked`) layout.
#[derive(Debug, Clone)]
pub struct PackedEncoder {
    kind: InstrumentKind,
    buf: Vec<u8>,
}

impl PackedEncoder {
    pub fn new(kind: InstrumentKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: InstrumentKind, capacity: usize) -> Self {
        Self {
            kind,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append a 20-byte address.
    pub fn address(&mut self, value: &Address) -> &mut Self {
        self.buf.extend_from_slice(value.as_slice());
        self
    }

    /// Append a 32-byte big-endian word.
    pub fn uint256(&mut self, value: &U256) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    /// Append a `bytes32` value.
    pub fn bytes32(&mut self, value: &B256) -> &mut Self {
        self.buf.extend_from_slice(value.as_slice());
        self
    }

    /// Append `value` as a `uint<bits>`.
    ///
    /// Fails rather than truncating when `value` needs more than `bits`.
    /// Instrument fields are all `uint256`, so these errors only arise
    /// for narrower layouts.
    pub fn uint(
        &mut self,
        field: &'static str,
        value: &U256,
        bits: usize,
    ) -> Result<&mut Self, EncodingError> {
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(EncodingError::UnsupportedWidth {
                kind: self.kind,
                field,
                bits,
            });
        }
        if value.bit_len() > bits {
            return Err(EncodingError::FieldOutOfRange {
                kind: self.kind,
                field,
                bits,
            });
        }
        let word = value.to_be_bytes::<32>();
        self.buf.extend_from_slice(&word[32 - bits / 8..]);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Instrument layouts
// ---------------------------------------------------------------------------

/// Inner loan offering encoding: rate terms, timing and salt.
pub fn encode_loan_rates(offering: &LoanOffering) -> Vec<u8> {
    let rates = &offering.rates;
    let mut enc = PackedEncoder::with_capacity(InstrumentKind::LoanOffering, LOAN_RATES_ENCODED_LEN);
    enc.uint256(&rates.minimum_deposit)
        .uint256(&rates.max_amount)
        .uint256(&rates.min_amount)
        .uint256(&rates.interest_rate)
        .uint256(&rates.lender_fee)
        .uint256(&rates.taker_fee)
        .uint256(&offering.expiration_timestamp)
        .uint256(&offering.lockout_time)
        .uint256(&offering.call_time_limit)
        .uint256(&offering.salt);
    enc.finish()
}

/// Outer loan offering encoding: protocol instance, identity addresses and
/// the digest of `encode_loan_rates`.
pub fn encode_loan_offering(
    margin_contract: &Address,
    offering: &LoanOffering,
    rates_hash: &B256,
) -> Vec<u8> {
    let mut enc =
        PackedEncoder::with_capacity(InstrumentKind::LoanOffering, LOAN_OFFERING_ENCODED_LEN);
    enc.address(margin_contract)
        .address(&offering.underlying_token)
        .address(&offering.base_token)
        .address(&offering.lender)
        .address(&offering.taker)
        .address(&offering.fee_recipient)
        .bytes32(rates_hash);
    enc.finish()
}

/// Flat exchange order encoding.
pub fn encode_exchange_order(order: &ExchangeOrder) -> Vec<u8> {
    let mut enc =
        PackedEncoder::with_capacity(InstrumentKind::ExchangeOrder, EXCHANGE_ORDER_ENCODED_LEN);
    enc.address(&order.exchange_contract)
        .address(&order.maker)
        .address(&order.taker)
        .address(&order.maker_token)
        .address(&order.taker_token)
        .address(&order.fee_recipient)
        .uint256(&order.maker_token_amount)
        .uint256(&order.taker_token_amount)
        .uint256(&order.maker_fee)
        .uint256(&order.taker_fee)
        .uint256(&order.expiration_timestamp_sec)
        .uint256(&order.salt);
    enc.finish()
}

/// Preimage of a short position identifier.
pub fn encode_short_id(lender: &Address, sequence: &U256) -> Vec<u8> {
    let mut enc = PackedEncoder::with_capacity(InstrumentKind::ShortPosition, SHORT_ID_ENCODED_LEN);
    enc.address(lender).uint256(sequence);
    enc.finish()
}
