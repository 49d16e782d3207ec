//! Fixed-point math — proportional scaling with floor division
//!
//! Every amount derived here rounds toward zero; there is no round-up
//! variant.

use alloy_primitives::ruint::UintTryFrom;
use alloy_primitives::{U256, U512};
use margin_types::errors::MathError;
use margin_types::loan::LoanOffering;
use margin_types::order::ExchangeOrder;

/// ⌊numerator × target / denominator⌋.
///
/// The product is formed in 512-bit precision before dividing, so no
/// intermediate overflow or precision loss is possible. Fails with
/// `DivisionByZero` for a zero denominator and `Overflow` when the result
/// does not fit in 256 bits.
pub fn partial_amount(numerator: U256, denominator: U256, target: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = U512::from(numerator) * U512::from(target);
    let quotient = product / U512::from(denominator);
    U256::uint_try_from(quotient).map_err(|_| MathError::Overflow)
}

/// Fees owed for a short of `short_amount` against `offering`.
///
/// Both fees scale linearly with the share of `max_amount` being used.
/// Returns `(lender_fee, taker_fee)`.
pub fn loan_fees(offering: &LoanOffering, short_amount: U256) -> Result<(U256, U256), MathError> {
    let max = offering.rates.max_amount;
    let lender_fee = partial_amount(short_amount, max, offering.rates.lender_fee)?;
    let taker_fee = partial_amount(short_amount, max, offering.rates.taker_fee)?;
    Ok((lender_fee, taker_fee))
}

/// Maker tokens released when `taker_fill` taker tokens are filled.
pub fn maker_fill_amount(order: &ExchangeOrder, taker_fill: U256) -> Result<U256, MathError> {
    partial_amount(taker_fill, order.taker_token_amount, order.maker_token_amount)
}

/// Taker fee charged for a fill of `taker_fill` taker tokens.
pub fn taker_fee_for_fill(order: &ExchangeOrder, taker_fill: U256) -> Result<U256, MathError> {
    partial_amount(taker_fill, order.taker_token_amount, order.taker_fee)
}
