//! Flat interest arithmetic.
//!
//! Interest is a fixed whole-percent share of the principal, independent of
//! elapsed time or the requested duration. Integer division truncates toward
//! zero, so fractional units of interest are not charged.

use crate::Error;

const PERCENT_DENOMINATOR: i128 = 100;

/// `amount * rate / 100`, checked.
pub fn interest(amount: i128, rate: u32) -> Result<i128, Error> {
    amount
        .checked_mul(rate as i128)
        .map(|scaled| scaled / PERCENT_DENOMINATOR)
        .ok_or(Error::ArithmeticOverflow)
}

/// Principal plus flat interest: the amount `repay_loan` collects.
pub fn repayment_amount(amount: i128, rate: u32) -> Result<i128, Error> {
    amount
        .checked_add(interest(amount, rate)?)
        .ok_or(Error::ArithmeticOverflow)
}
