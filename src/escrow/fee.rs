//! Service fee arithmetic.
//!
//! Rounding rule: the forwarded amount is rounded down to the wei and the
//! fee absorbs the remainder, so the two always sum to the escrowed amount.

use std::fmt;

use alloy::primitives::U256;
use thiserror::Error;

use crate::escrow::amount::Amount;

const MAX_FRACTION_DIGITS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeRateError {
    #[error("fee percentage '{0}' is not a non-negative decimal with at most 18 fractional digits")]
    Malformed(String),
    #[error("fee percentage '{0}' must be below 100")]
    OutOfRange(String),
    #[error("amount too large for fee computation")]
    Overflow,
}

/// An exact fee rate, `numerator / denominator` of the amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRate {
    numerator: U256,
    denominator: U256,
    percentage: String,
}

/// How an escrowed amount is divided at forward time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub forwarded: Amount,
    pub fee: Amount,
}

impl FeeRate {
    /// Parse a decimal percentage such as `"1"` or `"0.25"`.
    pub fn from_percentage(input: &str) -> Result<Self, FeeRateError> {
        let trimmed = input.trim();
        let malformed = || FeeRateError::Malformed(input.to_string());

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty()
            || !all_digits(whole)
            || !all_digits(fraction)
            || fraction.len() > MAX_FRACTION_DIGITS
            || whole.len() > 3
        {
            return Err(malformed());
        }

        let digits = format!("{}{}", whole, fraction);
        let numerator: U256 = digits.parse().map_err(|_| malformed())?;
        let denominator = U256::from(100u64) * U256::from(10u64).pow(U256::from(fraction.len()));

        if numerator >= denominator {
            return Err(FeeRateError::OutOfRange(input.to_string()));
        }

        Ok(Self {
            numerator,
            denominator,
            percentage: trimmed.to_string(),
        })
    }

    /// Divide `amount` into forwarded value and fee.
    pub fn split(&self, amount: Amount) -> Result<FeeSplit, FeeRateError> {
        let keep = self.denominator - self.numerator;
        let forwarded = amount
            .wei()
            .checked_mul(keep)
            .ok_or(FeeRateError::Overflow)?
            / self.denominator;
        let forwarded = Amount::from_wei(forwarded);
        let fee = amount.checked_sub(forwarded).ok_or(FeeRateError::Overflow)?;
        Ok(FeeSplit { forwarded, fee })
    }

    /// The percentage as configured.
    pub fn percentage(&self) -> &str {
        &self.percentage
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage)
    }
}
