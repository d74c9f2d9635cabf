//! Fixed-precision ledger amount.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! `Amount` wraps `rust_decimal::Decimal` constrained to the ledger's numeric
//! contract: at most 18 integer digits and exactly 4 fractional digits, with
//! banker's rounding (`MidpointNearestEven`) applied on construction and
//! after every arithmetic operation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits carried by every stored amount.
pub const AMOUNT_SCALE: u32 = 4;

/// Maximum number of integer digits an amount may carry.
pub const AMOUNT_INTEGER_DIGITS: u32 = 18;

/// Errors produced when constructing or combining amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The integer part exceeds 18 digits.
    #[error("Amount exceeds 18 integer digits: {0}")]
    Overflow(Decimal),

    /// The input string is not a valid decimal.
    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// A monetary quantity at fixed scale 4.
///
/// Construction rounds banker-style to 4 fractional digits and rejects
/// values whose integer part needs more than 18 digits, so every `Amount`
/// in the system satisfies the numeric contract by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a decimal, rounding to scale 4 with banker's
    /// rounding.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the integer part exceeds 18 digits.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        let mut rounded =
            value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven);
        if rounded.abs().trunc() >= integer_limit() {
            return Err(AmountError::Overflow(value));
        }
        rounded.rescale(AMOUNT_SCALE);
        Ok(Self(rounded))
    }

    /// Returns the inner decimal (always at scale 4).
    #[must_use]
    pub const fn into_inner(self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Adds two amounts.
    ///
    /// Both operands are at scale 4, so the sum is exact; only the 18-digit
    /// bound can fail.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the result exceeds the bound.
    pub fn checked_add(self, other: Self) -> Result<Self, AmountError> {
        let sum = self
            .0
            .checked_add(other.0)
            .ok_or(AmountError::Overflow(self.0))?;
        Self::new(sum)
    }

    /// Subtracts `other` from `self`.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the result exceeds the bound.
    pub fn checked_sub(self, other: Self) -> Result<Self, AmountError> {
        let diff = self
            .0
            .checked_sub(other.0)
            .ok_or(AmountError::Overflow(self.0))?;
        Self::new(diff)
    }

    /// Multiplies by a raw decimal factor, rounding the product to scale 4.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the result exceeds the bound.
    pub fn checked_mul(self, factor: Decimal) -> Result<Self, AmountError> {
        let product = self
            .0
            .checked_mul(factor)
            .ok_or(AmountError::Overflow(self.0))?;
        Self::new(product)
    }
}

/// Smallest decimal whose integer part no longer fits in 18 digits.
fn integer_limit() -> Decimal {
    Decimal::from(1_000_000_000_000_000_000_i64)
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The ZERO constant carries scale 0; render at scale 4 regardless.
        let mut value = self.0;
        value.rescale(AMOUNT_SCALE);
        write!(f, "{value}")
    }
}

impl std::str::FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal: Decimal = s
            .parse()
            .map_err(|_| AmountError::Invalid(s.to_string()))?;
        Self::new(decimal)
    }
}
