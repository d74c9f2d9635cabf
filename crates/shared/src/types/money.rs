//! Money type with decimal precision and currency.
//!
//! All monetary values are a single compound value carrying amount plus
//! currency; cross-currency arithmetic is a hard error, never a silent
//! promotion.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::amount::{Amount, AmountError};

/// Number of fractional digits carried by an exchange rate.
pub const RATE_SCALE: u32 = 6;

/// Errors produced by money operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// Arithmetic attempted between different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: Currency,
        /// Currency of the right operand.
        right: Currency,
    },

    /// The underlying amount violated the numeric contract.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Exchange rate must be strictly positive.
    #[error("Exchange rate must be positive: {0}")]
    NonPositiveRate(Decimal),
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Indonesian Rupiah
    Idr,
    /// Euro
    Eur,
    /// British Pound
    Gbp,
    /// Singapore Dollar
    Sgd,
    /// Japanese Yen
    Jpy,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usd => write!(f, "USD"),
            Self::Idr => write!(f, "IDR"),
            Self::Eur => write!(f, "EUR"),
            Self::Gbp => write!(f, "GBP"),
            Self::Sgd => write!(f, "SGD"),
            Self::Jpy => write!(f, "JPY"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "IDR" => Ok(Self::Idr),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "SGD" => Ok(Self::Sgd),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

/// Represents a monetary amount with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The amount at scale 4.
    pub amount: Amount,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Amount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Amount::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_negative()
    }

    /// Adds two same-currency values.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for cross-currency operands,
    /// or an amount error if the sum overflows.
    pub fn try_add(self, other: Self) -> Result<Self, MoneyError> {
        self.require_same_currency(other)?;
        Ok(Self::new(
            self.amount.checked_add(other.amount)?,
            self.currency,
        ))
    }

    /// Subtracts a same-currency value.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for cross-currency operands,
    /// or an amount error if the difference overflows.
    pub fn try_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.require_same_currency(other)?;
        Ok(Self::new(
            self.amount.checked_sub(other.amount)?,
            self.currency,
        ))
    }

    /// Converts into `target` currency by multiplying with an exchange rate,
    /// rounding banker-style to scale 4.
    ///
    /// # Errors
    ///
    /// Returns an amount error if the product overflows.
    pub fn convert(self, rate: ExchangeRate, target: Currency) -> Result<Self, MoneyError> {
        Ok(Self::new(
            self.amount.checked_mul(rate.into_inner())?,
            target,
        ))
    }

    fn require_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// A positive conversion rate at fixed scale 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// Creates a rate, rounding banker-style to 6 fractional digits.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::NonPositiveRate` if the rate is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        let mut rounded =
            value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointNearestEven);
        if rounded <= Decimal::ZERO {
            return Err(MoneyError::NonPositiveRate(value));
        }
        rounded.rescale(RATE_SCALE);
        Ok(Self(rounded))
    }

    /// A rate of exactly one (same-currency booking).
    #[must_use]
    pub fn one() -> Self {
        let mut one = Decimal::ONE;
        one.rescale(RATE_SCALE);
        Self(one)
    }

    /// Returns the inner decimal (always at scale 6).
    #[must_use]
    pub const fn into_inner(self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn eur(value: Decimal) -> Money {
        Money::new(Amount::new(value).unwrap(), Currency::Eur)
    }

    #[test]
    fn test_money_display_carries_currency() {
        assert_eq!(eur(dec!(100)).to_string(), "100.0000 EUR");
        assert_eq!(eur(dec!(99.99)).to_string(), "99.9900 EUR");
    }

    #[test]
    fn test_try_add_same_currency() {
        let sum = eur(dec!(1.5)).try_add(eur(dec!(2.5))).unwrap();
        assert_eq!(sum, eur(dec!(4)));
    }

    #[test]
    fn test_try_add_cross_currency_fails() {
        let usd = Money::new(Amount::new(dec!(1)).unwrap(), Currency::Usd);
        let result = eur(dec!(1)).try_add(usd);
        assert!(matches!(
            result,
            Err(MoneyError::CurrencyMismatch {
                left: Currency::Eur,
                right: Currency::Usd,
            })
        ));
    }

    #[test]
    fn test_convert_uses_bankers_rounding() {
        let rate = ExchangeRate::new(dec!(1.23456789)).unwrap();
        // Rate itself is rounded to 6 digits first: 1.234568.
        assert_eq!(rate.to_string(), "1.234568");

        let converted = eur(dec!(100))
            .convert(rate, Currency::Usd)
            .unwrap();
        assert_eq!(converted.to_string(), "123.4568 USD");
    }

    #[test]
    fn test_rate_one_renders_six_digits() {
        assert_eq!(ExchangeRate::one().to_string(), "1.000000");
    }

    #[test]
    fn test_rate_rejects_zero_and_negative() {
        assert!(ExchangeRate::new(dec!(0)).is_err());
        assert!(ExchangeRate::new(dec!(-1.5)).is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("eur").unwrap(), Currency::Eur);
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
        assert!(Currency::from_str("XXX").is_err());
    }

    #[test]
    fn test_zero_money() {
        let zero = Money::zero(Currency::Idr);
        assert!(zero.is_zero());
        assert!(!zero.is_negative());
    }
}
