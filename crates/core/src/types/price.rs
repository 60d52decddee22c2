//! Type-safe money and tax-rate representation using decimal arithmetic.
//!
//! Prices are stored as [`Decimal`] in the currency's standard unit (dollars,
//! not cents). Binary floating point is never used for money, so the cart
//! identity `total == subtotal * (1 + tax_rate)` holds exactly.
//!
//! Arithmetic saturates at [`Decimal::MAX`] instead of overflowing, so reading
//! totals never panics whatever the quantities involved.

use core::fmt;
use core::ops::{Add, Mul};
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing a [`Price`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input string is not a decimal number.
    #[error("price is not a valid decimal: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest representable amount; arithmetic saturates here.
    pub const MAX: Self = Self(Decimal::MAX);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an integer number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents < 0`.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity (line total).
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::saturating(self.0.checked_mul(Decimal::from(quantity)))
    }

    fn saturating(amount: Option<Decimal>) -> Self {
        amount.map_or(Self::MAX, Self)
    }

    /// Amount rounded to cents, for display.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.rounded())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::saturating(self.0.checked_add(rhs.0))
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// A sales tax rate, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// No tax.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a tax rate, clamping the input into `[0, 1]`.
    ///
    /// Returns the clamped rate and whether clamping was necessary.
    #[must_use]
    pub fn clamped(rate: Decimal) -> (Self, bool) {
        if rate < Decimal::ZERO {
            (Self(Decimal::ZERO), true)
        } else if rate > Decimal::ONE {
            (Self(Decimal::ONE), true)
        } else {
            (Self(rate), false)
        }
    }

    /// Create a tax rate from basis points (800 = 8%).
    #[must_use]
    pub fn from_basis_points(bps: u32) -> Self {
        Self::clamped(Decimal::new(i64::from(bps), 4)).0
    }

    /// Get the underlying decimal rate.
    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.0
    }

    /// Apply the rate to a subtotal, returning `subtotal * (1 + rate)`.
    #[must_use]
    pub fn apply(&self, subtotal: Price) -> Price {
        Price::saturating(subtotal.0.checked_mul(Decimal::ONE + self.0))
    }

    /// Tax owed on a subtotal, `subtotal * rate`.
    #[must_use]
    pub fn tax_on(&self, subtotal: Price) -> Price {
        Price::saturating(subtotal.0.checked_mul(self.0))
    }
}

impl Default for TaxRate {
    /// 8%, the storefront's standing rate.
    fn default() -> Self {
        Self(Decimal::new(8, 2))
    }
}

impl Mul<Price> for TaxRate {
    type Output = Price;

    fn mul(self, rhs: Price) -> Price {
        self.tax_on(rhs)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}
