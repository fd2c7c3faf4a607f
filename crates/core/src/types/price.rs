//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored tax-exclusive. Argentine storefronts display prices
//! with 21% IVA included, so [`Price::with_vat`] exists for display math.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Argentine VAT (IVA) rate, percent.
pub const IVA_RATE_PERCENT: u32 = 21;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price amount cannot be negative")]
    Negative,
}

/// A tax-exclusive price with currency information.
///
/// ## Examples
///
/// ```
/// use lockerbay_core::{CurrencyCode, Price};
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(1000, 2), CurrencyCode::ARS).unwrap();
/// assert_eq!(price.to_string(), "$10.00");
/// assert_eq!(price.with_vat(), Decimal::new(1210, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit, excluding tax.
    amount: Decimal,
    /// ISO 4217 currency code.
    currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// The tax-exclusive amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency code.
    #[must_use]
    pub const fn currency_code(&self) -> CurrencyCode {
        self.currency_code
    }

    /// The amount with Argentine VAT (21% IVA) included, for display.
    #[must_use]
    pub fn with_vat(&self) -> Decimal {
        let factor = Decimal::from(100 + IVA_RATE_PERCENT) / Decimal::ONE_HUNDRED;
        (self.amount * factor).round_dp(2)
    }

    /// The tax-exclusive line total for `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.amount * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ARS,
    USD,
}

impl CurrencyCode {
    /// The display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::ARS | Self::USD => "$",
        }
    }

    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ARS => "ARS",
            Self::USD => "USD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        let err = Price::new(Decimal::new(-1, 0), CurrencyCode::ARS);
        assert!(matches!(err, Err(PriceError::Negative)));
    }

    #[test]
    fn test_zero_amount_allowed() {
        let price = Price::new(Decimal::ZERO, CurrencyCode::ARS).unwrap();
        assert!(price.amount().is_zero());
    }

    #[test]
    fn test_with_vat_adds_21_percent() {
        let price = Price::new(Decimal::new(10000, 2), CurrencyCode::ARS).unwrap();
        assert_eq!(price.with_vat(), Decimal::new(12100, 2));
    }

    #[test]
    fn test_times() {
        let price = Price::new(Decimal::new(250, 2), CurrencyCode::ARS).unwrap();
        assert_eq!(price.times(4), Decimal::new(1000, 2));
    }

    #[test]
    fn test_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::ARS).unwrap();
        assert_eq!(price.to_string(), "$19.99");
    }
}
