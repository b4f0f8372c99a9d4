//! Type-safe price representation using decimal arithmetic.
//!
//! WooCommerce and Shopify both return prices as decimal strings
//! (`"19.99"`), and WooCommerce uses `""` for "no price set".

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is not a decimal number.
    #[error("invalid price amount: {0}")]
    InvalidAmount(String),
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Parse a platform price string.
    ///
    /// Returns `Ok(None)` for an empty or whitespace-only string.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the string is not a non-negative decimal.
    pub fn parse(raw: &str, currency_code: CurrencyCode) -> Result<Option<Self>, PriceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let amount = Decimal::from_str(trimmed)
            .map_err(|_| PriceError::InvalidAmount(trimmed.to_string()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        Ok(Some(Self::new(amount, currency_code)))
    }

    /// Format as a platform price string with two decimals (e.g., `"19.90"`).
    #[must_use]
    pub fn to_platform_string(&self) -> String {
        format!("{:.2}", self.amount)
    }

    /// Format for display (e.g., `"$19.99"`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_price() {
        let price = Price::parse("19.99", CurrencyCode::USD).unwrap().unwrap();
        assert_eq!(price.amount, Decimal::new(1999, 2));
        assert_eq!(price.display(), "$19.99");
    }

    #[test]
    fn test_parse_empty_price_is_none() {
        assert!(Price::parse("", CurrencyCode::USD).unwrap().is_none());
        assert!(Price::parse("   ", CurrencyCode::EUR).unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage_and_negative() {
        assert!(matches!(
            Price::parse("abc", CurrencyCode::USD),
            Err(PriceError::InvalidAmount(_))
        ));
        assert_eq!(
            Price::parse("-1.00", CurrencyCode::USD),
            Err(PriceError::Negative)
        );
    }

    #[test]
    fn test_platform_string_pads_decimals() {
        let price = Price::parse("19.9", CurrencyCode::GBP).unwrap().unwrap();
        assert_eq!(price.to_platform_string(), "19.90");
        assert_eq!(price.display(), "£19.90");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
