//! Currency codes and money rounding with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; sums stay exact and are rounded
//! to two decimal places only at the reporting boundary.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a currency code is blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("currency code must not be empty")]
pub struct EmptyCurrencyCode;

/// A currency code as declared by the upstream subscription feed.
///
/// The feed is the authority on which currencies exist, so this is an open
/// set rather than a closed enum: any trimmed, non-empty code is accepted
/// and normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyCurrencyCode`] if the trimmed input is empty.
    pub fn parse(raw: &str) -> Result<Self, EmptyCurrencyCode> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyCurrencyCode);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Parses like [`CurrencyCode::parse`], substituting `EUR` for blank
    /// input. Used where upstream records may omit the currency.
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self("EUR".to_string())
        } else {
            Self(trimmed.to_uppercase())
        }
    }

    /// Returns the normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = EmptyCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = EmptyCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Rounds an amount at the reporting boundary: two decimal places,
/// midpoint away from zero.
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with exactly two decimals for wire output.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_amount(amount);
    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_currency_code_normalizes() {
        assert_eq!(CurrencyCode::parse(" eur ").unwrap().as_str(), "EUR");
        assert_eq!(CurrencyCode::parse("USD").unwrap().as_str(), "USD");
        assert_eq!(CurrencyCode::parse("chf").unwrap().to_string(), "CHF");
    }

    #[test]
    fn test_currency_code_rejects_blank() {
        assert_eq!(CurrencyCode::parse(""), Err(EmptyCurrencyCode));
        assert_eq!(CurrencyCode::parse("   "), Err(EmptyCurrencyCode));
        assert!(CurrencyCode::from_str("\t").is_err());
    }

    #[test]
    fn test_parse_lossy_falls_back_to_eur() {
        assert_eq!(CurrencyCode::parse_lossy("").as_str(), "EUR");
        assert_eq!(CurrencyCode::parse_lossy("  ").as_str(), "EUR");
        assert_eq!(CurrencyCode::parse_lossy("usd").as_str(), "USD");
    }

    #[test]
    fn test_currency_code_orders_lexicographically() {
        let eur = CurrencyCode::parse("EUR").unwrap();
        let usd = CurrencyCode::parse("USD").unwrap();
        assert!(eur < usd);
    }

    #[test]
    fn test_round_amount_midpoint_away_from_zero() {
        assert_eq!(round_amount(dec!(1.005)), dec!(1.01));
        assert_eq!(round_amount(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_amount(dec!(2.4449)), dec!(2.44));
        assert_eq!(round_amount(dec!(10)), dec!(10));
    }

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount(dec!(120)), "120.00");
        assert_eq!(format_amount(dec!(0.5)), "0.50");
        assert_eq!(format_amount(dec!(-33.335)), "-33.34");
    }
}
