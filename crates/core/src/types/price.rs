//! Whole-rupee prices.
//!
//! The shop prices everything in whole Indian rupees: product prices, the
//! delivery charge and order totals are all integers on the wire. Values
//! written by older clients may arrive as floating point numbers or numeric
//! strings, so deserialization accepts those and truncates toward zero the
//! same way the admin forms parse their input.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Currency symbol used for every displayed amount.
pub const RUPEE_SYMBOL: &str = "₹";

/// Error returned when a price string has no leading integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a whole-rupee amount: {0:?}")]
pub struct ParsePriceError(pub String);

/// An amount in whole rupees.
///
/// Displays as `₹220`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(0);

    /// Create a price from a whole-rupee amount.
    #[must_use]
    pub const fn new(rupees: i64) -> Self {
        Self(rupees)
    }

    /// The amount in whole rupees.
    #[must_use]
    pub const fn rupees(self) -> i64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse the leading integer of a form value.
    ///
    /// Leading whitespace and an optional sign are accepted, parsing stops
    /// at the first non-digit: `"120"`, `" 45 "` and `"99.50"` parse to
    /// 120, 45 and 99.
    ///
    /// # Errors
    ///
    /// Returns `ParsePriceError` when the input has no leading digits
    /// (`""`, `"abc"`, `"-"`).
    pub fn parse_leading_integer(input: &str) -> Result<Self, ParsePriceError> {
        let trimmed = input.trim_start();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, trimmed.get(1..).unwrap_or_default()),
            Some(b'+') => (false, trimmed.get(1..).unwrap_or_default()),
            _ => (false, trimmed),
        };

        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let number = digits
            .get(..end)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ParsePriceError(input.to_owned()))?;

        Ok(Self(if negative { -number } else { number }))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RUPEE_SYMBOL}{}", self.0)
    }
}

impl From<i64> for Price {
    fn from(rupees: i64) -> Self {
        Self(rupees)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriceVisitor;

        impl Visitor<'_> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a whole-rupee amount")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                Ok(Price(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                i64::try_from(v)
                    .map(Price)
                    .map_err(|_| E::custom("price out of range"))
            }

            #[allow(clippy::cast_possible_truncation)] // Truncation toward zero is the intent
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                if v.is_finite() {
                    Ok(Price(v.trunc() as i64))
                } else {
                    Err(E::custom("price must be finite"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                Price::parse_leading_integer(v).map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Price, E> {
                Ok(Price::ZERO)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_rupee_symbol() {
        assert_eq!(Price::new(220).to_string(), "₹220");
        assert_eq!(Price::ZERO.to_string(), "₹0");
    }

    #[test]
    fn test_parse_leading_integer() {
        assert_eq!(Price::parse_leading_integer("120").unwrap(), Price::new(120));
        assert_eq!(Price::parse_leading_integer("  45 ").unwrap(), Price::new(45));
        assert_eq!(Price::parse_leading_integer("99.50").unwrap(), Price::new(99));
        assert_eq!(Price::parse_leading_integer("30rs").unwrap(), Price::new(30));
        assert_eq!(Price::parse_leading_integer("-5").unwrap(), Price::new(-5));
    }

    #[test]
    fn test_parse_leading_integer_rejects_non_numbers() {
        assert!(Price::parse_leading_integer("").is_err());
        assert!(Price::parse_leading_integer("abc").is_err());
        assert!(Price::parse_leading_integer("-").is_err());
        assert!(Price::parse_leading_integer(".5").is_err());
    }

    #[test]
    fn test_deserialize_lenient_numbers() {
        let from_int: Price = serde_json::from_str("100").unwrap();
        let from_float: Price = serde_json::from_str("49.9").unwrap();
        let from_string: Price = serde_json::from_str("\"75\"").unwrap();
        let from_null: Price = serde_json::from_str("null").unwrap();

        assert_eq!(from_int, Price::new(100));
        assert_eq!(from_float, Price::new(49));
        assert_eq!(from_string, Price::new(75));
        assert_eq!(from_null, Price::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let line = Price::new(100) * 2;
        assert_eq!(line, Price::new(200));
        assert_eq!(line + Price::new(20), Price::new(220));

        let total: Price = [Price::new(1), Price::new(2), Price::new(3)].iter().sum();
        assert_eq!(total, Price::new(6));
    }
}
