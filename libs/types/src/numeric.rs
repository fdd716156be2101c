//! Price and quantity types
//!
//! Prices use rust_decimal for exact comparisons (no floating-point tie
//! ambiguity at a price level). Quantities are integer order sizes.
//! Prices are serialized as strings to prevent JSON number precision loss.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Price with exact decimal representation
///
/// Must always be positive. Total ordering is exact, which makes it usable
/// as the key of a price-ordered book side. Displays with two decimal
/// places, the user-facing precision of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the price is negative or zero
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None if invalid
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Integer order quantity
///
/// Zero is representable (filled quantity of a new order); the book rejects
/// orders whose requested quantity is zero at entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Create a new Quantity
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Zero quantity
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Smaller of two quantities
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Subtraction returning None on underflow
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Subtraction clamping at zero
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(
            self.0
                .checked_add(rhs.0)
                .expect("Quantity addition overflowed"),
        )
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(
            self.0 >= rhs.0,
            "Quantity subtraction would result in negative"
        );
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(100);
        assert_eq!(price.as_decimal(), Decimal::from(100));
    }

    #[test]
    #[should_panic(expected = "Price must be positive")]
    fn test_price_zero_panics() {
        Price::new(Decimal::ZERO);
    }

    #[test]
    fn test_price_try_new() {
        assert!(Price::try_new(Decimal::from(1)).is_some());
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::from(-5)).is_none());
    }

    #[test]
    fn test_price_ordering_exact() {
        let a = Price::from_str("100.10").unwrap();
        let b = Price::from_str("100.1").unwrap();
        let c = Price::from_str("100.11").unwrap();

        assert_eq!(a, b);
        assert!(a < c);
    }

    #[test]
    fn test_price_two_decimal_display() {
        assert_eq!(Price::from_u64(100).to_string(), "100.00");
        assert_eq!(Price::from_str("99.5").unwrap().to_string(), "99.50");
        assert_eq!(Price::from_str("101.25").unwrap().to_string(), "101.25");
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("102.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"102.25\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1 = Quantity::new(10);
        let q2 = Quantity::new(4);

        assert_eq!(q1 + q2, Quantity::new(14));
        assert_eq!(q1 - q2, Quantity::new(6));
        assert_eq!(q2.saturating_sub(q1), Quantity::zero());
        assert_eq!(q1.checked_sub(q2), Some(Quantity::new(6)));
        assert_eq!(q2.checked_sub(q1), None);
    }

    #[test]
    #[should_panic(expected = "Quantity subtraction would result in negative")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::new(1) - Quantity::new(2);
    }

    #[test]
    fn test_quantity_min() {
        assert_eq!(Quantity::new(7).min(Quantity::new(3)), Quantity::new(3));
        assert_eq!(Quantity::new(2).min(Quantity::new(9)), Quantity::new(2));
    }

    #[test]
    fn test_quantity_serialization() {
        let qty = Quantity::new(25);
        let json = serde_json::to_string(&qty).unwrap();
        assert_eq!(json, "25");

        let deserialized: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(qty, deserialized);
    }
}
