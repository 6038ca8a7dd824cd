//! Value objects: equality by value, not identity.
//!
//! Numeric values that cross the API boundary (quantities, prices) are
//! normalized here exactly once. Clients may send `3`, `3.0` or `"3"`; after
//! parsing, every piece of arithmetic works on integers.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects (immutable, compared by value).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Maximum length of a SKU code.
pub const SKU_MAX_LEN: usize = 32;

/// Stock keeping unit code. Trimmed, 1..=32 characters, immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if trimmed.chars().count() > SKU_MAX_LEN {
            return Err(DomainError::validation(format!(
                "sku cannot exceed {SKU_MAX_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Sku {}

impl TryFrom<String> for Sku {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Sku::parse(&value)
    }
}

impl From<Sku> for String {
    fn from(value: Sku) -> Self {
        value.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A numeric field as a client may send it: JSON integer, JSON float, or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        NumericInput::Integer(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

/// Non-negative whole quantity of stock units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self(value))
    }

    /// Parse a strictly positive quantity (order lines).
    pub fn positive(input: &NumericInput, field: &str) -> DomainResult<Self> {
        let value = parse_whole(input, field)?;
        if value <= 0 {
            return Err(DomainError::validation(format!("{field} must be > 0")));
        }
        Ok(Self(value))
    }

    /// Parse a quantity that may be zero (counts, thresholds).
    pub fn non_negative(input: &NumericInput, field: &str) -> DomainResult<Self> {
        let value = parse_whole(input, field)?;
        if value < 0 {
            return Err(DomainError::validation(format!("{field} must be >= 0")));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

fn parse_whole(input: &NumericInput, field: &str) -> DomainResult<i64> {
    match input {
        NumericInput::Integer(v) => Ok(*v),
        NumericInput::Float(v) => {
            if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 {
                Ok(*v as i64)
            } else {
                Err(DomainError::validation(format!(
                    "{field} must be a whole number"
                )))
            }
        }
        NumericInput::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::validation(format!("{field} is not a whole number: {s:?}"))),
    }
}

/// Monetary amount in minor units (cents). Two decimal places, never negative.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor_units(self) -> u64 {
        self.0
    }

    /// Parse a non-negative amount with at most two decimal places.
    pub fn parse(input: &NumericInput, field: &str) -> DomainResult<Self> {
        match input {
            NumericInput::Integer(v) => {
                let whole = u64::try_from(*v)
                    .map_err(|_| DomainError::validation(format!("{field} must be >= 0")))?;
                whole
                    .checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| DomainError::validation(format!("{field} is too large")))
            }
            // Round-trip through the shortest decimal rendering so 0.1 stays 0.1.
            NumericInput::Float(v) => {
                if !v.is_finite() {
                    return Err(DomainError::validation(format!("{field} must be finite")));
                }
                parse_decimal_text(&v.to_string(), field)
            }
            NumericInput::Text(s) => parse_decimal_text(s, field),
        }
    }

    pub fn checked_mul_qty(self, qty: Quantity) -> DomainResult<Money> {
        let qty = u64::try_from(qty.get())
            .map_err(|_| DomainError::invariant("negative quantity in valuation"))?;
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// Amount in major units, for JSON payloads only.
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

fn parse_decimal_text(raw: &str, field: &str) -> DomainResult<Money> {
    let s = raw.trim();
    let invalid = || DomainError::validation(format!("{field} is not a valid amount: {raw:?}"));

    if s.starts_with('-') {
        return Err(DomainError::validation(format!("{field} must be >= 0")));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 2 {
        return Err(DomainError::validation(format!(
            "{field} has more than two decimal places"
        )));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let cents: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
        _ => frac.parse::<u64>().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .map(Money)
        .ok_or_else(|| DomainError::validation(format!("{field} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_accepts_text_and_numbers() {
        assert_eq!(Quantity::positive(&"3".into(), "quantity").unwrap().get(), 3);
        assert_eq!(Quantity::positive(&" 12 ".into(), "quantity").unwrap().get(), 12);
        assert_eq!(Quantity::positive(&NumericInput::Float(4.0), "quantity").unwrap().get(), 4);
        assert_eq!(Quantity::positive(&7.into(), "quantity").unwrap().get(), 7);
    }

    #[test]
    fn quantity_rejects_non_positive_and_fractional() {
        assert!(Quantity::positive(&0.into(), "quantity").is_err());
        assert!(Quantity::positive(&(-2).into(), "quantity").is_err());
        assert!(Quantity::positive(&NumericInput::Float(1.5), "quantity").is_err());
        assert!(Quantity::positive(&"1.5".into(), "quantity").is_err());
        assert!(Quantity::positive(&"abc".into(), "quantity").is_err());
        assert_eq!(Quantity::non_negative(&0.into(), "counted_qty").unwrap(), Quantity::ZERO);
    }

    #[test]
    fn money_parses_two_decimal_places_exactly() {
        assert_eq!(Money::parse(&"1.5".into(), "unit_price").unwrap().minor_units(), 150);
        assert_eq!(Money::parse(&"2.0".into(), "unit_price").unwrap().minor_units(), 200);
        assert_eq!(Money::parse(&"0.07".into(), "unit_price").unwrap().minor_units(), 7);
        assert_eq!(Money::parse(&".5".into(), "unit_price").unwrap().minor_units(), 50);
        assert_eq!(Money::parse(&3.into(), "unit_price").unwrap().minor_units(), 300);
        assert_eq!(
            Money::parse(&NumericInput::Float(0.1), "unit_price").unwrap().minor_units(),
            10
        );
    }

    #[test]
    fn money_rejects_negative_and_excess_precision() {
        assert!(Money::parse(&"-1".into(), "unit_price").is_err());
        assert!(Money::parse(&(-1).into(), "unit_price").is_err());
        assert!(Money::parse(&"1.234".into(), "unit_price").is_err());
        assert!(Money::parse(&"1,5".into(), "unit_price").is_err());
        assert!(Money::parse(&".".into(), "unit_price").is_err());
    }

    #[test]
    fn money_display_has_two_decimals() {
        assert_eq!(Money::from_minor(750).to_string(), "7.50");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(750).to_major(), 7.5);
    }

    #[test]
    fn sku_is_trimmed_and_bounded() {
        assert_eq!(Sku::parse("  SKU-001 ").unwrap().as_str(), "SKU-001");
        assert!(Sku::parse("   ").is_err());
        assert!(Sku::parse(&"X".repeat(33)).is_err());
    }

    #[test]
    fn numeric_input_deserializes_every_client_representation() {
        let v: Vec<NumericInput> = serde_json::from_str(r#"[3, 1.5, "2"]"#).unwrap();
        assert_eq!(v[0], NumericInput::Integer(3));
        assert_eq!(v[1], NumericInput::Float(1.5));
        assert_eq!(v[2], NumericInput::Text("2".to_string()));
    }

    proptest::proptest! {
        #[test]
        fn money_text_is_exact_in_cents(whole in 0u64..10_000_000, cents in 0u64..100) {
            let text = format!("{whole}.{cents:02}");
            let money = Money::parse(&text.as_str().into(), "amount").unwrap();
            proptest::prop_assert_eq!(money.minor_units(), whole * 100 + cents);
            proptest::prop_assert_eq!(money.to_string(), text);
        }

        #[test]
        fn quantity_text_matches_integer_input(n in 1i64..1_000_000) {
            let from_text = Quantity::positive(&n.to_string().as_str().into(), "quantity").unwrap();
            let from_int = Quantity::positive(&n.into(), "quantity").unwrap();
            proptest::prop_assert_eq!(from_text, from_int);
        }
    }
}
