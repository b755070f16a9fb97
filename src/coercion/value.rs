//! Normalized scalar values

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A parsed scalar, typed per primitive type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NormalizedValue {
    /// Character data exactly as supplied (never padded)
    Text(String),
    /// Zero-padded numeric, leading zeros stripped
    Numeric {
        /// Minus sign present (signed fields only)
        negative: bool,
        /// Significant digits, at least one
        digits: String,
    },
    /// Packed decimal with its scale preserved
    Decimal(Decimal),
    /// Calendar date
    Date(NaiveDate),
    /// Unit of measure code
    Unit(String),
    /// Currency key
    Currency(String),
}

impl NormalizedValue {
    /// Returns the kind name for messages
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedValue::Text(_) => "text",
            NormalizedValue::Numeric { .. } => "numeric",
            NormalizedValue::Decimal(_) => "decimal",
            NormalizedValue::Date(_) => "date",
            NormalizedValue::Unit(_) => "unit",
            NormalizedValue::Currency(_) => "currency",
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Text(s) | NormalizedValue::Unit(s) | NormalizedValue::Currency(s) => {
                write!(f, "{}", s)
            }
            NormalizedValue::Numeric { negative, digits } => {
                if *negative {
                    write!(f, "-{}", digits)
                } else {
                    write!(f, "{}", digits)
                }
            }
            NormalizedValue::Decimal(d) => write!(f, "{}", d),
            NormalizedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}
