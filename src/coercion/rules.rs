//! Per-type parse and format rules
//!
//! | Type | Parse | Wire format |
//! |------|-------|-------------|
//! | CHAR | any text, at most `length` characters | right-padded with spaces |
//! | NUMC | digits (leading `-` only when signed), at most `length` significant digits | left-padded with zeros |
//! | DEC  | decimal, at most `length` integer digits, scale preserved | plain decimal |
//! | DATS | `YYYY-MM-DD`, `YYYYMMDD` or `DD.MM.YYYY` | `YYYYMMDD` |
//! | UNIT / CUKY | uppercase alphanumeric, at most `length` characters | as parsed |
//!
//! All rules are pure functions of their inputs.

use std::borrow::Cow;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use super::value::NormalizedValue;
use crate::schema::{FieldDescriptor, PrimitiveType};

/// Why a raw value could not be coerced. Always reported as part of a
/// validation failure, never on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeCoercionError {
    #[error("expected a scalar value, got {found}")]
    NotAScalar { found: &'static str },

    #[error("length {actual} exceeds maximum {max}")]
    LengthExceeded { max: u32, actual: usize },

    #[error("'{value}' is not a digit string")]
    NotNumeric { value: String },

    #[error("sign not allowed on unsigned numeric field")]
    SignNotAllowed,

    #[error("{actual} digits exceed maximum {max}")]
    TooManyDigits { max: u32, actual: usize },

    #[error("'{value}' is not a decimal number")]
    InvalidDecimal { value: String },

    #[error("{actual} fractional digits cannot be stored in {decimals} without rounding")]
    PrecisionLoss { decimals: u32, actual: usize },

    #[error("'{value}' is not a valid date (expected YYYY-MM-DD, YYYYMMDD or DD.MM.YYYY)")]
    InvalidDate { value: String },

    #[error("'{value}' must be uppercase alphanumeric")]
    InvalidCode { value: String },
}

/// Extracts the textual form of a JSON scalar.
///
/// Numbers are accepted for every type and use their JSON text.
pub fn scalar_text(raw: &Value) -> Result<Cow<'_, str>, TypeCoercionError> {
    match raw {
        Value::String(s) => Ok(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Ok(Cow::Owned(n.to_string())),
        other => Err(TypeCoercionError::NotAScalar {
            found: json_type_name(other),
        }),
    }
}

/// Parses a raw JSON value against a field descriptor.
pub fn parse(raw: &Value, field: &FieldDescriptor) -> Result<NormalizedValue, TypeCoercionError> {
    let text = scalar_text(raw)?;
    parse_text(&text, field)
}

/// Parses text against a field descriptor.
pub fn parse_text(text: &str, field: &FieldDescriptor) -> Result<NormalizedValue, TypeCoercionError> {
    match field.primitive_type {
        PrimitiveType::Character => {
            check_length(text, field.max_length)?;
            Ok(NormalizedValue::Text(text.to_string()))
        }
        PrimitiveType::NumericZeroPadded => parse_numeric(text, field),
        PrimitiveType::PackedDecimal => parse_packed(text, field),
        PrimitiveType::Date => parse_date(text).map(NormalizedValue::Date),
        PrimitiveType::UnitOfMeasure => parse_code(text, field.max_length).map(NormalizedValue::Unit),
        PrimitiveType::CurrencyKey => {
            parse_code(text, field.max_length).map(NormalizedValue::Currency)
        }
    }
}

/// Formats a normalized value into its fixed-format wire string.
pub fn format(value: &NormalizedValue, field: &FieldDescriptor) -> String {
    let width = field.max_length as usize;
    match value {
        NormalizedValue::Text(s) => format!("{:<width$}", s, width = width),
        NormalizedValue::Numeric { negative, digits } => {
            let padded = format!("{:0>width$}", digits, width = width);
            if *negative {
                format!("-{}", padded)
            } else {
                padded
            }
        }
        NormalizedValue::Decimal(d) => d.to_string(),
        NormalizedValue::Date(d) => d.format("%Y%m%d").to_string(),
        NormalizedValue::Unit(code) | NormalizedValue::Currency(code) => code.clone(),
    }
}

fn check_length(text: &str, max: u32) -> Result<(), TypeCoercionError> {
    let actual = text.chars().count();
    if actual > max as usize {
        return Err(TypeCoercionError::LengthExceeded { max, actual });
    }
    Ok(())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_numeric(text: &str, field: &FieldDescriptor) -> Result<NormalizedValue, TypeCoercionError> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) if field.signed => (true, rest),
        Some(_) => return Err(TypeCoercionError::SignNotAllowed),
        None => (false, text),
    };

    if !is_digits(body) {
        return Err(TypeCoercionError::NotNumeric {
            value: text.to_string(),
        });
    }

    let significant = match body.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };

    if significant.len() > field.max_length as usize {
        return Err(TypeCoercionError::TooManyDigits {
            max: field.max_length,
            actual: significant.len(),
        });
    }

    Ok(NormalizedValue::Numeric {
        negative: negative && significant != "0",
        digits: significant.to_string(),
    })
}

fn parse_packed(text: &str, field: &FieldDescriptor) -> Result<NormalizedValue, TypeCoercionError> {
    let invalid = || TypeCoercionError::InvalidDecimal {
        value: text.to_string(),
    };

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => {
            if !is_digits(frac_part) {
                return Err(invalid());
            }
            (int_part, frac_part)
        }
        None => (body, ""),
    };

    if !is_digits(int_part) {
        return Err(invalid());
    }

    let int_digits = int_part.trim_start_matches('0').len();
    if int_digits > field.max_length as usize {
        return Err(TypeCoercionError::TooManyDigits {
            max: field.max_length,
            actual: int_digits,
        });
    }

    let mut frac = frac_part;
    if let Some(decimals) = field.decimals {
        if frac.len() > decimals as usize {
            let (kept, dropped) = frac.split_at(decimals as usize);
            if dropped.bytes().any(|b| b != b'0') {
                return Err(TypeCoercionError::PrecisionLoss {
                    decimals,
                    actual: frac.len(),
                });
            }
            frac = kept;
        }
    }

    let canonical = if frac.is_empty() {
        format!("{}{}", if negative { "-" } else { "" }, int_part)
    } else {
        format!("{}{}.{}", if negative { "-" } else { "" }, int_part, frac)
    };

    let mut value = Decimal::from_str_exact(&canonical).map_err(|_| invalid())?;
    if let Some(decimals) = field.decimals {
        value.rescale(decimals);
    }
    if value.is_zero() {
        value.set_sign_positive(true);
    }

    Ok(NormalizedValue::Decimal(value))
}

fn parse_date(text: &str) -> Result<NaiveDate, TypeCoercionError> {
    let invalid = || TypeCoercionError::InvalidDate {
        value: text.to_string(),
    };

    let (year, month, day) = match text.len() {
        8 if is_digits(text) => (&text[0..4], &text[4..6], &text[6..8]),
        10 if text.is_ascii() => {
            let bytes = text.as_bytes();
            if bytes[4] == b'-' && bytes[7] == b'-' {
                (&text[0..4], &text[5..7], &text[8..10])
            } else if bytes[2] == b'.' && bytes[5] == b'.' {
                (&text[6..10], &text[3..5], &text[0..2])
            } else {
                return Err(invalid());
            }
        }
        _ => return Err(invalid()),
    };

    if !(is_digits(year) && is_digits(month) && is_digits(day)) {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

fn parse_code(text: &str, max: u32) -> Result<String, TypeCoercionError> {
    check_length(text, max)?;
    if !text.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(TypeCoercionError::InvalidCode {
            value: text.to_string(),
        });
    }
    Ok(text.to_string())
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
