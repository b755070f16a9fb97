//! Type coercion for fixed-width backend primitives
//!
//! `parse` turns caller-supplied JSON into a [`NormalizedValue`];
//! `format` turns a normalized value into the wire string the remote
//! call layer expects. Both are pure and deterministic.

mod rules;
mod value;

pub use rules::{format, parse, parse_text, scalar_text, TypeCoercionError};
pub use value::NormalizedValue;

pub(crate) use rules::json_type_name;
