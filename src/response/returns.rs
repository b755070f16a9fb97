//! RETURN message interpretation
//!
//! Remote business functions report logical outcome through a `RETURN`
//! parameter made of `TYPE`/`ID`/`NUMBER`/`MESSAGE` entries. RETURN may be
//! a single structure or a table of entries. A `TYPE` of `E` (error),
//! `A` (abort) or `X` (exit) marks the call as failed even when the
//! transport itself succeeded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the conventional message parameter
pub const RETURN_PARAMETER: &str = "RETURN";

/// Message types that mark a logical failure
///
/// Error, abort and exit only. Warnings (`W`), information (`I`) and
/// success (`S`) entries do not fail the call; their text still reaches
/// the caller inside the filtered `RETURN`.
pub const FAILURE_TYPES: &[&str] = &["E", "A", "X"];

/// One entry of a RETURN parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnMessage {
    #[serde(rename = "TYPE")]
    pub message_type: String,
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "NUMBER", default)]
    pub number: String,
    #[serde(rename = "MESSAGE", default)]
    pub message: String,
}

impl ReturnMessage {
    /// Reads an entry; fields that are missing or not strings become empty.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| -> String {
            match obj.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            }
        };

        Some(Self {
            message_type: text("TYPE").trim().to_string(),
            id: text("ID"),
            number: text("NUMBER"),
            message: text("MESSAGE"),
        })
    }

    pub fn is_failure(&self) -> bool {
        FAILURE_TYPES.contains(&self.message_type.as_str())
    }
}

/// Reads every RETURN entry from a raw result, in order.
pub fn return_messages(raw: &Value) -> Vec<ReturnMessage> {
    match raw.get(RETURN_PARAMETER) {
        Some(Value::Array(entries)) => entries.iter().filter_map(ReturnMessage::from_value).collect(),
        Some(entry @ Value::Object(_)) => ReturnMessage::from_value(entry).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Returns the first failure entry, if any.
pub fn first_failure(raw: &Value) -> Option<ReturnMessage> {
    return_messages(raw).into_iter().find(ReturnMessage::is_failure)
}
