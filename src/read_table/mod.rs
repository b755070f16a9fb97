//! Master-data table reads
//!
//! Reads rows of a backend table through the generic `RFC_READ_TABLE`
//! function. The remote side returns each row as one delimited work-area
//! line (`DATA[].WA`) plus the column list (`FIELDS[].FIELDNAME`); this
//! module builds the call and splits the lines back into records.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::invocation::{GatewayError, GatewayResult, Orchestrator};
use crate::marshal::CallStructures;
use crate::observability::Event;

/// Remote function used for table reads
pub const READ_TABLE_FUNCTION: &str = "RFC_READ_TABLE";

/// Column delimiter requested from the remote side
pub const DELIMITER: &str = "|";

/// Width of one OPTIONS line on the remote side
pub const OPTION_LINE_WIDTH: usize = 72;

/// Table read request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadTableRequest {
    /// Table to read, e.g. `LIKP`
    pub table: String,
    /// Columns to return; empty means all columns
    #[serde(default)]
    pub fields: Vec<String>,
    /// Open SQL selection, e.g. `VBELN = '0080000001'`
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    /// Shorthand for `VBELN = '<key>'` when no `where` is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_key: Option<String>,
    /// Maximum rows to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u32>,
}

impl ReadTableRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Effective selection clause
    pub fn selection(&self) -> Option<String> {
        match self.where_clause.as_deref().map(str::trim) {
            Some(clause) if !clause.is_empty() => Some(clause.to_string()),
            _ => self
                .condition_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(|key| format!("VBELN = '{}'", key.replace('\'', "''"))),
        }
    }

    /// Checks table and column names.
    pub fn validate(&self) -> GatewayResult<()> {
        if !is_valid_name(&self.table) {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid table name '{}'",
                self.table
            )));
        }
        if let Some(field) = self.fields.iter().find(|f| !is_valid_name(f)) {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid field name '{}'",
                field
            )));
        }
        Ok(())
    }

    /// Builds the `RFC_READ_TABLE` call structures.
    pub fn to_call(&self) -> CallStructures {
        let fields = self
            .fields
            .iter()
            .map(|name| json!({ "FIELDNAME": name }))
            .collect();
        let options = self
            .selection()
            .map(|clause| option_lines(&clause))
            .unwrap_or_default()
            .into_iter()
            .map(|line| json!({ "TEXT": line }))
            .collect();

        let mut call = CallStructures::new()
            .with_parameter("QUERY_TABLE", json!(self.table))
            .with_parameter("DELIMITER", json!(DELIMITER))
            .with_table("FIELDS", fields)
            .with_table("OPTIONS", options);

        if let Some(rows) = self.row_count {
            call = call.with_parameter("ROWCOUNT", json!(rows));
        }
        call
    }
}

/// Table read result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadTableResponse {
    pub status: String,
    pub record_found: bool,
    pub data: ReadTableData,
}

/// Parsed records plus the column and selection tables as returned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadTableData {
    #[serde(rename = "DATA")]
    pub records: Vec<Map<String, Value>>,
    #[serde(rename = "FIELDS")]
    pub fields: Vec<Value>,
    #[serde(rename = "OPTIONS")]
    pub options: Vec<Value>,
}

/// Table and column names: letters, digits, `_` and namespace slashes.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/')
}

/// Word-wraps a selection clause into lines of at most
/// [`OPTION_LINE_WIDTH`] characters. Words longer than a line are split.
/// A quoted literal is one word and keeps its inner spacing.
pub fn option_lines(clause: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in clause_words(clause) {
        let mut word: &str = word;
        while word.chars().count() > OPTION_LINE_WIDTH {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(OPTION_LINE_WIDTH)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > OPTION_LINE_WIDTH {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits on whitespace outside single-quoted literals.
fn clause_words(clause: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = None;
    let mut quoted = false;

    for (i, c) in clause.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        }
        if c.is_whitespace() && !quoted {
            if let Some(begin) = start.take() {
                words.push(&clause[begin..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(begin) = start {
        words.push(&clause[begin..]);
    }
    words
}

/// Splits `DATA[].WA` lines into records keyed by `FIELDS[].FIELDNAME`.
///
/// Values are kept verbatim; a line with fewer columns than declared
/// yields empty strings for the missing ones.
pub fn parse_work_areas(data: &[Value], fields: &[Value]) -> Vec<Map<String, Value>> {
    let names: Vec<&str> = fields
        .iter()
        .map(|f| f.get("FIELDNAME").and_then(Value::as_str).unwrap_or_default())
        .collect();

    data.iter()
        .map(|entry| {
            let line = entry.get("WA").and_then(Value::as_str).unwrap_or_default();
            let mut values = line.split(DELIMITER);
            names
                .iter()
                .map(|name| {
                    let value = values.next().unwrap_or_default();
                    (name.to_string(), Value::String(value.to_string()))
                })
                .collect()
        })
        .collect()
}

fn rows_of(raw: &Value, name: &str) -> Vec<Value> {
    match raw.get(name) {
        Some(Value::Array(rows)) => rows.clone(),
        _ => Vec::new(),
    }
}

/// Reads table rows through the orchestrator's transport.
pub async fn read_table(
    orchestrator: &Orchestrator,
    request: &ReadTableRequest,
) -> GatewayResult<ReadTableResponse> {
    request.validate()?;

    let call = request.to_call();
    let raw = orchestrator.invoke_raw(READ_TABLE_FUNCTION, &call).await?;

    let data = rows_of(&raw, "DATA");
    let fields = rows_of(&raw, "FIELDS");
    let options = rows_of(&raw, "OPTIONS");
    let records = parse_work_areas(&data, &fields);

    orchestrator.metrics().increment_table_reads();
    info!(
        event = Event::TableReadExecuted.as_str(),
        table = %request.table,
        records = records.len()
    );

    Ok(ReadTableResponse {
        status: "success".to_string(),
        record_found: !records.is_empty(),
        data: ReadTableData {
            records,
            fields,
            options,
        },
    })
}
