//! Payload validator
//!
//! Validation semantics:
//! - Traversal follows the schema, not the payload, so every declared
//!   member is considered even when absent
//! - Missing required members are reported at their exact path
//! - Present values are coerced per primitive type
//! - Table rows are validated independently, index appended to the path
//! - Every violation in the payload is collected; nothing short-circuits
//! - Undeclared members are ignored or rejected per [`UnknownFieldPolicy`]
//!
//! `null` and `""` count as absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coercion::{self, json_type_name};

use super::tree::{ValidatedRequest, ValidatedStructure, ValidatedTable, ValidatedValue};
use super::types::{Descriptor, FunctionSchema, StructureDescriptor, TableDescriptor};
use super::violation::{make_path, row_path, ReasonCode, Violation, ViolationList};

/// How members present in the payload but absent from the schema are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Silently skip undeclared members
    #[default]
    Ignore,
    /// Report undeclared members as `UNKNOWN_FIELD` violations
    Reject,
}

/// Validates request parameters against one function schema.
///
/// The validator never mutates the payload and is deterministic.
pub struct SchemaValidator<'s> {
    schema: &'s FunctionSchema,
    policy: UnknownFieldPolicy,
}

impl<'s> SchemaValidator<'s> {
    /// Creates a validator for the given schema with the default policy.
    pub fn new(schema: &'s FunctionSchema) -> Self {
        Self {
            schema,
            policy: UnknownFieldPolicy::default(),
        }
    }

    /// Sets the unknown-field policy.
    pub fn with_policy(mut self, policy: UnknownFieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validates `{ "input": {...}, "tables": {...} }` parameters.
    ///
    /// # Errors
    ///
    /// Returns the complete [`ViolationList`] if any value fails.
    pub fn validate(&self, parameters: &Value) -> Result<ValidatedRequest<'s>, ViolationList> {
        let mut violations = ViolationList::new();
        let empty = Map::new();

        let params = match parameters {
            Value::Null => &empty,
            Value::Object(obj) => obj,
            other => {
                violations.push(Violation::invalid_shape(
                    "$parameters",
                    "object",
                    json_type_name(other),
                ));
                return Err(violations);
            }
        };

        let input = self.group(params.get("input"), "$input", &empty, &mut violations);
        let tables = self.group(params.get("tables"), "$tables", &empty, &mut violations);

        let input = self.validate_structure(input, &self.schema.input_parameters, "", &mut violations);

        let mut validated_tables = Vec::new();
        for table in &self.schema.table_parameters {
            let raw = present(tables.get(&table.name));
            if let Some(validated) = self.validate_table(raw, table, &table.name, &mut violations) {
                validated_tables.push(validated);
            }
        }

        if self.policy == UnknownFieldPolicy::Reject {
            for name in tables.keys() {
                if self.schema.table(name).is_none() {
                    violations.push(Violation::unknown_field(name.as_str()));
                }
            }
        }

        if violations.is_empty() {
            Ok(ValidatedRequest {
                input,
                tables: validated_tables,
            })
        } else {
            Err(violations)
        }
    }

    /// Resolves a parameter group; a non-object group is a shape violation.
    fn group<'p>(
        &self,
        value: Option<&'p Value>,
        path: &str,
        empty: &'p Map<String, Value>,
        out: &mut ViolationList,
    ) -> &'p Map<String, Value> {
        match value {
            None | Some(Value::Null) => empty,
            Some(Value::Object(obj)) => obj,
            Some(other) => {
                out.push(Violation::invalid_shape(path, "object", json_type_name(other)));
                empty
            }
        }
    }

    fn validate_structure(
        &self,
        obj: &Map<String, Value>,
        descriptor: &'s StructureDescriptor,
        prefix: &str,
        out: &mut ViolationList,
    ) -> ValidatedStructure<'s> {
        let mut result = ValidatedStructure::new();

        for member in &descriptor.members {
            let path = make_path(prefix, member.name());
            let raw = present(obj.get(member.name()));

            match member {
                Descriptor::Field(field) => match raw {
                    None => {
                        if field.required {
                            out.push(Violation::missing_required(path));
                        }
                    }
                    Some(raw) => match coercion::parse(raw, field) {
                        Ok(value) => result.push(&field.name, ValidatedValue::Scalar { field, value }),
                        Err(e) => out.push(Violation::new(
                            path,
                            ReasonCode::TypeOrLengthViolation,
                            e.to_string(),
                        )),
                    },
                },
                Descriptor::Structure(nested) => match raw {
                    None => {
                        // Walk the absent structure so each missing required
                        // member is reported at its own path.
                        if nested.has_required() {
                            self.validate_structure(&Map::new(), nested, &path, out);
                        }
                    }
                    Some(Value::Object(nested_obj)) => {
                        let validated = self.validate_structure(nested_obj, nested, &path, out);
                        if !validated.is_empty() {
                            result.push(&nested.name, ValidatedValue::Structure(validated));
                        }
                    }
                    Some(other) => out.push(Violation::invalid_shape(
                        path,
                        "object",
                        json_type_name(other),
                    )),
                },
                Descriptor::Table(table) => {
                    if let Some(validated) = self.validate_table(raw, table, &path, out) {
                        result.push(&table.name, ValidatedValue::Table(validated));
                    }
                }
            }
        }

        if self.policy == UnknownFieldPolicy::Reject {
            for key in obj.keys() {
                if descriptor.member(key).is_none() {
                    out.push(Violation::unknown_field(make_path(prefix, key)));
                }
            }
        }

        result
    }

    fn validate_table(
        &self,
        raw: Option<&Value>,
        table: &'s TableDescriptor,
        path: &str,
        out: &mut ViolationList,
    ) -> Option<ValidatedTable<'s>> {
        let raw = match raw {
            Some(raw) => raw,
            None => {
                if table.required {
                    out.push(Violation::missing_required(path));
                }
                return None;
            }
        };

        let rows = match table_rows(raw) {
            Some(rows) => rows,
            None => {
                out.push(Violation::invalid_shape(
                    path,
                    "a sequence of rows",
                    json_type_name(raw),
                ));
                return None;
            }
        };

        if let Some(min) = table.min_rows {
            if rows.len() < min {
                out.push(Violation::new(
                    path,
                    ReasonCode::RowCountViolation,
                    format!("expected at least {} rows, got {}", min, rows.len()),
                ));
            }
        }
        if let Some(max) = table.max_rows {
            if rows.len() > max {
                out.push(Violation::new(
                    path,
                    ReasonCode::RowCountViolation,
                    format!("expected at most {} rows, got {}", max, rows.len()),
                ));
            }
        }

        let mut validated = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let path = row_path(path, index);
            match row {
                Value::Object(row_obj) => {
                    validated.push(self.validate_structure(row_obj, &table.row, &path, out));
                }
                other => out.push(Violation::invalid_shape(path, "row object", json_type_name(other))),
            }
        }

        Some(ValidatedTable {
            descriptor: table,
            rows: validated,
        })
    }
}

/// Treats `null` and the empty string as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}

/// Extracts table rows from the accepted wire shapes:
/// - `[row, ...]`
/// - `{ "fields": [row, ...] }`
/// - `{ "fields": row }` (single-row shorthand; `{}` means no rows)
fn table_rows(raw: &Value) -> Option<Vec<&Value>> {
    match raw {
        Value::Array(rows) => Some(rows.iter().collect()),
        Value::Object(obj) => match obj.get("fields") {
            Some(Value::Array(rows)) => Some(rows.iter().collect()),
            Some(row) if row.is_object() => {
                if row.as_object().map_or(true, Map::is_empty) {
                    Some(Vec::new())
                } else {
                    Some(vec![row])
                }
            }
            None | Some(Value::Null) => Some(Vec::new()),
            Some(_) => None,
        },
        _ => None,
    }
}
