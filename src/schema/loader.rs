//! Metadata document parsing
//!
//! Metadata documents look like:
//!
//! ```json
//! {
//!   "function_name": "BAPI_SALESORDER_CREATEFROMDAT2",
//!   "description": "...",
//!   "input_parameters": {
//!     "ORDER_HEADER_IN": {
//!       "DOC_TYPE": { "type": "CHAR", "length": 4, "required": true }
//!     }
//!   },
//!   "table_parameters": {
//!     "ORDER_ITEMS_IN": { "fields": { "ITM_NUMBER": { "type": "NUMC", "length": 6 } } }
//!   },
//!   "output_parameters": { "RETURN": { "TYPE": { "type": "CHAR", "length": 1 } } }
//! }
//! ```
//!
//! A member object carrying a string `type` is a leaf field. An object whose
//! only keys are `fields` plus table attributes is a table. Any other object
//! is a nested structure, at any depth.

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{
    Descriptor, FieldDescriptor, FunctionSchema, PrimitiveType, StructureDescriptor,
    TableDescriptor,
};
use super::violation::make_path;

/// Keys allowed next to `fields` in a table descriptor
const TABLE_KEYS: &[&str] = &["fields", "required", "min_rows", "max_rows", "description"];

/// Largest fractional digit count a packed decimal may declare
const MAX_DECIMALS: u64 = 28;

/// Parses a metadata document from text. A leading UTF-8 byte order mark
/// is tolerated.
pub fn parse_schema_text(text: &str) -> SchemaResult<FunctionSchema> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| SchemaError::malformed("$", format!("Invalid JSON: {}", e)))?;
    parse_function_schema(&doc)
}

/// Parses an already-decoded metadata document.
pub fn parse_function_schema(doc: &Value) -> SchemaResult<FunctionSchema> {
    let obj = doc
        .as_object()
        .ok_or_else(|| SchemaError::malformed("$", "metadata must be a JSON object"))?;

    let function_name = match obj.get("function_name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(SchemaError::malformed("function_name", "must be a non-empty string")),
    };

    let description = match obj.get("description") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(SchemaError::malformed("description", "must be a string")
                .for_function(&function_name))
        }
    };

    let parse = || -> SchemaResult<FunctionSchema> {
        let input_parameters = parse_group(obj.get("input_parameters"), "input_parameters")?;
        let output_parameters = parse_group(obj.get("output_parameters"), "output_parameters")?;

        let mut table_parameters = Vec::new();
        match obj.get("table_parameters") {
            None | Some(Value::Null) => {}
            Some(Value::Object(tables)) => {
                for (name, value) in tables {
                    let path = make_path("table_parameters", name);
                    let table_obj = value
                        .as_object()
                        .ok_or_else(|| SchemaError::malformed(&path, "table must be an object"))?;
                    if !table_obj.contains_key("fields") {
                        return Err(SchemaError::malformed(&path, "table must declare 'fields'"));
                    }
                    table_parameters.push(parse_table(name, table_obj, &path)?);
                }
            }
            Some(_) => return Err(SchemaError::malformed("table_parameters", "must be an object")),
        }

        Ok(FunctionSchema {
            function_name: function_name.clone(),
            description: description.clone(),
            input_parameters,
            table_parameters,
            output_parameters,
        })
    };

    parse().map_err(|e| e.for_function(&function_name))
}

/// Parses a top-level parameter group (input or output).
fn parse_group(value: Option<&Value>, path: &str) -> SchemaResult<StructureDescriptor> {
    match value {
        None | Some(Value::Null) => Ok(StructureDescriptor::default()),
        Some(Value::Object(members)) => Ok(StructureDescriptor::new("", parse_members(members, path)?)),
        Some(_) => Err(SchemaError::malformed(path, "must be an object")),
    }
}

fn parse_members(members: &Map<String, Value>, path: &str) -> SchemaResult<Vec<Descriptor>> {
    members
        .iter()
        .map(|(name, value)| parse_member(name, value, &make_path(path, name)))
        .collect()
}

fn parse_member(name: &str, value: &Value, path: &str) -> SchemaResult<Descriptor> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::malformed(path, "expected a descriptor object"))?;

    if matches!(obj.get("type"), Some(Value::String(_))) {
        return parse_field(name, obj, path).map(Descriptor::Field);
    }

    if is_table(obj) {
        return parse_table(name, obj, path).map(Descriptor::Table);
    }

    let members = parse_members(obj, path)?;
    Ok(Descriptor::Structure(StructureDescriptor::new(name, members)))
}

fn is_table(obj: &Map<String, Value>) -> bool {
    matches!(obj.get("fields"), Some(Value::Object(_)))
        && obj.keys().all(|k| TABLE_KEYS.contains(&k.as_str()))
}

fn parse_field(name: &str, obj: &Map<String, Value>, path: &str) -> SchemaResult<FieldDescriptor> {
    let type_name = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    let primitive_type = PrimitiveType::from_name(type_name).ok_or_else(|| {
        SchemaError::malformed(path, format!("unknown primitive type '{}'", type_name))
    })?;

    let max_length = match obj.get("length").and_then(Value::as_u64) {
        Some(len) if len > 0 && len <= u64::from(u32::MAX) => len as u32,
        _ => return Err(SchemaError::malformed(path, "length must be a positive integer")),
    };

    let required = optional_bool(obj, "required", path)?.unwrap_or(false);
    let signed = optional_bool(obj, "signed", path)?.unwrap_or(false);

    let decimals = match obj.get("decimals") {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_u64() {
            Some(d) if d <= MAX_DECIMALS => Some(d as u32),
            _ => {
                return Err(SchemaError::malformed(
                    path,
                    format!("decimals must be an integer between 0 and {}", MAX_DECIMALS),
                ))
            }
        },
    };

    if decimals.is_some() && primitive_type != PrimitiveType::PackedDecimal {
        return Err(SchemaError::malformed(path, "decimals only apply to packed decimals"));
    }
    if signed && primitive_type != PrimitiveType::NumericZeroPadded {
        return Err(SchemaError::malformed(path, "signed only applies to numeric fields"));
    }

    Ok(FieldDescriptor {
        name: name.to_string(),
        primitive_type,
        max_length,
        required,
        decimals,
        signed,
    })
}

fn parse_table(name: &str, obj: &Map<String, Value>, path: &str) -> SchemaResult<TableDescriptor> {
    let fields_path = make_path(path, "fields");
    let fields = obj
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::malformed(&fields_path, "must be an object"))?;

    let row_members = parse_members(fields, &fields_path)?;
    let required = optional_bool(obj, "required", path)?.unwrap_or(true);
    let min_rows = optional_count(obj, "min_rows", path)?;
    let max_rows = optional_count(obj, "max_rows", path)?;

    if let (Some(min), Some(max)) = (min_rows, max_rows) {
        if min > max {
            return Err(SchemaError::malformed(path, "min_rows must not exceed max_rows"));
        }
    }

    let mut table = TableDescriptor::new(name, row_members, required);
    table.min_rows = min_rows;
    table.max_rows = max_rows;
    Ok(table)
}

fn optional_bool(obj: &Map<String, Value>, key: &str, path: &str) -> SchemaResult<Option<bool>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(SchemaError::malformed(make_path(path, key), "must be a boolean")),
    }
}

fn optional_count(obj: &Map<String, Value>, key: &str, path: &str) -> SchemaResult<Option<usize>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| SchemaError::malformed(make_path(path, key), "must be a non-negative integer")),
    }
}

/// Renders a schema back into the metadata document shape.
pub fn render_function_schema(schema: &FunctionSchema) -> Value {
    let mut doc = Map::new();
    doc.insert("function_name".into(), Value::String(schema.function_name.clone()));
    doc.insert("description".into(), Value::String(schema.description.clone()));
    doc.insert("input_parameters".into(), render_members(&schema.input_parameters));

    let mut tables = Map::new();
    for table in &schema.table_parameters {
        tables.insert(table.name.clone(), render_table(table));
    }
    doc.insert("table_parameters".into(), Value::Object(tables));
    doc.insert("output_parameters".into(), render_members(&schema.output_parameters));
    Value::Object(doc)
}

fn render_members(structure: &StructureDescriptor) -> Value {
    let mut members = Map::new();
    for member in &structure.members {
        let rendered = match member {
            Descriptor::Field(field) => render_field(field),
            Descriptor::Structure(nested) => render_members(nested),
            Descriptor::Table(table) => render_table(table),
        };
        members.insert(member.name().to_string(), rendered);
    }
    Value::Object(members)
}

fn render_field(field: &FieldDescriptor) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::String(field.primitive_type.code().to_string()));
    obj.insert("length".into(), Value::from(field.max_length));
    obj.insert("required".into(), Value::Bool(field.required));
    if let Some(decimals) = field.decimals {
        obj.insert("decimals".into(), Value::from(decimals));
    }
    if field.signed {
        obj.insert("signed".into(), Value::Bool(true));
    }
    Value::Object(obj)
}

fn render_table(table: &TableDescriptor) -> Value {
    let mut obj = Map::new();
    obj.insert("fields".into(), render_members(&table.row));
    obj.insert("required".into(), Value::Bool(table.required));
    if let Some(min) = table.min_rows {
        obj.insert("min_rows".into(), Value::from(min));
    }
    if let Some(max) = table.max_rows {
        obj.insert("max_rows".into(), Value::from(max));
    }
    Value::Object(obj)
}
