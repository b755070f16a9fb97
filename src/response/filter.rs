//! Response projection
//!
//! The remote system returns more than the caller asked for: internal
//! fields, system structures, sometimes extra table rows. The filter copies
//! only what `output_parameters` declares, in declared order.
//!
//! - Declared but absent members become `null`
//! - A field holds only a scalar; an object or array there becomes `null`
//! - Table row order is preserved; rows are never reordered or deduplicated
//! - A structure returned as a list of rows is projected per row
//! - A table returned as a single object is projected as one row

use serde_json::{Map, Value};

use crate::schema::{Descriptor, StructureDescriptor};

/// Projected remote result
pub type FilteredResult = Map<String, Value>;

/// Projects `raw` onto the declared output shape.
pub fn filter(raw: &Value, output: &StructureDescriptor) -> FilteredResult {
    match raw {
        Value::Object(obj) => project_structure(obj, output),
        _ => project_structure(&Map::new(), output),
    }
}

fn project_structure(raw: &Map<String, Value>, descriptor: &StructureDescriptor) -> FilteredResult {
    let mut out = Map::with_capacity(descriptor.members.len());

    for member in &descriptor.members {
        let value = raw.get(member.name());
        let projected = match member {
            Descriptor::Field(_) => match value {
                Some(scalar @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => scalar.clone(),
                _ => Value::Null,
            },
            Descriptor::Structure(nested) => match value {
                Some(Value::Object(obj)) => Value::Object(project_structure(obj, nested)),
                Some(Value::Array(rows)) => project_rows(rows, nested),
                _ => Value::Null,
            },
            Descriptor::Table(table) => match value {
                Some(Value::Array(rows)) => project_rows(rows, &table.row),
                Some(Value::Object(obj)) => {
                    Value::Array(vec![Value::Object(project_structure(obj, &table.row))])
                }
                _ => Value::Null,
            },
        };
        out.insert(member.name().to_string(), projected);
    }

    out
}

fn project_rows(rows: &[Value], row: &StructureDescriptor) -> Value {
    Value::Array(
        rows.iter()
            .map(|entry| match entry {
                Value::Object(obj) => Value::Object(project_structure(obj, row)),
                _ => Value::Null,
            })
            .collect(),
    )
}
