//! Request marshaling
//!
//! Turns a validated tree into the two-channel call structures the remote
//! system expects: scalar and structure parameters on one channel, table
//! parameters on the other. Every scalar is rendered through
//! [`coercion::format`](crate::coercion::format).
//!
//! The marshaler performs no validation of its own.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coercion;
use crate::schema::{ValidatedRequest, ValidatedStructure, ValidatedTable, ValidatedValue};

/// Wire-ready call structures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallStructures {
    /// Import and structure parameters, in declared order
    pub parameters: Map<String, Value>,
    /// Table parameters, rows in caller order
    pub tables: Map<String, Value>,
}

impl CallStructures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an import or structure parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Sets a table parameter.
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.tables.insert(name.into(), Value::Array(rows));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.tables.is_empty()
    }

    /// Flattens both channels into a single keyword-argument object, as
    /// RFC client libraries take them.
    pub fn to_value(&self) -> Value {
        let mut merged = self.parameters.clone();
        for (name, rows) in &self.tables {
            merged.insert(name.clone(), rows.clone());
        }
        Value::Object(merged)
    }
}

/// Marshals a validated request.
///
/// Deterministic: marshaling the same tree twice yields identical output.
pub fn marshal(request: &ValidatedRequest<'_>) -> CallStructures {
    let mut tables = Map::new();
    for table in &request.tables {
        tables.insert(table.descriptor.name.clone(), marshal_table(table));
    }

    CallStructures {
        parameters: marshal_structure(&request.input),
        tables,
    }
}

fn marshal_structure(structure: &ValidatedStructure<'_>) -> Map<String, Value> {
    structure
        .iter()
        .map(|(name, value)| (name.to_string(), marshal_value(value)))
        .collect()
}

fn marshal_value(value: &ValidatedValue<'_>) -> Value {
    match value {
        ValidatedValue::Scalar { field, value } => Value::String(coercion::format(value, field)),
        ValidatedValue::Structure(nested) => Value::Object(marshal_structure(nested)),
        ValidatedValue::Table(table) => marshal_table(table),
    }
}

fn marshal_table(table: &ValidatedTable<'_>) -> Value {
    Value::Array(
        table
            .rows
            .iter()
            .map(|row| Value::Object(marshal_structure(row)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        FieldDescriptor, FunctionSchema, PrimitiveType, SchemaValidator, StructureDescriptor,
        TableDescriptor,
    };
    use serde_json::json;

    fn schema() -> FunctionSchema {
        FunctionSchema::new("BAPI_SALESORDER_CREATEFROMDAT2")
            .with_input(StructureDescriptor::new(
                "ORDER_HEADER_IN",
                vec![
                    FieldDescriptor::required("DOC_TYPE", PrimitiveType::Character, 4).into(),
                    FieldDescriptor::required("REQ_DATE_H", PrimitiveType::Date, 8).into(),
                    FieldDescriptor::optional("PURCH_NO_C", PrimitiveType::Character, 35).into(),
                ],
            ))
            .with_input(FieldDescriptor::optional("TESTRUN", PrimitiveType::Character, 1))
            .with_table(TableDescriptor::new(
                "ORDER_ITEMS_IN",
                vec![
                    FieldDescriptor::required("ITM_NUMBER", PrimitiveType::NumericZeroPadded, 6).into(),
                    FieldDescriptor::optional("TARGET_QTY", PrimitiveType::PackedDecimal, 13)
                        .with_decimals(3)
                        .into(),
                    FieldDescriptor::optional("TARGET_QU", PrimitiveType::UnitOfMeasure, 3).into(),
                ],
                true,
            ))
    }

    fn payload() -> Value {
        json!({
            "input": {
                "ORDER_HEADER_IN": { "DOC_TYPE": "TA", "REQ_DATE_H": "2024-05-01" },
                "TESTRUN": "X"
            },
            "tables": {
                "ORDER_ITEMS_IN": { "fields": [
                    { "ITM_NUMBER": "10", "TARGET_QTY": "2.5", "TARGET_QU": "PC" },
                    { "ITM_NUMBER": 20 }
                ] }
            }
        })
    }

    #[test]
    fn test_marshal_formats_scalars() {
        let schema = schema();
        let tree = SchemaValidator::new(&schema).validate(&payload()).unwrap();
        let call = marshal(&tree);

        assert_eq!(call.parameters["ORDER_HEADER_IN"]["DOC_TYPE"], "TA  ");
        assert_eq!(call.parameters["ORDER_HEADER_IN"]["REQ_DATE_H"], "20240501");
        assert!(call.parameters["ORDER_HEADER_IN"].get("PURCH_NO_C").is_none());
        assert_eq!(call.parameters["TESTRUN"], "X");

        let rows = call.tables["ORDER_ITEMS_IN"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ITM_NUMBER"], "000010");
        assert_eq!(rows[0]["TARGET_QTY"], "2.500");
        assert_eq!(rows[0]["TARGET_QU"], "PC");
        assert_eq!(rows[1]["ITM_NUMBER"], "000020");
    }

    #[test]
    fn test_marshal_preserves_declared_order() {
        let schema = schema();
        let tree = SchemaValidator::new(&schema).validate(&payload()).unwrap();
        let call = marshal(&tree);

        let keys: Vec<&String> = call.parameters.keys().collect();
        assert_eq!(keys, vec!["ORDER_HEADER_IN", "TESTRUN"]);
    }

    #[test]
    fn test_marshal_is_deterministic() {
        let schema = schema();
        let tree = SchemaValidator::new(&schema).validate(&payload()).unwrap();

        let first = serde_json::to_string(&marshal(&tree)).unwrap();
        let second = serde_json::to_string(&marshal(&tree)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_value_merges_channels() {
        let call = CallStructures::new()
            .with_parameter("QUERY_TABLE", json!("MARA"))
            .with_table("FIELDS", vec![json!({ "FIELDNAME": "MATNR" })]);

        let merged = call.to_value();
        assert_eq!(merged["QUERY_TABLE"], "MARA");
        assert_eq!(merged["FIELDS"][0]["FIELDNAME"], "MATNR");
        assert!(!call.is_empty());
    }
}
