//! Schema validation and marshaling invariants
//!
//! Exercises the shipped sales-order metadata end to end:
//! 1. Metadata parses and renders back to an equivalent schema
//! 2. Validation reports every violation with its exact path
//! 3. Marshaling produces fixed-format values deterministically
//! 4. Unknown members follow the configured policy

use serde_json::{json, Value};

use rfcgate::marshal::marshal;
use rfcgate::schema::{
    parse_function_schema, parse_schema_text, render_function_schema, FunctionSchema, ReasonCode,
    SchemaValidator, UnknownFieldPolicy,
};

const SALES_ORDER: &str = include_str!("../metadata/BAPI_SALESORDER_CREATEFROMDAT2.json");

fn sales_order() -> FunctionSchema {
    parse_schema_text(SALES_ORDER).unwrap()
}

fn valid_parameters() -> Value {
    json!({
        "input": {
            "ORDER_HEADER_IN": {
                "DOC_TYPE": "TA",
                "SALES_ORG": "1000",
                "DISTR_CHAN": "10",
                "DIVISION": "00",
                "REQ_DATE_H": "2024-03-01"
            },
            "TESTRUN": "X"
        },
        "tables": {
            "ORDER_ITEMS_IN": [
                { "ITM_NUMBER": "10", "MATERIAL": "MAT-100", "TARGET_QTY": "5", "TARGET_QU": "PC" },
                { "ITM_NUMBER": 20, "MATERIAL": "MAT-200", "TARGET_QTY": 1.5 }
            ],
            "ORDER_PARTNERS": [
                { "PARTN_ROLE": "AG", "PARTN_NUMB": "1000" }
            ]
        }
    })
}

// =============================================================================
// METADATA
// =============================================================================

#[test]
fn test_shipped_metadata_parses() {
    let schema = sales_order();
    assert_eq!(schema.function_name, "BAPI_SALESORDER_CREATEFROMDAT2");
    assert_eq!(schema.input_parameters.len(), 2);
    assert_eq!(schema.table_parameters.len(), 3);

    let names: Vec<&str> = schema.table_parameters.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["ORDER_ITEMS_IN", "ORDER_PARTNERS", "ORDER_SCHEDULES_IN"]);

    assert!(schema.table("ORDER_ITEMS_IN").unwrap().required);
    assert!(!schema.table("ORDER_SCHEDULES_IN").unwrap().required);
}

#[test]
fn test_rendered_metadata_parses_to_same_schema() {
    let schema = sales_order();
    let rendered = render_function_schema(&schema);
    assert_eq!(parse_function_schema(&rendered).unwrap(), schema);
}

// =============================================================================
// VALIDATION COMPLETENESS
// =============================================================================

/// Every failing location is reported, in schema order, in one pass.
#[test]
fn test_all_violations_reported_with_paths() {
    let schema = sales_order();
    let parameters = json!({
        "input": {
            "ORDER_HEADER_IN": {
                "SALES_ORG": "1000",
                "DISTR_CHAN": "10",
                "DIVISION": "00",
                "REQ_DATE_H": "2024-02-30"
            }
        },
        "tables": {
            "ORDER_ITEMS_IN": [
                { "ITM_NUMBER": "10", "MATERIAL": "MAT-100", "TARGET_QTY": "5" },
                { "ITM_NUMBER": "1x", "MATERIAL": "MAT-200", "TARGET_QTY": "5" }
            ]
        }
    });

    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();

    assert_eq!(
        violations.paths(),
        vec![
            "ORDER_HEADER_IN.DOC_TYPE",
            "ORDER_HEADER_IN.REQ_DATE_H",
            "ORDER_ITEMS_IN[1].ITM_NUMBER",
            "ORDER_PARTNERS",
        ]
    );
    assert_eq!(
        violations.at("ORDER_HEADER_IN.DOC_TYPE").unwrap().reason,
        ReasonCode::MissingRequired
    );
    assert_eq!(
        violations.at("ORDER_HEADER_IN.REQ_DATE_H").unwrap().reason,
        ReasonCode::TypeOrLengthViolation
    );
    assert_eq!(violations.at("ORDER_PARTNERS").unwrap().reason, ReasonCode::MissingRequired);
}

/// An absent structure reports each of its required members.
#[test]
fn test_absent_structure_reports_required_members() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["input"]
        .as_object_mut()
        .unwrap()
        .remove("ORDER_HEADER_IN");

    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();
    assert_eq!(
        violations.paths(),
        vec![
            "ORDER_HEADER_IN.DOC_TYPE",
            "ORDER_HEADER_IN.SALES_ORG",
            "ORDER_HEADER_IN.DISTR_CHAN",
            "ORDER_HEADER_IN.DIVISION",
        ]
    );
    assert!(violations.iter().all(|v| v.reason == ReasonCode::MissingRequired));
}

/// Null and the empty string are absent values.
#[test]
fn test_null_and_empty_string_are_absent() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["input"]["ORDER_HEADER_IN"]["REQ_DATE_H"] = json!("");
    parameters["input"]["ORDER_HEADER_IN"]["PURCH_NO_C"] = Value::Null;
    assert!(SchemaValidator::new(&schema).validate(&parameters).is_ok());

    parameters["input"]["ORDER_HEADER_IN"]["DOC_TYPE"] = json!("");
    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();
    assert_eq!(violations.paths(), vec!["ORDER_HEADER_IN.DOC_TYPE"]);
}

/// Required members are found at any depth, including rows of a table
/// held inside a structure.
#[test]
fn test_missing_required_at_nested_paths() {
    let schema = parse_function_schema(&json!({
        "function_name": "Z_NESTED",
        "input_parameters": {
            "L1": {
                "L2": {
                    "L3": { "LEAF": { "type": "CHAR", "length": 3, "required": true } },
                    "ROWS": { "fields": { "N": { "type": "NUMC", "length": 2, "required": true } } }
                }
            }
        }
    }))
    .unwrap();

    let parameters = json!({
        "input": { "L1": { "L2": { "L3": {}, "ROWS": [{ "N": "1" }, {}] } } }
    });
    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();

    assert_eq!(violations.paths(), vec!["L1.L2.L3.LEAF", "L1.L2.ROWS[1].N"]);
    assert!(violations.iter().all(|v| v.reason == ReasonCode::MissingRequired));

    let parameters = json!({
        "input": { "L1": { "L2": { "L3": { "LEAF": "abc" }, "ROWS": [{ "N": "1" }] } } }
    });
    let validated = SchemaValidator::new(&schema).validate(&parameters).unwrap();
    let call = marshal(&validated).to_value();
    assert_eq!(call["L1"]["L2"]["L3"]["LEAF"], json!("abc"));
    assert_eq!(call["L1"]["L2"]["ROWS"][0]["N"], json!("01"));
}

#[test]
fn test_row_count_bounds() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["tables"]["ORDER_ITEMS_IN"] = json!([]);

    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();
    assert_eq!(violations.len(), 1);
    let violation = violations.at("ORDER_ITEMS_IN").unwrap();
    assert_eq!(violation.reason, ReasonCode::RowCountViolation);
}

#[test]
fn test_parameters_must_be_an_object() {
    let schema = sales_order();
    let violations = SchemaValidator::new(&schema).validate(&json!([1, 2])).unwrap_err();
    assert_eq!(violations.paths(), vec!["$parameters"]);
    assert_eq!(violations.at("$parameters").unwrap().reason, ReasonCode::InvalidShape);
}

#[test]
fn test_table_rows_must_be_objects() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["tables"]["ORDER_PARTNERS"] = json!(["AG"]);

    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();
    assert_eq!(violations.paths(), vec!["ORDER_PARTNERS[0]"]);
    assert_eq!(violations.at("ORDER_PARTNERS[0]").unwrap().reason, ReasonCode::InvalidShape);
}

#[test]
fn test_precision_loss_is_rejected() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["tables"]["ORDER_ITEMS_IN"][0]["TARGET_QTY"] = json!("1.2345");

    let violations = SchemaValidator::new(&schema).validate(&parameters).unwrap_err();
    assert_eq!(violations.paths(), vec!["ORDER_ITEMS_IN[0].TARGET_QTY"]);
}

// =============================================================================
// MARSHALING
// =============================================================================

#[test]
fn test_marshal_fixed_format_values() {
    let schema = sales_order();
    let parameters = valid_parameters();
    let validated = SchemaValidator::new(&schema).validate(&parameters).unwrap();
    let call = marshal(&validated).to_value();

    let header = &call["ORDER_HEADER_IN"];
    assert_eq!(header["DOC_TYPE"], json!("TA  "));
    assert_eq!(header["SALES_ORG"], json!("1000"));
    assert_eq!(header["REQ_DATE_H"], json!("20240301"));
    assert_eq!(call["TESTRUN"], json!("X"));

    let items = call["ORDER_ITEMS_IN"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["ITM_NUMBER"], json!("000010"));
    assert_eq!(items[0]["MATERIAL"], json!(format!("{:<18}", "MAT-100")));
    assert_eq!(items[0]["TARGET_QTY"], json!("5.000"));
    assert_eq!(items[0]["TARGET_QU"], json!("PC"));
    assert_eq!(items[1]["ITM_NUMBER"], json!("000020"));
    assert_eq!(items[1]["TARGET_QTY"], json!("1.500"));

    assert_eq!(call["ORDER_PARTNERS"][0]["PARTN_NUMB"], json!("0000001000"));
    assert!(call.get("ORDER_SCHEDULES_IN").is_none());
}

#[test]
fn test_marshal_is_deterministic() {
    let schema = sales_order();
    let parameters = valid_parameters();
    let validator = SchemaValidator::new(&schema);

    let first = marshal(&validator.validate(&parameters).unwrap()).to_value();
    let second = marshal(&validator.validate(&parameters).unwrap()).to_value();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_single_row_shorthand() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["tables"]["ORDER_PARTNERS"] = json!({
        "fields": { "PARTN_ROLE": "WE", "PARTN_NUMB": "42" }
    });

    let validated = SchemaValidator::new(&schema).validate(&parameters).unwrap();
    let call = marshal(&validated).to_value();
    let partners = call["ORDER_PARTNERS"].as_array().unwrap();
    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0]["PARTN_NUMB"], json!("0000000042"));
}

// =============================================================================
// UNKNOWN MEMBERS
// =============================================================================

#[test]
fn test_unknown_members_ignored_by_default() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["input"]["ORDER_HEADER_IN"]["SHIP_COND"] = json!("01");
    parameters["tables"]["EXTENSIONIN"] = json!([]);

    let validated = SchemaValidator::new(&schema).validate(&parameters).unwrap();
    let call = marshal(&validated).to_value();
    assert!(call["ORDER_HEADER_IN"].get("SHIP_COND").is_none());
    assert!(call.get("EXTENSIONIN").is_none());
}

#[test]
fn test_unknown_members_rejected_under_reject_policy() {
    let schema = sales_order();
    let mut parameters = valid_parameters();
    parameters["input"]["ORDER_HEADER_IN"]["SHIP_COND"] = json!("01");
    parameters["tables"]["EXTENSIONIN"] = json!([]);

    let violations = SchemaValidator::new(&schema)
        .with_policy(UnknownFieldPolicy::Reject)
        .validate(&parameters)
        .unwrap_err();

    assert_eq!(violations.paths(), vec!["ORDER_HEADER_IN.SHIP_COND", "EXTENSIONIN"]);
    assert!(violations.iter().all(|v| v.reason == ReasonCode::UnknownField));
}
