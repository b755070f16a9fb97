//! Schema subsystem
//!
//! Function schemas are loaded from an external metadata store and are
//! immutable after load. They drive validation, marshaling and response
//! projection.
//!
//! # Design Principles
//!
//! - Metadata is the source of truth for every request
//! - Validation walks the schema, never the payload
//! - All violations are collected in one pass
//! - Schemas are shared read-only across concurrent requests

mod errors;
mod loader;
mod provider;
mod tree;
mod types;
mod validator;
mod violation;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::{parse_function_schema, parse_schema_text, render_function_schema};
pub use provider::{
    is_valid_function_name, CachedSchemaProvider, FileSchemaStore, InMemorySchemaStore,
    SchemaProvider,
};
pub use tree::{ValidatedRequest, ValidatedStructure, ValidatedTable, ValidatedValue};
pub use types::{
    Descriptor, FieldDescriptor, FunctionSchema, PrimitiveType, StructureDescriptor,
    TableDescriptor,
};
pub use validator::{SchemaValidator, UnknownFieldPolicy};
pub use violation::{ReasonCode, Violation, ViolationList};

pub(crate) use violation::{make_path, row_path};
