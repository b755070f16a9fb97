//! Schema model for remote function metadata
//!
//! A function is described by three parameter groups:
//! - input parameters: scalar fields and (nested) structures
//! - table parameters: repeating, order-significant rows
//! - output parameters: the shape results are projected onto
//!
//! Descriptors are a closed recursive sum type so every consumer has to
//! handle fields, structures and tables explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-width primitive types of the backend system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrimitiveType {
    /// Free text, padded with trailing spaces on the wire
    Character,
    /// Digits only, zero-left-padded on the wire
    NumericZeroPadded,
    /// Decimal number with optional fractional part
    PackedDecimal,
    /// Calendar date, `YYYYMMDD` on the wire
    Date,
    /// Unit of measure code
    UnitOfMeasure,
    /// Currency key
    CurrencyKey,
}

impl PrimitiveType {
    /// Returns the canonical backend type code
    pub fn code(&self) -> &'static str {
        match self {
            PrimitiveType::Character => "CHAR",
            PrimitiveType::NumericZeroPadded => "NUMC",
            PrimitiveType::PackedDecimal => "DEC",
            PrimitiveType::Date => "DATS",
            PrimitiveType::UnitOfMeasure => "UNIT",
            PrimitiveType::CurrencyKey => "CUKY",
        }
    }

    /// Resolves a metadata type name. Backend codes and descriptive
    /// aliases are accepted, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let primitive = match upper.as_str() {
            "CHAR" | "C" | "CHARACTER" | "STRING" => PrimitiveType::Character,
            "NUMC" | "N" | "NUMERIC" | "NUMERICZEROPADDED" => PrimitiveType::NumericZeroPadded,
            "DEC" | "P" | "CURR" | "QUAN" | "PACKED" | "DECIMAL" | "PACKEDDECIMAL" => {
                PrimitiveType::PackedDecimal
            }
            "DATS" | "D" | "DATE" => PrimitiveType::Date,
            "UNIT" | "UOM" | "UNITOFMEASURE" => PrimitiveType::UnitOfMeasure,
            "CUKY" | "CURRENCY" | "CURRENCYKEY" => PrimitiveType::CurrencyKey,
            _ => return None,
        };
        Some(primitive)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<String> for PrimitiveType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PrimitiveType::from_name(&value).ok_or_else(|| format!("unknown primitive type '{}'", value))
    }
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.code().to_string()
    }
}

/// Scalar schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as the backend knows it
    pub name: String,
    /// Primitive type, drives parse and format rules
    pub primitive_type: PrimitiveType,
    /// Maximum length in characters or digits (always > 0)
    pub max_length: u32,
    /// Whether the caller must supply a value
    pub required: bool,
    /// Fixed fractional digits for packed decimals
    pub decimals: Option<u32>,
    /// Whether a numeric field accepts a leading minus sign
    pub signed: bool,
}

impl FieldDescriptor {
    /// Create a descriptor with no extension attributes
    pub fn new(
        name: impl Into<String>,
        primitive_type: PrimitiveType,
        max_length: u32,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            primitive_type,
            max_length,
            required,
            decimals: None,
            signed: false,
        }
    }

    /// Create a required field
    pub fn required(name: impl Into<String>, primitive_type: PrimitiveType, max_length: u32) -> Self {
        Self::new(name, primitive_type, max_length, true)
    }

    /// Create an optional field
    pub fn optional(name: impl Into<String>, primitive_type: PrimitiveType, max_length: u32) -> Self {
        Self::new(name, primitive_type, max_length, false)
    }

    /// Set the fixed fractional digit count
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Allow a leading minus sign
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }
}

/// Non-repeating group of named members.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructureDescriptor {
    /// Structure name (empty for parameter groups)
    pub name: String,
    /// Members in declared order
    pub members: Vec<Descriptor>,
}

impl StructureDescriptor {
    /// Create a structure from members in declared order
    pub fn new(name: impl Into<String>, members: Vec<Descriptor>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Looks up a direct member by name
    pub fn member(&self, name: &str) -> Option<&Descriptor> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Returns true if any member at any depth must be supplied
    pub fn has_required(&self) -> bool {
        self.members.iter().any(|m| match m {
            Descriptor::Field(f) => f.required,
            Descriptor::Structure(s) => s.has_required(),
            Descriptor::Table(t) => t.required,
        })
    }

    /// Number of direct members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the structure declares no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Repeating structure. Row order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table parameter name
    pub name: String,
    /// Schema every row is validated against
    pub row: StructureDescriptor,
    /// Whether the table parameter must be present (rows may still be empty)
    pub required: bool,
    /// Minimum row count, if constrained
    pub min_rows: Option<usize>,
    /// Maximum row count, if constrained
    pub max_rows: Option<usize>,
}

impl TableDescriptor {
    /// Create a table with no row-count constraints
    pub fn new(name: impl Into<String>, row_members: Vec<Descriptor>, required: bool) -> Self {
        let name = name.into();
        Self {
            row: StructureDescriptor::new(name.clone(), row_members),
            name,
            required,
            min_rows: None,
            max_rows: None,
        }
    }
}

/// A schema node: field, structure or table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// Scalar leaf
    Field(FieldDescriptor),
    /// Nested non-repeating group
    Structure(StructureDescriptor),
    /// Nested repeating group
    Table(TableDescriptor),
}

impl Descriptor {
    /// Returns the member name
    pub fn name(&self) -> &str {
        match self {
            Descriptor::Field(f) => &f.name,
            Descriptor::Structure(s) => &s.name,
            Descriptor::Table(t) => &t.name,
        }
    }

    /// Returns the kind name for messages
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::Field(_) => "field",
            Descriptor::Structure(_) => "structure",
            Descriptor::Table(_) => "table",
        }
    }
}

impl From<FieldDescriptor> for Descriptor {
    fn from(field: FieldDescriptor) -> Self {
        Descriptor::Field(field)
    }
}

impl From<StructureDescriptor> for Descriptor {
    fn from(structure: StructureDescriptor) -> Self {
        Descriptor::Structure(structure)
    }
}

impl From<TableDescriptor> for Descriptor {
    fn from(table: TableDescriptor) -> Self {
        Descriptor::Table(table)
    }
}

/// Complete metadata for one remote function.
///
/// Immutable after load; shared read-only between concurrent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSchema {
    /// Unique function name
    pub function_name: String,
    /// Human-readable description
    pub description: String,
    /// Scalar and structure inputs
    pub input_parameters: StructureDescriptor,
    /// Table parameters in declared order
    pub table_parameters: Vec<TableDescriptor>,
    /// Declared output shape
    pub output_parameters: StructureDescriptor,
}

impl FunctionSchema {
    /// Create a schema with empty parameter groups
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            description: String::new(),
            input_parameters: StructureDescriptor::default(),
            table_parameters: Vec::new(),
            output_parameters: StructureDescriptor::default(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an input member
    pub fn with_input(mut self, member: impl Into<Descriptor>) -> Self {
        self.input_parameters.members.push(member.into());
        self
    }

    /// Add a table parameter
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.table_parameters.push(table);
        self
    }

    /// Add an output member
    pub fn with_output(mut self, member: impl Into<Descriptor>) -> Self {
        self.output_parameters.members.push(member.into());
        self
    }

    /// Looks up a table parameter by name
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.table_parameters.iter().find(|t| t.name == name)
    }
}
