//! Validated value tree
//!
//! The tree mirrors the schema it was validated against and borrows its
//! descriptors, so it cannot outlive the request that produced it.
//! Absent optional members are simply not present.

use crate::coercion::NormalizedValue;

use super::types::{FieldDescriptor, TableDescriptor};

/// A validated member value
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedValue<'s> {
    /// Scalar leaf with the descriptor it was parsed against
    Scalar {
        field: &'s FieldDescriptor,
        value: NormalizedValue,
    },
    /// Nested structure
    Structure(ValidatedStructure<'s>),
    /// Nested table
    Table(ValidatedTable<'s>),
}

/// Validated members of one structure, in declared order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedStructure<'s> {
    entries: Vec<(&'s str, ValidatedValue<'s>)>,
}

impl<'s> ValidatedStructure<'s> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn push(&mut self, name: &'s str, value: ValidatedValue<'s>) {
        self.entries.push((name, value));
    }

    /// Looks up a member by name
    pub fn get(&self, name: &str) -> Option<&ValidatedValue<'s>> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Looks up a scalar member's value by name
    pub fn scalar(&self, name: &str) -> Option<&NormalizedValue> {
        match self.get(name) {
            Some(ValidatedValue::Scalar { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Iterates members in declared order
    pub fn iter(&self) -> impl Iterator<Item = (&'s str, &ValidatedValue<'s>)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validated rows of one table, in caller order
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable<'s> {
    pub descriptor: &'s TableDescriptor,
    pub rows: Vec<ValidatedStructure<'s>>,
}

/// A fully validated request: input members plus table parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedRequest<'s> {
    pub input: ValidatedStructure<'s>,
    pub tables: Vec<ValidatedTable<'s>>,
}

impl<'s> ValidatedRequest<'s> {
    /// Looks up a validated table parameter by name
    pub fn table(&self, name: &str) -> Option<&ValidatedTable<'s>> {
        self.tables.iter().find(|t| t.descriptor.name == name)
    }
}
