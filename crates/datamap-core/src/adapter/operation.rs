use crate::schema::{FieldMapping, OperationDescriptor, OperationKind};

/// A CRUD operation as handed to an adapter.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,

    /// Qualified name of the mapping the operation belongs to
    pub mapping: String,

    /// Backend specific statement
    pub statement: String,

    /// Whether a fetch expects many records
    pub multi: bool,

    /// Whether every record arrives in a single call
    pub bulk: bool,

    pub properties: Vec<FieldMapping>,
    pub identifier: Vec<FieldMapping>,
    pub generated: Vec<FieldMapping>,
    pub condition: Vec<FieldMapping>,
}

impl Operation {
    pub fn new(kind: OperationKind, mapping: impl Into<String>, descriptor: &OperationDescriptor) -> Operation {
        Operation {
            kind,
            mapping: mapping.into(),
            statement: descriptor.statement.clone(),
            multi: descriptor.is_multi(),
            bulk: descriptor.bulk,
            properties: descriptor.properties.clone(),
            identifier: descriptor.identifier.clone(),
            generated: descriptor.generated_fields().into_iter().cloned().collect(),
            condition: descriptor.condition.clone(),
        }
    }

    /// Record field names identifying a record.
    pub fn identifier_fields(&self) -> impl Iterator<Item = &str> {
        self.identifier.iter().map(|m| m.field.as_str())
    }

    /// Record field names the backend assigns.
    pub fn generated_fields(&self) -> impl Iterator<Item = &str> {
        self.generated.iter().map(|m| m.field.as_str())
    }

    /// Record field names that must match the stored record.
    pub fn condition_fields(&self) -> impl Iterator<Item = &str> {
        self.condition.iter().map(|m| m.field.as_str())
    }

    pub fn is_generated(&self, field: &str) -> bool {
        self.generated_fields().any(|name| name == field)
    }
}
