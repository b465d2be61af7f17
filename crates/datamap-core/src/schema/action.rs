use super::{FieldMapping, ResultDescriptor, SourceRef};

use serde::Deserialize;

/// A named custom action on a mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionDescriptor {
    pub source: Option<String>,
    pub sources: Vec<SourceRef>,
    pub statement: String,
    pub parameters: Vec<FieldMapping>,
    pub result: Option<ResultDescriptor>,
}

impl ActionDescriptor {
    pub fn new(statement: impl Into<String>) -> ActionDescriptor {
        ActionDescriptor {
            statement: statement.into(),
            ..ActionDescriptor::default()
        }
    }

    pub fn result_fields(&self) -> &[FieldMapping] {
        self.result
            .as_ref()
            .map(|result| &result.properties[..])
            .unwrap_or_default()
    }
}
