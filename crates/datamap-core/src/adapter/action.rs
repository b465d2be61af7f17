use crate::schema::{ActionDescriptor, AfterAction, FieldMapping, Options};

/// A custom action as handed to an adapter.
///
/// Actions come either from a mapping's `actions` table or from an
/// operation's after-actions, in which case `name` is the after-action kind
/// (e.g. `invalidate`) and `options` carries its config.
#[derive(Debug, Clone, Default)]
pub struct Action {
    pub name: String,

    /// Qualified name of the mapping the action belongs to
    pub mapping: String,

    pub statement: String,

    /// Whether the action is expected to return many records
    pub multi: bool,

    /// Result field mappings, if any
    pub properties: Vec<FieldMapping>,

    pub options: Options,
}

impl Action {
    pub fn new(name: impl Into<String>, mapping: impl Into<String>, descriptor: &ActionDescriptor) -> Action {
        Action {
            name: name.into(),
            mapping: mapping.into(),
            statement: descriptor.statement.clone(),
            multi: descriptor.result.as_ref().is_some_and(|result| result.multi),
            properties: descriptor.result_fields().to_vec(),
            options: Options::default(),
        }
    }

    pub fn after(mapping: impl Into<String>, after: &AfterAction) -> Action {
        Action {
            name: after.action.clone(),
            mapping: mapping.into(),
            statement: after.statement.clone(),
            multi: false,
            properties: vec![],
            options: after.config.clone(),
        }
    }
}
