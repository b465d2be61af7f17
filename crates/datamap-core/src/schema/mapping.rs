use super::{ActionDescriptor, FieldMapping, OperationDescriptor, ResultDescriptor};

use indexmap::IndexMap;
use serde::Deserialize;

/// Binds a domain type to a default source, its CRUD operations and its
/// custom actions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mapping {
    /// Name of the domain type, matched against `Entity::NAME`
    pub object: String,

    /// Default source for operations that do not pick one
    #[serde(default)]
    pub source: Option<String>,

    /// Operations keyed by verb: `fetch`, `insert`, `update`, `delete`
    #[serde(default)]
    pub operations: IndexMap<String, OperationDescriptor>,

    /// Named custom actions
    #[serde(default)]
    pub actions: IndexMap<String, ActionDescriptor>,
}

/// The four CRUD verbs an operation descriptor can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Fetch,
    Insert,
    Update,
    Delete,
}

impl Mapping {
    pub fn operation(&self, kind: OperationKind) -> Option<&OperationDescriptor> {
        self.operations.get(kind.as_str())
    }

    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    /// Every field mapping list that names fields of the mapped object,
    /// paired with the operation or action it belongs to.
    ///
    /// Result blocks describing another type are left out; they are checked
    /// against that type instead.
    pub fn object_field_lists(&self) -> Vec<(&str, &[FieldMapping])> {
        let mut lists = vec![];

        for (name, op) in &self.operations {
            lists.push((name.as_str(), &op.properties[..]));
            lists.push((name.as_str(), &op.identifier[..]));
            lists.push((name.as_str(), &op.generated[..]));
            lists.push((name.as_str(), &op.condition[..]));

            if let Some(result) = &op.result {
                if self.describes_object(result) {
                    lists.push((name.as_str(), &result.properties[..]));
                }
            }
        }

        for (name, action) in &self.actions {
            if let Some(result) = &action.result {
                if self.describes_object(result) {
                    lists.push((name.as_str(), &result.properties[..]));
                }
            }
        }

        lists.retain(|(_, fields)| !fields.is_empty());
        lists
    }

    fn describes_object(&self, result: &ResultDescriptor) -> bool {
        result.ty.as_deref().map_or(true, |ty| ty == self.object)
    }
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Fetch,
        OperationKind::Insert,
        OperationKind::Update,
        OperationKind::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Fetch => "fetch",
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl core::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
