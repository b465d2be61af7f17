use super::{FieldMapping, Options};

use serde::Deserialize;

/// Per-verb configuration of a mapping.
///
/// Unknown keys are rejected, so a document using a nested `fallback`
/// operation fails to load instead of silently losing it; alternatives are
/// expressed as a `sources` chain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationDescriptor {
    /// Explicit source override, used alone when set
    pub source: Option<String>,

    /// Ordered fallback chain, used when no override is set
    pub sources: Vec<SourceRef>,

    /// Backend specific statement: SQL text, path template, table name, ...
    pub statement: String,

    /// Translates caller parameter names to record field names
    pub parameters: Vec<FieldMapping>,

    /// Fields sent to (or read from) the backend
    pub properties: Vec<FieldMapping>,

    /// Fields identifying a record for update and delete
    pub identifier: Vec<FieldMapping>,

    /// Fields assigned by the backend and written back after insert
    pub generated: Vec<FieldMapping>,

    /// Extra match conditions, e.g. an optimistic-lock version
    pub condition: Vec<FieldMapping>,

    /// Shape of the records returned by a fetch
    pub result: Option<ResultDescriptor>,

    /// Send every record in one adapter call instead of one call each
    pub bulk: bool,

    /// Side effects run after a successful write
    pub after: Vec<AfterAction>,
}

/// An entry of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "SourceRefRepr")]
pub struct SourceRef {
    pub name: String,

    /// What to do when this source has no matching record
    pub on_miss: Continuation,

    /// What to do when this source fails
    pub on_error: Continuation,
}

/// Chain continuation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Continuation {
    /// Return this source's outcome to the caller
    #[default]
    #[serde(alias = "fail")]
    Stop,

    /// Try the next source in the chain
    #[serde(alias = "continue", alias = "fallback")]
    Next,
}

/// Chain entries are written either as a bare source name or as a table.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRefRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        on_miss: Continuation,
        #[serde(default)]
        on_error: Continuation,
    },
}

impl From<SourceRefRepr> for SourceRef {
    fn from(repr: SourceRefRepr) -> SourceRef {
        match repr {
            SourceRefRepr::Name(name) => SourceRef::new(name),
            SourceRefRepr::Full {
                name,
                on_miss,
                on_error,
            } => SourceRef {
                name,
                on_miss,
                on_error,
            },
        }
    }
}

impl SourceRef {
    pub fn new(name: impl Into<String>) -> SourceRef {
        SourceRef {
            name: name.into(),
            on_miss: Continuation::Stop,
            on_error: Continuation::Stop,
        }
    }

    pub fn on_miss(mut self, continuation: Continuation) -> SourceRef {
        self.on_miss = continuation;
        self
    }

    pub fn on_error(mut self, continuation: Continuation) -> SourceRef {
        self.on_error = continuation;
        self
    }
}

/// Shape of fetched records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResultDescriptor {
    /// Target type name; defaults to the mapping's object
    #[serde(rename = "type")]
    pub ty: Option<String>,

    /// Whether the fetch returns many records
    pub multi: bool,

    pub properties: Vec<FieldMapping>,
}

/// A side effect run once per written record after a successful write.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AfterAction {
    /// Action name passed to the adapter, e.g. `invalidate`
    pub action: String,

    /// Source to run on; defaults to the source that served the write
    pub source: Option<String>,

    pub statement: String,

    /// Extra adapter options for the action
    pub config: Options,
}

impl OperationDescriptor {
    pub fn new(statement: impl Into<String>) -> OperationDescriptor {
        OperationDescriptor {
            statement: statement.into(),
            ..OperationDescriptor::default()
        }
    }

    /// Field mappings used to read fetched records: the result block when
    /// configured, else the operation's own properties.
    pub fn result_fields(&self) -> &[FieldMapping] {
        match &self.result {
            Some(result) => &result.properties,
            None => &self.properties,
        }
    }

    /// Whether fetches expect many records.
    pub fn is_multi(&self) -> bool {
        self.result.as_ref().is_some_and(|result| result.multi)
    }

    /// Every field mapping flagged generated: the `generated` list plus
    /// properties marked `generated: true`. Duplicates by record field are
    /// dropped.
    pub fn generated_fields(&self) -> Vec<&FieldMapping> {
        let mut out: Vec<&FieldMapping> = vec![];
        let flagged = self.properties.iter().filter(|m| m.generated);

        for mapping in flagged.chain(&self.generated) {
            if !out.iter().any(|m| m.field == mapping.field) {
                out.push(mapping);
            }
        }

        out
    }
}
