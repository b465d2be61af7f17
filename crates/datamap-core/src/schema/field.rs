use serde::Deserialize;

/// Correspondence between a domain field and a record field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldMapping {
    /// Name of the field on the domain type
    pub object: String,

    /// Name of the field in the record exchanged with the adapter
    pub field: String,

    /// How values are converted between the two sides
    #[serde(rename = "type", default)]
    pub coercion: Coercion,

    /// Value is assigned by the backend (auto-increment ids, timestamps, ...)
    /// and never sent on insert
    #[serde(default)]
    pub generated: bool,
}

/// The closed set of type coercions a field mapping can request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Coercion {
    /// Direct assignment with safe numeric/string widening
    #[default]
    Default,

    /// Native timestamps, ISO-8601 strings or epoch seconds
    Timestamp,

    /// Embedded JSON blob parsed into a nested shape
    Structured,
}

impl FieldMapping {
    pub fn new(object: impl Into<String>, field: impl Into<String>) -> FieldMapping {
        FieldMapping {
            object: object.into(),
            field: field.into(),
            coercion: Coercion::Default,
            generated: false,
        }
    }

    pub fn coerce(mut self, coercion: Coercion) -> FieldMapping {
        self.coercion = coercion;
        self
    }

    pub fn generated(mut self) -> FieldMapping {
        self.generated = true;
        self
    }
}

impl Coercion {
    pub fn as_str(self) -> &'static str {
        match self {
            Coercion::Default => "default",
            Coercion::Timestamp => "timestamp",
            Coercion::Structured => "structured",
        }
    }
}

impl From<&str> for Coercion {
    /// Any tag other than `timestamp`, `json` or `structured` (such as
    /// `string` or `int`) selects the default coercion.
    fn from(tag: &str) -> Coercion {
        match tag.trim().to_ascii_lowercase().as_str() {
            "timestamp" | "datetime" | "time" => Coercion::Timestamp,
            "json" | "structured" => Coercion::Structured,
            _ => Coercion::Default,
        }
    }
}

impl From<Option<String>> for Coercion {
    fn from(tag: Option<String>) -> Coercion {
        tag.as_deref().map(Coercion::from).unwrap_or_default()
    }
}
