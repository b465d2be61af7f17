use crate::Record;

/// An untyped value carried in a [`Record`].
///
/// Records carry no schema; the variants only describe what the backend
/// handed over. Typing is imposed later by field mappings.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Opaque byte blob
    Bytes(Vec<u8>),

    /// 64-bit floating point number
    F64(f64),

    /// Signed 64-bit integer
    I64(i64),

    /// A list of values
    List(Vec<Value>),

    /// Null value
    #[default]
    Null,

    /// A nested record
    Record(Record),

    /// String value
    String(String),

    /// An instant in time
    Timestamp(jiff::Timestamp),

    /// Unsigned 64-bit integer that does not fit `I64`
    U64(u64),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Name of the variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Bytes(_) => "Bytes",
            Self::F64(_) => "F64",
            Self::I64(_) => "I64",
            Self::List(_) => "List",
            Self::Null => "Null",
            Self::Record(_) => "Record",
            Self::String(_) => "String",
            Self::Timestamp(_) => "Timestamp",
            Self::U64(_) => "U64",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            Self::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Renders a scalar as plain text, the way it would appear in a path or
    /// a key. Returns `None` for nulls, lists, records and byte blobs.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Bool(v) => Some(v.to_string()),
            Self::F64(v) => Some(v.to_string()),
            Self::I64(v) => Some(v.to_string()),
            Self::String(v) => Some(v.clone()),
            Self::Timestamp(v) => Some(v.to_string()),
            Self::U64(v) => Some(v.to_string()),
            Self::Bytes(_) | Self::List(_) | Self::Null | Self::Record(_) => None,
        }
    }

    /// Converts the value into a JSON tree.
    ///
    /// Timestamps become RFC 3339 strings, byte blobs become arrays of
    /// numbers and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Bool(v) => Json::Bool(*v),
            Self::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
            Self::F64(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::I64(v) => Json::from(*v),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Null => Json::Null,
            Self::Record(record) => Json::Object(
                record
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect(),
            ),
            Self::String(v) => Json::String(v.clone()),
            Self::Timestamp(v) => Json::String(v.to_string()),
            Self::U64(v) => Json::from(*v),
        }
    }
}

impl AsRef<Self> for Value {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

macro_rules! impl_from_signed {
    ( $($t:ty),+ ) => {
        $(
            impl From<$t> for Value {
                fn from(src: $t) -> Self {
                    Self::I64(src as i64)
                }
            }
        )+
    };
}

impl_from_signed!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(src: u64) -> Self {
        match i64::try_from(src) {
            Ok(v) => Self::I64(v),
            Err(_) => Self::U64(src),
        }
    }
}

impl From<f32> for Value {
    fn from(src: f32) -> Self {
        Self::F64(src as f64)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<jiff::Timestamp> for Value {
    fn from(src: jiff::Timestamp) -> Self {
        Self::Timestamp(src)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T> From<Option<T>> for Value
where
    Self: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::from(value),
            None => Self::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(src: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match src {
            Json::Null => Self::Null,
            Json::Bool(v) => Self::Bool(v),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::I64(v)
                } else if let Some(v) = n.as_u64() {
                    Self::U64(v)
                } else {
                    n.as_f64().map(Self::F64).unwrap_or(Self::Null)
                }
            }
            Json::String(v) => Self::String(v),
            Json::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            Json::Object(fields) => Self::Record(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
