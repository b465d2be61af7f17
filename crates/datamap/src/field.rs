use crate::{coerce, Result};

use datamap_core::{Error, Record, Value};

use serde::{de::DeserializeOwned, Serialize};

/// A type that can live in an entity field.
///
/// Conversions from a record value apply the default coercion: direct
/// assignment when the value already has the field's type, else a safe
/// numeric or string widening, else [`Error::type_coercion`].
pub trait FieldValue: Sized {
    /// Converts a non-null value.
    fn from_value(value: Value) -> Result<Self>;

    /// Converts the field to an untyped value.
    fn store(&self) -> Result<Value>;

    /// The value a field takes when the record holds `null`.
    fn empty() -> Self;

    /// Converts any value, `null` included.
    fn load(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(Self::empty())
        } else {
            Self::from_value(value)
        }
    }
}

/// Embeds any serde type as a structured field.
///
/// Pair it with the `structured` coercion when the backend stores the blob
/// as JSON text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> core::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl FieldValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            Value::Bytes(bytes) => String::from_utf8(bytes)
                .map_err(|err| Error::type_coercion_detail("Bytes", "String", err)),
            value => value
                .to_text()
                .ok_or_else(|| Error::type_coercion(value.kind(), "String")),
        }
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }

    fn empty() -> Self {
        String::new()
    }
}

impl FieldValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::I64(0) | Value::U64(0) => Ok(false),
            Value::I64(1) | Value::U64(1) => Ok(true),
            Value::String(ref v) => match v.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(Error::type_coercion("String", "bool")),
            },
            value => Err(Error::type_coercion(value.kind(), "bool")),
        }
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn empty() -> Self {
        false
    }
}

macro_rules! impl_integer {
    ( $( $t:ty => $store:expr ),+ ) => {
        $(
            impl FieldValue for $t {
                fn from_value(value: Value) -> Result<Self> {
                    let kind = value.kind();
                    let to = stringify!($t);

                    match value {
                        Value::I64(v) => <$t>::try_from(v)
                            .map_err(|_| Error::type_coercion_detail(kind, to, "out of range")),
                        Value::U64(v) => <$t>::try_from(v)
                            .map_err(|_| Error::type_coercion_detail(kind, to, "out of range")),
                        // `MAX as f64 + 1.0` is exact for narrow types and rounds
                        // to 2^N for 64-bit ones, so it is an exclusive bound.
                        Value::F64(v) if v.fract() == 0.0
                            && v >= <$t>::MIN as f64
                            && v < <$t>::MAX as f64 + 1.0 =>
                        {
                            Ok(v as $t)
                        }
                        Value::F64(v) => {
                            let detail = if v.fract() == 0.0 { "out of range" } else { "not a whole number" };
                            Err(Error::type_coercion_detail(kind, to, detail))
                        }
                        Value::String(v) => v
                            .trim()
                            .parse::<$t>()
                            .map_err(|err| Error::type_coercion_detail(kind, to, err)),
                        _ => Err(Error::type_coercion(kind, to)),
                    }
                }

                fn store(&self) -> Result<Value> {
                    let store: fn($t) -> Value = $store;
                    Ok(store(*self))
                }

                fn empty() -> Self {
                    0
                }
            }
        )+
    };
}

impl_integer!(
    i8 => |v| Value::I64(v as i64),
    i16 => |v| Value::I64(v as i64),
    i32 => |v| Value::I64(v as i64),
    i64 => Value::I64,
    u8 => |v| Value::I64(v as i64),
    u16 => |v| Value::I64(v as i64),
    u32 => |v| Value::I64(v as i64),
    u64 => Value::from
);

/// Converts an integer to a float only when the float holds it exactly.
fn exact_float<F: Copy>(
    from: &'static str,
    to: &'static str,
    v: i128,
    cast: fn(i128) -> F,
    back: fn(F) -> i128,
) -> Result<F> {
    let f = cast(v);
    if back(f) == v {
        Ok(f)
    } else {
        Err(Error::type_coercion_detail(from, to, "out of range"))
    }
}

impl FieldValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F64(v) => Ok(v),
            Value::I64(v) => exact_float("I64", "f64", v.into(), |v| v as f64, |f| f as i128),
            Value::U64(v) => exact_float("U64", "f64", v.into(), |v| v as f64, |f| f as i128),
            Value::String(v) => v
                .trim()
                .parse::<f64>()
                .map_err(|err| Error::type_coercion_detail("String", "f64", err)),
            value => Err(Error::type_coercion(value.kind(), "f64")),
        }
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::F64(*self))
    }

    fn empty() -> Self {
        0.0
    }
}

impl FieldValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F64(v) => narrow_f64(v, "F64"),
            Value::I64(v) => exact_float("I64", "f32", v.into(), |v| v as f32, |f| f as i128),
            Value::U64(v) => exact_float("U64", "f32", v.into(), |v| v as f32, |f| f as i128),
            Value::String(v) => v
                .trim()
                .parse::<f64>()
                .map_err(|err| Error::type_coercion_detail("String", "f32", err))
                .and_then(|v| narrow_f64(v, "String")),
            value => Err(Error::type_coercion(value.kind(), "f32")),
        }
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::F64(f64::from(*self)))
    }

    fn empty() -> Self {
        0.0
    }
}

/// Accepts an `f64` into an `f32` when nothing but trailing binary digits is
/// lost: the result is exact or prints back as the same decimal number.
/// Values that overflow to infinity or need more precision are rejected.
fn narrow_f64(v: f64, from: &'static str) -> Result<f32> {
    let f = v as f32;

    if !v.is_finite() || f64::from(f) == v {
        return Ok(f);
    }

    if f.is_finite() && f.to_string().parse::<f64>().ok() == Some(v) {
        Ok(f)
    } else {
        Err(Error::type_coercion_detail(from, "f32", "out of range"))
    }
}

impl FieldValue for jiff::Timestamp {
    fn from_value(value: Value) -> Result<Self> {
        coerce::timestamp(value)
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::Timestamp(*self))
    }

    fn empty() -> Self {
        jiff::Timestamp::UNIX_EPOCH
    }
}

impl FieldValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }

    fn store(&self) -> Result<Value> {
        Ok(self.clone())
    }

    fn empty() -> Self {
        Value::Null
    }
}

impl FieldValue for Record {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(record) => Ok(record),
            value => Err(Error::type_coercion(value.kind(), "Record")),
        }
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::Record(self.clone()))
    }

    fn empty() -> Self {
        Record::new()
    }
}

impl FieldValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value.to_json())
    }

    fn store(&self) -> Result<Value> {
        Ok(Value::from(self.clone()))
    }

    fn empty() -> Self {
        serde_json::Value::Null
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Some)
    }

    fn store(&self) -> Result<Value> {
        match self {
            Some(value) => value.store(),
            None => Ok(Value::Null),
        }
    }

    fn empty() -> Self {
        None
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::load).collect(),
            Value::Bytes(bytes) => bytes
                .into_iter()
                .map(|byte| T::load(Value::I64(byte as i64)))
                .collect(),
            value => Err(Error::type_coercion(value.kind(), "Vec")),
        }
    }

    fn store(&self) -> Result<Value> {
        self.iter()
            .map(FieldValue::store)
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn empty() -> Self {
        vec![]
    }
}

impl<T: Serialize + DeserializeOwned + Default> FieldValue for Json<T> {
    fn from_value(value: Value) -> Result<Self> {
        let kind = value.kind();
        let to = core::any::type_name::<T>();

        let json = match value {
            Value::String(text) => serde_json::from_str(&text),
            Value::Bytes(bytes) => serde_json::from_slice(&bytes),
            value => serde_json::from_value(value.to_json()),
        };

        json.map(Json)
            .map_err(|err| Error::type_coercion_detail(kind, to, err))
    }

    fn store(&self) -> Result<Value> {
        serde_json::to_value(&self.0)
            .map(Value::from)
            .map_err(|err| Error::type_coercion_detail("Json", "Value", err))
    }

    fn empty() -> Self {
        Json(T::default())
    }
}
