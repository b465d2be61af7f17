use crate::{coerce, Result};

use datamap_core::{adapter::Operation, Error, Record, Value};

/// Identifiers accepted by [`Mapper::delete`](crate::Mapper::delete).
///
/// Each entry is either a scalar, keyed by the operation's first identifier
/// field, or an already structured identifier record. Lists are flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identifiers {
    values: Vec<Value>,
}

impl Identifiers {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts every identifier into a record for the adapter.
    pub(crate) fn into_records(self, op: &Operation) -> Result<Vec<Record>> {
        self.values
            .into_iter()
            .map(|value| match value {
                Value::Record(record) => Ok(record),
                scalar => {
                    let Some(key) = op.identifier.first() else {
                        return Err(Error::invalid_config(format!(
                            "mapping `{}` has no identifier field for `{}`; pass identifier records instead",
                            op.mapping, op.kind
                        )));
                    };

                    let value = coerce::encode(key.coercion, scalar)
                        .map_err(|err| err.for_field(&key.object))?;
                    Ok(Record::new().with(key.field.clone(), value))
                }
            })
            .collect()
    }

    fn push(&mut self, value: Value) {
        match value {
            Value::List(items) => items.into_iter().for_each(|item| self.push(item)),
            value => self.values.push(value),
        }
    }
}

impl From<Value> for Identifiers {
    fn from(value: Value) -> Identifiers {
        let mut identifiers = Identifiers::default();
        identifiers.push(value);
        identifiers
    }
}

impl From<Record> for Identifiers {
    fn from(record: Record) -> Identifiers {
        Identifiers {
            values: vec![Value::Record(record)],
        }
    }
}

impl From<Vec<Record>> for Identifiers {
    fn from(records: Vec<Record>) -> Identifiers {
        Identifiers {
            values: records.into_iter().map(Value::Record).collect(),
        }
    }
}

macro_rules! impl_from_scalar {
    ( $( $t:ty ),* ) => {
        $(
            impl From<$t> for Identifiers {
                fn from(value: $t) -> Identifiers {
                    Identifiers::from(Value::from(value))
                }
            }

            impl From<Vec<$t>> for Identifiers {
                fn from(values: Vec<$t>) -> Identifiers {
                    Identifiers {
                        values: values.into_iter().map(Value::from).collect(),
                    }
                }
            }
        )*
    };
}

impl_from_scalar!(i32, i64, u32, u64, String, &str);

impl From<Vec<Value>> for Identifiers {
    fn from(values: Vec<Value>) -> Identifiers {
        Identifiers::from(Value::List(values))
    }
}
