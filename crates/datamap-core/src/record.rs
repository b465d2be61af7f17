use crate::Value;

use indexmap::IndexMap;

/// The storage-agnostic unit exchanged with adapters: an ordered map from
/// field names to untyped values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn with_capacity(capacity: usize) -> Record {
        Record {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Sets a field, returning the previous value. A replaced field keeps
    /// its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Removes a field, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Builder-style [`Record::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Record {
        self.insert(name, value);
        self
    }

    /// Copies every field of `other` into `self`, overwriting fields present
    /// in both.
    pub fn merge(&mut self, other: &Record) {
        for (name, value) in other {
            self.fields.insert(name.to_string(), value.clone());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields
            .iter_mut()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns `true` when every field of `subset` is present in `self` with
    /// an equal value.
    pub fn matches(&self, subset: &Record) -> bool {
        subset
            .iter()
            .all(|(name, value)| self.get(name) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Record {
        let mut record = Record::new();
        record.extend(iter);
        record
    }
}

impl<K, V> Extend<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(fields: [(K, V); N]) -> Record {
        fields.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
