use datamap_core::{Record, Value};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Tables of records shared between memory adapters.
///
/// Cloning a store yields a handle to the same tables, so tests can seed
/// and inspect what an adapter sees.
#[derive(Debug, Clone, Default)]
pub struct Store {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

#[derive(Debug, Default)]
pub(crate) struct Table {
    pub(crate) rows: Vec<Record>,

    /// Last id handed out for generated keys
    pub(crate) last_id: i64,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    /// Appends records to a table as-is.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Record>) {
        self.lock()
            .entry(table.to_string())
            .or_default()
            .rows
            .extend(rows);
    }

    /// A copy of every record of a table, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.lock()
            .get(table)
            .map(|table| table.rows.clone())
            .unwrap_or_default()
    }

    pub fn len(&self, table: &str) -> usize {
        self.lock().get(table).map_or(0, |table| table.rows.len())
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<String, Table>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Table {
    /// Hands out an id above both the last one handed out and every integer
    /// already stored under `key`.
    pub(crate) fn next_id(&mut self, key: &str) -> i64 {
        let stored = self
            .rows
            .iter()
            .filter_map(|row| match row.get(key) {
                Some(Value::I64(id)) => Some(*id),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        self.last_id = self.last_id.max(stored) + 1;
        self.last_id
    }

    pub(crate) fn position(&self, filter: &Record) -> Option<usize> {
        self.rows.iter().position(|row| row.matches(filter))
    }

    pub(crate) fn matching<'a>(&'a self, filter: &'a Record) -> impl Iterator<Item = &'a Record> + 'a {
        self.rows.iter().filter(move |row| row.matches(filter))
    }

    /// Removes every matching row, returning how many were removed.
    pub(crate) fn remove(&mut self, filter: &Record) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.matches(filter));
        before - self.rows.len()
    }
}
