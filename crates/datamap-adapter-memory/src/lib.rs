mod store;
pub use store::Store;

use datamap_core::{
    adapter::{Action, Operation, Response},
    async_trait, bail,
    schema::{Options, Source},
    Adapter, Error, Record, Result, Value,
};

use std::sync::atomic::{AtomicBool, Ordering::SeqCst};

const DEFAULT_KEY: &str = "id";

/// An adapter keeping records in process memory.
///
/// Statements name tables. Fetch parameters, identifiers and conditions
/// select rows by equality. A generated key field left empty on insert is
/// assigned the next integer of its table.
///
/// Options:
///
/// * `key`: the field identifying rows when an operation declares no
///   identifier (default `id`)
#[derive(Debug)]
pub struct Memory {
    store: Store,
    key: String,
    closed: AtomicBool,
}

impl Memory {
    pub fn new() -> Memory {
        Memory::with_store(Store::new())
    }

    /// An adapter operating on an existing store.
    pub fn with_store(store: Store) -> Memory {
        Memory {
            store,
            key: DEFAULT_KEY.to_string(),
            closed: AtomicBool::new(false),
        }
    }

    /// Factory building an adapter with its own empty store.
    pub fn factory(_source: &Source) -> Result<Box<dyn Adapter>> {
        Ok(Box::new(Memory::new()))
    }

    /// Factory building adapters that all operate on `store`.
    pub fn shared(store: Store) -> impl Fn(&Source) -> Result<Box<dyn Adapter>> + Send + Sync + 'static {
        move |_| Ok(Box::new(Memory::with_store(store.clone())))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(SeqCst) {
            bail!("memory adapter is closed");
        }
        Ok(())
    }

    /// Identifying fields of `record`: the operation's identifier when it
    /// declares one, else the key field.
    fn identity(&self, op: &Operation, record: &Record) -> Result<Record> {
        let mut fields: Vec<&str> = op.identifier_fields().collect();
        if fields.is_empty() {
            fields.push(&self.key);
        }

        let mut identity = Record::with_capacity(fields.len());
        for field in fields {
            let Some(value) = record.get(field) else {
                bail!("record for `{}` is missing identifier field `{field}`", op.mapping);
            };
            identity.insert(field, value.clone());
        }

        Ok(identity)
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}

#[async_trait]
impl Adapter for Memory {
    async fn connect(&mut self, options: &Options) -> Result<()> {
        if let Some(key) = options.get("key") {
            let Some(key) = key.as_str() else {
                return Err(Error::invalid_config("memory option `key` must be a string"));
            };
            self.key = key.to_string();
        }

        tracing::debug!(key = %self.key, "memory adapter connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, SeqCst) {
            bail!("memory adapter is already closed");
        }
        Ok(())
    }

    async fn fetch(&self, op: &Operation, params: &Record) -> Result<Vec<Record>> {
        self.check_open()?;

        let tables = self.store.lock();
        let Some(table) = tables.get(table_name(&op.statement, &op.mapping)) else {
            return Ok(vec![]);
        };

        let limit = if op.multi { usize::MAX } else { 1 };
        Ok(table.matching(params).take(limit).cloned().collect())
    }

    async fn insert(&self, op: &Operation, records: &mut [Record]) -> Result<()> {
        self.check_open()?;

        let name = table_name(&op.statement, &op.mapping);
        let mut tables = self.store.lock();
        let table = tables.entry(name.to_string()).or_default();

        for record in records.iter_mut() {
            let assign = op.is_generated(&self.key)
                && record.get(&self.key).map_or(true, Value::is_null);

            if assign {
                let id = table.next_id(&self.key);
                record.insert(self.key.as_str(), id);
            }

            if let Some(key) = record.get(&self.key) {
                let filter = Record::from([(self.key.as_str(), key.clone())]);
                if table.position(&filter).is_some() {
                    bail!("duplicate key {:?} in memory table `{name}`", key);
                }
            }

            table.rows.push(record.clone());
        }

        tracing::trace!(table = name, inserted = records.len(), "memory insert");
        Ok(())
    }

    async fn update(&self, op: &Operation, records: &[Record]) -> Result<()> {
        self.check_open()?;

        let name = table_name(&op.statement, &op.mapping);
        let mut tables = self.store.lock();
        let table = tables.entry(name.to_string()).or_default();

        for record in records {
            let mut filter = self.identity(op, record)?;
            for field in op.condition_fields() {
                if let Some(value) = record.get(field) {
                    filter.insert(field, value.clone());
                }
            }

            let Some(index) = table.position(&filter) else {
                return Err(Error::record_not_found(format!("no row in `{name}` matches {filter:?}")));
            };

            let row = &mut table.rows[index];
            row.merge(record);

            // Integer conditions act as versions and move forward on write
            for field in op.condition_fields() {
                if let Some(Value::I64(version)) = row.get_mut(field) {
                    *version += 1;
                }
            }
        }

        Ok(())
    }

    async fn delete(&self, op: &Operation, identifiers: &[Record]) -> Result<()> {
        self.check_open()?;

        let name = table_name(&op.statement, &op.mapping);
        let mut tables = self.store.lock();
        let table = tables.entry(name.to_string()).or_default();

        for identifier in identifiers {
            let filter = self.identity(op, identifier)?;
            if table.remove(&filter) == 0 {
                return Err(Error::record_not_found(format!("no row in `{name}` matches {filter:?}")));
            }
        }

        Ok(())
    }

    async fn execute(&self, action: &Action, params: &Record) -> Result<Response> {
        self.check_open()?;

        let name = table_name(&action.statement, &action.mapping);
        let mut tables = self.store.lock();

        match action.name.as_str() {
            "count" => {
                let count = tables.get(name).map_or(0, |table| table.matching(params).count());
                Ok(Response::count(count as u64))
            }
            "list" => {
                let rows = tables
                    .get(name)
                    .map(|table| table.matching(params).cloned().collect())
                    .unwrap_or_default();
                Ok(Response::records(rows))
            }
            "invalidate" => {
                // Written records carry changed fields; match on the key alone
                let filter = match params.get(&self.key) {
                    Some(key) => Record::from([(self.key.as_str(), key.clone())]),
                    None => params.clone(),
                };

                let removed = tables.get_mut(name).map_or(0, |table| table.remove(&filter));
                tracing::debug!(table = name, removed, "memory invalidate");
                Ok(Response::count(removed as u64))
            }
            "clear" => {
                let removed = tables.remove(name).map_or(0, |table| table.rows.len());
                Ok(Response::count(removed as u64))
            }
            other => bail!("memory adapter does not support action `{other}`"),
        }
    }
}

/// The table a statement names; operations without a statement use their
/// mapping's qualified name.
fn table_name<'a>(statement: &'a str, mapping: &'a str) -> &'a str {
    match statement.trim() {
        "" => mapping,
        statement => statement,
    }
}
