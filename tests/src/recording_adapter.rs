use crate::call_log::{Call, Verb};

use datamap::{
    adapter::{Action, Operation, Response},
    async_trait, err,
    schema::Options,
    Adapter, Record, Result,
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

/// Failures to inject, keyed by source name and verb.
pub(crate) type Faults = Arc<Mutex<HashSet<(String, Verb)>>>;

/// An adapter wrapper that logs every call and can be told to fail
#[derive(Debug)]
pub struct RecordingAdapter {
    /// Name of the source this instance serves
    source: String,

    /// The adapter that actually runs the calls
    inner: Box<dyn Adapter>,

    calls: Arc<Mutex<Vec<Call>>>,
    faults: Faults,
}

impl RecordingAdapter {
    pub(crate) fn new(
        source: impl Into<String>,
        inner: Box<dyn Adapter>,
        calls: Arc<Mutex<Vec<Call>>>,
        faults: Faults,
    ) -> RecordingAdapter {
        RecordingAdapter {
            source: source.into(),
            inner,
            calls,
            faults,
        }
    }

    fn check_fault(&self, verb: Verb) -> Result<()> {
        let faulty = self
            .faults
            .lock()
            .unwrap()
            .contains(&(self.source.clone(), verb));

        if faulty {
            return Err(err!("injected {verb:?} failure on `{}`", self.source));
        }
        Ok(())
    }

    fn log<T>(&self, verb: Verb, target: &str, records: Vec<Record>, result: &Result<T>) {
        self.calls.lock().unwrap().push(Call {
            source: self.source.clone(),
            verb,
            target: target.to_string(),
            records,
            ok: result.is_ok(),
        });
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    async fn connect(&mut self, options: &Options) -> Result<()> {
        let result = match self.check_fault(Verb::Connect) {
            Ok(()) => self.inner.connect(options).await,
            Err(err) => Err(err),
        };
        self.log(Verb::Connect, "", vec![], &result);
        result
    }

    async fn close(&self) -> Result<()> {
        let result = match self.check_fault(Verb::Close) {
            Ok(()) => self.inner.close().await,
            Err(err) => Err(err),
        };
        self.log(Verb::Close, "", vec![], &result);
        result
    }

    async fn fetch(&self, op: &Operation, params: &Record) -> Result<Vec<Record>> {
        let result = match self.check_fault(Verb::Fetch) {
            Ok(()) => self.inner.fetch(op, params).await,
            Err(err) => Err(err),
        };
        self.log(Verb::Fetch, &op.mapping, vec![params.clone()], &result);
        result
    }

    async fn insert(&self, op: &Operation, records: &mut [Record]) -> Result<()> {
        let sent = records.to_vec();
        let result = match self.check_fault(Verb::Insert) {
            Ok(()) => self.inner.insert(op, records).await,
            Err(err) => Err(err),
        };
        self.log(Verb::Insert, &op.mapping, sent, &result);
        result
    }

    async fn update(&self, op: &Operation, records: &[Record]) -> Result<()> {
        let result = match self.check_fault(Verb::Update) {
            Ok(()) => self.inner.update(op, records).await,
            Err(err) => Err(err),
        };
        self.log(Verb::Update, &op.mapping, records.to_vec(), &result);
        result
    }

    async fn delete(&self, op: &Operation, identifiers: &[Record]) -> Result<()> {
        let result = match self.check_fault(Verb::Delete) {
            Ok(()) => self.inner.delete(op, identifiers).await,
            Err(err) => Err(err),
        };
        self.log(Verb::Delete, &op.mapping, identifiers.to_vec(), &result);
        result
    }

    async fn execute(&self, action: &Action, params: &Record) -> Result<Response> {
        let result = match self.check_fault(Verb::Execute) {
            Ok(()) => self.inner.execute(action, params).await,
            Err(err) => Err(err),
        };
        self.log(Verb::Execute, &action.name, vec![params.clone()], &result);
        result
    }
}
