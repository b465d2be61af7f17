use datamap::Record;
use std::sync::{Arc, Mutex};

/// Adapter entry points, as seen by the recording adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Connect,
    Close,
    Fetch,
    Insert,
    Update,
    Delete,
    Execute,
}

/// One call made to a recording adapter
#[derive(Debug, Clone)]
pub struct Call {
    /// Name of the source the call went to
    pub source: String,

    pub verb: Verb,

    /// Qualified mapping name, or the action name for `Execute`
    pub target: String,

    /// Parameters or records handed to the adapter
    pub records: Vec<Record>,

    pub ok: bool,
}

/// A wrapper around the calls log that provides a clean API for tests
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub(crate) fn handle(&self) -> Arc<Mutex<Vec<Call>>> {
        self.calls.clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls of one verb, oldest first
    pub fn of(&self, verb: Verb) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.verb == verb)
            .cloned()
            .collect()
    }

    /// Sources a verb went to, in call order
    pub fn sources(&self, verb: Verb) -> Vec<String> {
        self.of(verb).into_iter().map(|call| call.source).collect()
    }

    pub fn count(&self, source: &str, verb: Verb) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.source == source && call.verb == verb)
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}
