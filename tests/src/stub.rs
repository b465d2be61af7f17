use datamap::{
    adapter::{Action, Operation, Response},
    async_trait, bail,
    schema::{Options, Source},
    Adapter, Record, Result,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering::SeqCst},
        Arc,
    },
    time::Duration,
};

/// Lifecycle counters shared by every stub a factory builds
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub built: Arc<AtomicUsize>,
    pub connected: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

/// An adapter that stores nothing and counts its lifecycle.
///
/// Source options steer it:
///
/// * `delay_ms`: sleep this long in `connect`
/// * `fail_connect`: fail `connect`
/// * `fail_close`: fail `close`
#[derive(Debug)]
pub struct Stub {
    counters: Counters,
    fail_close: bool,
}

impl Counters {
    pub fn built(&self) -> usize {
        self.built.load(SeqCst)
    }

    pub fn connected(&self) -> usize {
        self.connected.load(SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(SeqCst)
    }
}

impl Stub {
    pub fn factory(counters: &Counters) -> impl Fn(&Source) -> Result<Box<dyn Adapter>> + Send + Sync + 'static {
        let counters = counters.clone();
        move |_| {
            counters.built.fetch_add(1, SeqCst);
            Ok(Box::new(Stub {
                counters: counters.clone(),
                fail_close: false,
            }))
        }
    }
}

#[async_trait]
impl Adapter for Stub {
    async fn connect(&mut self, options: &Options) -> Result<()> {
        if let Some(delay) = options.get("delay_ms").and_then(|v| v.as_u64()) {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if options.get("fail_connect").and_then(|v| v.as_bool()) == Some(true) {
            bail!("connection refused");
        }

        self.fail_close = options.get("fail_close").and_then(|v| v.as_bool()) == Some(true);
        self.counters.connected.fetch_add(1, SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.counters.closed.fetch_add(1, SeqCst);
        if self.fail_close {
            bail!("close timed out");
        }
        Ok(())
    }

    async fn fetch(&self, _op: &Operation, _params: &Record) -> Result<Vec<Record>> {
        Ok(vec![])
    }

    async fn insert(&self, _op: &Operation, _records: &mut [Record]) -> Result<()> {
        Ok(())
    }

    async fn update(&self, _op: &Operation, _records: &[Record]) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _op: &Operation, _identifiers: &[Record]) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, _action: &Action, _params: &Record) -> Result<Response> {
        Ok(Response::empty())
    }
}
