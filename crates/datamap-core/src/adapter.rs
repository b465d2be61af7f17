mod action;
pub use action::Action;

mod operation;
pub use operation::Operation;

mod response;
pub use response::{Response, Rows};

use crate::{async_trait, schema::Options, Record, Result};

use std::fmt::Debug;

/// The capability set every storage backend implements.
///
/// An adapter is constructed by a factory registered with the adapter
/// registry, connected once, then shared by every caller routed to its
/// source. Backend specific cancellation and timeouts are the adapter's
/// concern.
#[async_trait]
pub trait Adapter: Debug + Send + Sync + 'static {
    /// Establishes backend resources. Called exactly once, before the
    /// adapter is shared.
    async fn connect(&mut self, _options: &Options) -> Result<()> {
        Ok(())
    }

    /// Releases backend resources. Called once per lifecycle; a second call
    /// may report an error but must not corrupt state.
    async fn close(&self) -> Result<()>;

    /// Fetches records. Absence is an empty list, not an error.
    async fn fetch(&self, op: &Operation, params: &Record) -> Result<Vec<Record>>;

    /// Inserts records. Values the backend assigns to generated fields are
    /// written back into `records`.
    async fn insert(&self, op: &Operation, records: &mut [Record]) -> Result<()>;

    /// Updates records, failing with [`Error::record_not_found`] when a
    /// record (including its condition fields) matches nothing.
    ///
    /// [`Error::record_not_found`]: crate::Error::record_not_found
    async fn update(&self, op: &Operation, records: &[Record]) -> Result<()>;

    /// Deletes records by identifier, failing with
    /// [`Error::record_not_found`] when an identifier matches nothing.
    ///
    /// [`Error::record_not_found`]: crate::Error::record_not_found
    async fn delete(&self, op: &Operation, identifiers: &[Record]) -> Result<()>;

    /// Runs a custom action.
    async fn execute(&self, action: &Action, params: &Record) -> Result<Response>;
}
