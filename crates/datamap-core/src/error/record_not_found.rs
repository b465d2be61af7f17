use super::Error;

/// Error when an operation matched no record.
///
/// Adapters return this from `update` and `delete` when nothing matched
/// (including a stale optimistic-lock condition). The engine returns it from
/// single-record fetches that come back empty.
#[derive(Debug)]
pub(super) struct RecordNotFoundError {
    pub(super) context: Option<Box<str>>,
}

impl std::error::Error for RecordNotFoundError {}

impl core::fmt::Display for RecordNotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("record not found")?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {}", ctx)?;
        }
        Ok(())
    }
}

impl Error {
    /// Creates a record not found error with a short description of what was
    /// looked up.
    pub fn record_not_found(context: impl Into<String>) -> Error {
        let context = context.into();
        Error::from(super::ErrorKind::RecordNotFound(RecordNotFoundError {
            context: (!context.is_empty()).then(|| context.into()),
        }))
    }

    /// Returns `true` if this error is a record not found error.
    pub fn is_record_not_found(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::RecordNotFound(_))
    }
}
