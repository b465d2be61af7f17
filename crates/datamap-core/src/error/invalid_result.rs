use super::Error;

/// An adapter answered with data of the wrong shape, such as a row count
/// where the caller asked for records, or a stored document that is not an
/// object.
#[derive(Debug)]
pub(super) struct InvalidResult {
    detail: Box<str>,
}

impl std::error::Error for InvalidResult {}

impl core::fmt::Display for InvalidResult {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("unexpected adapter response: ")?;
        f.write_str(&self.detail)
    }
}

impl Error {
    pub fn invalid_result(detail: impl Into<String>) -> Error {
        let detail = detail.into().into_boxed_str();
        Error::from(super::ErrorKind::InvalidResult(InvalidResult { detail }))
    }

    /// The adapter response did not have the shape the operation needs.
    pub fn is_invalid_result(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidResult(_))
    }
}
