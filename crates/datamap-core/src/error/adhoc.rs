use super::Error;

/// Error built from a formatted message, see the `err!` and `bail!` macros.
#[derive(Debug)]
pub(super) struct AdhocError {
    message: Box<str>,
}

impl AdhocError {
    pub(super) fn new(message: impl Into<Box<str>>) -> AdhocError {
        AdhocError {
            message: message.into(),
        }
    }
}

impl std::error::Error for AdhocError {}

impl core::fmt::Display for AdhocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error {
    /// Creates an ad-hoc error from format arguments.
    ///
    /// Prefer the `err!` and `bail!` macros over calling this directly.
    #[doc(hidden)]
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        let message = match args.as_str() {
            Some(message) => Box::from(message),
            None => args.to_string().into_boxed_str(),
        };
        Error::from(super::ErrorKind::Adhoc(AdhocError { message }))
    }
}
