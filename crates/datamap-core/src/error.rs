mod adapter;
mod adhoc;
mod configuration;
mod invalid_result;
mod mapping;
mod record_not_found;
mod registry;
mod resolution;

use adapter::AdapterError;
use adhoc::AdhocError;
use configuration::ConfigurationError;
use invalid_result::InvalidResult;
use mapping::MappingError;
use record_not_found::RecordNotFoundError;
use registry::RegistryError;
use resolution::ResolutionError;
use std::sync::Arc;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Creates an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while mapping records to and from a backend.
///
/// Errors are cheap to clone and carry an optional cause. Classification
/// predicates (`is_record_not_found`, `is_unknown_source`, ...) inspect the
/// outermost error only, so wrapping an error with [`Error::context`]
/// changes how it classifies.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }

        let attachable = err
            .inner
            .as_mut()
            .and_then(Arc::get_mut)
            .is_some_and(|inner| inner.cause.is_none());

        if attachable {
            return err.with_cause(self);
        }

        // A consequent that is shared or already has a cause cannot take a
        // new one; wrap it in a fresh error that keeps its message.
        Error::from(ErrorKind::Adhoc(AdhocError::new(err.to_string()))).with_cause(self)
    }

    fn with_cause(mut self, cause: Error) -> Error {
        if let Some(inner) = self.inner.as_mut().and_then(Arc::get_mut) {
            inner.cause = Some(cause);
        }
        self
    }

    /// Returns the error this one was caused by, if any.
    pub fn cause(&self) -> Option<&Error> {
        self.inner.as_ref().and_then(|inner| inner.cause.as_ref())
    }

    /// Returns the innermost error of the chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = err.cause() {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    fn kind_mut(&mut self) -> Option<&mut ErrorKind> {
        self.inner
            .as_mut()
            .and_then(Arc::get_mut)
            .map(|inner| &mut inner.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Adapter(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => self.cause().map(|cause| cause as _),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Adapter(AdapterError),
    Configuration(ConfigurationError),
    Resolution(ResolutionError),
    Registry(RegistryError),
    Mapping(MappingError),
    RecordNotFound(RecordNotFoundError),
    InvalidResult(InvalidResult),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Adapter(err) => core::fmt::Display::fmt(err, f),
            Configuration(err) => core::fmt::Display::fmt(err, f),
            Resolution(err) => core::fmt::Display::fmt(err, f),
            Registry(err) => core::fmt::Display::fmt(err, f),
            Mapping(err) => core::fmt::Display::fmt(err, f),
            RecordNotFound(err) => core::fmt::Display::fmt(err, f),
            InvalidResult(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown datamap error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<jiff::Error> for Error {
    fn from(err: jiff::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}
