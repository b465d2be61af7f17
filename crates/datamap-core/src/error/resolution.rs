use super::Error;

/// Error when no usable source can be determined for a call.
#[derive(Debug)]
pub(super) struct ResolutionError {
    kind: ResolutionErrorKind,
}

#[derive(Debug)]
enum ResolutionErrorKind {
    NoSourceConfigured {
        mapping: Box<str>,
        operation: Box<str>,
    },
    UnknownSource {
        source: Box<str>,
        referrer: Box<str>,
    },
}

impl std::error::Error for ResolutionError {}

impl core::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            ResolutionErrorKind::NoSourceConfigured { mapping, operation } => write!(
                f,
                "no source configured for `{operation}` on mapping `{mapping}`"
            ),
            ResolutionErrorKind::UnknownSource { source, referrer } => {
                write!(f, "unknown source `{source}` referenced by `{referrer}`")
            }
        }
    }
}

impl Error {
    /// Creates an error for an operation with neither an override, a
    /// fallback chain, nor a mapping default source.
    pub fn no_source_configured(mapping: impl Into<String>, operation: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Resolution(ResolutionError {
            kind: ResolutionErrorKind::NoSourceConfigured {
                mapping: mapping.into().into(),
                operation: operation.into().into(),
            },
        }))
    }

    /// Creates an error for a source name that is not defined in the
    /// referring namespace.
    ///
    /// `referrer` names the configuration element holding the reference,
    /// e.g. `app.user.fetch`.
    pub fn unknown_source(source: impl Into<String>, referrer: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Resolution(ResolutionError {
            kind: ResolutionErrorKind::UnknownSource {
                source: source.into().into(),
                referrer: referrer.into().into(),
            },
        }))
    }

    /// Returns `true` if this error is a source resolution error.
    pub fn is_resolution(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Resolution(_))
    }

    /// Returns `true` if no source was configured for the operation.
    pub fn is_no_source_configured(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::Resolution(ResolutionError {
                kind: ResolutionErrorKind::NoSourceConfigured { .. }
            })
        )
    }

    /// Returns `true` if a referenced source does not exist.
    pub fn is_unknown_source(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::Resolution(ResolutionError {
                kind: ResolutionErrorKind::UnknownSource { .. }
            })
        )
    }
}
