use super::Error;

/// Error raised by the adapter registry.
///
/// Messages name the source identifier and the adapter tag only, never the
/// connection string.
#[derive(Debug)]
pub(super) struct RegistryError {
    kind: RegistryErrorKind,
}

#[derive(Debug)]
enum RegistryErrorKind {
    UnknownAdapterType { adapter: Box<str>, source: Box<str> },
    ConnectFailed { source: Box<str>, adapter: Box<str> },
    NotFound { source: Box<str> },
    CloseFailed { errors: Vec<Error> },
}

impl std::error::Error for RegistryError {}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use RegistryErrorKind::*;

        match &self.kind {
            UnknownAdapterType { adapter, source } => write!(
                f,
                "no adapter registered for type `{adapter}` (source `{source}`)"
            ),
            ConnectFailed { source, adapter } => write!(
                f,
                "failed to connect source `{source}` (adapter `{adapter}`)"
            ),
            NotFound { source } => write!(f, "no active adapter instance for source `{source}`"),
            CloseFailed { errors } => {
                write!(f, "failed to close {} adapter instance(s): ", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    core::fmt::Display::fmt(err, f)?;
                }
                Ok(())
            }
        }
    }
}

impl Error {
    /// Creates an error for a source whose adapter type has no factory.
    pub fn unknown_adapter_type(adapter: impl Into<String>, source: impl Into<String>) -> Error {
        Error::registry(RegistryErrorKind::UnknownAdapterType {
            adapter: adapter.into().into(),
            source: source.into().into(),
        })
    }

    /// Creates an error for a failed construct-and-connect sequence.
    ///
    /// Used as context over the adapter's own error:
    /// `cause.context(Error::connect_failed(..))`.
    pub fn connect_failed(source: impl Into<String>, adapter: impl Into<String>) -> Error {
        Error::registry(RegistryErrorKind::ConnectFailed {
            source: source.into().into(),
            adapter: adapter.into().into(),
        })
    }

    /// Creates an error for evicting a source that has no live instance.
    pub fn instance_not_found(source: impl Into<String>) -> Error {
        Error::registry(RegistryErrorKind::NotFound {
            source: source.into().into(),
        })
    }

    /// Creates an error aggregating every failure seen while closing
    /// adapter instances.
    pub fn close_failed(errors: Vec<Error>) -> Error {
        Error::registry(RegistryErrorKind::CloseFailed { errors })
    }

    fn registry(kind: RegistryErrorKind) -> Error {
        Error::from(super::ErrorKind::Registry(RegistryError { kind }))
    }

    /// Returns `true` if this error is any registry error.
    pub fn is_registry(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Registry(_))
    }

    /// Returns `true` if no adapter factory matched the source's type.
    pub fn is_unknown_adapter_type(&self) -> bool {
        matches!(
            self.registry_kind(),
            Some(RegistryErrorKind::UnknownAdapterType { .. })
        )
    }

    /// Returns `true` if constructing or connecting an adapter failed.
    pub fn is_connect_failed(&self) -> bool {
        matches!(
            self.registry_kind(),
            Some(RegistryErrorKind::ConnectFailed { .. })
        )
    }

    /// Returns `true` if an eviction targeted a source with no instance.
    pub fn is_instance_not_found(&self) -> bool {
        matches!(self.registry_kind(), Some(RegistryErrorKind::NotFound { .. }))
    }

    /// Returns `true` if closing one or more adapter instances failed.
    pub fn is_close_failed(&self) -> bool {
        matches!(
            self.registry_kind(),
            Some(RegistryErrorKind::CloseFailed { .. })
        )
    }

    /// Returns the individual failures aggregated by a close error, or an
    /// empty slice for any other error.
    pub fn close_failures(&self) -> &[Error] {
        match self.registry_kind() {
            Some(RegistryErrorKind::CloseFailed { errors }) => errors,
            _ => &[],
        }
    }

    fn registry_kind(&self) -> Option<&RegistryErrorKind> {
        match self.kind() {
            super::ErrorKind::Registry(err) => Some(&err.kind),
            _ => None,
        }
    }
}
