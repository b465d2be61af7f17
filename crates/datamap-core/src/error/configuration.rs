use super::Error;

/// Error in the loaded configuration or in how a caller refers to it.
///
/// Configuration errors are never transient; retrying the same call fails
/// the same way.
#[derive(Debug)]
pub(super) struct ConfigurationError {
    kind: ConfigurationErrorKind,
}

#[derive(Debug)]
enum ConfigurationErrorKind {
    /// The configuration document itself is malformed
    Invalid(Box<str>),

    /// No mapping with the qualified name exists
    UnknownMapping(Box<str>),

    /// The mapping exists but does not configure the requested operation
    NoSuchOperation {
        mapping: Box<str>,
        operation: Box<str>,
    },

    /// The mapping exists but does not configure the requested action
    NoSuchAction { mapping: Box<str>, action: Box<str> },
}

impl std::error::Error for ConfigurationError {}

impl core::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use ConfigurationErrorKind::*;

        match &self.kind {
            Invalid(message) => write!(f, "invalid configuration: {message}"),
            UnknownMapping(name) => write!(f, "unknown mapping `{name}`"),
            NoSuchOperation { mapping, operation } => {
                write!(f, "mapping `{mapping}` has no `{operation}` operation")
            }
            NoSuchAction { mapping, action } => {
                write!(f, "mapping `{mapping}` has no `{action}` action")
            }
        }
    }
}

impl Error {
    /// Creates an error for a malformed configuration.
    pub fn invalid_config(message: impl Into<String>) -> Error {
        Error::configuration(ConfigurationErrorKind::Invalid(message.into().into()))
    }

    /// Creates an error for a mapping name that does not resolve.
    pub fn unknown_mapping(name: impl Into<String>) -> Error {
        Error::configuration(ConfigurationErrorKind::UnknownMapping(name.into().into()))
    }

    /// Creates an error for an operation the mapping does not configure.
    pub fn no_such_operation(mapping: impl Into<String>, operation: impl Into<String>) -> Error {
        Error::configuration(ConfigurationErrorKind::NoSuchOperation {
            mapping: mapping.into().into(),
            operation: operation.into().into(),
        })
    }

    /// Creates an error for an action the mapping does not configure.
    pub fn no_such_action(mapping: impl Into<String>, action: impl Into<String>) -> Error {
        Error::configuration(ConfigurationErrorKind::NoSuchAction {
            mapping: mapping.into().into(),
            action: action.into().into(),
        })
    }

    fn configuration(kind: ConfigurationErrorKind) -> Error {
        Error::from(super::ErrorKind::Configuration(ConfigurationError { kind }))
    }

    /// Returns `true` if this error is any kind of configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Configuration(_))
    }

    /// Returns `true` if a mapping name did not resolve.
    pub fn is_unknown_mapping(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::Configuration(ConfigurationError {
                kind: ConfigurationErrorKind::UnknownMapping(_)
            })
        )
    }

    /// Returns `true` if the requested operation is not configured.
    pub fn is_no_such_operation(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::Configuration(ConfigurationError {
                kind: ConfigurationErrorKind::NoSuchOperation { .. }
            })
        )
    }

    /// Returns `true` if the requested action is not configured.
    pub fn is_no_such_action(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::Configuration(ConfigurationError {
                kind: ConfigurationErrorKind::NoSuchAction { .. }
            })
        )
    }
}
