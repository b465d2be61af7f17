use indexmap::IndexMap;
use serde::Deserialize;

/// Free-form adapter options, passed to [`Adapter::connect`].
///
/// [`Adapter::connect`]: crate::Adapter::connect
pub type Options = IndexMap<String, serde_json::Value>;

/// A named connection descriptor.
///
/// The connection string has already been through credential resolution
/// and may hold secrets, so it is left out of the `Debug` output.
#[derive(Clone, Default, Deserialize)]
pub struct Source {
    /// Adapter type tag, matched against registered factories
    pub adapter: String,

    /// Connection string or URI
    #[serde(default)]
    pub connection: String,

    /// Adapter specific options
    #[serde(default)]
    pub options: Options,
}

impl Source {
    pub fn new(adapter: impl Into<String>) -> Source {
        Source {
            adapter: adapter.into(),
            ..Source::default()
        }
    }

    pub fn connection(mut self, connection: impl Into<String>) -> Source {
        self.connection = connection.into();
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Source {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Returns a string option, if set.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(serde_json::Value::as_str)
    }
}

impl core::fmt::Debug for Source {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Source")
            .field("adapter", &self.adapter)
            .field("connection", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}
