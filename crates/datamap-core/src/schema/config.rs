use super::{Mapping, OperationKind, Source};
use crate::{Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// One configuration document: a namespace of sources and mappings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub namespace: String,

    #[serde(default = "default_version", deserialize_with = "deserialize_version")]
    pub version: String,

    #[serde(default)]
    pub sources: IndexMap<String, Source>,

    #[serde(default)]
    pub mappings: IndexMap<String, Mapping>,
}

impl Config {
    /// The only configuration format version understood.
    pub const VERSION: &'static str = "1.0";

    pub fn new(namespace: impl Into<String>) -> Config {
        Config {
            namespace: namespace.into(),
            version: Config::VERSION.to_string(),
            ..Config::default()
        }
    }

    pub fn source(mut self, name: impl Into<String>, source: Source) -> Config {
        self.sources.insert(name.into(), source);
        self
    }

    pub fn mapping(mut self, name: impl Into<String>, mapping: Mapping) -> Config {
        self.mappings.insert(name.into(), mapping);
        self
    }

    /// Checks the structure of this document on its own. Cross references
    /// are checked once every document is known, see [`Schema::from_configs`].
    ///
    /// [`Schema::from_configs`]: super::Schema::from_configs
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(Error::invalid_config("namespace is required"));
        }

        if self.namespace.contains('.') {
            return Err(Error::invalid_config(format!(
                "namespace `{}` must not contain `.`",
                self.namespace
            )));
        }

        if self.version != Config::VERSION {
            return Err(Error::invalid_config(format!(
                "unsupported version `{}` in namespace `{}` (expected `{}`)",
                self.version,
                self.namespace,
                Config::VERSION
            )));
        }

        if self.mappings.is_empty() {
            return Err(Error::invalid_config(format!(
                "namespace `{}` defines no mappings",
                self.namespace
            )));
        }

        for (name, source) in &self.sources {
            if source.adapter.is_empty() {
                return Err(Error::invalid_config(format!(
                    "source `{}.{name}` has no adapter type",
                    self.namespace
                )));
            }
        }

        for (name, mapping) in &self.mappings {
            let qualified = format!("{}.{name}", self.namespace);

            if mapping.object.is_empty() {
                return Err(Error::invalid_config(format!(
                    "mapping `{qualified}` has no object type"
                )));
            }

            if mapping.source.is_none()
                && mapping.operations.is_empty()
                && mapping.actions.is_empty()
            {
                return Err(Error::invalid_config(format!(
                    "mapping `{qualified}` needs a source, operations or actions"
                )));
            }

            for operation in mapping.operations.keys() {
                if !OperationKind::ALL.iter().any(|kind| kind.as_str() == operation) {
                    return Err(Error::invalid_config(format!(
                        "mapping `{qualified}` has unknown operation `{operation}` \
                         (expected fetch, insert, update or delete)"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn default_version() -> String {
    Config::VERSION.to_string()
}

/// YAML readily types `version: 1.0` as a number; accept both forms.
fn deserialize_version<'de, D: Deserializer<'de>>(deserializer: D) -> core::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Number(f64),
    }

    Ok(match Version::deserialize(deserializer)? {
        Version::Text(text) => text,
        Version::Number(n) if n.fract() == 0.0 => format!("{n:.1}"),
        Version::Number(n) => n.to_string(),
    })
}
