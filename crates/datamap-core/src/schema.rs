mod action;
pub use action::ActionDescriptor;

mod config;
pub use config::Config;

mod field;
pub use field::{Coercion, FieldMapping};

mod mapping;
pub use mapping::{Mapping, OperationKind};

mod operation;
pub use operation::{AfterAction, Continuation, OperationDescriptor, ResultDescriptor, SourceRef};

mod source;
pub use source::{Options, Source};

mod verify;

use crate::{Error, Result};

use indexmap::IndexMap;

/// The validated, read-only configuration the engine runs against: every
/// loaded namespace with its sources and mappings.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    configs: IndexMap<String, Config>,
}

/// A mapping resolved from its qualified `namespace.mapping` name.
#[derive(Debug, Clone, Copy)]
pub struct MappingRef<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub config: &'a Config,
    pub mapping: &'a Mapping,
}

/// Source selection inputs shared by operations and actions.
pub trait Routing {
    /// Explicit source override.
    fn source_override(&self) -> Option<&str>;

    /// Ordered fallback chain, possibly empty.
    fn fallback_chain(&self) -> &[SourceRef];
}

impl Schema {
    /// Builds a schema from configuration documents.
    ///
    /// Each document is validated on its own, namespaces must be unique, and
    /// every source reference must resolve within its namespace.
    pub fn from_configs(configs: impl IntoIterator<Item = Config>) -> Result<Schema> {
        let mut schema = Schema::default();

        for config in configs {
            config.validate()?;

            if schema.configs.contains_key(&config.namespace) {
                return Err(Error::invalid_config(format!(
                    "namespace `{}` is defined more than once",
                    config.namespace
                )));
            }

            schema.configs.insert(config.namespace.clone(), config);
        }

        schema.verify()?;
        Ok(schema)
    }

    pub fn config(&self, namespace: &str) -> Option<&Config> {
        self.configs.get(namespace)
    }

    pub fn configs(&self) -> impl Iterator<Item = &Config> {
        self.configs.values()
    }

    /// Looks up a mapping by its `namespace.mapping` name.
    pub fn mapping(&self, qualified: &str) -> Result<MappingRef<'_>> {
        let (namespace, name) = qualified
            .split_once('.')
            .ok_or_else(|| Error::unknown_mapping(qualified))?;

        let config = self
            .configs
            .get(namespace)
            .ok_or_else(|| Error::unknown_mapping(qualified))?;

        let (name, mapping) = config
            .mappings
            .get_key_value(name)
            .ok_or_else(|| Error::unknown_mapping(qualified))?;

        Ok(MappingRef {
            namespace: &config.namespace,
            name,
            config,
            mapping,
        })
    }

    /// Iterates every mapping of every namespace.
    pub fn mappings(&self) -> impl Iterator<Item = MappingRef<'_>> {
        self.configs.values().flat_map(|config| {
            config.mappings.iter().map(move |(name, mapping)| MappingRef {
                namespace: &config.namespace,
                name,
                config,
                mapping,
            })
        })
    }

    /// Looks up a source by name within a namespace.
    pub fn source(&self, namespace: &str, name: &str) -> Result<&Source> {
        self.configs
            .get(namespace)
            .and_then(|config| config.sources.get(name))
            .ok_or_else(|| Error::unknown_source(name, namespace))
    }
}

impl<'a> MappingRef<'a> {
    /// The `namespace.mapping` name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// The registry identifier of a source in this mapping's namespace.
    pub fn source_id(&self, source: &str) -> String {
        format!("{}.{}", self.namespace, source)
    }

    pub fn operation(&self, kind: OperationKind) -> Result<&'a OperationDescriptor> {
        self.mapping
            .operation(kind)
            .ok_or_else(|| Error::no_such_operation(self.qualified_name(), kind.as_str()))
    }

    pub fn action(&self, name: &str) -> Result<&'a ActionDescriptor> {
        self.mapping
            .action(name)
            .ok_or_else(|| Error::no_such_action(self.qualified_name(), name))
    }
}

impl Routing for OperationDescriptor {
    fn source_override(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn fallback_chain(&self) -> &[SourceRef] {
        &self.sources
    }
}

impl Routing for ActionDescriptor {
    fn source_override(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn fallback_chain(&self) -> &[SourceRef] {
        &self.sources
    }
}
