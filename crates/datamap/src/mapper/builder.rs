use super::{Mapper, Shared};
use crate::{record_mapper, AdapterRegistry, Entity, FieldSet, Result};

use datamap_core::{
    schema::{MappingRef, Source},
    Adapter, Error, Schema,
};

use std::{collections::HashMap, sync::Arc};

/// Assembles a [`Mapper`].
#[derive(Default)]
pub struct Builder {
    schema: Option<Schema>,

    /// Registered entity shapes keyed by type name
    entities: HashMap<&'static str, &'static dyn FieldSet>,

    registry: Option<Arc<AdapterRegistry>>,

    factories: Vec<(String, crate::AdapterFactory)>,
}

impl Builder {
    pub fn schema(&mut self, schema: Schema) -> &mut Self {
        self.schema = Some(schema);
        self
    }

    /// Registers an entity type. Every mapping whose object (or result
    /// type) names it is checked against its fields when the mapper is
    /// built.
    pub fn entity<T: Entity>(&mut self) -> &mut Self {
        self.entities.insert(T::NAME, T::shape());
        self
    }

    /// Registers an adapter factory for a tag.
    pub fn adapter<F>(&mut self, adapter: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Source) -> Result<Box<dyn Adapter>> + Send + Sync + 'static,
    {
        self.factories.push((adapter.into(), Arc::new(factory)));
        self
    }

    /// Uses an existing registry instead of a fresh one.
    pub fn registry(&mut self, registry: Arc<AdapterRegistry>) -> &mut Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(&mut self) -> Result<Mapper> {
        let schema = self
            .schema
            .clone()
            .ok_or_else(|| Error::invalid_config("no schema configured"))?;

        for mapping in schema.mappings() {
            self.verify_entities(mapping)?;
        }

        let registry = self.registry.clone().unwrap_or_default();
        for (adapter, factory) in self.factories.drain(..) {
            registry.register(adapter, move |source: &Source| factory(source));
        }

        tracing::debug!(
            namespaces = schema.configs().count(),
            entities = self.entities.len(),
            "mapper built"
        );

        Ok(Mapper {
            shared: Arc::new(Shared { schema, registry }),
        })
    }

    fn verify_entities(&self, mapping: MappingRef<'_>) -> Result<()> {
        let located = |target: &str, err: Error| {
            err.context(Error::invalid_config(format!(
                "mapping `{}` `{target}`",
                mapping.qualified_name()
            )))
        };

        if let Some(shape) = self.entities.get(mapping.mapping.object.as_str()) {
            for (target, fields) in mapping.mapping.object_field_lists() {
                record_mapper::validate(*shape, fields).map_err(|err| located(target, err))?;
            }
        }

        // Result blocks describing some other registered type
        let results = mapping
            .mapping
            .operations
            .iter()
            .filter_map(|(name, op)| op.result.as_ref().map(|result| (name, result)))
            .chain(
                mapping
                    .mapping
                    .actions
                    .iter()
                    .filter_map(|(name, action)| action.result.as_ref().map(|result| (name, result))),
            );

        for (target, result) in results {
            let Some(ty) = result.ty.as_deref() else {
                continue;
            };

            if ty == mapping.mapping.object {
                continue;
            }

            if let Some(shape) = self.entities.get(ty) {
                record_mapper::validate(*shape, &result.properties)
                    .map_err(|err| located(target, err))?;
            }
        }

        Ok(())
    }
}

impl core::fmt::Debug for Builder {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut entities: Vec<_> = self.entities.keys().collect();
        entities.sort();

        f.debug_struct("Builder")
            .field("schema", &self.schema)
            .field("entities", &entities)
            .field(
                "adapters",
                &self.factories.iter().map(|(tag, _)| tag).collect::<Vec<_>>(),
            )
            .finish()
    }
}
