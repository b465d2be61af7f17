use crate::Result;

use datamap_core::{schema::Source, Adapter, Error};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tokio::sync::OnceCell;

/// Constructs an unconnected adapter for a source.
pub type AdapterFactory = Arc<dyn Fn(&Source) -> Result<Box<dyn Adapter>> + Send + Sync>;

type Slot = Arc<OnceCell<Arc<dyn Adapter>>>;

/// Owns one connected adapter instance per source identifier.
///
/// Instances are created on first use: the factory registered for the
/// source's adapter tag builds the adapter, which is connected before
/// anyone else can see it. Concurrent lookups of the same source share a
/// single construct-and-connect sequence. Lookups of other sources never
/// wait on it.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: RwLock<HashMap<String, AdapterFactory>>,

    /// Source identifier to its instance slot. The lock only guards the
    /// map; slots are initialized outside of it.
    instances: Mutex<HashMap<String, Slot>>,
}

impl AdapterRegistry {
    pub fn new() -> AdapterRegistry {
        AdapterRegistry::default()
    }

    /// Associates an adapter tag with a factory. Registering a tag again
    /// replaces the previous factory.
    pub fn register<F>(&self, adapter: impl Into<String>, factory: F)
    where
        F: Fn(&Source) -> Result<Box<dyn Adapter>> + Send + Sync + 'static,
    {
        let adapter = adapter.into();
        tracing::debug!(adapter = %adapter, "registering adapter factory");

        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(adapter, Arc::new(factory));
    }

    pub fn is_registered(&self, adapter: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(adapter)
    }

    /// Returns the instance for `id`, constructing and connecting it on
    /// first use.
    ///
    /// A failed construct or connect caches nothing; the next call tries
    /// again.
    pub async fn get(&self, id: &str, source: &Source) -> Result<Arc<dyn Adapter>> {
        loop {
            let slot = {
                let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
                instances.entry(id.to_string()).or_default().clone()
            };

            if let Some(adapter) = slot.get() {
                tracing::trace!(source = id, "reusing adapter instance");
                return Ok(adapter.clone());
            }

            let adapter = slot.get_or_try_init(|| self.connect(id, source)).await?.clone();

            // The slot may have been closed and evicted while this lookup
            // waited on another caller's connect.
            if self.is_current(id, &slot) {
                return Ok(adapter);
            }

            tracing::debug!(source = id, "instance closed during lookup; reconnecting");
        }
    }

    /// Closes and evicts the instance for `id`.
    ///
    /// The instance is evicted even when closing it fails.
    pub async fn close_instance(&self, id: &str) -> Result<()> {
        let adapter = {
            let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);

            match instances.get(id).and_then(|slot| slot.get().cloned()) {
                Some(adapter) => {
                    instances.remove(id);
                    adapter
                }
                None => return Err(Error::instance_not_found(id)),
            }
        };

        tracing::debug!(source = id, "closing adapter instance");
        adapter.close().await.map_err(|err| {
            tracing::warn!(source = id, error = %err, "adapter close failed");
            err
        })
    }

    /// Closes every live instance and clears the cache.
    ///
    /// Every instance is closed even if some fail; the failures are
    /// reported together.
    pub async fn close_all(&self) -> Result<()> {
        let live: Vec<(String, Arc<dyn Adapter>)> = {
            let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);

            // Empty slots still referenced belong to in-flight lookups.
            let mut live = vec![];
            instances.retain(|id, slot| match slot.get() {
                Some(adapter) => {
                    live.push((id.clone(), adapter.clone()));
                    false
                }
                None => Arc::strong_count(slot) > 1,
            });
            live
        };

        tracing::debug!(count = live.len(), "closing all adapter instances");

        let mut errors = vec![];
        for (id, adapter) in live {
            if let Err(err) = adapter.close().await {
                tracing::warn!(source = %id, error = %err, "adapter close failed");
                errors.push(err.context(crate::err!("source `{id}`")));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::close_failed(errors))
        }
    }

    /// Identifiers of every source with a live instance, sorted.
    pub fn list_active(&self) -> Vec<String> {
        let instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);

        let mut active: Vec<_> = instances
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        active.sort();
        active
    }

    fn is_current(&self, id: &str, slot: &Slot) -> bool {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    async fn connect(&self, id: &str, source: &Source) -> Result<Arc<dyn Adapter>> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&source.adapter)
            .cloned()
            .ok_or_else(|| Error::unknown_adapter_type(&source.adapter, id))?;

        tracing::debug!(source = id, adapter = %source.adapter, "constructing adapter");

        let mut adapter =
            factory(source).map_err(|err| err.context(Error::connect_failed(id, &source.adapter)))?;

        adapter
            .connect(&source.options)
            .await
            .map_err(|err| err.context(Error::connect_failed(id, &source.adapter)))?;

        tracing::info!(source = id, adapter = %source.adapter, "adapter connected");
        Ok(Arc::from(adapter))
    }
}

impl core::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut adapters: Vec<_> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        adapters.sort();

        f.debug_struct("AdapterRegistry")
            .field("adapters", &adapters)
            .field("active", &self.list_active())
            .finish()
    }
}
