use super::{Config, Mapping, Routing, Schema};
use crate::{Error, Result};

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        for config in self.schema.configs() {
            for (name, mapping) in &config.mappings {
                self.verify_mapping_sources(config, name, mapping)?;
            }
        }

        Ok(())
    }

    /// Every source name a mapping can route to must exist in its namespace:
    /// the default, operation overrides, fallback chain entries,
    /// after-action targets and action sources.
    fn verify_mapping_sources(&self, config: &Config, name: &str, mapping: &Mapping) -> Result<()> {
        let qualified = format!("{}.{name}", config.namespace);

        if let Some(source) = &mapping.source {
            self.verify_source(config, source, &qualified)?;
        }

        for (op_name, op) in &mapping.operations {
            let referrer = format!("{qualified}.{op_name}");
            self.verify_routing(config, op, &referrer)?;

            for after in &op.after {
                if let Some(source) = &after.source {
                    self.verify_source(config, source, &format!("{referrer}.after"))?;
                }
            }
        }

        for (action_name, action) in &mapping.actions {
            self.verify_routing(config, action, &format!("{qualified}.{action_name}"))?;
        }

        Ok(())
    }

    fn verify_routing(&self, config: &Config, routing: &impl Routing, referrer: &str) -> Result<()> {
        if let Some(source) = routing.source_override() {
            self.verify_source(config, source, referrer)?;
        }

        for entry in routing.fallback_chain() {
            self.verify_source(config, &entry.name, referrer)?;
        }

        Ok(())
    }

    fn verify_source(&self, config: &Config, source: &str, referrer: &str) -> Result<()> {
        if config.sources.contains_key(source) {
            Ok(())
        } else {
            Err(Error::unknown_source(source, referrer))
        }
    }
}
