mod builder;
pub use builder::Builder;

mod identifiers;
pub use identifiers::Identifiers;

use crate::{
    coerce, err,
    record_mapper::{from_object_all, to_object},
    resolve::{Candidate, Route},
    AdapterRegistry, Entity, Result,
};

use datamap_core::{
    adapter::{Action, Operation, Response},
    schema::{
        ActionDescriptor, FieldMapping, MappingRef, OperationDescriptor, OperationKind,
        ResultDescriptor, Source,
    },
    Adapter, Error, Record, Schema,
};

use std::sync::Arc;

/// The orchestration engine.
///
/// Every verb looks up a mapping by its `namespace.mapping` name, resolves
/// the sources the call may be served by, obtains their adapters from the
/// registry and converts between entities and records on the way in and
/// out. The engine keeps no per-call state; clones share the same schema
/// and registry.
#[derive(Debug, Clone)]
pub struct Mapper {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    schema: Schema,
    registry: Arc<AdapterRegistry>,
}

impl Mapper {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.shared.registry
    }

    /// Registers (or replaces) an adapter factory on the shared registry.
    pub fn register_adapter<F>(&self, adapter: impl Into<String>, factory: F)
    where
        F: Fn(&Source) -> Result<Box<dyn Adapter>> + Send + Sync + 'static,
    {
        self.shared.registry.register(adapter, factory);
    }

    /// Fetches exactly one record and maps it into a new `T`.
    ///
    /// Fails with [`Error::record_not_found`] when the backend returns
    /// nothing.
    pub async fn fetch_one<T: Entity + Default>(&self, mapping: &str, params: impl Into<Record>) -> Result<T> {
        let mut target = T::default();
        self.fetch_one_into(mapping, params, &mut target).await?;
        Ok(target)
    }

    /// Same as [`Mapper::fetch_one`], mapping into an existing value. Fields
    /// missing from the fetched record keep their current value.
    pub async fn fetch_one_into<T: Entity>(
        &self,
        mapping: &str,
        params: impl Into<Record>,
        target: &mut T,
    ) -> Result<()> {
        let mapping = self.schema().mapping(mapping)?;
        let descriptor = mapping.operation(OperationKind::Fetch)?;
        expect_entity::<T>(mapping, "fetch", result_type(mapping, descriptor.result.as_ref()))?;

        let records = self.fetch(mapping, descriptor, params.into(), false).await?;

        let Some(record) = records.first() else {
            return Err(Error::record_not_found(mapping.qualified_name()));
        };

        to_object(record, target, descriptor.result_fields())
    }

    /// Fetches every matching record. No match is an empty list.
    pub async fn fetch_many<T: Entity + Default>(&self, mapping: &str, params: impl Into<Record>) -> Result<Vec<T>> {
        let mapping = self.schema().mapping(mapping)?;
        let descriptor = mapping.operation(OperationKind::Fetch)?;
        expect_entity::<T>(mapping, "fetch", result_type(mapping, descriptor.result.as_ref()))?;

        let records = self.fetch(mapping, descriptor, params.into(), true).await?;
        map_records(&records, descriptor.result_fields())
    }

    /// Inserts entities. Values the backend assigns to generated fields are
    /// written back onto the entities.
    pub async fn insert<'a, T: Entity>(
        &self,
        mapping: &str,
        objects: impl IntoIterator<Item = &'a mut T>,
    ) -> Result<()> {
        let mapping = self.schema().mapping(mapping)?;
        let descriptor = mapping.operation(OperationKind::Insert)?;
        expect_entity::<T>(mapping, "insert", &mapping.mapping.object)?;

        let mut objects: Vec<&mut T> = objects.into_iter().collect();
        if objects.is_empty() {
            return Ok(());
        }

        let op = Operation::new(OperationKind::Insert, mapping.qualified_name(), descriptor);
        let fields: Vec<FieldMapping> = descriptor
            .properties
            .iter()
            .filter(|m| !op.is_generated(&m.field))
            .cloned()
            .collect();

        let mut records = objects
            .iter()
            .map(|object| from_object_all(&**object, &fields))
            .collect::<Result<Vec<_>>>()?;

        let route = Route::resolve(mapping, "insert", descriptor)?;
        let (served, mut outcome) = self.write(&route, &op, &mut records).await;

        if !op.generated.is_empty() {
            for (object, record) in objects.iter_mut().zip(&records[..served.len()]) {
                if let Err(err) = to_object(record, &mut **object, &op.generated) {
                    outcome = outcome.and(Err(err));
                    break;
                }
            }
        }

        self.settle(mapping, descriptor, &op, &served, &records, outcome).await
    }

    /// Updates entities, matched by their identifier and condition fields.
    ///
    /// A record the backend cannot match surfaces as
    /// [`Error::record_not_found`], which is how a stale optimistic-lock
    /// condition shows up.
    pub async fn update<'a, T: Entity>(
        &self,
        mapping: &str,
        objects: impl IntoIterator<Item = &'a mut T>,
    ) -> Result<()> {
        let mapping = self.schema().mapping(mapping)?;
        let descriptor = mapping.operation(OperationKind::Update)?;
        expect_entity::<T>(mapping, "update", &mapping.mapping.object)?;

        let objects: Vec<&mut T> = objects.into_iter().collect();
        if objects.is_empty() {
            return Ok(());
        }

        let op = Operation::new(OperationKind::Update, mapping.qualified_name(), descriptor);
        let fields: Vec<FieldMapping> = descriptor
            .properties
            .iter()
            .filter(|m| !op.is_generated(&m.field))
            .chain(&descriptor.identifier)
            .chain(&descriptor.condition)
            .cloned()
            .collect();

        let mut records = objects
            .iter()
            .map(|object| from_object_all(&**object, &fields))
            .collect::<Result<Vec<_>>>()?;

        let route = Route::resolve(mapping, "update", descriptor)?;
        let (served, outcome) = self.write(&route, &op, &mut records).await;

        self.settle(mapping, descriptor, &op, &served, &records, outcome).await
    }

    /// Deletes records by identifier: a scalar, a list of scalars, or
    /// identifier records.
    pub async fn delete(&self, mapping: &str, identifiers: impl Into<Identifiers>) -> Result<()> {
        let mapping = self.schema().mapping(mapping)?;
        let descriptor = mapping.operation(OperationKind::Delete)?;

        let op = Operation::new(OperationKind::Delete, mapping.qualified_name(), descriptor);
        let mut records = identifiers.into().into_records(&op)?;
        if records.is_empty() {
            return Ok(());
        }

        let route = Route::resolve(mapping, "delete", descriptor)?;
        let (served, outcome) = self.write(&route, &op, &mut records).await;

        self.settle(mapping, descriptor, &op, &served, &records, outcome).await
    }

    /// Runs the custom action `namespace.mapping.action` and maps every
    /// returned record into a `T`.
    pub async fn execute<T: Entity + Default>(&self, action: &str, params: impl Into<Record>) -> Result<Vec<T>> {
        let (mapping, descriptor) = self.action(action)?;
        expect_entity::<T>(mapping, action, result_type(mapping, descriptor.result.as_ref()))?;

        let response = self.run_action(mapping, action, descriptor, params.into()).await?;
        let records = response.rows.into_records()?;
        map_records(&records, descriptor.result_fields())
    }

    /// Runs a custom action expected to produce one record.
    pub async fn execute_one<T: Entity + Default>(&self, action: &str, params: impl Into<Record>) -> Result<T> {
        self.execute(action, params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::record_not_found(action))
    }

    /// Runs a custom action and returns the adapter's response untouched.
    pub async fn execute_raw(&self, action: &str, params: impl Into<Record>) -> Result<Response> {
        let (mapping, descriptor) = self.action(action)?;
        self.run_action(mapping, action, descriptor, params.into()).await
    }

    /// Closes every adapter instance.
    pub async fn close(&self) -> Result<()> {
        self.shared.registry.close_all().await
    }

    async fn adapter(&self, candidate: &Candidate<'_>) -> Result<Arc<dyn Adapter>> {
        self.shared
            .registry
            .get(&candidate.id, candidate.source)
            .await
    }

    async fn fetch(
        &self,
        mapping: MappingRef<'_>,
        descriptor: &OperationDescriptor,
        params: Record,
        multi: bool,
    ) -> Result<Vec<Record>> {
        let mut op = Operation::new(OperationKind::Fetch, mapping.qualified_name(), descriptor);
        op.multi = multi;

        let params = translate(params, &descriptor.parameters)?;
        let route = Route::resolve(mapping, "fetch", descriptor)?;

        let mut candidates = route.candidates().iter().peekable();
        while let Some(candidate) = candidates.next() {
            let outcome = match self.adapter(candidate).await {
                Ok(adapter) => adapter.fetch(&op, &params).await,
                Err(err) => Err(err),
            };

            let has_next = candidates.peek().is_some();
            match outcome {
                Ok(records) if records.is_empty() && has_next && candidate.continues_on_miss() => {
                    tracing::debug!(mapping = %op.mapping, source = %candidate.id, "fetch missed; trying next source");
                }
                Ok(records) => {
                    tracing::debug!(
                        mapping = %op.mapping,
                        source = %candidate.id,
                        records = records.len(),
                        "fetched"
                    );
                    return Ok(records);
                }
                Err(err) if has_next && continues_after(candidate, &err) => {
                    tracing::debug!(mapping = %op.mapping, source = %candidate.id, error = %err, "fetch failed; trying next source");
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::no_source_configured(mapping.qualified_name(), "fetch"))
    }

    /// Sends the records to the backend: all at once for bulk operations,
    /// otherwise one call per record, stopping at the first failure.
    ///
    /// Returns the candidate that served each record written so far, in
    /// order, along with the failure that stopped the batch.
    async fn write<'r, 'a>(
        &self,
        route: &'r Route<'a>,
        op: &Operation,
        records: &mut [Record],
    ) -> (Vec<&'r Candidate<'a>>, Result<()>) {
        let mut served = Vec::with_capacity(records.len());

        if op.bulk {
            match self.dispatch(route, op, records).await {
                Ok(candidate) => served.resize(records.len(), candidate),
                Err(err) => return (served, Err(err)),
            }
        } else {
            for record in records.iter_mut() {
                match self.dispatch(route, op, std::slice::from_mut(record)).await {
                    Ok(candidate) => served.push(candidate),
                    Err(err) => {
                        tracing::debug!(
                            mapping = %op.mapping,
                            operation = %op.kind,
                            written = served.len(),
                            "batch stopped by a failed record"
                        );
                        return (served, Err(err));
                    }
                }
            }
        }

        tracing::debug!(mapping = %op.mapping, operation = %op.kind, records = records.len(), "written");
        (served, Ok(()))
    }

    /// Runs the after-actions for every record that reached the backend, even
    /// when a later record failed, then reports the write's own outcome first.
    async fn settle(
        &self,
        mapping: MappingRef<'_>,
        descriptor: &OperationDescriptor,
        op: &Operation,
        served: &[&Candidate<'_>],
        records: &[Record],
        outcome: Result<()>,
    ) -> Result<()> {
        let after = self
            .after_actions(mapping, descriptor, op, served, &records[..served.len()])
            .await;

        match (outcome, after) {
            (Ok(()), after) => after,
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(after_err)) => {
                tracing::warn!(
                    mapping = %op.mapping,
                    operation = %op.kind,
                    error = %after_err,
                    "after-action failed following a partial write"
                );
                Err(err)
            }
        }
    }

    async fn dispatch<'r, 'a>(
        &self,
        route: &'r Route<'a>,
        op: &Operation,
        records: &mut [Record],
    ) -> Result<&'r Candidate<'a>> {
        let mut candidates = route.candidates().iter().peekable();

        while let Some(candidate) = candidates.next() {
            let outcome = match self.adapter(candidate).await {
                Ok(adapter) => match op.kind {
                    OperationKind::Insert => adapter.insert(op, records).await,
                    OperationKind::Update => adapter.update(op, records).await,
                    OperationKind::Delete => adapter.delete(op, records).await,
                    OperationKind::Fetch => unreachable!("fetch is not a write"),
                },
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => return Ok(candidate),
                Err(err) if candidates.peek().is_some() && continues_after(candidate, &err) => {
                    tracing::debug!(
                        mapping = %op.mapping,
                        operation = %op.kind,
                        source = %candidate.id,
                        error = %err,
                        "write failed; trying next source"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::no_source_configured(&op.mapping, op.kind.as_str()))
    }

    /// Runs the operation's after-actions once per written record.
    async fn after_actions(
        &self,
        mapping: MappingRef<'_>,
        descriptor: &OperationDescriptor,
        op: &Operation,
        served: &[&Candidate<'_>],
        records: &[Record],
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        for after in &descriptor.after {
            let action = Action::after(&op.mapping, after);
            let pinned = match after.source.as_deref() {
                Some(name) => Some(Route::single(
                    mapping,
                    name,
                    format!("{}.{}.after", op.mapping, op.kind),
                )?),
                None => None,
            };

            for (record, served) in records.iter().zip(served) {
                let candidate = match &pinned {
                    Some(route) => route.primary(),
                    None => *served,
                };

                let located = |err: Error| {
                    err.context(err!(
                        "after-action `{}` of `{}` {} on source `{}`",
                        after.action,
                        op.mapping,
                        op.kind,
                        candidate.id
                    ))
                };

                let adapter = self.adapter(candidate).await.map_err(located)?;
                adapter.execute(&action, record).await.map_err(located)?;
            }

            tracing::debug!(
                mapping = %op.mapping,
                action = %after.action,
                records = records.len(),
                "after-action done"
            );
        }

        Ok(())
    }

    fn action(&self, qualified: &str) -> Result<(MappingRef<'_>, &ActionDescriptor)> {
        let (mapping, name) = qualified
            .rsplit_once('.')
            .ok_or_else(|| Error::unknown_mapping(qualified))?;

        let mapping = self.schema().mapping(mapping)?;
        let descriptor = mapping.action(name)?;
        Ok((mapping, descriptor))
    }

    async fn run_action(
        &self,
        mapping: MappingRef<'_>,
        qualified: &str,
        descriptor: &ActionDescriptor,
        params: Record,
    ) -> Result<Response> {
        let name = qualified.rsplit_once('.').map_or(qualified, |(_, name)| name);
        let action = Action::new(name, mapping.qualified_name(), descriptor);
        let params = translate(params, &descriptor.parameters)?;
        let route = Route::resolve(mapping, name, descriptor)?;

        let mut candidates = route.candidates().iter().peekable();
        while let Some(candidate) = candidates.next() {
            let outcome = match self.adapter(candidate).await {
                Ok(adapter) => adapter.execute(&action, &params).await,
                Err(err) => Err(err),
            };

            let has_next = candidates.peek().is_some();
            match outcome {
                Ok(response)
                    if response.rows.is_records()
                        && response.rows.is_empty()
                        && has_next
                        && candidate.continues_on_miss() =>
                {
                    tracing::debug!(action = qualified, source = %candidate.id, "action missed; trying next source");
                }
                Ok(response) => {
                    tracing::debug!(action = qualified, source = %candidate.id, rows = response.rows.len(), "action done");
                    return Ok(response);
                }
                Err(err) if has_next && continues_after(candidate, &err) => {
                    tracing::debug!(action = qualified, source = %candidate.id, error = %err, "action failed; trying next source");
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::no_source_configured(mapping.qualified_name(), name))
    }
}

/// Whether a failed attempt moves on to the next candidate: a no-match
/// error follows the miss policy, anything else the error policy.
fn continues_after(candidate: &Candidate<'_>, err: &Error) -> bool {
    if err.is_record_not_found() {
        candidate.continues_on_miss()
    } else {
        candidate.continues_on_error()
    }
}

/// Renames caller parameters that name a domain field to their record
/// field, encoding them with the mapping's coercion. Other keys pass
/// through.
fn translate(params: Record, mappings: &[FieldMapping]) -> Result<Record> {
    if mappings.is_empty() {
        return Ok(params);
    }

    let mut translated = Record::with_capacity(params.len());
    for (name, value) in params {
        match mappings.iter().find(|m| m.object == name) {
            Some(mapping) => {
                let value = coerce::encode(mapping.coercion, value)
                    .map_err(|err| err.for_field(&mapping.object))?;
                translated.insert(mapping.field.clone(), value);
            }
            None => {
                translated.insert(name, value);
            }
        }
    }

    Ok(translated)
}

fn map_records<T: Entity + Default>(records: &[Record], fields: &[FieldMapping]) -> Result<Vec<T>> {
    records
        .iter()
        .map(|record| {
            let mut target = T::default();
            to_object(record, &mut target, fields)?;
            Ok(target)
        })
        .collect()
}

/// The type name records of a result block map into.
fn result_type<'a>(
    mapping: MappingRef<'a>,
    result: Option<&'a ResultDescriptor>,
) -> &'a str {
    result
        .and_then(|result| result.ty.as_deref())
        .unwrap_or(&mapping.mapping.object)
}

fn expect_entity<T: Entity>(mapping: MappingRef<'_>, target: &str, expected: &str) -> Result<()> {
    if expected == T::NAME {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "mapping `{}` `{target}` works on `{expected}`, not `{}`",
            mapping.qualified_name(),
            T::NAME
        )))
    }
}
