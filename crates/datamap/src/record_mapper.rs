//! Field by field conversion between records and entities.

use crate::{coerce, Entity, FieldSet, Result};

use datamap_core::{schema::FieldMapping, Error, Record};

/// Writes the fields of `record` named by `mappings` into `target`.
///
/// Mappings whose record field is absent are skipped, so partial records
/// only touch the fields they carry. Every domain field is checked against
/// the entity before anything is assigned.
pub fn to_object<T: Entity>(record: &Record, target: &mut T, mappings: &[FieldMapping]) -> Result<()> {
    let shape = T::shape();
    validate(shape, mappings)?;

    for mapping in mappings {
        let Some(value) = record.get(&mapping.field) else {
            continue;
        };

        let value = coerce::decode(mapping.coercion, value.clone())
            .map_err(|err| err.for_field(&mapping.object))?;

        shape
            .set(target, &mapping.object, value)
            .map_err(|err| err.for_field(&mapping.object))?;
    }

    Ok(())
}

/// Builds the record sent to a backend on write. Mappings flagged
/// `generated` are left out.
pub fn from_object<T: Entity>(object: &T, mappings: &[FieldMapping]) -> Result<Record> {
    encode(object, mappings.iter().filter(|mapping| !mapping.generated))
}

/// Builds a record from every mapping, generated ones included.
pub fn from_object_all<T: Entity>(object: &T, mappings: &[FieldMapping]) -> Result<Record> {
    encode(object, mappings)
}

/// Checks that every domain field named by `mappings` exists on `shape`,
/// reporting all missing fields at once.
pub fn validate(shape: &dyn FieldSet, mappings: &[FieldMapping]) -> Result<()> {
    let mut missing: Vec<&str> = vec![];

    for mapping in mappings {
        if !shape.contains(&mapping.object) && !missing.contains(&mapping.object.as_str()) {
            missing.push(&mapping.object);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::field_not_found(shape.entity(), missing))
    }
}

fn encode<'a, T: Entity>(
    object: &T,
    mappings: impl IntoIterator<Item = &'a FieldMapping>,
) -> Result<Record> {
    let shape = T::shape();
    let mut record = Record::new();

    for mapping in mappings {
        let value = shape.get(object, &mapping.object)?;
        let value = coerce::encode(mapping.coercion, value)
            .map_err(|err| err.for_field(&mapping.object))?;
        record.insert(mapping.field.clone(), value);
    }

    Ok(record)
}
