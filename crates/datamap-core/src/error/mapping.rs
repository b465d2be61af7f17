use super::Error;

/// Error converting between a record and a domain object.
///
/// These indicate a mismatch between the configured field mappings and the
/// domain type, not a transient condition.
#[derive(Debug)]
pub(super) struct MappingError {
    kind: MappingErrorKind,
}

#[derive(Debug)]
enum MappingErrorKind {
    FieldNotFound {
        entity: Box<str>,
        fields: Vec<String>,
    },
    Unwritable {
        entity: Box<str>,
        field: Box<str>,
    },
    TypeCoercion {
        from: &'static str,
        to: Box<str>,
        detail: Option<Box<str>>,
        field: Option<Box<str>>,
    },
}

impl std::error::Error for MappingError {}

impl core::fmt::Display for MappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use MappingErrorKind::*;

        match &self.kind {
            FieldNotFound { entity, fields } => {
                write!(f, "`{entity}` has no field ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "`{field}`")?;
                }
                Ok(())
            }
            Unwritable { entity, field } => {
                write!(f, "field `{field}` on `{entity}` is not writable")
            }
            TypeCoercion {
                from,
                to,
                detail,
                field,
            } => {
                write!(f, "cannot coerce {from} to {to}")?;
                if let Some(field) = field {
                    write!(f, " for field `{field}`")?;
                }
                if let Some(detail) = detail {
                    write!(f, ": {detail}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error {
    /// Creates an error listing every field missing from an entity.
    pub fn field_not_found<I, S>(entity: impl Into<String>, fields: I) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::mapping(MappingErrorKind::FieldNotFound {
            entity: entity.into().into(),
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }

    /// Creates an error for assigning a read-only field.
    pub fn unwritable(entity: impl Into<String>, field: impl Into<String>) -> Error {
        Error::mapping(MappingErrorKind::Unwritable {
            entity: entity.into().into(),
            field: field.into().into(),
        })
    }

    /// Creates an error for a value that cannot be coerced to the target
    /// type. `from` is the record value's kind.
    pub fn type_coercion(from: &'static str, to: impl Into<String>) -> Error {
        Error::mapping(MappingErrorKind::TypeCoercion {
            from,
            to: to.into().into(),
            detail: None,
            field: None,
        })
    }

    /// Same as [`Error::type_coercion`] with an explanation of the failure.
    pub fn type_coercion_detail(
        from: &'static str,
        to: impl Into<String>,
        detail: impl core::fmt::Display,
    ) -> Error {
        Error::mapping(MappingErrorKind::TypeCoercion {
            from,
            to: to.into().into(),
            detail: Some(detail.to_string().into()),
            field: None,
        })
    }

    /// Records which domain field a type coercion failure happened on.
    ///
    /// Does nothing for other errors, or when the field is already known.
    pub fn for_field(mut self, name: &str) -> Error {
        if let Some(super::ErrorKind::Mapping(MappingError {
            kind: MappingErrorKind::TypeCoercion { field: field @ None, .. },
        })) = self.kind_mut()
        {
            *field = Some(name.into());
        }
        self
    }

    fn mapping(kind: MappingErrorKind) -> Error {
        Error::from(super::ErrorKind::Mapping(MappingError { kind }))
    }

    /// Returns `true` if this error is any mapping error.
    pub fn is_mapping(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Mapping(_))
    }

    /// Returns `true` if a mapped field does not exist on the entity.
    pub fn is_field_not_found(&self) -> bool {
        matches!(
            self.mapping_kind(),
            Some(MappingErrorKind::FieldNotFound { .. })
        )
    }

    /// Returns `true` if a mapped field exists but cannot be assigned.
    pub fn is_unwritable(&self) -> bool {
        matches!(self.mapping_kind(), Some(MappingErrorKind::Unwritable { .. }))
    }

    /// Returns `true` if a value could not be coerced to its target type.
    pub fn is_type_coercion(&self) -> bool {
        matches!(
            self.mapping_kind(),
            Some(MappingErrorKind::TypeCoercion { .. })
        )
    }

    fn mapping_kind(&self) -> Option<&MappingErrorKind> {
        match self.kind() {
            super::ErrorKind::Mapping(err) => Some(&err.kind),
            _ => None,
        }
    }
}
