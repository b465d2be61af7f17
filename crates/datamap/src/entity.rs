use crate::{FieldValue, Result};

use datamap_core::{Error, Value};

/// A domain type that can be mapped to and from records.
///
/// Usually implemented with `#[derive(Entity)]`, which builds the accessor
/// table once and hands out a `'static` reference to it.
pub trait Entity: Send + Sync + 'static {
    /// Type name matched against a mapping's `object` (or a result block's
    /// `type`).
    const NAME: &'static str;

    /// The accessor table for this type.
    fn shape() -> &'static Shape<Self>
    where
        Self: Sized;
}

/// Read access to the field names of a shape, independent of its type.
pub trait FieldSet: Send + Sync {
    /// Name of the entity the fields belong to.
    fn entity(&self) -> &str;

    fn contains(&self, field: &str) -> bool;
}

type Getter<T> = Box<dyn Fn(&T) -> Result<Value> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

/// Precomputed accessor table of an entity: for each field, a getter and,
/// unless the field is read-only, a setter.
pub struct Shape<T> {
    name: &'static str,
    accessors: Vec<Accessor<T>>,
}

struct Accessor<T> {
    name: &'static str,
    get: Getter<T>,
    set: Option<Setter<T>>,
}

/// Builds a [`Shape`] field by field.
pub struct ShapeBuilder<T> {
    shape: Shape<T>,
}

impl<T: 'static> Shape<T> {
    pub fn builder(name: &'static str) -> ShapeBuilder<T> {
        ShapeBuilder {
            shape: Shape {
                name,
                accessors: vec![],
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field names in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.accessors.iter().map(|accessor| accessor.name)
    }

    pub fn is_writable(&self, field: &str) -> bool {
        self.accessor(field).is_some_and(|accessor| accessor.set.is_some())
    }

    /// Reads a field as an untyped value.
    pub fn get(&self, target: &T, field: &str) -> Result<Value> {
        let accessor = self
            .accessor(field)
            .ok_or_else(|| Error::field_not_found(self.name, [field]))?;
        (accessor.get)(target)
    }

    /// Assigns a field from an untyped value.
    pub fn set(&self, target: &mut T, field: &str, value: Value) -> Result<()> {
        let accessor = self
            .accessor(field)
            .ok_or_else(|| Error::field_not_found(self.name, [field]))?;

        let Some(set) = &accessor.set else {
            return Err(Error::unwritable(self.name, field));
        };

        set(target, value)
    }

    fn accessor(&self, field: &str) -> Option<&Accessor<T>> {
        self.accessors.iter().find(|accessor| accessor.name == field)
    }
}

impl<T: 'static> ShapeBuilder<T> {
    /// Adds a readable and writable field.
    pub fn field<F: FieldValue + 'static>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        self.shape.accessors.push(Accessor {
            name,
            get: Box::new(move |target: &T| get(target).store()),
            set: Some(Box::new(move |target: &mut T, value: Value| {
                *get_mut(target) = F::load(value)?;
                Ok(())
            })),
        });
        self
    }

    /// Adds a field that can be read but never assigned from a record.
    pub fn readonly<F: FieldValue + 'static>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
    ) -> Self {
        self.shape.accessors.push(Accessor {
            name,
            get: Box::new(move |target: &T| get(target).store()),
            set: None,
        });
        self
    }

    pub fn build(self) -> Shape<T> {
        self.shape
    }
}

impl<T: 'static> FieldSet for Shape<T> {
    fn entity(&self) -> &str {
        self.name
    }

    fn contains(&self, field: &str) -> bool {
        self.accessor(field).is_some()
    }
}

impl<T> core::fmt::Debug for Shape<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Shape({}) ", self.name)?;

        let mut list = f.debug_list();
        for accessor in &self.accessors {
            list.entry(&format_args!(
                "{}{}",
                accessor.name,
                if accessor.set.is_some() { "" } else { " (readonly)" }
            ));
        }
        list.finish()
    }
}
