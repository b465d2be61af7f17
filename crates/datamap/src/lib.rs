pub mod coerce;

pub mod config;

mod entity;
pub use entity::{Entity, FieldSet, Shape, ShapeBuilder};

mod field;
pub use field::{FieldValue, Json};

pub mod mapper;
pub use mapper::{Builder, Identifiers, Mapper};

pub mod record_mapper;

pub mod registry;
pub use registry::{AdapterFactory, AdapterRegistry};

pub mod resolve;

pub use datamap_macros::Entity;

pub use datamap_core::{
    adapter::{self, Adapter},
    async_trait, bail, err, record, schema, Error, Record, Result, Schema, Value,
};

#[doc(hidden)]
pub mod codegen_support {
    pub use crate::{Entity, FieldValue, Shape};
    pub use std::sync::OnceLock;
}
