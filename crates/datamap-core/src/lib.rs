#[macro_use]
mod macros;

pub mod adapter;
pub use adapter::Adapter;

mod error;
pub use error::{Error, IntoError};

mod record;
pub use record::Record;

pub mod schema;
pub use schema::Schema;

mod value;
pub use value::Value;

/// A Result type alias that uses the datamap [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
