//! Common imports for test files
//!
//! This module provides a convenient way to import frequently used items
//! in test files with `use tests::prelude::*;`

pub use crate::{Call, CallLog, Counters, Harness, Stub, Verb};

pub use datamap::{record, Entity, Mapper, Record, Value};
pub use std_util::prelude::*;
