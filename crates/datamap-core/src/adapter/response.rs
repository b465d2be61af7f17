use crate::{Error, Record, Result};

/// Result of a custom action.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    /// Number of records affected by the action
    Count(u64),

    /// Records produced by the action
    Records(Vec<Record>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn records(records: Vec<Record>) -> Self {
        Self {
            rows: Rows::Records(records),
        }
    }

    pub fn empty() -> Self {
        Self::records(vec![])
    }
}

impl Rows {
    pub fn is_records(&self) -> bool {
        matches!(self, Self::Records(_))
    }

    /// Returns the affected count, or the number of records.
    pub fn len(&self) -> u64 {
        match self {
            Self::Count(count) => *count,
            Self::Records(records) => records.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Result<Vec<Record>> {
        match self {
            Self::Records(records) => Ok(records),
            Self::Count(count) => Err(Error::invalid_result(format!(
                "expected records, got a count of {count}"
            ))),
        }
    }
}
