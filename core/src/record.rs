//! Records returned by the catalog and the ranges that could not be resolved

use serde::{Deserialize, Serialize};

use crate::range::PriceRange;

/// A single catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier
    pub id: u64,

    /// Display name
    pub name: String,

    /// Price, the key ranges are queried on
    pub price: f64,
}

/// One page answered by the catalog for a range query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangePage {
    /// Records in the whole catalog, used for the preliminary estimate
    #[serde(default)]
    pub total: usize,

    /// Records matching the queried range
    pub count: usize,

    /// Returned records, at most one page
    #[serde(default)]
    pub products: Vec<Product>,
}

impl RangePage {
    /// Whether the page carries every match of its range
    pub fn is_exhaustive(&self, page_cap: usize) -> bool {
        self.count <= page_cap
    }
}

/// Why a range was given up on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Every query attempt errored
    QueryFailed {
        /// Message of the last error
        error: String,
    },

    /// Still over the page cap but too narrow to split
    TooDense {
        /// Matches reported for the range
        count: usize,
    },
}

/// A range that reached a terminal failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRange {
    /// The range itself
    pub range: PriceRange,

    /// Queries issued for it
    pub attempts: u32,

    /// Why it failed
    pub reason: FailureReason,
}

impl FailedRange {
    /// Range whose queries kept failing
    pub fn query_failed(range: PriceRange, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            range,
            attempts,
            reason: FailureReason::QueryFailed {
                error: error.into(),
            },
        }
    }

    /// Range too dense to split any further
    pub fn too_dense(range: PriceRange, attempts: u32, count: usize) -> Self {
        Self {
            range,
            attempts,
            reason: FailureReason::TooDense { count },
        }
    }
}
