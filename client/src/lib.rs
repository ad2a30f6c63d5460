//! HTTP catalog client for range-harvest
//!
//! Implements `RangeQueryClient` over reqwest with a pooled client shared by
//! every worker.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod pool;

pub use catalog::{parse_page, CatalogClient, ClientError, MAX_PRICE_PARAM, MIN_PRICE_PARAM};
pub use config::{ConfigValidationError, HttpConfig};
pub use pool::HttpClientPool;
