//! Price ranges and the tasks built on them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised when constructing a range
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    /// A bound is NaN or infinite
    #[error("range bounds must be finite: [{low}, {high}]")]
    NonFinite {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },

    /// `low > high`
    #[error("range is inverted: {low} > {high}")]
    Inverted {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
}

/// Closed interval `[low, high]` over the catalog's price key
///
/// Ranges are immutable. Splitting yields two ranges sharing only the
/// midpoint, whose union is the parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    low: f64,
    high: f64,
}

impl PriceRange {
    /// Create a range, rejecting non-finite or inverted bounds
    pub fn new(low: f64, high: f64) -> Result<Self, RangeError> {
        if !low.is_finite() || !high.is_finite() {
            return Err(RangeError::NonFinite { low, high });
        }
        if low > high {
            return Err(RangeError::Inverted { low, high });
        }
        Ok(Self { low, high })
    }

    /// Lower bound (inclusive)
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound (inclusive)
    pub fn high(&self) -> f64 {
        self.high
    }

    /// `high - low`
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Midpoint, computed without overflowing for large bounds
    pub fn midpoint(&self) -> f64 {
        self.low + (self.high - self.low) / 2.0
    }

    /// Whether `price` lies inside the closed interval
    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }

    /// Split at the midpoint into `[low, mid]` and `[mid, high]`
    ///
    /// Returns `None` when the midpoint is not strictly inside the range,
    /// i.e. the range is too narrow for `f64` to divide further.
    pub fn split(&self) -> Option<(PriceRange, PriceRange)> {
        let mid = self.midpoint();
        if mid <= self.low || mid >= self.high {
            return None;
        }
        Some((
            PriceRange {
                low: self.low,
                high: mid,
            },
            PriceRange {
                low: mid,
                high: self.high,
            },
        ))
    }

    /// Slice into `parts` contiguous equal-width ranges
    ///
    /// The last slice ends exactly at `high` so float drift never shrinks the
    /// covered domain. `parts == 0` is treated as 1.
    pub fn partition(&self, parts: usize) -> Vec<PriceRange> {
        let parts = parts.max(1);
        let step = self.width() / parts as f64;
        let mut slices = Vec::with_capacity(parts);
        let mut low = self.low;
        for i in 0..parts {
            let high = if i + 1 == parts {
                self.high
            } else {
                self.low + step * (i + 1) as f64
            };
            slices.push(PriceRange { low, high });
            low = high;
        }
        slices
    }

    /// Approximate equality on both bounds
    pub fn approx_eq(&self, other: &PriceRange, epsilon: f64) -> bool {
        (self.low - other.low).abs() <= epsilon && (self.high - other.high).abs() <= epsilon
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// A range waiting to be queried, with the failed attempts already spent on it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeTask {
    /// Range to query
    pub range: PriceRange,

    /// Failed queries already spent on this range
    pub attempts: u32,
}

impl RangeTask {
    /// Fresh task with no failed attempts
    pub fn new(range: PriceRange) -> Self {
        Self { range, attempts: 0 }
    }

    /// Same range, one more failed attempt recorded
    pub fn retried(&self) -> Self {
        Self {
            range: self.range,
            attempts: self.attempts + 1,
        }
    }
}

impl From<PriceRange> for RangeTask {
    fn from(range: PriceRange) -> Self {
        Self::new(range)
    }
}
