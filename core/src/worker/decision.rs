//! Accept / split / retry / fail decision for one queried range

use crate::config::HarvestConfig;
use crate::range::RangeTask;
use crate::record::{FailedRange, Product, RangePage};
use crate::traits::QueryError;

/// Parameters the decision depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    /// Most records the catalog returns for one query
    pub page_cap: usize,

    /// Retries allowed per range after its first failed query
    pub max_attempts: u32,

    /// Dense ranges narrower than this are failed instead of split
    pub min_range_width: f64,
}

impl From<&HarvestConfig> for DecisionPolicy {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            page_cap: config.page_cap,
            max_attempts: config.max_attempts,
            min_range_width: config.min_range_width,
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from(&HarvestConfig::default())
    }
}

/// What to do with a task after its query returned
#[derive(Debug, PartialEq)]
pub enum Decision {
    /// The page holds every match of the range
    Accept(Vec<Product>),

    /// Too many matches: query both halves instead
    Split(RangeTask, RangeTask),

    /// Query failed with budget left: try the same range again
    Retry(RangeTask),

    /// Terminal failure
    Fail(FailedRange),
}

/// Decide the fate of `task` given the outcome of its query
pub fn decide(
    task: RangeTask,
    outcome: Result<RangePage, QueryError>,
    policy: &DecisionPolicy,
) -> Decision {
    let page = match outcome {
        Ok(page) => page,
        Err(error) => {
            if task.attempts < policy.max_attempts {
                return Decision::Retry(task.retried());
            }
            return Decision::Fail(FailedRange::query_failed(
                task.range,
                task.attempts + 1,
                error.to_string(),
            ));
        }
    };

    if page.is_exhaustive(policy.page_cap) {
        return Decision::Accept(page.products);
    }

    // Queries issued for this range: the failed ones plus this success.
    let issued = task.attempts + 1;
    if task.range.width() < policy.min_range_width {
        return Decision::Fail(FailedRange::too_dense(task.range, issued, page.count));
    }

    match task.range.split() {
        Some((left, right)) => Decision::Split(RangeTask::new(left), RangeTask::new(right)),
        None => Decision::Fail(FailedRange::too_dense(task.range, issued, page.count)),
    }
}
