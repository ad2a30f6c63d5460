//! Initial partition of the search domain

use crate::range::{PriceRange, RangeTask};

/// Number of seed slices for an estimated catalog size
///
/// One slice per full page of estimated records, at least one.
pub fn partition_count(estimated_total: usize, page_cap: usize) -> usize {
    (estimated_total / page_cap.max(1)).max(1)
}

/// Slice `domain` into equal-width seed tasks
pub fn initial_partition(
    domain: PriceRange,
    estimated_total: usize,
    page_cap: usize,
) -> Vec<RangeTask> {
    domain
        .partition(partition_count(estimated_total, page_cap))
        .into_iter()
        .map(RangeTask::new)
        .collect()
}
