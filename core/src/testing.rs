//! In-memory catalog used by the worker and orchestrator tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::range::PriceRange;
use crate::record::{Product, RangePage};
use crate::traits::{QueryError, RangeQueryClient};

/// Catalog answering range queries from a fixed product list
///
/// Matches are counted over the closed range and the page is truncated to
/// `page_cap`, like the real service.
pub(crate) struct MockCatalog {
    products: Vec<Product>,
    page_cap: usize,
    delay: Option<Duration>,
    failing: Vec<PriceRange>,
    panicking: Vec<PriceRange>,
    fail_first: usize,
    fail_all: bool,
    calls: AtomicUsize,
    per_range: Mutex<HashMap<(u64, u64), usize>>,
}

impl MockCatalog {
    /// `count` products spread evenly over (0, 100000)
    pub(crate) fn uniform(count: usize, page_cap: usize) -> Self {
        let step = 99_900.0 / count.max(1) as f64;
        let products = (0..count)
            .map(|i| Product {
                id: i as u64,
                name: format!("product-{}", i),
                price: 7.3 + i as f64 * step,
            })
            .collect();

        Self {
            products,
            page_cap,
            delay: None,
            failing: Vec::new(),
            panicking: Vec::new(),
            fail_first: 0,
            fail_all: false,
            calls: AtomicUsize::new(0),
            per_range: Mutex::new(HashMap::new()),
        }
    }

    /// Add `count` products that all share `price`
    pub(crate) fn with_cluster(mut self, price: f64, count: usize) -> Self {
        let first = self.products.len() as u64;
        self.products.extend((0..count as u64).map(|i| Product {
            id: first + i,
            name: format!("cluster-{}", i),
            price,
        }));
        self
    }

    /// Sleep before answering each query
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Always fail queries for exactly this range
    pub(crate) fn with_failing_range(mut self, range: PriceRange) -> Self {
        self.failing.push(range);
        self
    }

    /// Panic inside the query for exactly this range
    pub(crate) fn with_panicking_range(mut self, range: PriceRange) -> Self {
        self.panicking.push(range);
        self
    }

    /// Fail the first `n` queries of every distinct range
    pub(crate) fn with_fail_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Fail every query
    pub(crate) fn with_fail_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Total queries received
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received for exactly `range`
    pub(crate) fn calls_for(&self, range: &PriceRange) -> usize {
        self.per_range
            .lock()
            .unwrap()
            .get(&key(range))
            .copied()
            .unwrap_or(0)
    }

    /// Number of products in the catalog
    pub(crate) fn len(&self) -> usize {
        self.products.len()
    }

    /// Distinct products priced inside `range`
    pub(crate) fn count_in(&self, range: &PriceRange) -> usize {
        self.products
            .iter()
            .filter(|p| range.contains(p.price))
            .count()
    }
}

fn key(range: &PriceRange) -> (u64, u64) {
    (range.low().to_bits(), range.high().to_bits())
}

#[async_trait]
impl RangeQueryClient for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, range: &PriceRange) -> Result<RangePage, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let seen = {
            let mut per_range = self.per_range.lock().unwrap();
            let entry = per_range.entry(key(range)).or_insert(0);
            *entry += 1;
            *entry
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panicking.iter().any(|p| p.approx_eq(range, 1e-9)) {
            panic!("catalog client crashed on {}", range);
        }

        if self.fail_all || self.failing.iter().any(|f| f.approx_eq(range, 1e-9)) {
            return Err(QueryError::Other("simulated outage".into()));
        }

        if seen <= self.fail_first {
            return Err(QueryError::Status {
                status: 503,
                message: "simulated transient failure".into(),
            });
        }

        let matches: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| range.contains(p.price))
            .collect();

        Ok(RangePage {
            total: self.products.len(),
            count: matches.len(),
            products: matches
                .into_iter()
                .take(self.page_cap)
                .cloned()
                .collect(),
        })
    }
}
