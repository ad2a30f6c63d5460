//! Integration tests for the Worker module

use super::*;
use crate::collector::Collector;
use crate::queue::TaskQueue;
use crate::range::{PriceRange, RangeTask};
use crate::record::{FailedRange, FailureReason, Product};
use crate::testing::MockCatalog;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Helper functions
// ============================================================================

struct Harness {
    queue: Arc<TaskQueue>,
    limiter: Arc<TokenBucket>,
    records: Collector<Product>,
    failures: Collector<FailedRange>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Harness {
    fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            queue: Arc::new(TaskQueue::new()),
            limiter: Arc::new(TokenBucket::new(1000, Duration::from_millis(1)).unwrap()),
            records: Collector::spawn("records", 100),
            failures: Collector::spawn("failures", 10),
            shutdown_tx,
        }
    }

    fn worker(&self, id: usize, catalog: Arc<MockCatalog>, policy: DecisionPolicy) -> Worker {
        WorkerBuilder::new(id)
            .client(catalog)
            .queue(Arc::clone(&self.queue))
            .limiter(Arc::clone(&self.limiter))
            .records_tx(self.records.sender())
            .failures_tx(self.failures.sender())
            .policy(policy)
            .build()
            .expect("Failed to build worker")
    }

    /// Run `workers` over the seeded queue until every task resolved
    async fn drain(
        self,
        workers: Vec<Worker>,
    ) -> (Vec<WorkerStats>, Vec<Product>, Vec<FailedRange>) {
        let mut handles = Vec::new();
        for worker in workers {
            let rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move { worker.run(rx).await }));
        }

        tokio::time::timeout(Duration::from_secs(10), self.queue.wait_idle())
            .await
            .expect("queue never went idle");
        self.shutdown_tx.send(()).expect("Failed to send shutdown");

        let mut stats = Vec::new();
        for handle in handles {
            stats.push(
                handle
                    .await
                    .expect("Worker task panicked")
                    .expect("Worker failed"),
            );
        }

        assert!(self.queue.close_and_drain().await.is_empty());
        let records = self.records.finish().await.unwrap();
        let failures = self.failures.finish().await.unwrap();
        (stats, records, failures)
    }
}

fn range(low: f64, high: f64) -> PriceRange {
    PriceRange::new(low, high).unwrap()
}

fn policy(page_cap: usize) -> DecisionPolicy {
    DecisionPolicy {
        page_cap,
        max_attempts: 3,
        min_range_width: 0.01,
    }
}

fn distinct_ids(records: &[Product]) -> usize {
    records.iter().map(|p| p.id).collect::<HashSet<_>>().len()
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_worker_accepts_sparse_range() {
    let catalog = Arc::new(MockCatalog::uniform(500, 1000));
    let harness = Harness::new();
    harness.queue.push(RangeTask::new(range(0.0, 100_000.0))).unwrap();

    let worker = harness.worker(0, Arc::clone(&catalog), policy(1000));
    let (stats, records, failures) = harness.drain(vec![worker]).await;

    assert_eq!(stats[0].queries, 1);
    assert_eq!(stats[0].accepted, 1);
    assert_eq!(stats[0].records, 500);
    assert_eq!(records.len(), 500);
    assert_eq!(distinct_ids(&records), 500);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_worker_splits_dense_range() {
    let catalog = Arc::new(MockCatalog::uniform(1500, 1000));
    let harness = Harness::new();
    harness.queue.push(RangeTask::new(range(0.0, 100_000.0))).unwrap();

    let worker = harness.worker(0, Arc::clone(&catalog), policy(1000));
    let (stats, records, failures) = harness.drain(vec![worker]).await;

    assert_eq!(stats[0].splits, 1);
    assert_eq!(stats[0].accepted, 2);
    assert_eq!(stats[0].queries, 3);
    assert_eq!(catalog.calls_for(&range(0.0, 50_000.0)), 1);
    assert_eq!(catalog.calls_for(&range(50_000.0, 100_000.0)), 1);
    assert_eq!(distinct_ids(&records), 1500);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_worker_fails_after_max_attempts() {
    let catalog = Arc::new(MockCatalog::uniform(10, 1000).with_fail_all());
    let harness = Harness::new();
    let target = range(100.0, 200.0);
    harness.queue.push(RangeTask::new(target)).unwrap();

    let worker = harness.worker(0, Arc::clone(&catalog), policy(1000));
    let (stats, records, failures) = harness.drain(vec![worker]).await;

    // First query plus three retries
    assert_eq!(catalog.calls_for(&target), 4);
    assert_eq!(stats[0].queries, 4);
    assert_eq!(stats[0].query_errors, 4);
    assert_eq!(stats[0].retries, 3);
    assert_eq!(stats[0].failures, 1);
    assert!(records.is_empty());

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].range, target);
    assert_eq!(failures[0].attempts, 4);
    assert!(matches!(
        failures[0].reason,
        FailureReason::QueryFailed { .. }
    ));
}

#[tokio::test]
async fn test_worker_recovers_from_transient_failures() {
    let catalog = Arc::new(MockCatalog::uniform(1500, 1000).with_fail_first(1));
    let harness = Harness::new();
    harness.queue.push(RangeTask::new(range(0.0, 100_000.0))).unwrap();

    let worker = harness.worker(0, Arc::clone(&catalog), policy(1000));
    let (stats, records, failures) = harness.drain(vec![worker]).await;

    // Parent and both halves each fail once before succeeding
    assert_eq!(stats[0].retries, 3);
    assert_eq!(stats[0].queries, 6);
    assert_eq!(distinct_ids(&records), 1500);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_worker_stops_splitting_below_min_width() {
    let catalog = Arc::new(MockCatalog::uniform(0, 1000).with_cluster(42.0, 1500));
    let harness = Harness::new();
    harness.queue.push(RangeTask::new(range(40.0, 44.0))).unwrap();

    let policy = DecisionPolicy {
        page_cap: 1000,
        max_attempts: 3,
        min_range_width: 1.0,
    };
    let worker = harness.worker(0, Arc::clone(&catalog), policy);
    let (stats, records, failures) = harness.drain(vec![worker]).await;

    // 1 + 2 + 4 + 4 queries: [40,44] -> [40,42],[42,44] -> [41,42],[42,43]
    // -> [41.5,42],[42,42.5] too dense
    assert_eq!(stats[0].queries, 11);
    assert_eq!(stats[0].splits, 5);
    assert!(records.is_empty());
    assert_eq!(failures.len(), 2);
    for failed in &failures {
        assert!(failed.range.contains(42.0));
        assert!(failed.range.width() < 1.0);
        assert_eq!(failed.reason, FailureReason::TooDense { count: 1500 });
    }
}

#[tokio::test]
async fn test_workers_share_queue() {
    let catalog = Arc::new(MockCatalog::uniform(5000, 100));
    let harness = Harness::new();
    for slice in range(0.0, 100_000.0).partition(4) {
        harness.queue.push(RangeTask::new(slice)).unwrap();
    }

    let workers = (0..4)
        .map(|id| harness.worker(id, Arc::clone(&catalog), policy(100)))
        .collect();
    let (stats, records, failures) = harness.drain(workers).await;

    let mut total = WorkerStats::new();
    for s in &stats {
        total.merge(s);
    }

    assert_eq!(stats.len(), 4);
    assert_eq!(distinct_ids(&records), 5000);
    assert_eq!(total.records, records.len());
    assert_eq!(total.queries, catalog.calls());
    assert!(total.splits > 0);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_worker_shutdown_while_idle() {
    let catalog = Arc::new(MockCatalog::uniform(10, 1000));
    let harness = Harness::new();
    let worker = harness.worker(0, catalog, policy(1000));

    let rx = harness.shutdown_tx.subscribe();
    let handle = tokio::spawn(async move { worker.run(rx).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    harness.shutdown_tx.send(()).unwrap();

    let stats = tokio::time::timeout(Duration::from_millis(500), handle)
        .await
        .expect("worker should stop")
        .expect("Worker task panicked")
        .expect("Worker failed");
    assert_eq!(stats.queries, 0);
}

#[tokio::test]
async fn test_worker_returns_task_when_bucket_closes() {
    let catalog = Arc::new(MockCatalog::uniform(10, 1000));
    let (shutdown_tx, _) = broadcast::channel(1);
    let queue = Arc::new(TaskQueue::new());
    let limiter = Arc::new(TokenBucket::new(1, Duration::from_secs(60)).unwrap());
    let records = Collector::<Product>::spawn("records", 10);
    let failures = Collector::<FailedRange>::spawn("failures", 10);

    // Spend the only token so the worker blocks in acquire
    limiter.acquire().await.unwrap();
    let task = RangeTask::new(range(0.0, 10.0));
    queue.push(task).unwrap();

    let worker = WorkerBuilder::new(0)
        .client(catalog.clone())
        .queue(Arc::clone(&queue))
        .limiter(Arc::clone(&limiter))
        .records_tx(records.sender())
        .failures_tx(failures.sender())
        .build()
        .unwrap();
    let rx = shutdown_tx.subscribe();
    let handle = tokio::spawn(async move { worker.run(rx).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown_tx.send(()).unwrap();
    limiter.close();

    let stats = handle.await.unwrap().unwrap();
    assert_eq!(stats.queries, 0);
    assert_eq!(catalog.calls(), 0);
    assert_eq!(queue.outstanding(), 1);
    assert_eq!(queue.close_and_drain().await, vec![task]);
    assert!(records.finish().await.unwrap().is_empty());
    assert!(failures.finish().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_worker_debug_format() {
    let catalog = Arc::new(MockCatalog::uniform(1, 10));
    let harness = Harness::new();
    let worker = harness.worker(7, catalog, policy(10));

    assert_eq!(worker.id(), 7);
    let debug = format!("{:?}", worker);
    assert!(debug.contains("Worker"));
    assert!(debug.contains("mock"));
}
