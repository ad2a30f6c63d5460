//! Concurrent sinks for accepted records and failed ranges
//!
//! Each collector owns its container inside a dedicated drain task. Workers
//! only hold channel senders, so the hot query path never contends on a lock
//! and the container has exactly one writer.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{HarvestError, HarvestResult};

/// Many-producer sink draining a channel into an owned `Vec`
#[derive(Debug)]
pub struct Collector<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
    handle: JoinHandle<Vec<T>>,
}

impl<T: Send + 'static> Collector<T> {
    /// Spawn the drain task with a channel of `buffer` items
    pub fn spawn(name: &'static str, buffer: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<T>(buffer.max(1));
        let handle = tokio::spawn(async move {
            let mut items = Vec::new();
            while let Some(item) = rx.recv().await {
                items.push(item);
            }
            tracing::debug!(collector = name, collected = items.len(), "Collector drained");
            items
        });

        Self { name, tx, handle }
    }

    /// A sender for a producer
    pub fn sender(&self) -> mpsc::Sender<T> {
        self.tx.clone()
    }

    /// Collector name used in logs and errors
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Close the collector's own sender and wait for the drain to finish
    ///
    /// Completes once every producer has dropped its sender, so the returned
    /// items are final.
    pub async fn finish(self) -> HarvestResult<Vec<T>> {
        let Self { name, tx, handle } = self;
        drop(tx);
        handle
            .await
            .map_err(|e| HarvestError::orchestration(format!("collector '{}' failed: {}", name, e)))
    }
}
