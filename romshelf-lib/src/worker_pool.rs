//! Bounded worker pool for independent per-file probe work.
//!
//! N persistent tokio tasks pull items from a bounded `async-channel`.
//! Its `Receiver` is `Clone`, so every worker holds its own handle and no
//! mutex guards the queue. Results land on an unbounded channel; the
//! caller drains them single-threaded, so no lock is needed around the
//! catalog map either.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A pool of worker tasks processing items concurrently.
///
/// The bounded work channel (capacity = worker count) gives natural
/// backpressure; dropping the submission sender shuts the pool down once
/// the queue drains.
pub struct WorkerPool<R: Send + 'static> {
    result_rx: mpsc::UnboundedReceiver<R>,
    _handles: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Spawn `n` workers over `items`, processing each with `process_fn`.
    ///
    /// Submission runs in a background task so results can be received
    /// immediately without deadlocking on the bounded queue.
    pub fn start<W, F, Fut>(n: usize, items: Vec<W>, process_fn: F) -> Self
    where
        W: Send + 'static,
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let n = n.max(1);
        let (work_tx, work_rx) = async_channel::bounded::<W>(n);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<R>();
        let process_fn = Arc::new(process_fn);

        let handles: Vec<JoinHandle<()>> = (0..n)
            .map(|_| {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let process_fn = process_fn.clone();
                tokio::spawn(async move {
                    while let Ok(item) = work_rx.recv().await {
                        if result_tx.send(process_fn(item).await).is_err() {
                            break; // receiver dropped
                        }
                    }
                })
            })
            .collect();

        // Close the result channel once every worker clone is gone.
        drop(result_tx);

        tokio::spawn(async move {
            for item in items {
                if work_tx.send(item).await.is_err() {
                    break;
                }
            }
            // work_tx drops here; workers drain the queue and exit
        });

        Self {
            result_rx,
            _handles: handles,
        }
    }

    /// Next result, or `None` once every item has been processed.
    pub async fn recv(&mut self) -> Option<R> {
        self.result_rx.recv().await
    }

    /// Drain the pool to completion.
    pub async fn collect(mut self) -> Vec<R> {
        let mut results = Vec::new();
        while let Some(r) = self.recv().await {
            results.push(r);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn processes_every_item() {
        let pool = WorkerPool::start(4, (0..100).collect(), |i: i32| async move { i * 2 });
        let mut results = pool.collect().await;
        results.sort_unstable();
        assert_eq!(results.len(), 100);
        assert_eq!(results[0], 0);
        assert_eq!(results[99], 198);
    }

    #[tokio::test]
    async fn empty_input_completes() {
        let pool = WorkerPool::start(4, Vec::<i32>::new(), |i| async move { i });
        assert!(pool.collect().await.is_empty());
    }

    #[tokio::test]
    async fn zero_workers_is_clamped() {
        let pool = WorkerPool::start(0, vec![1, 2, 3], |i: i32| async move { i });
        assert_eq!(pool.collect().await.len(), 3);
    }
}
