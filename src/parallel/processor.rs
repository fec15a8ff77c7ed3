//! Worker-pool execution over a batch of work items.

use anyhow::{anyhow, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Channel buffer size per worker.
const CHANNEL_BUFFER_MULTIPLIER: usize = 2;

/// Distributes a batch of work items over a fixed set of worker threads.
///
/// Results come back in the original item order regardless of which worker
/// finished first.
pub struct ParallelProcessor {
    workers: usize,
}

impl ParallelProcessor {
    pub fn new(workers: usize) -> Self {
        ParallelProcessor {
            workers: workers.max(1),
        }
    }

    /// Process `work_items`, calling `on_progress` with the completed count
    /// after each item.
    ///
    /// `worker_fn` is infallible by signature: callers fold per-item
    /// failures into their result type, since one bad item must never sink
    /// the batch.
    pub fn process<T, R, F, P>(&self, work_items: Vec<T>, worker_fn: F, on_progress: P) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
        P: Fn(usize) + Send + Sync,
    {
        let work_count = work_items.len();
        if work_count == 0 {
            return Ok(Vec::new());
        }
        let workers = self.workers.min(work_count);

        let (work_tx, work_rx): (Sender<(usize, T)>, Receiver<(usize, T)>) =
            bounded(workers * CHANNEL_BUFFER_MULTIPLIER);
        let (result_tx, result_rx): (Sender<(usize, R)>, Receiver<(usize, R)>) =
            bounded(workers * CHANNEL_BUFFER_MULTIPLIER);

        let completed = AtomicUsize::new(0);

        let mut indexed_results = crossbeam::thread::scope(|s| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let worker_fn = &worker_fn;
                let on_progress = &on_progress;
                let completed = &completed;
                s.spawn(move |_| {
                    while let Ok((index, item)) = work_rx.recv() {
                        let result = worker_fn(item);
                        if result_tx.send((index, result)).is_err() {
                            break; // receiver gone, nothing left to do
                        }
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        on_progress(done);
                    }
                });
            }

            // Producer: feed the bounded channel while workers drain it.
            let producer_tx = work_tx.clone();
            s.spawn(move |_| {
                for pair in work_items.into_iter().enumerate() {
                    if producer_tx.send(pair).is_err() {
                        break;
                    }
                }
            });

            // Drop our own handles so the channels close once the producer
            // and workers finish.
            drop(work_tx);
            drop(work_rx);
            drop(result_tx);

            let mut results = Vec::with_capacity(work_count);
            while let Ok(pair) = result_rx.recv() {
                results.push(pair);
            }
            results
        })
        .map_err(|_| anyhow!("worker thread panicked during parallel processing"))?;

        indexed_results.sort_by_key(|(index, _)| *index);
        Ok(indexed_results.into_iter().map(|(_, result)| result).collect())
    }
}
