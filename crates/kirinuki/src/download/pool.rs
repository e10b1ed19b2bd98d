use std::{
    collections::{BTreeMap, HashSet},
    panic::AssertUnwindSafe,
    sync::Arc,
};

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::{SegmentFetcher, SegmentResult, SegmentTask};

/// Bounded set of concurrently running segment fetches.
///
/// The pool is owned by a single orchestration task. Fetches run on spawned
/// tokio tasks and report back through a channel, so `in_flight` and
/// `capacity` are only ever touched by the owner.
///
/// A fetch stays counted as in flight until its result has been drained by
/// [WorkerPool::poll_completed] or [WorkerPool::next_completed].
pub struct WorkerPool<F> {
    fetcher: Arc<F>,
    capacity: usize,

    /// Waiting tasks ordered by index.
    pending: BTreeMap<u64, SegmentTask>,
    in_flight: HashSet<u64>,
    peak_in_flight: usize,

    sender: mpsc::UnboundedSender<SegmentResult>,
    receiver: mpsc::UnboundedReceiver<SegmentResult>,
}

impl<F> WorkerPool<F>
where
    F: SegmentFetcher + Send + Sync + 'static,
{
    pub fn new(fetcher: Arc<F>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            fetcher,
            capacity: capacity.max(1),
            pending: BTreeMap::new(),
            in_flight: HashSet::new(),
            peak_in_flight: 0,
            sender,
            receiver,
        }
    }

    /// Queue a task. It starts on the next [WorkerPool::admit] with a free slot.
    pub fn submit(&mut self, task: SegmentTask) {
        if self.in_flight.contains(&task.index) {
            tracing::warn!("Segment {} is already running, ignoring.", task.index);
            return;
        }
        self.pending.insert(task.index, task);
    }

    /// Start pending tasks in ascending index order until the pool is full.
    /// Returns how many were started.
    pub fn admit(&mut self) -> usize {
        let mut started = 0;
        while self.in_flight.len() < self.capacity {
            let Some((index, task)) = self.pending.pop_first() else {
                break;
            };
            self.in_flight.insert(index);
            self.spawn(task);
            started += 1;
        }
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
        started
    }

    fn spawn(&self, task: SegmentTask) {
        let fetcher = self.fetcher.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let index = task.index;
            let result = AssertUnwindSafe(fetcher.fetch(&task))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::error!("Fetching segment {index} panicked.");
                    SegmentResult::failure(index)
                });
            // receiver is gone only when the pool itself was dropped
            _ = sender.send(result);
        });
    }

    /// Change the number of concurrently admitted fetches.
    ///
    /// Running fetches are never interrupted. When shrinking below the current
    /// `in_flight`, new tasks are held back until enough of them finish.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        if new_capacity != self.capacity {
            tracing::debug!(
                "Worker pool resized {} -> {new_capacity} ({} in flight)",
                self.capacity,
                self.in_flight.len()
            );
            self.capacity = new_capacity;
        }
    }

    /// Drain every result that is already available. Never waits.
    pub fn poll_completed(&mut self) -> Vec<SegmentResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.receiver.try_recv() {
            self.complete(&result);
            results.push(result);
        }
        results
    }

    /// Wait for the next result. Returns `None` immediately when nothing is in flight.
    pub async fn next_completed(&mut self) -> Option<SegmentResult> {
        if self.in_flight.is_empty() {
            return None;
        }
        let result = self.receiver.recv().await?;
        self.complete(&result);
        Some(result)
    }

    fn complete(&mut self, result: &SegmentResult) {
        if !self.in_flight.remove(&result.index) {
            tracing::warn!("Received result for segment {} which is not running.", result.index);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Highest `in_flight` observed right after an admission.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }
}
