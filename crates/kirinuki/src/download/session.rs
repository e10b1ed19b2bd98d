use std::{collections::HashMap, path::PathBuf, time::Instant};

use crate::{ProcessId, SegmentResult, SegmentTask};

/// Bookkeeping of one in-flight download.
///
/// Only the orchestration task mutates a session, after draining results
/// from the worker pool.
#[derive(Debug)]
pub struct DownloadSession {
    pub process_id: ProcessId,
    pub total_segments: u64,
    pub completed_count: u64,
    pub total_bytes: u64,
    pub started_at: Instant,
    pub current_worker_count: usize,

    tasks: Vec<SegmentTask>,
    completed: Vec<bool>,
    failed: Vec<u64>,
    attempts: HashMap<u64, u32>,
    max_retries: u32,
}

/// What the orchestrator should do after recording a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The task failed but has retries left and should be submitted again.
    Retry(SegmentTask),
    Failed,
}

impl DownloadSession {
    pub fn new(
        process_id: ProcessId,
        tasks: Vec<SegmentTask>,
        worker_count: usize,
        max_retries: u32,
    ) -> Self {
        let total = tasks.len();
        Self {
            process_id,
            total_segments: total as u64,
            completed_count: 0,
            total_bytes: 0,
            started_at: Instant::now(),
            current_worker_count: worker_count,
            tasks,
            completed: vec![false; total],
            failed: Vec::new(),
            attempts: HashMap::new(),
            max_retries,
        }
    }

    pub fn tasks(&self) -> &[SegmentTask] {
        &self.tasks
    }

    pub fn record(&mut self, result: SegmentResult) -> Outcome {
        let Some(task) = self.tasks.get(result.index as usize) else {
            tracing::warn!("Ignoring result of unknown segment {}", result.index);
            return Outcome::Failed;
        };

        if result.success {
            if !self.completed[result.index as usize] {
                self.completed[result.index as usize] = true;
                self.completed_count += 1;
                self.total_bytes += result.byte_size;
            }
            return Outcome::Completed;
        }

        let attempts = self.attempts.entry(result.index).or_insert(0);
        if *attempts < self.max_retries {
            *attempts += 1;
            tracing::warn!(
                "Segment {} failed, retry {}/{}.",
                result.index,
                attempts,
                self.max_retries
            );
            return Outcome::Retry(task.clone());
        }

        tracing::error!("Segment {} failed permanently.", result.index);
        self.failed.push(result.index);
        Outcome::Failed
    }

    /// Every task has a final result.
    pub fn is_finished(&self) -> bool {
        self.completed_count + self.failed.len() as u64 >= self.total_segments
    }

    pub fn failed(&self) -> &[u64] {
        &self.failed
    }

    /// Scratch paths of successfully fetched segments, in index order.
    pub fn completed_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.tasks
            .iter()
            .zip(self.completed.iter())
            .filter(|(_, done)| **done)
            .map(|(task, _)| &task.scratch_path)
    }
}
