use std::time::{Duration, Instant};

use crate::{
    download::DownloadSession,
    progress::{ProgressSnapshot, ProgressStatus},
    util::format::{format_speed, format_time},
};

/// Default minimum gap between two download snapshots.
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_millis(500);

/// Turns session counters into rate limited download snapshots.
///
/// At most one snapshot is produced per `interval`, however many segments
/// complete in between.
#[derive(Debug)]
pub struct ProgressAggregator {
    interval: Duration,
    last_emitted: Option<Instant>,
}

impl ProgressAggregator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.last_emitted
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Build a snapshot if the interval has passed since the last one.
    ///
    /// `now` should be the scheduled time of the tick that triggered the
    /// emission, so a tick handled late does not make the next one look early.
    /// `bytes_on_disk` is the size of all completed segment files; throughput
    /// is that amount over the whole session time, not a sliding window.
    pub fn emit(
        &mut self,
        session: &DownloadSession,
        bytes_on_disk: u64,
        now: Instant,
    ) -> Option<ProgressSnapshot> {
        if !self.is_due(now) {
            return None;
        }
        self.last_emitted = Some(now);
        Some(Self::snapshot(session, bytes_on_disk, now))
    }

    pub fn snapshot(session: &DownloadSession, bytes_on_disk: u64, now: Instant) -> ProgressSnapshot {
        let elapsed = now.saturating_duration_since(session.started_at).as_secs_f64();
        let completed = session.completed_count;
        let total = session.total_segments;

        let progress = if total == 0 {
            0.
        } else {
            completed as f64 / total as f64 * 100.
        };
        let throughput = if elapsed > 0. {
            bytes_on_disk as f64 / elapsed
        } else {
            0.
        };
        let remaining = if completed == 0 {
            0.
        } else {
            elapsed / completed as f64 * total.saturating_sub(completed) as f64
        };

        let message = format!(
            "Downloading: {completed}/{total} segments at {}, {} left",
            format_speed(throughput),
            format_time(remaining)
        );

        ProgressSnapshot::new(ProgressStatus::Downloading, progress, message)
            .with_timing(elapsed, remaining, throughput)
            .with_segments(completed, total)
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_EMIT_INTERVAL)
    }
}
