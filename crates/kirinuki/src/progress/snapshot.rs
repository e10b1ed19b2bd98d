use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::format::{format_speed, format_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Queued,
    Downloading,
    Merging,
    /// Clip rendering in progress.
    Processing,
    Complete,
    Error,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Merging => "merging",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    #[serde(default)]
    pub elapsed_secs: f64,
    #[serde(default)]
    pub remaining_secs: f64,
    /// Bytes per second.
    #[serde(default)]
    pub throughput: f64,
    pub message: String,
    #[serde(default)]
    pub completed_segments: u64,
    #[serde(default)]
    pub total_segments: u64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressSnapshot {
    pub fn new(status: ProgressStatus, progress: f64, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.clamp(0., 100.),
            elapsed_secs: 0.,
            remaining_secs: 0.,
            throughput: 0.,
            message: message.into(),
            completed_segments: 0,
            total_segments: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn queued() -> Self {
        Self::new(ProgressStatus::Queued, 0., "Resolving playlist")
    }

    pub fn merging(total_segments: u64) -> Self {
        Self::new(
            ProgressStatus::Merging,
            100.,
            format!("Merging {total_segments} segments"),
        )
        .with_segments(total_segments, total_segments)
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(ProgressStatus::Complete, 100., message)
    }

    pub fn error(cause: impl std::fmt::Display) -> Self {
        Self::new(ProgressStatus::Error, 0., format!("Error: {cause}"))
    }

    pub fn with_timing(mut self, elapsed_secs: f64, remaining_secs: f64, throughput: f64) -> Self {
        self.elapsed_secs = elapsed_secs;
        self.remaining_secs = remaining_secs;
        self.throughput = throughput;
        self
    }

    pub fn with_segments(mut self, completed: u64, total: u64) -> Self {
        self.completed_segments = completed;
        self.total_segments = total;
        self
    }

    /// One-line summary for terminals.
    pub fn display_line(&self) -> String {
        let status = self.status.as_str();
        match self.status {
            ProgressStatus::Downloading => format!(
                "[{status}] {:.1}% | elapsed {} | remaining {} | {} | {}",
                self.progress,
                format_time(self.elapsed_secs),
                format_time(self.remaining_secs),
                format_speed(self.throughput),
                self.message
            ),
            _ => format!("[{status}] {:.1}% | {}", self.progress, self.message),
        }
    }
}
