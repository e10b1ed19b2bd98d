use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::download::ResizePolicy;

/// Tunables of a [Downloader](crate::download::Downloader).
///
/// Every field has a default, so a partial TOML table is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Timeout of a single segment request, in seconds.
    pub request_timeout_secs: u64,
    /// Fixed initial pool capacity. Derived from the host when unset.
    pub concurrency: Option<usize>,
    /// How many times a failed segment is resubmitted before it fails the download.
    pub segment_retries: u32,
    /// Parent of per-session scratch directories.
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub progress_dir: PathBuf,
    pub resize_interval_ms: u64,
    pub progress_interval_ms: u64,
    pub policy: ResizePolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            concurrency: None,
            segment_retries: 0,
            scratch_dir: std::env::temp_dir(),
            output_dir: default_output_dir(),
            progress_dir: PathBuf::from("progress"),
            resize_interval_ms: 2000,
            progress_interval_ms: 500,
            policy: ResizePolicy::default(),
        }
    }
}

impl DownloadConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resize_interval(&self) -> Duration {
        Duration::from_millis(self.resize_interval_ms.max(1))
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .map(|dir| dir.join("kirinuki"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}
