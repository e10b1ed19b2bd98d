use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::{
    error::{KirinukiError, KirinukiResult},
    util::format::format_time,
};

/// Reads container metadata with `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe: PathBuf,
}

impl FfprobeProber {
    /// Locate `ffprobe` in `PATH`.
    pub fn new() -> KirinukiResult<Self> {
        Ok(Self {
            ffprobe: which::which("ffprobe")?,
        })
    }

    pub fn with_binary(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.ffprobe
    }

    /// Duration in seconds of a local file or a remote url.
    pub async fn duration(&self, input: &str) -> KirinukiResult<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                input,
            ])
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(KirinukiError::Transcode(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_duration(stdout: &str) -> KirinukiResult<f64> {
    let value = stdout.trim();
    match value.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration >= 0. => Ok(duration),
        _ => Err(KirinukiError::Transcode(format!(
            "could not determine duration from {value:?}"
        ))),
    }
}

/// Duration in seconds, probing with the `ffprobe` found in `PATH`.
pub async fn probe_duration(input: &str) -> KirinukiResult<f64> {
    FfprobeProber::new()?.duration(input).await
}

/// Duration rendered as `HH:MM:SS`.
pub async fn video_duration(input: &str) -> KirinukiResult<String> {
    probe_duration(input).await.map(format_time)
}
