use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
};

use tokio::process::Command;

use super::Transcoder;
use crate::error::{KirinukiError, KirinukiResult};

/// Drives the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
}

impl FfmpegTranscoder {
    /// Locate `ffmpeg` in `PATH`.
    pub fn new() -> KirinukiResult<Self> {
        Ok(Self {
            ffmpeg: which::which("ffmpeg")?,
        })
    }

    pub fn with_binary(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.ffmpeg
    }

    async fn run(&self, args: &[OsString]) -> KirinukiResult<()> {
        tracing::debug!("Running {} {:?}", self.ffmpeg.display(), args);
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KirinukiError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Quote a path for the concat demuxer list file.
fn concat_entry(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{escaped}'")
}

impl Transcoder for FfmpegTranscoder {
    /// Concatenate with the concat demuxer and stream copy.
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> KirinukiResult<()> {
        if inputs.is_empty() {
            return Err(KirinukiError::Transcode("no input files".to_string()));
        }

        let mut list = tempfile::Builder::new()
            .prefix("kirinuki_concat_")
            .suffix(".txt")
            .tempfile()?;
        for input in inputs {
            let input = if input.is_absolute() {
                input.clone()
            } else {
                std::env::current_dir()?.join(input)
            };
            writeln!(list, "{}", concat_entry(&input))?;
        }
        list.flush()?;

        let args: Vec<OsString> = vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list.path().into(),
            "-c".into(),
            "copy".into(),
            output.into(),
        ];
        self.run(&args).await
    }

    async fn transcode(&self, args: &[OsString]) -> KirinukiResult<()> {
        self.run(args).await
    }
}
