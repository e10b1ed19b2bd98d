mod concat;
mod ffmpeg;

pub use concat::ConcatTranscoder;
pub use ffmpeg::FfmpegTranscoder;

use crate::{
    error::{KirinukiError, KirinukiResult},
    ProcessId,
};
use std::{
    ffi::OsString,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

/// External media tool the merger and the clip renderer drive.
pub trait Transcoder: Send + Sync + 'static {
    /// Concatenate `inputs` into `output`, in exactly the given order.
    fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
    ) -> impl Future<Output = KirinukiResult<()>> + Send;

    /// Run one transcode command. `args` are ffmpeg style arguments, the
    /// output file being the last one.
    fn transcode(&self, args: &[OsString]) -> impl Future<Output = KirinukiResult<()>> + Send;
}

impl<T> Transcoder for Arc<T>
where
    T: Transcoder,
{
    fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
    ) -> impl Future<Output = KirinukiResult<()>> + Send {
        self.as_ref().concat(inputs, output)
    }

    fn transcode(&self, args: &[OsString]) -> impl Future<Output = KirinukiResult<()>> + Send {
        self.as_ref().transcode(args)
    }
}

/// Assembles downloaded segments into the final file.
///
/// The transcoder writes to a staging file next to the output, owned by one
/// process id, which is only renamed to the requested path once it exists and
/// is not empty.
pub struct SegmentMerger<T> {
    transcoder: T,
}

impl<T> SegmentMerger<T>
where
    T: Transcoder,
{
    pub fn new(transcoder: T) -> Self {
        Self { transcoder }
    }

    /// Merge `(index, path)` pairs in ascending index order, whatever order
    /// they are passed in. Indices must cover `0..segments.len()`.
    ///
    /// Returns the size of the merged file.
    pub async fn merge(
        &self,
        mut segments: Vec<(u64, PathBuf)>,
        output: &Path,
        process_id: &ProcessId,
    ) -> KirinukiResult<u64> {
        if segments.is_empty() {
            return Err(KirinukiError::Merge("no segments to merge".to_string()));
        }

        segments.sort_by_key(|(index, _)| *index);
        if let Some((position, (index, _))) = segments
            .iter()
            .enumerate()
            .find(|(position, (index, _))| *index != *position as u64)
        {
            return Err(KirinukiError::Merge(format!(
                "segment {position} is missing (found {index} instead)"
            )));
        }
        let inputs: Vec<PathBuf> = segments.into_iter().map(|(_, path)| path).collect();

        let staging = staging_path(output, process_id);
        tracing::info!("Merging {} segments into {}", inputs.len(), output.display());

        if let Err(e) = self.transcoder.concat(&inputs, &staging).await {
            remove_if_exists(&staging).await;
            return Err(KirinukiError::Merge(e.to_string()));
        }

        let size = match tokio::fs::metadata(&staging).await {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => metadata.len(),
            Ok(_) => {
                remove_if_exists(&staging).await;
                return Err(KirinukiError::Merge("merged output is empty".to_string()));
            }
            Err(e) => {
                return Err(KirinukiError::Merge(format!("merged output is missing: {e}")));
            }
        };

        if let Err(e) = tokio::fs::rename(&staging, output).await {
            remove_if_exists(&staging).await;
            return Err(KirinukiError::Merge(format!(
                "failed to move merged output to {}: {e}",
                output.display()
            )));
        }

        Ok(size)
    }
}

/// `<dir>/.partial_<process id>_<file name>`, keeping the extension for muxer
/// detection.
pub fn staging_path(output: &Path, process_id: &ProcessId) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.mp4".to_string());
    output.with_file_name(format!(".partial_{process_id}_{file_name}"))
}

pub(crate) async fn remove_if_exists(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {e}", path.display());
        }
    }
}
