use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use super::{CropLayout, CropRegion, Timestamp};
use crate::{
    error::{KirinukiError, KirinukiResult},
    merge::{remove_if_exists, Transcoder},
    progress::{self, ProgressSnapshot, ProgressStatus, ProgressStore},
    util::path::KirinukiPathExt,
    ProcessId,
};

/// Destination files of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipOutputs {
    pub screen: PathBuf,
    pub webcam: PathBuf,
}

impl ClipOutputs {
    /// `<stem>_screen.<ext>` and `<stem>_webcam.<ext>` next to `base`.
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            screen: base.with_suffix("screen"),
            webcam: base.with_suffix("webcam"),
        }
    }
}

/// Cuts `[start, end]` out of a local recording twice: once cropped to the
/// shared screen without audio, once cropped to the webcam with audio.
pub struct ClipRenderer<T, P> {
    transcoder: T,
    progress: P,
}

impl<T, P> ClipRenderer<T, P>
where
    T: Transcoder,
    P: ProgressStore,
{
    pub fn new(transcoder: T, progress: P) -> Self {
        Self {
            transcoder,
            progress,
        }
    }

    pub async fn render(
        &self,
        process_id: &ProcessId,
        input: &Path,
        start: Timestamp,
        end: Timestamp,
        layout: &CropLayout,
        outputs: &ClipOutputs,
    ) -> KirinukiResult<ClipOutputs> {
        let mut produced = Vec::new();
        match self
            .render_inner(process_id, input, start, end, layout, outputs, &mut produced)
            .await
        {
            Ok(()) => {
                progress::report(
                    &self.progress,
                    process_id,
                    ProgressSnapshot::complete("Processing complete"),
                )
                .await;
                Ok(outputs.clone())
            }
            Err(e) => {
                tracing::error!("[{process_id}] Error processing video: {e}");
                for path in produced {
                    remove_if_exists(path).await;
                }
                progress::report(&self.progress, process_id, ProgressSnapshot::error(&e)).await;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn render_inner<'a>(
        &self,
        process_id: &ProcessId,
        input: &Path,
        start: Timestamp,
        end: Timestamp,
        layout: &CropLayout,
        outputs: &'a ClipOutputs,
        produced: &mut Vec<&'a Path>,
    ) -> KirinukiResult<()> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(KirinukiError::InputNotFound(input.to_path_buf()));
        }
        if start >= end {
            return Err(KirinukiError::InvalidTimestamp(format!(
                "end {end} must be after start {start}"
            )));
        }
        layout.validate()?;

        progress::report(
            &self.progress,
            process_id,
            ProgressSnapshot::new(
                ProgressStatus::Processing,
                0.,
                "Processing screen share video...",
            ),
        )
        .await;
        produced.push(&outputs.screen);
        let args = clip_args(input, start, end, &layout.screen, &["-an"], &outputs.screen);
        self.transcoder
            .transcode(&args)
            .await
            .map_err(|e| describe("screen", e))?;

        progress::report(
            &self.progress,
            process_id,
            ProgressSnapshot::new(
                ProgressStatus::Processing,
                50.,
                "Processing webcam video...",
            ),
        )
        .await;
        produced.push(&outputs.webcam);
        let args = clip_args(
            input,
            start,
            end,
            &layout.webcam,
            &["-c:a", "copy"],
            &outputs.webcam,
        );
        self.transcoder
            .transcode(&args)
            .await
            .map_err(|e| describe("webcam", e))?;

        Ok(())
    }
}

fn clip_args(
    input: &Path,
    start: Timestamp,
    end: Timestamp,
    region: &CropRegion,
    audio: &[&str],
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        input.into(),
        "-ss".into(),
        start.to_string().into(),
        "-to".into(),
        end.to_string().into(),
        "-filter:v".into(),
        region.filter().into(),
    ];
    args.extend(audio.iter().map(OsString::from));
    args.push(output.into());
    args
}

fn describe(clip: &str, error: KirinukiError) -> KirinukiError {
    match error {
        KirinukiError::Transcode(message) => {
            KirinukiError::Transcode(format!("{clip} clip: {message}"))
        }
        e => e,
    }
}
