use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{fs::File, io::AsyncWriteExt};

use super::Transcoder;
use crate::error::{KirinukiError, KirinukiResult};

/// Byte-level concatenation of segment files.
///
/// Works for MPEG-TS segments, which can be joined as-is. It can not run
/// transcode commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatTranscoder;

impl Transcoder for ConcatTranscoder {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> KirinukiResult<()> {
        let mut writer = File::create(output).await?;
        for input in inputs {
            let mut reader = File::open(input).await?;
            tokio::io::copy(&mut reader, &mut writer).await?;
        }
        writer.flush().await?;
        Ok(())
    }

    async fn transcode(&self, _args: &[OsString]) -> KirinukiResult<()> {
        Err(KirinukiError::Transcode(
            "byte concatenation can not run transcode commands".to_string(),
        ))
    }
}
