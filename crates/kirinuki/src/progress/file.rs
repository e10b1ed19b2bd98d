use std::{io::ErrorKind, path::PathBuf};

use super::{ProgressSnapshot, ProgressStore};
use crate::{
    error::{KirinukiError, KirinukiResult},
    ProcessId,
};

/// Stores every snapshot as `<dir>/<process_id>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// concurrent reader sees either the previous or the new snapshot.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn snapshot_path(&self, process_id: &ProcessId) -> KirinukiResult<PathBuf> {
        let id = process_id.as_str();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KirinukiError::Resource(format!(
                "invalid process id: {id:?}"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl ProgressStore for FileProgressStore {
    async fn write(&self, process_id: &ProcessId, snapshot: &ProgressSnapshot) -> KirinukiResult<()> {
        let path = self.snapshot_path(process_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let data = serde_json::to_vec(snapshot)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn read(&self, process_id: &ProcessId) -> KirinukiResult<Option<ProgressSnapshot>> {
        let path = self.snapshot_path(process_id)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&data) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!("Ignoring malformed progress file {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    async fn clear(&self, process_id: &ProcessId) -> KirinukiResult<()> {
        let path = self.snapshot_path(process_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
