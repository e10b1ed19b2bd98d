use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use url::Url;

use crate::{
    error::{KirinukiError, KirinukiResult},
    ProcessId,
};

/// Per-session directory holding downloaded but not yet merged segments.
///
/// Every segment is written to its own file, so workers never share a writer.
#[derive(Debug)]
pub struct ScratchDir {
    dir: PathBuf,
}

impl ScratchDir {
    /// Create `<root>/kirinuki_<process_id>`. The directory must not exist yet.
    pub async fn create(root: impl AsRef<Path>, process_id: &ProcessId) -> KirinukiResult<Self> {
        let dir = root.as_ref().join(format!("kirinuki_{process_id}"));
        if dir.exists() {
            return Err(KirinukiError::Resource(format!(
                "scratch directory {} already exists",
                dir.display()
            )));
        }

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            KirinukiError::Resource(format!("failed to create {}: {e}", dir.display()))
        })?;
        tracing::debug!("Created scratch directory {}", dir.display());

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Location of the segment with the given index.
    pub fn segment_path(&self, index: u64, uri: &Url) -> PathBuf {
        let filename = uri
            .path_segments()
            .and_then(|mut c| c.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("segment.ts")
            .replace('/', "__");
        self.dir.join(format!("{index:06}_{filename}"))
    }

    /// Sum of sizes of the given files that currently exist on disk.
    pub async fn bytes_on_disk<'a, I>(&self, files: I) -> u64
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let mut total = 0;
        for file in files {
            if let Ok(metadata) = tokio::fs::metadata(file).await {
                total += metadata.len();
            }
        }
        total
    }

    /// Remove the directory and everything in it. A missing directory is not an error.
    pub async fn remove(&self) -> KirinukiResult<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                tracing::debug!("Removed scratch directory {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KirinukiError::Resource(format!(
                "failed to remove {}: {e}",
                self.dir.display()
            ))),
        }
    }
}
