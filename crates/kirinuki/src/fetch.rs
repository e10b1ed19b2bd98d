use std::time::Duration;

use futures::StreamExt;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::{
    error::{KirinukiError, KirinukiResult},
    util::http::{HttpClient, DEFAULT_TIMEOUT},
    SegmentFetcher, SegmentResult, SegmentTask,
};

/// Fetches one segment per request and streams its body to the scratch file.
#[derive(Clone)]
pub struct HttpSegmentFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl HttpSegmentFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn download(&self, task: &SegmentTask) -> KirinukiResult<u64> {
        let response = self
            .client
            .get(task.uri.clone())
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(KirinukiError::HttpError(response.status()));
        }

        let mut file = File::create(&task.scratch_path).await?;
        let mut written = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

impl SegmentFetcher for HttpSegmentFetcher {
    async fn fetch(&self, task: &SegmentTask) -> SegmentResult {
        match self.download(task).await {
            Ok(byte_size) => SegmentResult::success(task.index, byte_size),
            Err(e) => {
                tracing::warn!(
                    "Fetching segment {} ({}) failed: {e}",
                    task.index,
                    task.file_name()
                );
                // a partially written file must not be mistaken for a finished one
                if let Err(e) = tokio::fs::remove_file(&task.scratch_path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            "Failed to remove partial segment {}: {e}",
                            task.scratch_path.display()
                        );
                    }
                }
                SegmentResult::failure(task.index)
            }
        }
    }
}
