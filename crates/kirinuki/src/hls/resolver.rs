use reqwest::Url;

use super::utils::load_m3u8;
use crate::{
    error::{KirinukiError, KirinukiResult},
    util::http::HttpClient,
    ManifestResolver, ResolvedManifest,
};

/// Resolves HLS playlists into absolute segment urls.
#[derive(Clone)]
pub struct M3u8Resolver {
    client: HttpClient,
    manifest_retries: u32,
}

impl M3u8Resolver {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            manifest_retries: 3,
        }
    }

    pub fn with_retries(mut self, manifest_retries: u32) -> Self {
        self.manifest_retries = manifest_retries;
        self
    }
}

impl ManifestResolver for M3u8Resolver {
    async fn resolve(&self, url: &str) -> KirinukiResult<ResolvedManifest> {
        let url = Url::parse(url)
            .map_err(|e| KirinukiError::Manifest(format!("invalid playlist url {url}: {e}")))?;
        let (playlist_url, playlist) = load_m3u8(&self.client, url, self.manifest_retries).await?;

        let mut segments = Vec::with_capacity(playlist.segments.len());
        let mut total_duration = 0.;
        for segment in playlist.segments.iter() {
            segments.push(playlist_url.join(&segment.uri)?);
            total_duration += segment.duration as f64;
        }
        tracing::debug!(
            "Resolved {} segments, {total_duration:.1}s in total",
            segments.len()
        );

        Ok(ResolvedManifest {
            segments,
            total_duration,
        })
    }
}
