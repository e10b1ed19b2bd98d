use m3u8_rs::{MediaPlaylist, Playlist, VariantStream};
use reqwest::{Client, Url};

use crate::error::{KirinukiError, KirinukiResult};

/// Fetch and parse a playlist, following a master playlist to its best
/// variant. Fetch and parse failures are retried up to `total_retry` times.
#[async_recursion::async_recursion]
pub async fn load_m3u8(
    client: &Client,
    url: Url,
    total_retry: u32,
) -> KirinukiResult<(Url, MediaPlaylist)> {
    log::info!("Start fetching M3U8 file.");

    let mut retry = total_retry.max(1);
    let mut last_error = String::new();
    let m3u8_parsed = loop {
        if retry == 0 {
            return Err(KirinukiError::Manifest(format!(
                "failed to load {url}: {last_error}"
            )));
        }

        match fetch_playlist(client, &url).await {
            Ok(m3u8_bytes) => match m3u8_rs::parse_playlist_res(&m3u8_bytes) {
                Ok(parsed) => break parsed,
                Err(error) => {
                    log::warn!("Failed to parse M3U8 file: {error}");
                    last_error = format!("invalid playlist: {error}");
                    retry -= 1;
                }
            },
            Err(error) => {
                log::warn!("Failed to fetch M3U8 file: {error}");
                last_error = error;
                retry -= 1;
            }
        }
    };
    log::info!("M3U8 file fetched.");

    match m3u8_parsed {
        Playlist::MasterPlaylist(pl) => {
            log::info!("Master playlist input detected. Auto selecting best quality streams.");
            let variant = best_variant(pl.variants)
                .ok_or_else(|| KirinukiError::Manifest("no variant found".to_string()))?;
            let url = url.join(&variant.uri)?;

            log::info!(
                "Best stream: {url}; Bandwidth: {bandwidth}",
                bandwidth = variant.bandwidth
            );
            load_m3u8(client, url, total_retry).await
        }
        Playlist::MediaPlaylist(pl) => Ok((url, pl)),
    }
}

async fn fetch_playlist(client: &Client, url: &Url) -> Result<bytes::Bytes, String> {
    let resp = client.get(url.clone()).send().await.map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.bytes().await.map_err(|e| e.to_string())
}

/// Pick the widest resolution, then the highest frame rate, then the
/// highest bandwidth. I-frame only streams are never picked.
pub fn best_variant(mut variants: Vec<VariantStream>) -> Option<VariantStream> {
    variants.retain(|v| !v.is_i_frame);
    variants.sort_by(|a, b| {
        // compare resolution first
        if let (Some(a), Some(b)) = (a.resolution, b.resolution) {
            if a.width != b.width {
                return b.width.cmp(&a.width);
            }
        }

        // compare framerate then
        if let (Some(a), Some(b)) = (a.frame_rate, b.frame_rate) {
            let a = a as u64;
            let b = b as u64;
            if a != b {
                return b.cmp(&a);
            }
        }

        // compare bandwidth finally
        b.bandwidth.cmp(&a.bandwidth)
    });
    variants.into_iter().next()
}
