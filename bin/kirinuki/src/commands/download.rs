use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use clap::{Args, Parser};
use clap_handler::handler;
use fake_user_agent::get_chrome_rua;
use kirinuki::{
    download::DownloaderBuilder,
    fetch::HttpSegmentFetcher,
    hls::M3u8Resolver,
    merge::FfmpegTranscoder,
    progress::{FileProgressStore, ProgressStore},
    HttpClient,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};

use crate::config::{Config, ConfigOptions};

#[derive(Parser, Clone, Debug)]
#[clap(name = "download", visible_alias = "dl")]
pub struct DownloadCommand {
    #[clap(flatten)]
    pub config: ConfigOptions,

    #[clap(flatten)]
    pub http: HttpOptions,

    #[clap(flatten)]
    pub download: DownloadOptions,

    /// Output file name, placed in the output directory
    #[clap(short, long, default_value = "video.mp4")]
    pub output: String,

    /// Playlist URL to download
    pub url: String,
}

#[derive(Args, Clone, Debug, Default)]
pub struct HttpOptions {
    /// Additional HTTP headers
    #[clap(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Cookies sent to the playlist host
    #[clap(long = "cookie")]
    pub cookies: Vec<String>,

    /// HTTP timeout, in seconds
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct DownloadOptions {
    /// Initial worker count. Derived from the host when omitted
    #[clap(long, alias = "threads")]
    pub concurrency: Option<usize>,

    /// Segment retry limit
    #[clap(long)]
    pub segment_retries: Option<u32>,

    /// Manifest retry limit
    #[clap(long, default_value = "3")]
    pub manifest_retries: u32,

    /// Directory the merged file is written to
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// Parent directory of per-download scratch directories
    #[clap(long, env = "TEMP")]
    pub temp_dir: Option<PathBuf>,
}

impl DownloadCommand {
    pub async fn download(self) -> anyhow::Result<()> {
        let Config {
            download: mut config,
            http,
        } = self.config.load()?;

        if let Some(timeout) = self.http.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(concurrency) = self.download.concurrency {
            config.concurrency = Some(concurrency);
        }
        if let Some(retries) = self.download.segment_retries {
            config.segment_retries = retries;
        }
        if let Some(output_dir) = self.download.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(temp_dir) = self.download.temp_dir {
            config.scratch_dir = temp_dir;
        }

        let headers = [http.headers, self.http.headers].concat();
        let cookies = [http.cookies, self.http.cookies].concat();
        let client = HttpClient::new(client_builder(&headers, config.request_timeout())?)?;
        if !cookies.is_empty() {
            client.add_cookies(cookies, self.url.as_str())?;
        }

        let store = FileProgressStore::new(&config.progress_dir);
        let resolver = M3u8Resolver::new(client.clone()).with_retries(self.download.manifest_retries);
        let fetcher = HttpSegmentFetcher::new(client).with_timeout(config.request_timeout());
        let downloader = Arc::new(
            DownloaderBuilder::new()
                .config(config)
                .build(resolver, fetcher, FfmpegTranscoder::new()?, store.clone()),
        );

        let handle = downloader.start_download(self.url, self.output);
        let process_id = handle.process_id().clone();
        eprintln!("Process id: {process_id}");

        let wait = handle.wait();
        tokio::pin!(wait);
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        let result = loop {
            tokio::select! {
                result = &mut wait => break result,
                _ = ticker.tick() => {
                    if let Ok(Some(snapshot)) = store.read(&process_id).await {
                        eprintln!("{}", snapshot.display_line());
                    }
                }
            }
        };

        let output = result?;
        println!("{}", output.display());
        Ok(())
    }
}

fn client_builder(headers: &[String], timeout: Duration) -> anyhow::Result<reqwest::ClientBuilder> {
    let mut header_map = HeaderMap::new();
    for header in headers {
        let (key, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Invalid header: {header}"))?;
        header_map.insert(
            HeaderName::from_str(key.trim())?,
            HeaderValue::from_str(value.trim())?,
        );
    }

    Ok(Client::builder()
        .default_headers(header_map)
        .user_agent(get_chrome_rua())
        .timeout(timeout))
}

#[handler(DownloadCommand)]
pub async fn download(args: DownloadCommand) -> anyhow::Result<()> {
    args.download().await
}
