use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use super::{DownloadSession, Outcome, WorkerPool};
use crate::{
    config::DownloadConfig,
    error::{KirinukiError, KirinukiResult},
    load::{HostResources, LoadSampler, SystemLoadSampler},
    merge::{remove_if_exists, staging_path, SegmentMerger, Transcoder},
    progress::{self, ProgressAggregator, ProgressSnapshot, ProgressStore},
    scratch::ScratchDir,
    util::{format::format_size, path::sanitize_filename},
    ManifestResolver, ProcessId, SegmentFetcher, SegmentTask,
};

/// Drives one download from playlist url to merged file:
/// `RESOLVING -> DOWNLOADING -> MERGING -> COMPLETE`, or `ERROR` from any of
/// the first three.
///
/// Every fatal error leaves exactly one `error` snapshot behind, with the
/// scratch directory and any staged output already removed.
pub struct Downloader<R, F, T, P, L = SystemLoadSampler> {
    resolver: R,
    fetcher: Arc<F>,
    merger: SegmentMerger<T>,
    progress: P,
    sampler: L,
    host: HostResources,
    config: DownloadConfig,
}

impl<R, F, T, P> Downloader<R, F, T, P>
where
    R: ManifestResolver + Send + Sync + 'static,
    F: SegmentFetcher + Send + Sync + 'static,
    T: Transcoder,
    P: ProgressStore,
{
    /// Downloader with the default config, sampling the current machine.
    pub fn new(resolver: R, fetcher: F, transcoder: T, progress: P) -> Self {
        DownloaderBuilder::new().build(resolver, fetcher, transcoder, progress)
    }
}

impl<R, F, T, P, L> Downloader<R, F, T, P, L>
where
    R: ManifestResolver + Send + Sync + 'static,
    F: SegmentFetcher + Send + Sync + 'static,
    T: Transcoder,
    P: ProgressStore,
    L: LoadSampler,
{
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Spawn the download and return immediately.
    pub fn start_download(
        self: &Arc<Self>,
        source_url: impl Into<String>,
        output_filename: impl Into<String>,
    ) -> DownloadHandle {
        let process_id = ProcessId::generate();
        let source_url = source_url.into();
        let output_filename = output_filename.into();

        let this = self.clone();
        let id = process_id.clone();
        let handle = tokio::spawn(async move {
            this.download(&id, &source_url, &output_filename).await
        });

        DownloadHandle { process_id, handle }
    }

    /// Run a download to completion. Returns the path of the merged file.
    pub async fn download(
        &self,
        process_id: &ProcessId,
        source_url: &str,
        output_filename: &str,
    ) -> KirinukiResult<PathBuf> {
        let output = self
            .config
            .output_dir
            .join(sanitize_filename(output_filename));
        progress::report(&self.progress, process_id, ProgressSnapshot::queued()).await;

        let scratch = match ScratchDir::create(&self.config.scratch_dir, process_id).await {
            Ok(scratch) => scratch,
            Err(e) => return self.fail(process_id, None, None, e).await,
        };

        let segments = match self.run(process_id, source_url, &scratch).await {
            Ok(segments) => segments,
            Err(e) => return self.fail(process_id, Some(&scratch), None, e).await,
        };

        let staging = staging_path(&output, process_id);
        match self.merge(process_id, segments, &output).await {
            Ok(size) => {
                if let Err(e) = scratch.remove().await {
                    tracing::warn!("[{process_id}] {e}");
                }
                tracing::info!(
                    "[{process_id}] Saved {} to {}",
                    format_size(size),
                    output.display()
                );
                progress::report(
                    &self.progress,
                    process_id,
                    ProgressSnapshot::complete(format!("Download complete ({})", format_size(size))),
                )
                .await;
                Ok(output)
            }
            Err(e) => self.fail(process_id, Some(&scratch), Some(&staging), e).await,
        }
    }

    async fn run(
        &self,
        process_id: &ProcessId,
        source_url: &str,
        scratch: &ScratchDir,
    ) -> KirinukiResult<Vec<(u64, PathBuf)>> {
        tracing::info!("[{process_id}] Resolving {source_url}");
        let manifest = self
            .resolver
            .resolve(source_url)
            .await
            .map_err(|e| match e {
                KirinukiError::Manifest(_) => e,
                e => KirinukiError::Manifest(e.to_string()),
            })?;
        if manifest.segments.is_empty() {
            return Err(KirinukiError::Manifest(
                "playlist contains no segments".to_string(),
            ));
        }

        let tasks: Vec<SegmentTask> = manifest
            .segments
            .into_iter()
            .enumerate()
            .map(|(index, uri)| {
                let index = index as u64;
                let scratch_path = scratch.segment_path(index, &uri);
                SegmentTask::new(index, uri, scratch_path)
            })
            .collect();

        let capacity = match self.config.concurrency {
            Some(concurrency) => concurrency.max(1),
            None => self.config.policy.initial_capacity(self.host),
        };
        tracing::info!(
            "[{process_id}] Start downloading {} segments ({:.1}s) with {capacity} worker(s).",
            tasks.len(),
            manifest.total_duration
        );

        let mut session = DownloadSession::new(
            process_id.clone(),
            tasks,
            capacity,
            self.config.segment_retries,
        );
        self.download_segments(scratch, &mut session).await;

        if !session.failed().is_empty() {
            let mut failed = session.failed().to_vec();
            failed.sort_unstable();
            return Err(KirinukiError::SegmentFetchFailure(failed));
        }

        Ok(session
            .tasks()
            .iter()
            .map(|task| (task.index, task.scratch_path.clone()))
            .collect())
    }

    /// MERGING state: concatenate every downloaded segment into `output`.
    async fn merge(
        &self,
        process_id: &ProcessId,
        segments: Vec<(u64, PathBuf)>,
        output: &Path,
    ) -> KirinukiResult<u64> {
        progress::report(
            &self.progress,
            process_id,
            ProgressSnapshot::merging(segments.len() as u64),
        )
        .await;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| {
                KirinukiError::Resource(format!(
                    "failed to create {}: {e}",
                    self.config.output_dir.display()
                ))
            })?;
        self.merger.merge(segments, output, process_id).await
    }

    /// Event loop of the DOWNLOADING state. Returns once every task has a
    /// final result.
    async fn download_segments(&self, scratch: &ScratchDir, session: &mut DownloadSession) {
        let mut pool = WorkerPool::new(self.fetcher.clone(), session.current_worker_count);
        for task in session.tasks() {
            pool.submit(task.clone());
        }
        pool.admit();

        let mut aggregator = ProgressAggregator::new(self.config.progress_interval());

        let resize_interval = self.config.resize_interval();
        let mut resize_tick = interval_at(Instant::now() + resize_interval, resize_interval);
        resize_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let progress_interval = self.config.progress_interval();
        let mut progress_tick = interval_at(Instant::now() + progress_interval, progress_interval);
        progress_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !pool.is_idle() {
            tokio::select! {
                Some(result) = pool.next_completed(), if pool.in_flight() > 0 => {
                    if let Outcome::Retry(task) = session.record(result) {
                        pool.submit(task);
                    }
                    pool.admit();
                }
                _ = resize_tick.tick() => {
                    self.resize(&mut pool, session);
                }
                scheduled = progress_tick.tick() => {
                    let bytes = scratch.bytes_on_disk(session.completed_paths()).await;
                    if let Some(snapshot) = aggregator.emit(session, bytes, scheduled.into_std()) {
                        progress::report(&self.progress, &session.process_id, snapshot).await;
                    }
                }
            }
        }

        tracing::info!(
            "[{}] {} of {} segments downloaded, peak concurrency {}.",
            session.process_id,
            session.completed_count,
            session.total_segments,
            pool.peak_in_flight()
        );
    }

    /// One resize tick: sample the host, apply the policy, admit into any
    /// freed slots.
    fn resize(&self, pool: &mut WorkerPool<F>, session: &mut DownloadSession) {
        let sample = self.sampler.sample();
        let capacity = self.config.policy.next_capacity(pool.capacity(), sample);
        if capacity != pool.capacity() {
            tracing::info!(
                "[{}] CPU {:.0}%, memory {:.0}%: {} -> {capacity} workers",
                session.process_id,
                sample.cpu_percent,
                sample.memory_percent,
                pool.capacity()
            );
        }
        pool.resize(capacity);
        session.current_worker_count = pool.capacity();
        pool.admit();
    }

    async fn fail(
        &self,
        process_id: &ProcessId,
        scratch: Option<&ScratchDir>,
        staging: Option<&Path>,
        error: KirinukiError,
    ) -> KirinukiResult<PathBuf> {
        tracing::error!("[{process_id}] Download failed: {error}");
        if let Some(scratch) = scratch {
            if let Err(e) = scratch.remove().await {
                tracing::warn!("[{process_id}] {e}");
            }
        }
        if let Some(staging) = staging {
            remove_if_exists(staging).await;
        }

        progress::report(&self.progress, process_id, ProgressSnapshot::error(&error)).await;
        Err(error)
    }
}

/// Handle of a download started with [Downloader::start_download].
pub struct DownloadHandle {
    process_id: ProcessId,
    handle: JoinHandle<KirinukiResult<PathBuf>>,
}

impl DownloadHandle {
    /// Id under which progress snapshots of this download are written.
    pub fn process_id(&self) -> &ProcessId {
        &self.process_id
    }

    pub async fn wait(self) -> KirinukiResult<PathBuf> {
        self.handle.await?
    }
}

/// Collects the optional parts of a [Downloader].
pub struct DownloaderBuilder<L = SystemLoadSampler> {
    config: DownloadConfig,
    sampler: L,
    host: Option<HostResources>,
}

impl DownloaderBuilder<SystemLoadSampler> {
    pub fn new() -> Self {
        Self {
            config: DownloadConfig::default(),
            sampler: SystemLoadSampler::new(),
            host: None,
        }
    }
}

impl Default for DownloaderBuilder<SystemLoadSampler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> DownloaderBuilder<L>
where
    L: LoadSampler,
{
    pub fn config(mut self, config: DownloadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sampler<L2>(self, sampler: L2) -> DownloaderBuilder<L2>
    where
        L2: LoadSampler,
    {
        DownloaderBuilder {
            config: self.config,
            sampler,
            host: self.host,
        }
    }

    /// Override the detected host, which decides the initial capacity.
    pub fn host(mut self, host: HostResources) -> Self {
        self.host = Some(host);
        self
    }

    pub fn build<R, F, T, P>(
        self,
        resolver: R,
        fetcher: F,
        transcoder: T,
        progress: P,
    ) -> Downloader<R, F, T, P, L>
    where
        T: Transcoder,
    {
        Downloader {
            resolver,
            fetcher: Arc::new(fetcher),
            merger: SegmentMerger::new(transcoder),
            progress,
            sampler: self.sampler,
            host: self.host.unwrap_or_else(HostResources::detect),
            config: self.config,
        }
    }
}
