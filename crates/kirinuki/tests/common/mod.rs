use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use kirinuki::{
    config::DownloadConfig,
    download::{Downloader, DownloaderBuilder},
    load::{HostResources, LoadSample, LoadSampler},
    merge::ConcatTranscoder,
    progress::{ProgressSnapshot, ProgressStatus, ProgressStore},
    KirinukiResult, ManifestResolver, ProcessId, ResolvedManifest, SegmentFetcher, SegmentResult,
    SegmentTask,
};
use url::Url;

/// Log the crate's events while a test runs, once per test binary.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("kirinuki=debug,wiremock=info")
        .with_test_writer()
        .try_init();
}

/// Serves a fixed list of `https://example.com/seg{i}.ts` urls.
pub struct StaticResolver {
    segments: Vec<Url>,
}

impl StaticResolver {
    pub fn numbered(count: u64) -> Self {
        Self {
            segments: (0..count)
                .map(|i| Url::parse(&format!("https://example.com/seg{i}.ts")).unwrap())
                .collect(),
        }
    }
}

impl ManifestResolver for StaticResolver {
    async fn resolve(&self, _url: &str) -> KirinukiResult<ResolvedManifest> {
        Ok(ResolvedManifest {
            total_duration: self.segments.len() as f64 * 2.,
            segments: self.segments.clone(),
        })
    }
}

pub fn body(index: u64) -> String {
    format!("segment-{index:03}\n")
}

pub fn merged_body(count: u64) -> String {
    (0..count).map(body).collect()
}

/// Writes [body] of each segment after a configurable delay, failing the
/// configured indices a given number of times first.
#[derive(Default)]
pub struct ScriptedFetcher {
    delay: Duration,
    delays: HashMap<u64, Duration>,
    failures: Mutex<HashMap<u64, u32>>,
    running: AtomicUsize,
    /// `(index, fetches running including this one)` at every start.
    pub starts: Mutex<Vec<(u64, usize)>>,
    /// Indices in the order their fetch succeeded.
    pub completions: Mutex<Vec<u64>>,
}

impl ScriptedFetcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn delay_for(mut self, index: u64, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    pub fn fail(self, index: u64, times: u32) -> Self {
        self.failures.lock().unwrap().insert(index, times);
        self
    }

    pub fn fail_always(self, index: u64) -> Self {
        self.fail(index, u32::MAX)
    }

    pub fn max_running(&self) -> usize {
        self.starts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, running)| *running)
            .max()
            .unwrap_or(0)
    }
}

impl SegmentFetcher for ScriptedFetcher {
    async fn fetch(&self, task: &SegmentTask) -> SegmentResult {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.starts.lock().unwrap().push((task.index, running));

        let delay = self.delays.get(&task.index).copied().unwrap_or(self.delay);
        tokio::time::sleep(delay).await;

        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&task.index) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };

        let result = if should_fail {
            SegmentResult::failure(task.index)
        } else {
            let data = body(task.index);
            match tokio::fs::write(&task.scratch_path, &data).await {
                Ok(()) => {
                    self.completions.lock().unwrap().push(task.index);
                    SegmentResult::success(task.index, data.len() as u64)
                }
                Err(_) => SegmentResult::failure(task.index),
            }
        };
        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Keeps every snapshot instead of only the latest.
#[derive(Clone, Default)]
pub struct RecordingStore {
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
}

impl RecordingStore {
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<ProgressStatus> {
        self.snapshots().iter().map(|s| s.status).collect()
    }
}

impl ProgressStore for RecordingStore {
    async fn write(&self, _id: &ProcessId, snapshot: &ProgressSnapshot) -> KirinukiResult<()> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn read(&self, _id: &ProcessId) -> KirinukiResult<Option<ProgressSnapshot>> {
        Ok(self.snapshots.lock().unwrap().last().cloned())
    }

    async fn clear(&self, _id: &ProcessId) -> KirinukiResult<()> {
        self.snapshots.lock().unwrap().clear();
        Ok(())
    }
}

pub struct FixedSampler(pub LoadSample);

impl FixedSampler {
    /// Between the grow and shrink thresholds, so capacity never changes.
    pub fn neutral() -> Self {
        Self(LoadSample::new(65., 70.))
    }
}

impl LoadSampler for FixedSampler {
    fn sample(&self) -> LoadSample {
        self.0
    }
}

pub fn host() -> HostResources {
    HostResources {
        cpu_cores: 4,
        available_memory: 16 * 1024 * 1024 * 1024,
    }
}

pub fn config(dir: &Path) -> DownloadConfig {
    DownloadConfig {
        scratch_dir: dir.join("scratch"),
        output_dir: dir.join("out"),
        progress_dir: dir.join("progress"),
        ..Default::default()
    }
}

pub fn downloader<R, F, P>(
    resolver: R,
    fetcher: F,
    progress: P,
    config: DownloadConfig,
    sampler: FixedSampler,
) -> Downloader<R, F, ConcatTranscoder, P, FixedSampler>
where
    R: ManifestResolver + Send + Sync + 'static,
    F: SegmentFetcher + Send + Sync + 'static,
    P: ProgressStore,
{
    DownloaderBuilder::new()
        .config(config)
        .sampler(sampler)
        .host(host())
        .build(resolver, fetcher, ConcatTranscoder, progress)
}

/// Entries left in the scratch root.
pub fn scratch_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir.join("scratch"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}
