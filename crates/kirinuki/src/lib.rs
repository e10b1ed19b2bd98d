pub mod clip;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod hls;
pub mod load;
pub mod merge;
pub mod progress;
pub mod scratch;
mod segment;
pub mod util;

pub use error::*;
pub use segment::*;
pub use util::http::HttpClient;

use std::{fmt, future::Future, sync::Arc};

use serde::{Deserialize, Serialize};

/// ┌───────────────────┐               ┌──────────────────┐
/// │                   │   SegmentTask │                  ├───┐
/// │                   ├───────────────►                  │   │ fetch
/// │     Manifest      │               │    WorkerPool    ◄───┘
/// │  (index 0..N-1)   │   SegmentTask │   [capacity ≤ 32]│
/// │                   ├───────────────►                  ├───┐
/// │                   │      ...      │                  │   │ fetch
/// └───────────────────┘               └────────┬─────────┘◄──┘
///                                              │ SegmentResult
///                                     ┌────────▼─────────┐
///                                     │   Orchestrator   ├──► ProgressStore
///                                     └────────┬─────────┘
///                                              │ index order
///                                     ┌────────▼─────────┐
///                                     │   SegmentMerger  ├──► output file
///                                     └──────────────────┘
pub trait ManifestResolver {
    /// Resolve a playlist url into its ordered segment list.
    ///
    /// An empty list is an error of the caller's choosing; implementations
    /// may return it as-is.
    fn resolve(&self, url: &str) -> impl Future<Output = KirinukiResult<ResolvedManifest>> + Send;
}

pub trait SegmentFetcher {
    /// Fetch a single segment into `task.scratch_path`.
    ///
    /// Failures are reported through [SegmentResult::success] and never retried here.
    fn fetch(&self, task: &SegmentTask) -> impl Future<Output = SegmentResult> + Send;
}

impl<T> ManifestResolver for Arc<T>
where
    T: ManifestResolver + Send + Sync,
{
    fn resolve(&self, url: &str) -> impl Future<Output = KirinukiResult<ResolvedManifest>> + Send {
        self.as_ref().resolve(url)
    }
}

impl<T> SegmentFetcher for Arc<T>
where
    T: SegmentFetcher + Send + Sync,
{
    fn fetch(&self, task: &SegmentTask) -> impl Future<Output = SegmentResult> + Send {
        self.as_ref().fetch(task)
    }
}

/// Opaque identifier of one download or clip job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    /// 16 random bytes, hex encoded.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
