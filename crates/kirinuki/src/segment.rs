use std::path::PathBuf;

use url::Url;

/// One unit of fetch work.
///
/// `index` is the only ordering key. Tasks of a session cover `[0, total)`
/// without gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTask {
    pub index: u64,
    pub uri: Url,
    pub scratch_path: PathBuf,
}

impl SegmentTask {
    pub fn new(index: u64, uri: Url, scratch_path: PathBuf) -> Self {
        Self {
            index,
            uri,
            scratch_path,
        }
    }

    /// Last path segment of the uri, used in log lines.
    pub fn file_name(&self) -> &str {
        self.uri
            .path_segments()
            .and_then(|mut c| c.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("segment.ts")
    }
}

/// Outcome of executing a [SegmentTask].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentResult {
    pub index: u64,
    pub success: bool,
    pub byte_size: u64,
}

impl SegmentResult {
    pub fn success(index: u64, byte_size: u64) -> Self {
        Self {
            index,
            success: true,
            byte_size,
        }
    }

    pub fn failure(index: u64) -> Self {
        Self {
            index,
            success: false,
            byte_size: 0,
        }
    }
}

/// Ordered segment list produced by a [crate::ManifestResolver].
#[derive(Debug, Clone, Default)]
pub struct ResolvedManifest {
    pub segments: Vec<Url>,
    /// Sum of all segment durations, in seconds.
    pub total_duration: f64,
}
