use thiserror::Error;

#[derive(Error, Debug)]
pub enum KirinukiError {
    /// The source manifest could not be loaded or contained no segments.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// At least one segment failed permanently.
    #[error("Failed to download {} segment(s): {}", .0.len(), format_indices(.0))]
    SegmentFetchFailure(Vec<u64>),

    #[error("Merge error: {0}")]
    Merge(String),

    /// Scratch directory could not be created or removed.
    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid crop region: {0}")]
    InvalidCrop(String),

    #[error("Input file not found: {0}")]
    InputNotFound(std::path::PathBuf),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    MissingExecutable(#[from] which::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
}

fn format_indices(indices: &[u64]) -> String {
    indices
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type KirinukiResult<T> = Result<T, KirinukiError>;
