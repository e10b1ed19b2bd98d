use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use kirinuki::{
    download::DownloaderBuilder,
    merge::{staging_path, Transcoder},
    progress::{ProgressStatus, ProgressStore},
    KirinukiError, KirinukiResult, ManifestResolver, ProcessId, ResolvedManifest,
};

use crate::common::{
    config, downloader, host, init_test_tracing, merged_body, scratch_entries, FixedSampler,
    RecordingStore, ScriptedFetcher, StaticResolver,
};

struct BrokenResolver;

impl ManifestResolver for BrokenResolver {
    async fn resolve(&self, url: &str) -> KirinukiResult<ResolvedManifest> {
        Err(KirinukiError::Manifest(format!("failed to fetch {url}: HTTP 404")))
    }
}

/// Leaves a half written file behind, then fails like a crashed ffmpeg.
struct CrashingTranscoder;

impl Transcoder for CrashingTranscoder {
    async fn concat(&self, _inputs: &[PathBuf], output: &Path) -> KirinukiResult<()> {
        tokio::fs::write(output, b"half").await?;
        Err(KirinukiError::Transcode("exit status 1".to_string()))
    }

    async fn transcode(&self, _args: &[OsString]) -> KirinukiResult<()> {
        Err(KirinukiError::Transcode("unsupported".to_string()))
    }
}

#[tokio::test]
async fn test_permanent_failure_cleans_up() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fetcher = Arc::new(ScriptedFetcher::new(Duration::from_millis(5)).fail_always(3));
    let store = RecordingStore::default();
    let downloader = downloader(
        StaticResolver::numbered(6),
        fetcher.clone(),
        store.clone(),
        config(dir.path()),
        FixedSampler::neutral(),
    );

    let process_id = ProcessId::from("broken");
    let result = downloader
        .download(&process_id, "https://example.com/index.m3u8", "broken")
        .await;

    let failed = match result {
        Err(KirinukiError::SegmentFetchFailure(failed)) => failed,
        other => panic!("expected segment failure, got {other:?}"),
    };
    assert_eq!(failed, vec![3]);
    // no retries by default
    let attempts = fetcher
        .starts
        .lock()
        .unwrap()
        .iter()
        .filter(|(index, _)| *index == 3)
        .count();
    assert_eq!(attempts, 1);

    let output = dir.path().join("out").join("broken.mp4");
    assert!(!output.exists());
    assert!(!staging_path(&output, &process_id).exists());
    assert_eq!(scratch_entries(dir.path()), 0);

    let snapshots = store.snapshots();
    let errors: Vec<_> = snapshots
        .iter()
        .filter(|s| s.status == ProgressStatus::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(snapshots.last().unwrap().status, ProgressStatus::Error);
    assert!(errors[0].message.starts_with("Error: "));
    assert!(!store.statuses().contains(&ProgressStatus::Merging));
    Ok(())
}

#[tokio::test]
async fn test_retry_recovers_transient_failure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fetcher = Arc::new(ScriptedFetcher::new(Duration::from_millis(5)).fail(2, 2));

    let mut config = config(dir.path());
    config.segment_retries = 2;
    let downloader = downloader(
        StaticResolver::numbered(4),
        fetcher.clone(),
        RecordingStore::default(),
        config,
        FixedSampler::neutral(),
    );

    let output = downloader
        .download(&"retry".into(), "https://example.com/index.m3u8", "retry")
        .await?;
    assert_eq!(tokio::fs::read_to_string(output).await?, merged_body(4));

    let attempts = fetcher
        .starts
        .lock()
        .unwrap()
        .iter()
        .filter(|(index, _)| *index == 2)
        .count();
    assert_eq!(attempts, 3);
    Ok(())
}

#[tokio::test]
async fn test_retry_budget_exhausted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fetcher = ScriptedFetcher::new(Duration::from_millis(1))
        .fail(0, 3)
        .fail_always(5);

    let mut config = config(dir.path());
    config.segment_retries = 2;
    let downloader = downloader(
        StaticResolver::numbered(6),
        fetcher,
        RecordingStore::default(),
        config,
        FixedSampler::neutral(),
    );

    let result = downloader
        .download(&"exhausted".into(), "https://example.com/index.m3u8", "exhausted")
        .await;
    assert!(matches!(
        result,
        Err(KirinukiError::SegmentFetchFailure(ref failed)) if failed == &[0, 5]
    ));
    Ok(())
}

#[tokio::test]
async fn test_manifest_failure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = RecordingStore::default();
    let downloader = downloader(
        BrokenResolver,
        ScriptedFetcher::new(Duration::ZERO),
        store.clone(),
        config(dir.path()),
        FixedSampler::neutral(),
    );

    let result = downloader
        .download(&"manifest".into(), "https://example.com/index.m3u8", "manifest")
        .await;
    assert!(matches!(result, Err(KirinukiError::Manifest(_))));
    assert_eq!(
        store.statuses(),
        vec![ProgressStatus::Queued, ProgressStatus::Error]
    );
    assert_eq!(scratch_entries(dir.path()), 0);

    let last = store.read(&"manifest".into()).await?.unwrap();
    assert!(last.message.contains("HTTP 404"));
    Ok(())
}

#[tokio::test]
async fn test_merge_failure_cleans_up() -> anyhow::Result<()> {
    init_test_tracing();
    let dir = tempfile::tempdir()?;
    let store = RecordingStore::default();
    let downloader = DownloaderBuilder::new()
        .config(config(dir.path()))
        .sampler(FixedSampler::neutral())
        .host(host())
        .build(
            StaticResolver::numbered(5),
            ScriptedFetcher::new(Duration::from_millis(1)),
            CrashingTranscoder,
            store.clone(),
        );

    let process_id = ProcessId::from("crash");
    let result = downloader
        .download(&process_id, "https://example.com/index.m3u8", "crash")
        .await;
    match result {
        Err(KirinukiError::Merge(message)) => assert!(message.contains("exit status 1")),
        other => panic!("expected merge failure, got {other:?}"),
    }

    let statuses = store.statuses();
    assert!(statuses.contains(&ProgressStatus::Merging));
    assert_eq!(
        statuses
            .iter()
            .filter(|status| **status == ProgressStatus::Error)
            .count(),
        1
    );
    assert_eq!(statuses.last(), Some(&ProgressStatus::Error));

    let output = dir.path().join("out").join("crash.mp4");
    assert!(!output.exists());
    assert!(!staging_path(&output, &process_id).exists());
    assert_eq!(scratch_entries(dir.path()), 0);
    Ok(())
}

#[tokio::test]
async fn test_failure_keeps_other_sessions_staging() -> anyhow::Result<()> {
    init_test_tracing();
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("out").join("shared.mp4");
    tokio::fs::create_dir_all(dir.path().join("out")).await?;

    // another download of the same name is merging right now
    let other = ProcessId::from("other");
    let other_staging = staging_path(&output, &other);
    tokio::fs::write(&other_staging, b"merging").await?;
    tokio::fs::write(&output, b"previous").await?;

    let failing = downloader(
        BrokenResolver,
        ScriptedFetcher::new(Duration::ZERO),
        RecordingStore::default(),
        config(dir.path()),
        FixedSampler::neutral(),
    );
    let result = failing
        .download(&"failing".into(), "https://example.com/index.m3u8", "shared")
        .await;
    assert!(matches!(result, Err(KirinukiError::Manifest(_))));

    let crashing = DownloaderBuilder::new()
        .config(config(dir.path()))
        .sampler(FixedSampler::neutral())
        .host(host())
        .build(
            StaticResolver::numbered(2),
            ScriptedFetcher::new(Duration::ZERO),
            CrashingTranscoder,
            RecordingStore::default(),
        );
    let result = crashing
        .download(&"crashing".into(), "https://example.com/index.m3u8", "shared")
        .await;
    assert!(matches!(result, Err(KirinukiError::Merge(_))));

    assert_eq!(tokio::fs::read(&other_staging).await?, b"merging");
    assert_eq!(tokio::fs::read(&output).await?, b"previous");
    Ok(())
}
