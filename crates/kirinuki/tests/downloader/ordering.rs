use std::{sync::Arc, time::Duration};

use kirinuki::progress::{ProgressStatus, ProgressStore};

use crate::common::{
    config, downloader, merged_body, scratch_entries, FixedSampler, RecordingStore,
    ScriptedFetcher, StaticResolver,
};

#[tokio::test]
async fn test_merge_follows_index_not_completion_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut fetcher = ScriptedFetcher::new(Duration::ZERO);
    for index in 0..8 {
        fetcher = fetcher.delay_for(index, Duration::from_millis((8 - index) * 25));
    }
    let fetcher = Arc::new(fetcher);

    let mut config = config(dir.path());
    config.concurrency = Some(8);
    let store = RecordingStore::default();
    let downloader = downloader(
        StaticResolver::numbered(8),
        fetcher.clone(),
        store.clone(),
        config,
        FixedSampler::neutral(),
    );

    let output = downloader
        .download(&"ordered".into(), "https://example.com/index.m3u8", "ordered")
        .await?;

    // the last segment finished first
    let completions = fetcher.completions.lock().unwrap().clone();
    assert_eq!(completions.first(), Some(&7));
    assert_eq!(completions.last(), Some(&0));

    assert_eq!(output, dir.path().join("out").join("ordered.mp4"));
    assert_eq!(tokio::fs::read_to_string(&output).await?, merged_body(8));
    assert_eq!(scratch_entries(dir.path()), 0);

    let statuses = store.statuses();
    assert_eq!(statuses.first(), Some(&ProgressStatus::Queued));
    assert_eq!(
        &statuses[statuses.len() - 2..],
        &[ProgressStatus::Merging, ProgressStatus::Complete]
    );
    Ok(())
}

#[tokio::test]
async fn test_ten_segments_with_four_workers() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fetcher = Arc::new(ScriptedFetcher::new(Duration::from_millis(50)));

    let mut config = config(dir.path());
    config.concurrency = Some(4);
    let downloader = downloader(
        StaticResolver::numbered(10),
        fetcher.clone(),
        RecordingStore::default(),
        config,
        FixedSampler::neutral(),
    );

    let start = std::time::Instant::now();
    let output = downloader
        .download(&"timing".into(), "https://example.com/index.m3u8", "timing.mp4")
        .await?;
    let elapsed = start.elapsed();

    // three waves of 50ms
    assert!(elapsed >= Duration::from_millis(150), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "{elapsed:?}");
    assert_eq!(fetcher.max_running(), 4);

    let merged = tokio::fs::metadata(&output).await?.len();
    assert_eq!(merged, merged_body(10).len() as u64);
    Ok(())
}

#[tokio::test]
async fn test_start_download_reports_under_process_id() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = kirinuki::progress::MemoryProgressStore::new();
    let downloader = Arc::new(downloader(
        StaticResolver::numbered(3),
        ScriptedFetcher::new(Duration::from_millis(5)),
        store.clone(),
        config(dir.path()),
        FixedSampler::neutral(),
    ));

    let handle = downloader.start_download("https://example.com/index.m3u8", "../../etc/clip name");
    let process_id = handle.process_id().clone();
    let output = handle.wait().await?;

    assert_eq!(output, dir.path().join("out").join("clip_name.mp4"));
    let snapshot = store.read(&process_id).await?.unwrap();
    assert_eq!(snapshot.status, ProgressStatus::Complete);
    assert_eq!(snapshot.progress, 100.);
    Ok(())
}
