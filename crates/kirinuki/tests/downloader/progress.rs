use std::{sync::Arc, time::Duration};

use kirinuki::progress::{ProgressSnapshot, ProgressStatus};

use crate::common::{
    config, downloader, FixedSampler, RecordingStore, ScriptedFetcher, StaticResolver,
};

fn downloading(snapshots: &[ProgressSnapshot]) -> Vec<&ProgressSnapshot> {
    snapshots
        .iter()
        .filter(|s| s.status == ProgressStatus::Downloading)
        .collect()
}

/// Gaps between consecutive download snapshots, in seconds of session time.
fn gaps(snapshots: &[&ProgressSnapshot]) -> Vec<f64> {
    snapshots
        .windows(2)
        .map(|pair| pair[1].elapsed_secs - pair[0].elapsed_secs)
        .collect()
}

#[tokio::test]
async fn test_snapshots_are_rate_limited() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = RecordingStore::default();

    let mut config = config(dir.path());
    config.concurrency = Some(8);
    let interval = config.progress_interval().as_secs_f64();
    // 600 segments in 75 waves of 20ms: more than 100 completions per window
    let downloader = downloader(
        StaticResolver::numbered(600),
        Arc::new(ScriptedFetcher::new(Duration::from_millis(20))),
        store.clone(),
        config,
        FixedSampler::neutral(),
    );

    downloader
        .download(&"burst".into(), "https://example.com/index.m3u8", "burst")
        .await?;

    let snapshots = store.snapshots();
    let downloading = downloading(&snapshots);
    assert!(!downloading.is_empty());

    for gap in gaps(&downloading) {
        assert!(gap >= interval - 1e-6, "snapshots {gap}s apart");
    }
    for pair in downloading.windows(2) {
        assert!(pair[1].progress >= pair[0].progress);
        assert!(pair[1].completed_segments >= pair[0].completed_segments);
    }
    for snapshot in &downloading {
        assert_eq!(snapshot.total_segments, 600);
        assert!(snapshot.throughput >= 0.);
        assert!(snapshot.message.starts_with("Downloading: "));
    }

    assert_eq!(snapshots.last().unwrap().status, ProgressStatus::Complete);
    assert_eq!(snapshots.last().unwrap().progress, 100.);
    Ok(())
}

#[tokio::test]
async fn test_snapshots_follow_tick_cadence() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = RecordingStore::default();

    let mut config = config(dir.path());
    config.concurrency = Some(2);
    let interval = config.progress_interval().as_secs_f64();
    // 120 waves of 30ms: at least 3.6s, so ticks at 0.5s .. 3.5s
    let downloader = downloader(
        StaticResolver::numbered(240),
        Arc::new(ScriptedFetcher::new(Duration::from_millis(30))),
        store.clone(),
        config,
        FixedSampler::neutral(),
    );

    downloader
        .download(&"cadence".into(), "https://example.com/index.m3u8", "cadence")
        .await?;

    let snapshots = store.snapshots();
    let downloading = downloading(&snapshots);
    assert!(
        downloading.len() >= 6,
        "only {} download snapshots",
        downloading.len()
    );

    let gaps = gaps(&downloading);
    for gap in &gaps {
        assert!(*gap >= interval - 1e-6, "snapshots {gap}s apart");
    }
    let on_time = gaps
        .iter()
        .filter(|gap| (**gap - interval).abs() < 1e-6)
        .count();
    assert!(on_time + 1 >= gaps.len(), "gaps {gaps:?}");
    Ok(())
}
