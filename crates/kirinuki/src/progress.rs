mod aggregator;
pub mod file;
pub mod memory;
mod snapshot;

pub use aggregator::ProgressAggregator;
pub use file::FileProgressStore;
pub use memory::MemoryProgressStore;
pub use snapshot::*;

use crate::{error::KirinukiResult, ProcessId};
use std::{future::Future, sync::Arc};

/// Keyed store holding the latest [ProgressSnapshot] of every job.
///
/// Writes overwrite: readers only ever see the most recent snapshot.
pub trait ProgressStore: Send + Sync + 'static {
    fn write(
        &self,
        process_id: &ProcessId,
        snapshot: &ProgressSnapshot,
    ) -> impl Future<Output = KirinukiResult<()>> + Send;

    /// Latest snapshot, or `None` if nothing was written for this id.
    fn read(
        &self,
        process_id: &ProcessId,
    ) -> impl Future<Output = KirinukiResult<Option<ProgressSnapshot>>> + Send;

    /// Forget the snapshot of this id.
    fn clear(&self, process_id: &ProcessId) -> impl Future<Output = KirinukiResult<()>> + Send;
}

impl<P> ProgressStore for Arc<P>
where
    P: ProgressStore,
{
    fn write(
        &self,
        process_id: &ProcessId,
        snapshot: &ProgressSnapshot,
    ) -> impl Future<Output = KirinukiResult<()>> + Send {
        self.as_ref().write(process_id, snapshot)
    }

    fn read(
        &self,
        process_id: &ProcessId,
    ) -> impl Future<Output = KirinukiResult<Option<ProgressSnapshot>>> + Send {
        self.as_ref().read(process_id)
    }

    fn clear(&self, process_id: &ProcessId) -> impl Future<Output = KirinukiResult<()>> + Send {
        self.as_ref().clear(process_id)
    }
}

/// Write a snapshot. Store failures are logged, not returned.
pub(crate) async fn report<P>(store: &P, process_id: &ProcessId, snapshot: ProgressSnapshot)
where
    P: ProgressStore,
{
    tracing::debug!(
        "[{process_id}] {:?} {:.1}% {}",
        snapshot.status,
        snapshot.progress,
        snapshot.message
    );
    if let Err(e) = store.write(process_id, &snapshot).await {
        tracing::warn!("[{process_id}] Failed to write progress: {e}");
    }
}
