use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{ProgressSnapshot, ProgressStore};
use crate::{error::KirinukiResult, ProcessId};

/// Process-local progress store.
#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    snapshots: Arc<Mutex<HashMap<ProcessId, ProgressSnapshot>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Arc<Mutex<HashMap<ProcessId, ProgressSnapshot>>> {
        self.snapshots
    }
}

impl ProgressStore for MemoryProgressStore {
    async fn write(&self, process_id: &ProcessId, snapshot: &ProgressSnapshot) -> KirinukiResult<()> {
        let mut snapshots = self
            .snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        snapshots.insert(process_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn read(&self, process_id: &ProcessId) -> KirinukiResult<Option<ProgressSnapshot>> {
        let snapshots = self
            .snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(snapshots.get(process_id).cloned())
    }

    async fn clear(&self, process_id: &ProcessId) -> KirinukiResult<()> {
        let mut snapshots = self
            .snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        snapshots.remove(process_id);
        Ok(())
    }
}
