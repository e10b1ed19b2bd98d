use serde::{Deserialize, Serialize};

use crate::load::{HostResources, LoadSample};

const GIB: u64 = 1024 * 1024 * 1024;

/// Thresholds for growing and shrinking the worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizePolicy {
    /// Shrink when CPU usage is above this percentage.
    pub high_cpu: f32,
    /// Shrink when memory usage is above this percentage.
    pub high_memory: f32,
    /// Grow only when CPU usage is below this percentage...
    pub low_cpu: f32,
    /// ...and memory usage is below this one.
    pub low_memory: f32,
    pub shrink_step: usize,
    pub grow_step: usize,
    pub min_capacity: usize,
    pub max_capacity: usize,
    /// Lower bound of the initial capacity.
    pub min_initial_capacity: usize,
    /// Initial capacity is halved below this amount of available memory.
    pub low_memory_bytes: u64,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            high_cpu: 80.,
            high_memory: 80.,
            low_cpu: 50.,
            low_memory: 60.,
            shrink_step: 4,
            grow_step: 2,
            min_capacity: 4,
            max_capacity: 32,
            min_initial_capacity: 8,
            low_memory_bytes: 4 * GIB,
        }
    }
}

impl ResizePolicy {
    /// `min(max, max(min_initial, cores * 4))`, where `cores * 4` is halved on low memory hosts.
    pub fn initial_capacity(&self, host: HostResources) -> usize {
        let mut workers = host.cpu_cores.max(1) * 4;
        if host.available_memory < self.low_memory_bytes {
            workers /= 2;
        }
        workers
            .max(self.min_initial_capacity)
            .min(self.max_capacity)
            .max(1)
    }

    /// Capacity after observing `sample`. Never shrinks below `min_capacity`
    /// and never grows above `max_capacity`, but leaves a capacity that is
    /// already outside those bounds untouched in the opposite direction.
    pub fn next_capacity(&self, current: usize, sample: LoadSample) -> usize {
        if sample.cpu_percent > self.high_cpu || sample.memory_percent > self.high_memory {
            current
                .saturating_sub(self.shrink_step)
                .max(self.min_capacity)
                .min(current)
        } else if sample.cpu_percent < self.low_cpu && sample.memory_percent < self.low_memory {
            (current + self.grow_step)
                .min(self.max_capacity)
                .max(current)
        } else {
            current
        }
    }
}
