use std::sync::Mutex;

use sysinfo::System;

/// Utilization of the host, both values in percent (`0.0..=100.0`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

impl LoadSample {
    pub fn new(cpu_percent: f32, memory_percent: f32) -> Self {
        Self {
            cpu_percent,
            memory_percent,
        }
    }
}

pub trait LoadSampler: Send + Sync + 'static {
    /// Take a reading. Must be cheap enough to call every couple of seconds.
    fn sample(&self) -> LoadSample;
}

/// Samples the current machine through `sysinfo`.
///
/// CPU usage is computed between two consecutive refreshes, so the reading
/// covers the period since the previous call.
pub struct SystemLoadSampler {
    system: Mutex<System>,
}

impl SystemLoadSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemLoadSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSampler for SystemLoadSampler {
    fn sample(&self) -> LoadSample {
        let Ok(mut system) = self.system.lock() else {
            return LoadSample::default();
        };
        system.refresh_cpu_usage();
        system.refresh_memory();

        let total = system.total_memory();
        let memory_percent = if total == 0 {
            0.
        } else {
            let used = total.saturating_sub(system.available_memory());
            used as f32 / total as f32 * 100.
        };

        LoadSample {
            cpu_percent: system.global_cpu_usage(),
            memory_percent,
        }
    }
}

impl<L> LoadSampler for std::sync::Arc<L>
where
    L: LoadSampler,
{
    fn sample(&self) -> LoadSample {
        self.as_ref().sample()
    }
}

/// Static facts about the host used to pick the initial pool capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostResources {
    pub cpu_cores: usize,
    /// Available memory in bytes.
    pub available_memory: u64,
}

impl HostResources {
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            cpu_cores: num_cpus::get(),
            available_memory: system.available_memory(),
        }
    }
}
