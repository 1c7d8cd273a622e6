use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::error::TrackerError;
use crate::models::stats::MemoryUsage;

/// A tracked pid file and its sampling options. Fixed once registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    /// File expected to hold the process id
    pub pid_file: PathBuf,

    /// Plugin instance used to tag every emitted value
    pub label: String,

    /// Whether rss / shared memory should be sampled at all
    #[serde(default)]
    pub collect_memory_stats: bool,

    /// Seconds between memory samples, relative to the global interval
    #[serde(default)]
    pub memory_stats_interval: Option<u64>,
}

impl Target {
    pub fn new(pid_file: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            pid_file: pid_file.into(),
            label: label.into(),
            collect_memory_stats: false,
            memory_stats_interval: None,
        }
    }

    pub fn with_memory_stats(mut self, interval: Option<u64>) -> Self {
        self.collect_memory_stats = true;
        self.memory_stats_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.pid_file.as_os_str().is_empty() {
            return Err(TrackerError::config(format!(
                "PidFile for \"{}\" has an empty path",
                self.label
            )));
        }
        if self.label.trim().is_empty() {
            return Err(TrackerError::config(format!(
                "PidFile {} is missing its plugin instance",
                self.pid_file.display()
            )));
        }
        if self.memory_stats_interval == Some(0) {
            return Err(TrackerError::config(format!(
                "PidFile {} has a zero memory stats interval",
                self.pid_file.display()
            )));
        }
        Ok(())
    }
}

/// Liveness, uptime and memory of one target.
///
/// Fields are private so that a target that is not running always reports
/// zero uptime and zero memory.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TargetState {
    running: bool,
    pid: Option<u32>,
    uptime_millis: u64,
    rss_bytes: u64,
    shared_mem_bytes: u64,
    #[serde(skip)]
    memory_sampled: bool,
    #[serde(skip)]
    pub(crate) interval_counter: u64,
}

impl TargetState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn uptime_millis(&self) -> u64 {
        self.uptime_millis
    }

    pub fn rss_bytes(&self) -> u64 {
        self.rss_bytes
    }

    pub fn shared_mem_bytes(&self) -> u64 {
        self.shared_mem_bytes
    }

    /// True when memory was recorded during the current tick.
    pub fn memory_sampled(&self) -> bool {
        self.memory_sampled
    }

    pub fn set_down(&mut self) {
        *self = Self::default();
    }

    /// Marks the target as running. Uptime is derived from the fixed start
    /// time on every call, never accumulated.
    pub fn set_up(&mut self, pid: u32, start_time: SystemTime, now: SystemTime) {
        self.running = true;
        self.pid = Some(pid);
        self.uptime_millis = uptime_between(start_time, now);
        self.rss_bytes = 0;
        self.shared_mem_bytes = 0;
        self.memory_sampled = false;
    }

    /// Ignored unless the target is running.
    pub fn record_memory(&mut self, usage: MemoryUsage) {
        if !self.running {
            return;
        }
        self.rss_bytes = usage.rss_bytes;
        self.shared_mem_bytes = usage.shared_bytes;
        self.memory_sampled = true;
    }
}

/// Milliseconds from `start` to `now`, clamped to zero if the clock went backwards.
pub fn uptime_between(start: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(start)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// One registry entry.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedTarget {
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub state: TargetState,
}

impl TrackedTarget {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            state: TargetState::default(),
        }
    }
}
