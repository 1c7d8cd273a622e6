use serde::Serialize;
use std::time::SystemTime;

/// Memory footprint of one process, in bytes.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Resident set size
    pub rss_bytes: u64,

    /// Resident pages shared with other processes
    pub shared_bytes: u64,
}

/// What the OS reports about a live process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Wall-clock time at which the process was created
    pub start_time: SystemTime,

    /// Only present when memory was requested
    pub memory: Option<MemoryUsage>,
}
