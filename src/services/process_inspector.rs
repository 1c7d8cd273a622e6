use std::time::{Duration, SystemTime, UNIX_EPOCH};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

use crate::models::{MemoryUsage, ProcessInfo};

/// Outcome of asking the OS about one pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inspection {
    Found(ProcessInfo),
    NotFound,
    AccessDenied,
}

/// Access to the OS process table.
pub trait ProcessInspector {
    /// Resolves `pid` to a live process. Memory is read only when
    /// `with_memory` is set, since it is the costlier query.
    fn inspect(&mut self, pid: u32, with_memory: bool) -> Inspection;
}

/// Process table lookups through sysinfo, refreshing only the requested pid.
pub struct SysinfoInspector {
    system: System,
}

impl SysinfoInspector {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInspector for SysinfoInspector {
    fn inspect(&mut self, pid: u32, with_memory: bool) -> Inspection {
        let sysinfo_pid = Pid::from_u32(pid);
        let refresh_kind = if with_memory {
            ProcessRefreshKind::nothing().with_memory()
        } else {
            ProcessRefreshKind::nothing()
        };
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sysinfo_pid]),
            true,
            refresh_kind,
        );

        let Some(process) = self.system.process(sysinfo_pid) else {
            return classify_missing(pid);
        };

        // an unreaped child is not a running service
        if process.status() == ProcessStatus::Zombie {
            log::debug!("pid {} is a zombie", pid);
            return Inspection::NotFound;
        }

        let memory = with_memory.then(|| MemoryUsage {
            rss_bytes: process.memory(),
            shared_bytes: shared_memory_bytes(pid).unwrap_or(0),
        });

        let start_time = precise_start_time(pid)
            .unwrap_or_else(|| UNIX_EPOCH + Duration::from_secs(process.start_time()));

        Inspection::Found(ProcessInfo { start_time, memory })
    }
}

/// sysinfo hides permission failures, so ask procfs why the pid is missing.
#[cfg(target_os = "linux")]
fn classify_missing(pid: u32) -> Inspection {
    use procfs::ProcError;

    let Ok(raw_pid) = i32::try_from(pid) else {
        return Inspection::NotFound;
    };
    match procfs::process::Process::new(raw_pid) {
        Err(ProcError::PermissionDenied(_)) => Inspection::AccessDenied,
        _ => Inspection::NotFound,
    }
}

#[cfg(not(target_os = "linux"))]
fn classify_missing(_pid: u32) -> Inspection {
    Inspection::NotFound
}

/// sysinfo truncates start times to whole seconds. The stat start tick
/// measured against /proc/uptime keeps the sub-second part.
#[cfg(target_os = "linux")]
fn precise_start_time(pid: u32) -> Option<SystemTime> {
    use procfs::{Current, Uptime};

    let process = procfs::process::Process::new(i32::try_from(pid).ok()?).ok()?;
    let start_ticks = process.stat().ok()?.starttime;
    let uptime = Uptime::current().ok()?;
    let now = SystemTime::now();

    let ticks_per_second = procfs::ticks_per_second();
    if ticks_per_second == 0 {
        return None;
    }
    let started_after_boot = Duration::from_millis(
        start_ticks.saturating_mul(1000) / ticks_per_second,
    );
    let age = Duration::try_from_secs_f64(uptime.uptime)
        .ok()?
        .saturating_sub(started_after_boot);
    now.checked_sub(age)
}

#[cfg(not(target_os = "linux"))]
fn precise_start_time(_pid: u32) -> Option<SystemTime> {
    None
}

/// Shared resident pages from /proc/<pid>/statm.
#[cfg(target_os = "linux")]
fn shared_memory_bytes(pid: u32) -> Option<u64> {
    let process = procfs::process::Process::new(i32::try_from(pid).ok()?).ok()?;
    let statm = process.statm().ok()?;
    Some(statm.shared * procfs::page_size())
}

#[cfg(not(target_os = "linux"))]
fn shared_memory_bytes(_pid: u32) -> Option<u64> {
    None
}
