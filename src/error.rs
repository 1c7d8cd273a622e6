use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while configuring or sampling tracked processes.
///
/// Only `Configuration` and `EmptyRegistry` ever reach the host. Per-target
/// variants are absorbed inside a sampling cycle and turned into a `Down`
/// transition.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid configuration: {details}")]
    Configuration { details: String },

    #[error("no pid files have been configured")]
    EmptyRegistry,

    #[error("pid file {path} is unusable: {source}")]
    TargetUnreadable {
        path: PathBuf,
        #[source]
        source: PidFileError,
    },

    #[error("pid {pid} does not point at a running process: {reason}")]
    ProcessResolution { pid: u32, reason: &'static str },

    #[error("IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackerError {
    pub fn config(details: impl Into<String>) -> Self {
        Self::Configuration {
            details: details.into(),
        }
    }

    /// Whether the failure deserves a warning rather than a debug line.
    ///
    /// A missing pid file or a dead process is the normal state of a stopped
    /// service; malformed pid file content is not.
    pub fn is_warning(&self) -> bool {
        match self {
            Self::TargetUnreadable { source, .. } => !matches!(source, PidFileError::Missing),
            Self::ProcessResolution { .. } => false,
            _ => true,
        }
    }
}

/// Why a pid file could not be turned into a process id.
#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("pid file does not exist")]
    Missing,

    #[error("pid file could not be read: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("pidfile contains no pid")]
    Empty,

    #[error("pidfile contains bad pid, value={0}")]
    Malformed(String),
}
