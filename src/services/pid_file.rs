use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::PidFileError;

/// Reads the process id stored in `path`.
pub fn read_pid_file(path: &Path) -> Result<u32, PidFileError> {
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PidFileError::Missing,
        _ => PidFileError::Unreadable(e),
    })?;
    parse_pid(&raw)
}

/// The whole trimmed content must be a base-10 non-negative integer.
pub fn parse_pid(raw: &str) -> Result<u32, PidFileError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(PidFileError::Empty);
    }
    // `str::parse` would also take a leading '+'
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PidFileError::Malformed(value.to_string()));
    }
    value
        .parse::<u32>()
        .map_err(|_| PidFileError::Malformed(value.to_string()))
}
