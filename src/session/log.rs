//! Append-only session log.
//!
//! Every significant session action is recorded as one timestamped line in
//! an append-only file, alongside the crate's `tracing` diagnostics. The
//! file format is `<timestamp>  <message>` with platform-appropriate line
//! termination; downstream tooling attaches it to submitted test results.

// ============================================================================
// Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::process::Platform;

// ============================================================================
// LogSink
// ============================================================================

/// Appends timestamped lines to the session log file.
///
/// The file is opened per append, so concurrent external readers always see
/// complete lines. Write failures are reported through `tracing` and never
/// interrupt the session.
#[derive(Debug, Clone)]
pub struct LogSink {
    /// Log file path.
    path: PathBuf,
    /// Platform deciding the line termination.
    platform: Platform,
}

impl LogSink {
    /// Creates a sink writing to `path`.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            path: path.into(),
            platform,
        }
    }

    /// Returns the log file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped message line.
    pub fn append(&self, message: &str) {
        info!("{message}");

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let terminator = match self.platform {
            Platform::Windows => "\r\n",
            Platform::Posix => "\n",
        };
        let line = format!("{timestamp}  {message}{terminator}");

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "session log append failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_append_writes_timestamped_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.log");
        let sink = LogSink::new(&path, Platform::Posix);

        sink.append("Started OpenSpace instance with ID 4242");

        let content = std::fs::read_to_string(&path).expect("read log");
        let line = content.strip_suffix('\n').expect("newline terminated");
        let (timestamp, message) = line.split_once("  ").expect("two-space separator");
        assert_eq!(message, "Started OpenSpace instance with ID 4242");
        // e.g. "2024-06-01 12:34:56"
        assert_eq!(timestamp.len(), 19);
        assert_eq!(&timestamp[4..5], "-");
        assert_eq!(&timestamp[13..14], ":");
    }

    #[test]
    fn test_append_accumulates_lines() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.log");
        let sink = LogSink::new(&path, Platform::Posix);

        sink.append("first");
        sink.append("second");

        let content = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_windows_line_termination() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.log");
        let sink = LogSink::new(&path, Platform::Windows);

        sink.append("quit message");

        let content = std::fs::read_to_string(&path).expect("read log");
        assert!(content.ends_with("\r\n"));
    }

    #[test]
    fn test_append_failure_does_not_panic() {
        let sink = LogSink::new("/nonexistent-dir/deeper/session.log", Platform::Posix);
        sink.append("goes nowhere");
    }
}
