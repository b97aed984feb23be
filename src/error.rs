//! Error types for the OpenSpace driver.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use openspace_driver::{Result, Error};
//!
//! async fn example(session: &mut Session) -> Result<()> {
//!     session.set_time("2024-01-01T00:00:00").await?;
//!     session.wait_for_idle().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Recoverable |
//! |----------|----------|-------------|
//! | Parsing | [`Error::MalformedCall`] | yes — log and skip the command |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionRefused`], [`Error::Transport`], [`Error::RetriesExhausted`] | yes — retry/backoff |
//! | Lifecycle | [`Error::ProcessLaunchFailed`], [`Error::ForceQuitExceeded`] | no — abort the session |
//! | Artifacts | [`Error::ArtifactMissing`] | yes — log, session continues |
//! | Logic | [`Error::Lifecycle`] | no — caller bug, not a transport fault |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Config`] | varies |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Parsing Errors
    // ========================================================================
    /// Scripting call string could not be parsed.
    ///
    /// Returned when a call expression is missing parentheses or is
    /// otherwise not of the form `name(arg, ...)`. The caller logs the
    /// offending command and skips it.
    #[error("Malformed scripting call: {script}")]
    MalformedCall {
        /// The offending call text.
        script: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid (bad control URL,
    /// empty application path, ...).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection attempt timed out.
    ///
    /// A connection to the engine exists but did not complete in time,
    /// typically during a long startup or asset sync.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection refused by the peer.
    ///
    /// The engine is not listening yet (or no longer listening).
    #[error("Connection refused")]
    ConnectionRefused,

    /// Any other transport-level failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport error.
        message: String,
    },

    /// All connection attempts were used up without a successful send.
    ///
    /// This is a reported condition, never a crash: the caller decides
    /// whether the session can proceed.
    #[error("Connection retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Total attempts made (initial + retries).
        attempts: u32,
    },

    // ========================================================================
    // Process Lifecycle Errors
    // ========================================================================
    /// Failed to launch the OpenSpace process.
    ///
    /// Fatal to the session.
    #[error("Failed to launch OpenSpace: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// Forced-termination escalation bound exceeded.
    ///
    /// The process survived the graceful quit and the bounded number of
    /// kill escalations. Fatal: the session must abort with a non-zero
    /// status rather than hang.
    #[error("Failed to force-quit OpenSpace after {attempts} attempts")]
    ForceQuitExceeded {
        /// Number of kill escalations attempted.
        attempts: u32,
    },

    /// Operation attempted in the wrong lifecycle state.
    ///
    /// E.g. sending control traffic after the process is confirmed dead.
    /// This is a logic bug in the caller, not a transport fault.
    #[error("Lifecycle error: {message}")]
    Lifecycle {
        /// Description of the state violation.
        message: String,
    },

    // ========================================================================
    // Artifact Errors
    // ========================================================================
    /// Expected screenshot artifact was not produced.
    ///
    /// Recoverable: logged, the session continues.
    #[error("Screenshot artifact missing: {path}")]
    ArtifactMissing {
        /// Path where the artifact was expected.
        path: PathBuf,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a malformed-call error.
    #[inline]
    pub fn malformed_call(script: impl Into<String>) -> Self {
        Self::MalformedCall {
            script: script.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a retries-exhausted error.
    #[inline]
    pub fn retries_exhausted(attempts: u32) -> Self {
        Self::RetriesExhausted { attempts }
    }

    /// Creates a process launch failure from the spawn error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a force-quit-exceeded error.
    #[inline]
    pub fn force_quit_exceeded(attempts: u32) -> Self {
        Self::ForceQuitExceeded { attempts }
    }

    /// Creates a lifecycle error.
    #[inline]
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    /// Creates an artifact-missing error.
    #[inline]
    pub fn artifact_missing(path: impl Into<PathBuf>) -> Self {
        Self::ArtifactMissing { path: path.into() }
    }
}

// ============================================================================
// Error Classification
// ============================================================================

impl Error {
    /// Classifies a tungstenite error into the crate's transport taxonomy.
    ///
    /// Connection-refused IO errors map to [`Error::ConnectionRefused`];
    /// everything else is a generic [`Error::Transport`].
    #[must_use]
    pub fn from_ws(err: WsError) -> Self {
        match err {
            WsError::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
                Self::ConnectionRefused
            }
            other => Self::transport(other.to_string()),
        }
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::ConnectionRefused
                | Self::Transport { .. }
                | Self::RetriesExhausted { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors are logged and reported; the session continues
    /// or retries. Everything else aborts the session.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedCall { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionRefused
                | Self::Transport { .. }
                | Self::RetriesExhausted { .. }
                | Self::ArtifactMissing { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is fatal to the session.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProcessLaunchFailed { .. } | Self::ForceQuitExceeded { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::malformed_call("openspace.time.setPause");
        assert_eq!(
            err.to_string(),
            "Malformed scripting call: openspace.time.setPause"
        );
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = Error::retries_exhausted(3);
        assert_eq!(
            err.to_string(),
            "Connection retries exhausted after 3 attempts"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::malformed_call("x").is_recoverable());
        assert!(Error::ConnectionRefused.is_recoverable());
        assert!(Error::artifact_missing("/tmp/missing.png").is_recoverable());
        assert!(!Error::force_quit_exceeded(4).is_recoverable());
        assert!(!Error::lifecycle("send after stop").is_recoverable());
    }

    #[test]
    fn test_is_fatal() {
        let io = IoError::new(ErrorKind::NotFound, "no such file");
        assert!(Error::process_launch_failed(io).is_fatal());
        assert!(Error::force_quit_exceeded(4).is_fatal());
        assert!(!Error::ConnectionRefused.is_fatal());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection_timeout(10_000).is_connection_error());
        assert!(Error::ConnectionRefused.is_connection_error());
        assert!(Error::transport("broken pipe").is_connection_error());
        assert!(!Error::config("bad url").is_connection_error());
    }

    #[test]
    fn test_from_ws_refused() {
        let io = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err = Error::from_ws(WsError::Io(io));
        assert!(matches!(err, Error::ConnectionRefused));
    }

    #[test]
    fn test_from_ws_other() {
        let err = Error::from_ws(WsError::AttackAttempt);
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
