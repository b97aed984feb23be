//! Session orchestration.
//!
//! This module composes parser, codec, transport, and supervisor into one
//! end-to-end scenario run:
//!
//! - [`Session`] - the orchestrator
//! - [`SessionConfig`] - immutable per-session configuration
//! - [`ScenarioStep`] - one instruction of a recorded scenario
//! - [`LogSink`] - the append-only timestamped session log

// ============================================================================
// Submodules
// ============================================================================

/// Session configuration and derived paths.
pub mod config;

/// The session orchestrator.
pub mod core;

/// Append-only session log.
pub mod log;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{DEFAULT_PROFILE, SCREENSHOT_FOLDER, SYNC_ENV_VAR, SessionConfig};
pub use core::{ScenarioStep, Session};
pub use log::LogSink;
