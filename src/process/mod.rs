//! Engine process supervision.
//!
//! This module owns the external OpenSpace process of a session:
//!
//! - [`Supervisor`] - launch, liveness, graceful-then-forced shutdown
//! - [`LaunchCommand`] - resolved command line and child environment
//! - [`Platform`] / [`PlatformKill`] - per-platform termination capability

// ============================================================================
// Submodules
// ============================================================================

/// Platform termination capabilities.
pub mod kill;

/// Lifecycle state machine and process handle.
pub mod supervisor;

// ============================================================================
// Re-exports
// ============================================================================

pub use kill::{Platform, PlatformKill, PosixKill, WindowsKill};
pub use supervisor::{LaunchCommand, ProcessHandle, Supervisor, SupervisorState};
