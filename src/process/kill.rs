//! Platform-specific process termination.
//!
//! Forced shutdown differs per platform: POSIX systems get a terminate
//! signal followed by a kill signal, windows gets `taskkill` in its polite
//! and forced forms. The [`PlatformKill`] trait captures that capability so
//! the supervisor selects one variant at construction and stays free of
//! OS branching.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Child;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Wait between the polite and the forced termination step.
const INTER_SIGNAL_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Platform
// ============================================================================

/// Supported host platform families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux, macOS, and other POSIX-like systems.
    Posix,
    /// Windows.
    Windows,
}

impl Platform {
    /// Detects the platform this binary was built for.
    #[inline]
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Returns the platform name used in artifact paths and logs.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Windows => "windows",
        }
    }

    /// Creates the kill capability for this platform.
    #[must_use]
    pub fn killer(self) -> Box<dyn PlatformKill> {
        match self {
            Self::Posix => Box::new(PosixKill),
            Self::Windows => Box::new(WindowsKill),
        }
    }
}

// ============================================================================
// PlatformKill
// ============================================================================

/// Process-table liveness and forced termination for one platform family.
#[async_trait]
pub trait PlatformKill: Send + Sync {
    /// Returns `true` if `pid` is present in the OS process table.
    fn is_pid_alive(&self, pid: u32) -> bool;

    /// Forcibly terminates the process: polite signal, short persist check,
    /// then the hard kill if it survived.
    ///
    /// Signal delivery problems are logged, not propagated; the caller
    /// re-checks liveness after its settle period.
    async fn terminate(&self, child: &mut Child, pid: u32) -> Result<()>;
}

// ============================================================================
// PosixKill
// ============================================================================

/// POSIX variant: SIGTERM, then SIGKILL.
pub struct PosixKill;

#[async_trait]
impl PlatformKill for PosixKill {
    fn is_pid_alive(&self, pid: u32) -> bool {
        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;
            // Signal 0 probes existence without delivering anything.
            kill(Pid::from_raw(pid as i32), None).is_ok()
        }
        #[cfg(not(unix))]
        {
            let _ = pid;
            false
        }
    }

    async fn terminate(&self, child: &mut Child, pid: u32) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;
            debug!(pid, "sending SIGTERM");
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!(pid, error = %e, "SIGTERM delivery failed");
            }
        }

        sleep(INTER_SIGNAL_DELAY).await;

        if self.is_pid_alive(pid) {
            debug!(pid, "process survived SIGTERM, sending SIGKILL");
            if let Err(e) = child.start_kill() {
                warn!(pid, error = %e, "SIGKILL delivery failed");
            }
        }
        Ok(())
    }
}

// ============================================================================
// WindowsKill
// ============================================================================

/// Windows variant: `taskkill`, then `taskkill /F /T`.
pub struct WindowsKill;

#[async_trait]
impl PlatformKill for WindowsKill {
    fn is_pid_alive(&self, pid: u32) -> bool {
        // tasklist prints a header-free row per matching process; an empty
        // filter result reports an info message instead.
        let output = std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {pid}"), "/NH"])
            .output();
        match output {
            Ok(out) => String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()),
            Err(e) => {
                warn!(pid, error = %e, "tasklist query failed");
                false
            }
        }
    }

    async fn terminate(&self, child: &mut Child, pid: u32) -> Result<()> {
        debug!(pid, "requesting taskkill");
        let polite = tokio::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string()])
            .output()
            .await;
        if let Err(e) = polite {
            debug!(pid, error = %e, "polite taskkill failed");
        }

        sleep(INTER_SIGNAL_DELAY).await;

        if self.is_pid_alive(pid) {
            debug!(pid, "process survived taskkill, forcing");
            let forced = tokio::process::Command::new("taskkill")
                .args(["/PID", &pid.to_string(), "/T", "/F"])
                .output()
                .await;
            if let Err(e) = forced {
                warn!(pid, error = %e, "forced taskkill failed");
            }
            if let Err(e) = child.start_kill() {
                debug!(pid, error = %e, "local kill after taskkill failed");
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_current_matches_build_target() {
        let platform = Platform::current();
        if cfg!(windows) {
            assert_eq!(platform, Platform::Windows);
        } else {
            assert_eq!(platform, Platform::Posix);
        }
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Posix.as_str(), "posix");
        assert_eq!(Platform::Windows.as_str(), "windows");
    }

    #[cfg(unix)]
    #[test]
    fn test_posix_liveness_own_process() {
        let killer = PosixKill;
        assert!(killer.is_pid_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_posix_terminate_ends_child() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let pid = child.id().expect("child pid");

        let killer = PosixKill;
        assert!(killer.is_pid_alive(pid));
        killer.terminate(&mut child, pid).await.expect("terminate");

        let status = child.wait().await.expect("wait");
        assert!(!status.success());
    }
}
