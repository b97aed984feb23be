//! Engine process lifecycle supervision.
//!
//! The supervisor owns the one OpenSpace process of a session and moves it
//! through an explicit state machine:
//!
//! ```text
//! NotStarted --launch()--> Running --quit()--> Stopping --confirmed--> Stopped
//!                             |                                          ^
//!                             +---------------forced kill---------------+
//! ```
//!
//! Shutdown is graceful-then-forced: a quit command over the control
//! channel, a grace period, then bounded kill escalation through the
//! platform capability. Exceeding the escalation bound is fatal to the
//! session; the alternative is hanging forever on a wedged renderer.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::EngineCommand;
use crate::transport::TransportClient;

use super::kill::{Platform, PlatformKill};

// ============================================================================
// Constants
// ============================================================================

/// Wait after spawning before any control traffic; the control socket is
/// not listening instantly.
const STARTUP_DELAY: Duration = Duration::from_secs(1);

/// Grace period after the quit command before checking liveness.
const QUIT_GRACE: Duration = Duration::from_secs(5);

/// Settle period after a forced termination before the next liveness check.
const KILL_SETTLE: Duration = Duration::from_secs(4);

/// Maximum kill escalations before the session gives up.
const MAX_FORCE_QUIT_ATTEMPTS: u32 = 3;

// ============================================================================
// SupervisorState
// ============================================================================

/// Lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    /// No process has been launched.
    #[default]
    NotStarted,
    /// The process is (believed) running.
    Running,
    /// Graceful shutdown is in progress.
    Stopping,
    /// The process is confirmed dead; no further sends are allowed.
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ============================================================================
// LaunchCommand
// ============================================================================

/// Fully resolved launch instruction for the engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Absolute path of the executable.
    pub program: PathBuf,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Environment variables set on the child only.
    pub envs: Vec<(String, String)>,
}

impl LaunchCommand {
    /// Creates a launch command with no arguments.
    #[inline]
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Appends an argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds a child-only environment variable.
    #[inline]
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Renders the command for logging.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

// ============================================================================
// ProcessHandle
// ============================================================================

/// Handle of the supervised OS process.
///
/// Created on launch, owned exclusively by the supervisor, and invalidated
/// once termination is confirmed.
pub struct ProcessHandle {
    /// Child process handle.
    child: Child,
    /// Recorded process identifier.
    pid: u32,
    /// Command line the process was launched with.
    launch_command: LaunchCommand,
}

impl ProcessHandle {
    /// Returns the recorded process identifier.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the launch command.
    #[inline]
    #[must_use]
    pub fn launch_command(&self) -> &LaunchCommand {
        &self.launch_command
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Launches and supervises the engine process.
pub struct Supervisor {
    /// Host platform, fixed at construction.
    platform: Platform,
    /// Platform kill capability, fixed at construction.
    killer: Box<dyn PlatformKill>,
    /// Current lifecycle state.
    state: SupervisorState,
    /// Live process handle, if any.
    handle: Option<ProcessHandle>,
    /// Post-spawn delay before control traffic.
    startup_delay: Duration,
    /// Grace period after the quit command.
    quit_grace: Duration,
    /// Settle period after each forced termination.
    kill_settle: Duration,
    /// Escalation bound.
    max_force_quit_attempts: u32,
}

// ============================================================================
// Supervisor - Construction
// ============================================================================

impl Supervisor {
    /// Creates a supervisor for the given platform.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            killer: platform.killer(),
            state: SupervisorState::NotStarted,
            handle: None,
            startup_delay: STARTUP_DELAY,
            quit_grace: QUIT_GRACE,
            kill_settle: KILL_SETTLE,
            max_force_quit_attempts: MAX_FORCE_QUIT_ATTEMPTS,
        }
    }

    /// Overrides the post-spawn delay.
    #[inline]
    #[must_use]
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Overrides the quit grace period.
    #[inline]
    #[must_use]
    pub fn with_quit_grace(mut self, grace: Duration) -> Self {
        self.quit_grace = grace;
        self
    }

    /// Overrides the kill settle period.
    #[inline]
    #[must_use]
    pub fn with_kill_settle(mut self, settle: Duration) -> Self {
        self.kill_settle = settle;
        self
    }

    /// Returns the platform the supervisor was built for.
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Returns the supervised process id, if a handle is live.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().map(ProcessHandle::pid)
    }
}

// ============================================================================
// Supervisor - Lifecycle
// ============================================================================

impl Supervisor {
    /// Launches the engine process and transitions to `Running`.
    ///
    /// Applies the fixed post-spawn delay before returning, since the
    /// control socket is not guaranteed to be listening instantly.
    ///
    /// # Errors
    ///
    /// - [`Error::Lifecycle`] if a process was already launched
    /// - [`Error::ProcessLaunchFailed`] if the spawn fails (fatal)
    pub async fn launch(&mut self, command: LaunchCommand) -> Result<u32> {
        if self.state != SupervisorState::NotStarted {
            return Err(Error::lifecycle(format!(
                "launch attempted in state {}",
                self.state
            )));
        }

        info!(command = %command.display_line(), "launching engine process");
        let child = command
            .to_command()
            .spawn()
            .map_err(Error::process_launch_failed)?;
        let pid = child.id().unwrap_or(0);

        self.handle = Some(ProcessHandle {
            child,
            pid,
            launch_command: command,
        });
        self.state = SupervisorState::Running;
        info!(pid, "engine process started");

        sleep(self.startup_delay).await;
        Ok(pid)
    }

    /// Returns `true` if the supervised process is still alive.
    ///
    /// A process counts as alive when its pid is present in the OS process
    /// table and the local handle has not reported exit. The process-table
    /// half is eventually consistent: immediately after spawn the result
    /// may lag the OS, so callers should not gate on it inside the
    /// post-launch window.
    pub fn is_alive(&mut self) -> bool {
        let Some(handle) = &mut self.handle else {
            return false;
        };

        if !self.killer.is_pid_alive(handle.pid) {
            return false;
        }

        match handle.child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = handle.pid, %status, "engine process exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = handle.pid, error = %e, "exit-status check failed");
                true
            }
        }
    }

    /// Gracefully quits the engine, escalating to forced termination.
    ///
    /// Sends the quit command (best effort), waits the grace period, then
    /// terminates while the process survives, up to the escalation bound.
    ///
    /// # Errors
    ///
    /// - [`Error::Lifecycle`] if no process is running
    /// - [`Error::ForceQuitExceeded`] once the bound is exceeded (fatal)
    pub async fn quit(&mut self, transport: &TransportClient) -> Result<()> {
        match self.state {
            SupervisorState::Running => {}
            other => {
                return Err(Error::lifecycle(format!("quit attempted in state {other}")));
            }
        }
        self.state = SupervisorState::Stopping;

        if let Err(e) = transport
            .send_fire_and_forget(&EngineCommand::Quit.into_message())
            .await
        {
            warn!(error = %e, "quit command send failed, proceeding to kill path");
        }
        sleep(self.quit_grace).await;

        let mut attempts = 0;
        while self.is_alive() {
            if attempts >= self.max_force_quit_attempts {
                warn!(attempts, "failing to force-quit engine process");
                return Err(Error::force_quit_exceeded(attempts));
            }
            attempts += 1;
            debug!(attempts, "engine still alive, escalating");
            self.terminate().await?;
        }

        self.handle = None;
        self.state = SupervisorState::Stopped;
        info!("confirmed engine process quit");
        Ok(())
    }

    /// Forcibly terminates the process through the platform capability.
    ///
    /// Waits the settle period afterwards; if the process is then gone the
    /// supervisor transitions straight to `Stopped`.
    ///
    /// # Errors
    ///
    /// Propagates platform capability failures.
    pub async fn terminate(&mut self) -> Result<()> {
        let Some(handle) = &mut self.handle else {
            return Ok(());
        };
        info!(pid = handle.pid, "force-terminating engine process");
        self.killer.terminate(&mut handle.child, handle.pid).await?;
        sleep(self.kill_settle).await;

        if !self.is_alive() {
            self.handle = None;
            self.state = SupervisorState::Stopped;
        }
        Ok(())
    }
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
impl Supervisor {
    /// Drives the state machine straight to `Stopped`, as after a
    /// completed quit.
    pub(crate) fn force_stopped(&mut self) {
        self.handle = None;
        self.state = SupervisorState::Stopped;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::transport::TransportClient;

    /// Kill capability double with scripted liveness.
    struct FakeKill {
        alive: Arc<AtomicBool>,
        terminations: Arc<AtomicU32>,
    }

    #[async_trait]
    impl PlatformKill for FakeKill {
        fn is_pid_alive(&self, _pid: u32) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        async fn terminate(&self, _child: &mut Child, _pid: u32) -> Result<()> {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_supervisor() -> Supervisor {
        Supervisor::new(Platform::current())
            .with_startup_delay(Duration::from_millis(10))
            .with_quit_grace(Duration::from_millis(10))
            .with_kill_settle(Duration::from_millis(10))
    }

    fn dead_transport() -> TransportClient {
        TransportClient::new("ws://127.0.0.1:9/websocket")
            .expect("valid url")
            .with_connect_timeout(Duration::from_millis(200))
            .with_refused_retry_delay(Duration::from_millis(10))
            .with_error_retry_delay(Duration::from_millis(10))
    }

    #[test]
    fn test_initial_state() {
        let supervisor = Supervisor::new(Platform::current());
        assert_eq!(supervisor.state(), SupervisorState::NotStarted);
        assert!(supervisor.pid().is_none());
    }

    #[test]
    fn test_launch_command_display_line() {
        let command = LaunchCommand::new("/opt/openspace/bin/OpenSpace")
            .with_arg("--profile")
            .with_arg("default")
            .with_arg("--bypassLauncher")
            .with_arg("true");
        assert_eq!(
            command.display_line(),
            "/opt/openspace/bin/OpenSpace --profile default --bypassLauncher true"
        );
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal_error() {
        let mut supervisor = fast_supervisor();
        let command = LaunchCommand::new("/nonexistent/definitely/not/a/binary");
        let result = supervisor.launch(command).await;
        assert!(matches!(result, Err(Error::ProcessLaunchFailed { .. })));
        assert_eq!(supervisor.state(), SupervisorState::NotStarted);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_records_pid_and_runs() {
        let mut supervisor = fast_supervisor();
        let pid = supervisor
            .launch(LaunchCommand::new("/bin/sleep").with_arg("30"))
            .await
            .expect("launch");

        assert!(pid > 0);
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert!(supervisor.is_alive());

        supervisor.terminate().await.expect("terminate");
        assert!(!supervisor.is_alive());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_double_launch_is_lifecycle_error() {
        let mut supervisor = fast_supervisor();
        supervisor
            .launch(LaunchCommand::new("/bin/sleep").with_arg("30"))
            .await
            .expect("launch");

        let second = supervisor
            .launch(LaunchCommand::new("/bin/sleep").with_arg("30"))
            .await;
        assert!(matches!(second, Err(Error::Lifecycle { .. })));

        supervisor.terminate().await.expect("terminate");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_is_alive_false_after_exit() {
        let mut supervisor = fast_supervisor();
        supervisor
            .launch(LaunchCommand::new("/bin/true"))
            .await
            .expect("launch");

        // /bin/true exits immediately; give the OS a moment.
        sleep(Duration::from_millis(100)).await;
        assert!(!supervisor.is_alive());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_is_alive_trusts_process_table_before_exit_status() {
        let mut supervisor = fast_supervisor();
        supervisor
            .launch(LaunchCommand::new("/bin/sleep").with_arg("30"))
            .await
            .expect("launch");

        // The pid has left the process table (per the capability) even
        // though the local exit status was never polled.
        supervisor.killer = Box::new(FakeKill {
            alive: Arc::new(AtomicBool::new(false)),
            terminations: Arc::new(AtomicU32::new(0)),
        });
        assert!(!supervisor.is_alive());

        if let Some(handle) = supervisor.handle.as_mut() {
            let _ = handle.child.start_kill();
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_quit_escalation_is_bounded() {
        let mut supervisor = fast_supervisor();
        supervisor
            .launch(LaunchCommand::new("/bin/sleep").with_arg("30"))
            .await
            .expect("launch");

        let terminations = Arc::new(AtomicU32::new(0));
        supervisor.killer = Box::new(FakeKill {
            alive: Arc::new(AtomicBool::new(true)),
            terminations: Arc::clone(&terminations),
        });

        let result = supervisor.quit(&dead_transport()).await;
        assert!(matches!(result, Err(Error::ForceQuitExceeded { .. })));
        assert_eq!(terminations.load(Ordering::SeqCst), 3);

        if let Some(handle) = supervisor.handle.as_mut() {
            let _ = handle.child.start_kill();
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_quit_reaches_stopped_via_escalation() {
        let mut supervisor = fast_supervisor();
        supervisor
            .launch(LaunchCommand::new("/bin/sleep").with_arg("30"))
            .await
            .expect("launch");

        // The quit command goes nowhere (no engine is listening), so the
        // supervisor escalates to the real platform kill.
        supervisor.quit(&dead_transport()).await.expect("quit");
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert!(supervisor.pid().is_none());
        assert!(!supervisor.is_alive());
    }

    #[test]
    fn test_quit_before_launch_is_lifecycle_error() {
        let mut supervisor = fast_supervisor();
        let result = tokio::runtime::Runtime::new()
            .expect("runtime")
            .block_on(supervisor.quit(&dead_transport()));
        assert!(matches!(result, Err(Error::Lifecycle { .. })));
    }
}
