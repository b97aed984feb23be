//! Session orchestration.
//!
//! A [`Session`] composes the call parser, wire codec, transport client,
//! and process supervisor into one end-to-end scenario run:
//!
//! 1. launch the engine and probe the control channel
//! 2. hide the overlay UI
//! 3. execute the scripted command sequence
//! 4. capture and relocate screenshot artifacts
//! 5. wait until playback is idle
//! 6. quit the engine, escalating to forced termination if needed
//!
//! All steps run strictly sequentially; the session never issues two
//! control operations concurrently against the engine. Waits are coarse
//! fixed sleeps rather than event-driven signals because the engine exposes
//! no completion callback for most operations — a known latency cost.
//!
//! One session owns exactly one engine process and its control socket.
//! Driving several engines concurrently requires one session per engine,
//! each with a distinct control endpoint.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::process::{Supervisor, SupervisorState};
use crate::protocol::{ControlMessage, EngineCommand, IDLE_STATE, hide_hud_commands};
use crate::script::parse_call;
use crate::transport::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, TransportClient};

use super::config::{SCREENSHOT_FOLDER, SessionConfig};
use super::log::LogSink;

// ============================================================================
// Constants
// ============================================================================

/// Wait before each fire-and-forget send.
const SEND_LEAD: Duration = Duration::from_millis(500);

/// Wait after each fire-and-forget send.
const SEND_SETTLE: Duration = Duration::from_secs(1);

/// Additional wait after script, action, and time commands.
const COMMAND_SETTLE: Duration = Duration::from_secs(1);

/// Wait after the screenshot command before looking for the file.
const SCREENSHOT_SETTLE: Duration = Duration::from_secs(2);

/// Connection retries for the startup probe.
const CONNECT_RETRIES: u32 = 2;

// ============================================================================
// ScenarioStep
// ============================================================================

/// One instruction of a recorded test scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioStep {
    /// Execute an arbitrary scripting call.
    Script(String),
    /// Set the simulation time.
    SetTime(String),
    /// Trigger a named action.
    TriggerAction(String),
    /// Capture a screenshot and relocate it for comparison.
    Screenshot {
        /// Scenario group, first half of the artifact name.
        group: String,
        /// Scenario name, second half of the artifact name.
        name: String,
    },
    /// Let the scene settle for a fixed number of seconds.
    Wait {
        /// Seconds to wait.
        seconds: u64,
    },
}

// ============================================================================
// Session
// ============================================================================

/// One visual-regression test session against one engine process.
pub struct Session {
    /// Immutable session configuration.
    config: SessionConfig,
    /// Append-only session log.
    log: LogSink,
    /// Control channel client.
    transport: TransportClient,
    /// Engine process supervisor.
    supervisor: Supervisor,
    /// Wait before each send.
    send_lead: Duration,
    /// Wait after each send.
    send_settle: Duration,
    /// Extra wait after scripted commands.
    command_settle: Duration,
    /// Wait after the screenshot command.
    screenshot_settle: Duration,
    /// Startup probe retry budget.
    connect_retries: u32,
    /// Idle poll attempt budget.
    poll_attempts: u32,
    /// Wait between idle polls.
    poll_interval: Duration,
}

// ============================================================================
// Session - Construction
// ============================================================================

impl Session {
    /// Creates a session from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the control URL is invalid.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let transport = TransportClient::new(config.control_url())?;
        let supervisor = Supervisor::new(config.platform());
        let log = LogSink::new(config.log_path(), config.platform());

        Ok(Self {
            config,
            log,
            transport,
            supervisor,
            send_lead: SEND_LEAD,
            send_settle: SEND_SETTLE,
            command_settle: COMMAND_SETTLE,
            screenshot_settle: SCREENSHOT_SETTLE,
            connect_retries: CONNECT_RETRIES,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Overrides the per-send lead and settle waits.
    #[inline]
    #[must_use]
    pub fn with_send_delays(mut self, lead: Duration, settle: Duration) -> Self {
        self.send_lead = lead;
        self.send_settle = settle;
        self
    }

    /// Overrides the extra wait after scripted commands.
    #[inline]
    #[must_use]
    pub fn with_command_settle(mut self, settle: Duration) -> Self {
        self.command_settle = settle;
        self
    }

    /// Overrides the wait after the screenshot command.
    #[inline]
    #[must_use]
    pub fn with_screenshot_settle(mut self, settle: Duration) -> Self {
        self.screenshot_settle = settle;
        self
    }

    /// Overrides the idle poll budget.
    #[inline]
    #[must_use]
    pub fn with_poll(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// Returns the session configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the supervisor's lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Launches the engine and probes the control channel.
    ///
    /// The probe resumes simulation time, which doubles as the readiness
    /// check the engine answers once its control socket is up. Returns
    /// whether the probe got through; a failed probe is reported, not
    /// fatal — the caller decides whether to continue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessLaunchFailed`] if the engine cannot be
    /// spawned (fatal).
    pub async fn start(&mut self) -> Result<bool> {
        let command = self.config.launch_command();
        self.log.append(&format!("Launch command: {}", command.display_line()));

        let pid = self.supervisor.launch(command).await?;
        self.log
            .append(&format!("Started OpenSpace instance with ID {pid}"));

        let probe = EngineCommand::SetPause { paused: false }.into_message();
        match self
            .transport
            .connect_with_retries(&probe, self.connect_retries)
            .await
        {
            Ok(retries) => {
                self.log
                    .append(&format!("Control channel reached after {retries} retries"));
                Ok(true)
            }
            Err(e) if e.is_recoverable() => {
                self.log
                    .append(&format!("Control channel unreachable at startup: {e}"));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Quits the engine, escalating to forced termination if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForceQuitExceeded`] if the process survives the
    /// escalation bound (fatal), or [`Error::Lifecycle`] if no process is
    /// running.
    pub async fn quit(&mut self) -> Result<()> {
        self.log.append("Quit OpenSpace instance");
        match self.supervisor.quit(&self.transport).await {
            Ok(()) => {
                self.log
                    .append("Confirmed that OpenSpace instance successfully quit");
                Ok(())
            }
            Err(e) => {
                self.log
                    .append(&format!("Failing to quit OpenSpace instance: {e}"));
                Err(e)
            }
        }
    }
}

// ============================================================================
// Session - Commands
// ============================================================================

impl Session {
    /// Disables every overlay UI element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lifecycle`] if the engine is already confirmed
    /// dead; individual send failures are logged and skipped.
    pub async fn hide_hud(&self) -> Result<()> {
        for command in hide_hud_commands() {
            self.dispatch(&command.into_message(), "hide HUD element").await?;
        }
        Ok(())
    }

    /// Parses and sends one scripting call.
    ///
    /// A malformed call is logged and skipped. Returns whether the command
    /// was actually sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lifecycle`] if the engine is already confirmed dead.
    pub async fn send_script(&self, script: &str) -> Result<bool> {
        let invocation = match parse_call(script) {
            Ok(invocation) => invocation,
            Err(e) => {
                self.log.append(&format!("Skipping script command: {e}"));
                return Ok(false);
            }
        };

        let sent = self
            .dispatch(
                &ControlMessage::script(invocation),
                &format!("script ({script})"),
            )
            .await?;
        sleep(self.command_settle).await;
        Ok(sent)
    }

    /// Sets the simulation time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lifecycle`] if the engine is already confirmed dead.
    pub async fn set_time(&self, time: &str) -> Result<bool> {
        let message = EngineCommand::SetTime {
            time: time.to_string(),
        }
        .into_message();
        let sent = self.dispatch(&message, &format!("setTime ({time})")).await?;
        sleep(self.command_settle).await;
        Ok(sent)
    }

    /// Triggers a named action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lifecycle`] if the engine is already confirmed dead.
    pub async fn trigger_action(&self, name: &str) -> Result<bool> {
        let message = EngineCommand::TriggerAction {
            name: name.to_string(),
        }
        .into_message();
        let sent = self.dispatch(&message, &format!("action ({name})")).await?;
        sleep(self.command_settle).await;
        Ok(sent)
    }

    /// Captures a screenshot and relocates it for the comparison tooling.
    ///
    /// The engine writes `OpenSpace_000000.png` into its screenshot folder;
    /// the file is moved to `<result dir>/<group><name>.png`, replacing any
    /// previous candidate.
    ///
    /// # Errors
    ///
    /// - [`Error::Lifecycle`] if the engine is already confirmed dead
    /// - [`Error::ArtifactMissing`] if the engine produced no file
    ///   (recoverable: logged, the session continues)
    /// - [`Error::Io`] if the relocation itself fails
    pub async fn move_screenshot(&self, group: &str, name: &str) -> Result<PathBuf> {
        self.log
            .append(&format!("move screenshot group/name : {group}/{name}"));

        let folder = EngineCommand::SetScreenshotFolder {
            folder: SCREENSHOT_FOLDER.to_string(),
        }
        .into_message();
        self.dispatch(&folder, "screenshot folder").await?;

        self.dispatch(&EngineCommand::TakeScreenshot.into_message(), "screenshot")
            .await?;
        sleep(self.screenshot_settle).await;

        let source = self.config.screenshot_source_path();
        if !source.is_file() {
            self.log.append(&format!(
                "Screenshot wasn't successful. Expected to find '{}'",
                source.display()
            ));
            return Err(Error::artifact_missing(source));
        }

        let target_dir = self.config.result_directory();
        std::fs::create_dir_all(&target_dir)?;
        let target = target_dir.join(format!("{group}{name}.png"));
        if target.is_file() {
            std::fs::remove_file(&target)?;
        }
        move_file(&source, &target)?;

        self.log.append(&format!(
            "Moved screenshot: '{group}{name}.png' to '{}'",
            target.display()
        ));
        Ok(target)
    }

    /// Polls the playback state until the engine reports idle.
    ///
    /// Returns whether idle was reached within the poll budget; an
    /// unreachable control channel is reported as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lifecycle`] if the engine is already confirmed dead.
    pub async fn wait_for_idle(&self) -> Result<bool> {
        self.ensure_can_send()?;
        self.log.append("Waiting for playback to finish");

        match self
            .transport
            .poll_until_state(IDLE_STATE, self.poll_attempts, self.poll_interval)
            .await
        {
            Ok(idle) => {
                if !idle {
                    self.log.append("Playback did not reach idle in time");
                }
                Ok(idle)
            }
            Err(e) if e.is_recoverable() => {
                self.log.append(&format!("Playback state poll failed: {e}"));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Session - Scenario
// ============================================================================

impl Session {
    /// Runs one complete scenario: start, configure, execute every step,
    /// wait for idle, quit.
    ///
    /// Recoverable step failures (malformed calls, dropped sends, missing
    /// artifacts) are logged and the scenario continues; lifecycle failures
    /// abort immediately.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: launch failure, quit escalation
    /// overflow, or a lifecycle violation.
    pub async fn run_scenario(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        if !self.start().await? {
            self.log
                .append("Continuing scenario despite failed startup probe");
        }
        self.hide_hud().await?;

        for step in steps {
            debug!(?step, "executing scenario step");
            match step {
                ScenarioStep::Script(script) => {
                    self.send_script(script).await?;
                }
                ScenarioStep::SetTime(time) => {
                    self.set_time(time).await?;
                }
                ScenarioStep::TriggerAction(name) => {
                    self.trigger_action(name).await?;
                }
                ScenarioStep::Screenshot { group, name } => {
                    match self.move_screenshot(group, name).await {
                        Ok(_) => {}
                        Err(e) if e.is_recoverable() => {
                            warn!(error = %e, "screenshot step failed, continuing");
                        }
                        Err(e) => return Err(e),
                    }
                }
                ScenarioStep::Wait { seconds } => {
                    sleep(Duration::from_secs(*seconds)).await;
                }
            }
        }

        self.wait_for_idle().await?;
        self.quit().await
    }
}

// ============================================================================
// Session - Internal
// ============================================================================

impl Session {
    /// Rejects control traffic once the process is confirmed dead.
    fn ensure_can_send(&self) -> Result<()> {
        if self.supervisor.state() == SupervisorState::Stopped {
            return Err(Error::lifecycle(
                "control traffic attempted after confirmed shutdown",
            ));
        }
        Ok(())
    }

    /// Logs and sends one message, converting transport failures into a
    /// reported `false`.
    async fn dispatch(&self, message: &ControlMessage, description: &str) -> Result<bool> {
        self.ensure_can_send()?;

        let wire = message.to_wire()?;
        self.log
            .append(&format!("Sending message: '{wire}' ({description})"));

        sleep(self.send_lead).await;
        let sent = match self.transport.send_fire_and_forget(message).await {
            Ok(()) => true,
            Err(e) => {
                self.log
                    .append(&format!("Send failed ({description}): {e}"));
                false
            }
        };
        sleep(self.send_settle).await;
        Ok(sent)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Moves a file, falling back to copy-and-remove across filesystems.
fn move_file(source: &std::path::Path, target: &std::path::Path) -> Result<()> {
    if std::fs::rename(source, target).is_err() {
        std::fs::copy(source, target)?;
        std::fs::remove_file(source)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    /// Session with all waits shrunk and a transport pointing at a port
    /// with nothing listening.
    fn offline_session(config: SessionConfig) -> Session {
        let url = "ws://127.0.0.1:9/websocket";
        let mut session = Session::new(config.with_control_url(url)).expect("session");
        session.transport = TransportClient::new(url)
            .expect("valid url")
            .with_connect_timeout(Duration::from_millis(200))
            .with_startup_retry_delay(Duration::from_millis(10))
            .with_refused_retry_delay(Duration::from_millis(10))
            .with_error_retry_delay(Duration::from_millis(10));
        session
            .with_send_delays(Duration::ZERO, Duration::ZERO)
            .with_command_settle(Duration::ZERO)
            .with_screenshot_settle(Duration::ZERO)
            .with_poll(2, Duration::from_millis(10))
    }

    fn test_config(dir: &std::path::Path) -> SessionConfig {
        SessionConfig::new(dir, "bin/OpenSpace", dir.join("session.log"))
    }

    #[test]
    fn test_new_rejects_invalid_control_url() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log")
            .with_control_url("not a url");
        assert!(matches!(Session::new(config), Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_start_launch_failure_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let mut session = offline_session(test_config(dir.path()));

        // No engine binary exists under the temp base directory.
        let result = session.start().await;
        assert!(matches!(result, Err(Error::ProcessLaunchFailed { .. })));
    }

    #[tokio::test]
    async fn test_send_script_skips_malformed_call() {
        let dir = tempdir().expect("tempdir");
        let session = offline_session(test_config(dir.path()));

        let sent = session
            .send_script("openspace.time.setPause")
            .await
            .expect("recoverable");
        assert!(!sent);

        let log = std::fs::read_to_string(dir.path().join("session.log")).expect("log");
        assert!(log.contains("Skipping script command"));
    }

    #[tokio::test]
    async fn test_send_script_reports_dropped_send() {
        let dir = tempdir().expect("tempdir");
        let session = offline_session(test_config(dir.path()));

        let sent = session
            .send_script("openspace.time.setPause(False)")
            .await
            .expect("recoverable");
        assert!(!sent);

        let log = std::fs::read_to_string(dir.path().join("session.log")).expect("log");
        assert!(log.contains("Sending message:"));
        assert!(log.contains("Send failed"));
    }

    #[tokio::test]
    async fn test_sends_fail_fast_after_confirmed_shutdown() {
        let dir = tempdir().expect("tempdir");
        let mut session = offline_session(test_config(dir.path()));
        assert!(session.ensure_can_send().is_ok());

        session.supervisor.force_stopped();
        let result = session.set_time("2024-06-01T12:00:00").await;
        assert!(matches!(result, Err(Error::Lifecycle { .. })));
        assert_eq!(session.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn test_move_screenshot_missing_artifact_is_recoverable() {
        let dir = tempdir().expect("tempdir");
        let session = offline_session(test_config(dir.path()));

        let result = session.move_screenshot("default", "earth").await;
        match result {
            Err(e) => {
                assert!(matches!(e, Error::ArtifactMissing { .. }));
                assert!(e.is_recoverable());
            }
            Ok(path) => panic!("expected missing artifact, got {}", path.display()),
        }

        let log = std::fs::read_to_string(dir.path().join("session.log")).expect("log");
        assert!(log.contains("Screenshot wasn't successful"));
    }

    #[tokio::test]
    async fn test_move_screenshot_relocates_artifact() {
        let dir = tempdir().expect("tempdir");
        let results = dir.path().join("results");
        let config = test_config(dir.path()).with_result_directory(&results);
        let session = offline_session(config);

        let source = session.config().screenshot_source_path();
        std::fs::create_dir_all(source.parent().expect("parent")).expect("mkdir");
        std::fs::write(&source, b"png-bytes").expect("write screenshot");

        let target = session
            .move_screenshot("default", "earth")
            .await
            .expect("relocate");

        assert_eq!(target, results.join("defaultearth.png"));
        assert_eq!(std::fs::read(&target).expect("read target"), b"png-bytes");
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_move_screenshot_replaces_previous_candidate() {
        let dir = tempdir().expect("tempdir");
        let results = dir.path().join("results");
        let config = test_config(dir.path()).with_result_directory(&results);
        let session = offline_session(config);

        let source = session.config().screenshot_source_path();
        std::fs::create_dir_all(source.parent().expect("parent")).expect("mkdir");
        std::fs::write(&source, b"new").expect("write screenshot");

        std::fs::create_dir_all(&results).expect("mkdir results");
        std::fs::write(results.join("defaultearth.png"), b"old").expect("write old");

        let target = session
            .move_screenshot("default", "earth")
            .await
            .expect("relocate");
        assert_eq!(std::fs::read(&target).expect("read"), b"new");
    }

    #[tokio::test]
    async fn test_wait_for_idle_reports_unreachable_channel() {
        let dir = tempdir().expect("tempdir");
        let session = offline_session(test_config(dir.path()));

        let idle = session.wait_for_idle().await.expect("recoverable");
        assert!(!idle);

        let log = std::fs::read_to_string(dir.path().join("session.log")).expect("log");
        assert!(log.contains("Playback state poll failed"));
    }
}
