//! Session configuration.
//!
//! A [`SessionConfig`] is assembled once before a session starts and stays
//! immutable afterwards. It resolves the engine launch command line and the
//! filesystem locations the session touches.
//!
//! The synchronization directory is an explicit field passed to the spawned
//! process as a child-only environment variable; nothing here mutates the
//! driver's own environment.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use crate::process::{LaunchCommand, Platform};
use crate::transport::DEFAULT_CONTROL_URL;

// ============================================================================
// Constants
// ============================================================================

/// Profile used when none is supplied.
pub const DEFAULT_PROFILE: &str = "default";

/// Engine-side screenshot folder; `${BASE}` is expanded by the engine.
pub const SCREENSHOT_FOLDER: &str = "${BASE}/user/screenshots/imagetestingfolder";

/// Environment variable carrying the synchronization directory.
pub const SYNC_ENV_VAR: &str = "OPENSPACE_SYNC";

/// File name of the first screenshot the engine writes per run.
const SCREENSHOT_FILE: &str = "OpenSpace_000000.png";

// ============================================================================
// SessionConfig
// ============================================================================

/// Immutable configuration of one test session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Engine executable, relative to the base directory or absolute.
    application_path: PathBuf,
    /// Profile passed to `--profile`.
    profile_name: String,
    /// OpenSpace installation root.
    base_directory: PathBuf,
    /// Append-only session log file.
    log_path: PathBuf,
    /// Host platform.
    platform: Platform,
    /// Synchronization directory exported to the child, if any.
    sync_directory: Option<PathBuf>,
    /// Control channel endpoint.
    control_url: String,
    /// Override for the relocated-screenshot directory; defaults to
    /// `ResultImages/<platform>` under the working directory.
    result_directory: Option<PathBuf>,
}

// ============================================================================
// SessionConfig - Construction
// ============================================================================

impl SessionConfig {
    /// Creates a configuration for the engine at
    /// `base_directory/application_path`, logging to `log_path`.
    #[must_use]
    pub fn new(
        base_directory: impl Into<PathBuf>,
        application_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            application_path: application_path.into(),
            profile_name: DEFAULT_PROFILE.to_string(),
            base_directory: base_directory.into(),
            log_path: log_path.into(),
            platform: Platform::current(),
            sync_directory: None,
            control_url: DEFAULT_CONTROL_URL.to_string(),
            result_directory: None,
        }
    }

    /// Sets the profile; an empty name falls back to the default profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        let profile = profile.into();
        self.profile_name = if profile.is_empty() {
            DEFAULT_PROFILE.to_string()
        } else {
            profile
        };
        self
    }

    /// Overrides the detected platform.
    #[inline]
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Sets the synchronization directory exported to the child process.
    #[inline]
    #[must_use]
    pub fn with_sync_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.sync_directory = Some(path.into());
        self
    }

    /// Overrides the control channel endpoint.
    #[inline]
    #[must_use]
    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = url.into();
        self
    }

    /// Overrides where relocated screenshots are placed.
    #[inline]
    #[must_use]
    pub fn with_result_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.result_directory = Some(path.into());
        self
    }
}

// ============================================================================
// SessionConfig - Accessors
// ============================================================================

impl SessionConfig {
    /// Returns the profile name.
    #[inline]
    #[must_use]
    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// Returns the installation root.
    #[inline]
    #[must_use]
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Returns the session log path.
    #[inline]
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Returns the host platform.
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the control channel endpoint.
    #[inline]
    #[must_use]
    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    /// Returns the synchronization directory, if set.
    #[inline]
    #[must_use]
    pub fn sync_directory(&self) -> Option<&Path> {
        self.sync_directory.as_deref()
    }
}

// ============================================================================
// SessionConfig - Derived Paths
// ============================================================================

impl SessionConfig {
    /// Resolves the launch command for the engine process.
    ///
    /// The command line is
    /// `<executable> --profile <profile> --bypassLauncher true`; the bypass
    /// flag skips the interactive launcher window so the engine starts
    /// straight into the profile.
    #[must_use]
    pub fn launch_command(&self) -> LaunchCommand {
        let joined = self.base_directory.join(&self.application_path);
        let executable = std::path::absolute(&joined).unwrap_or(joined);

        let mut command = LaunchCommand::new(executable)
            .with_arg("--profile")
            .with_arg(&self.profile_name)
            .with_arg("--bypassLauncher")
            .with_arg("true");
        if let Some(sync) = &self.sync_directory {
            command = command.with_env(SYNC_ENV_VAR, sync.display().to_string());
        }
        command
    }

    /// Path where the engine writes the screenshot of the current run.
    #[must_use]
    pub fn screenshot_source_path(&self) -> PathBuf {
        let joined = self
            .base_directory
            .join("user")
            .join("screenshots")
            .join("imagetestingfolder")
            .join(SCREENSHOT_FILE);
        std::path::absolute(&joined).unwrap_or(joined)
    }

    /// Directory receiving relocated screenshots.
    ///
    /// Defaults to `ResultImages/<platform>` under the working directory,
    /// where the downstream comparison tooling picks them up.
    #[must_use]
    pub fn result_directory(&self) -> PathBuf {
        match &self.result_directory {
            Some(path) => path.clone(),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join("ResultImages")
                .join(self.platform.as_str()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_command_shape() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log")
            .with_profile("earth");
        let command = config.launch_command();

        assert!(command.program.ends_with("bin/OpenSpace"));
        assert_eq!(
            command.args,
            vec!["--profile", "earth", "--bypassLauncher", "true"]
        );
        assert!(command.envs.is_empty());
    }

    #[test]
    fn test_empty_profile_falls_back_to_default() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log")
            .with_profile("");
        assert_eq!(config.profile_name(), DEFAULT_PROFILE);
    }

    #[test]
    fn test_sync_directory_becomes_child_env() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log")
            .with_sync_directory("/data/sync");
        let command = config.launch_command();
        assert_eq!(
            command.envs,
            vec![(SYNC_ENV_VAR.to_string(), "/data/sync".to_string())]
        );
    }

    #[test]
    fn test_screenshot_source_path() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log");
        let path = config.screenshot_source_path();
        assert!(path.ends_with("user/screenshots/imagetestingfolder/OpenSpace_000000.png"));
    }

    #[test]
    fn test_result_directory_override() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log")
            .with_result_directory("/tmp/results");
        assert_eq!(config.result_directory(), PathBuf::from("/tmp/results"));
    }

    #[test]
    fn test_default_control_url() {
        let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "/tmp/test.log");
        assert_eq!(config.control_url(), DEFAULT_CONTROL_URL);
    }
}
