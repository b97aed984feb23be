//! OpenSpace driver - scripting control client for visual regression runs.
//!
//! This library drives the OpenSpace renderer through its WebSocket
//! scripting channel to execute recorded test scenarios: launch the
//! application, issue commands (time-set, action-trigger, arbitrary
//! scripting calls, screenshot capture), wait for playback to go idle, and
//! shut the application down cleanly.
//!
//! # Architecture
//!
//! The driver is a client to a long-running external process:
//!
//! - **Local end (Rust)**: parses call expressions, encodes wire envelopes,
//!   sends them over short-lived WebSocket connections, supervises the
//!   engine process
//! - **Remote end (OpenSpace)**: executes `luascript` payloads and answers
//!   `sessionRecording` state queries
//!
//! Key design principles:
//!
//! - One [`Session`] owns exactly one engine process and its control socket
//! - Every control operation runs sequentially; waits are coarse, bounded
//!   sleeps because the engine offers no completion callbacks
//! - Connections are short-lived; retries always reconnect from scratch
//! - Shutdown is graceful-then-forced with a bounded kill escalation
//!
//! # Quick Start
//!
//! ```no_run
//! use openspace_driver::{Result, ScenarioStep, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SessionConfig::new("/opt/openspace", "bin/OpenSpace", "test.log")
//!         .with_profile("default");
//!
//!     let mut session = Session::new(config)?;
//!     session
//!         .run_scenario(&[
//!             ScenarioStep::SetTime("2024-06-01T12:00:00".to_string()),
//!             ScenarioStep::Script("openspace.time.setPause(True)".to_string()),
//!             ScenarioStep::Screenshot {
//!                 group: "default".to_string(),
//!                 name: "earth".to_string(),
//!             },
//!         ])
//!         .await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`script`] | Call parser: expressions to typed invocations |
//! | [`protocol`] | Wire envelopes and built-in engine commands |
//! | [`transport`] | WebSocket client with retry/backoff and state polling |
//! | [`process`] | Process supervisor and platform kill capabilities |
//! | [`session`] | End-to-end scenario orchestration |
//! | [`error`] | Error types and [`Result`] alias |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Engine process supervision.
///
/// Launch, liveness, and graceful-then-forced shutdown of the external
/// process.
pub mod process;

/// Wire protocol message types.
///
/// The `{topic, type, payload}` envelope and built-in engine commands.
pub mod protocol;

/// Scripting call parser.
///
/// Turns human-authored call expressions into typed invocations.
pub mod script;

/// Session orchestration.
///
/// Composes the other modules into one end-to-end scenario run.
pub mod session;

/// WebSocket transport layer.
///
/// Short-lived connections with retry/backoff and state polling.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Process types
pub use process::{LaunchCommand, Platform, Supervisor, SupervisorState};

// Protocol types
pub use protocol::{ControlMessage, EngineCommand, StateReply};

// Script types
pub use script::{Invocation, NavigationState, ScriptValue, parse_call};

// Session types
pub use session::{ScenarioStep, Session, SessionConfig};

// Transport types
pub use transport::{ConnectionState, TransportClient};
