//! Wire protocol message types.
//!
//! This module defines the JSON envelope exchanged with the engine's
//! WebSocket control channel and the fixed set of built-in commands:
//!
//! - [`ControlMessage`] - the `{topic, type, payload}` envelope
//! - [`EngineCommand`] - built-in commands (quit, time, screenshot, ...)
//! - [`StateReply`] - inbound playback-state replies
//!
//! Topic numbers, type strings, and payload field names are wire contract;
//! they must match the engine exactly.

// ============================================================================
// Submodules
// ============================================================================

/// Built-in engine command definitions.
pub mod command;

/// Envelope and reply types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{EngineCommand, HUD_PROPERTIES, hide_hud_commands};
pub use message::{
    ControlMessage, IDLE_STATE, MessagePayload, SCRIPT_TOPIC, SCRIPT_TYPE, STATE_TOPIC,
    STATE_TYPE, StateQueryPayload, StateReply, StateReplyPayload,
};
