//! Wire envelope types.
//!
//! Every message to the engine is a JSON envelope
//! `{"topic": <int>, "type": <string>, "payload": <object>}`. Topic numbers
//! and field names are part of the wire contract, not internal detail.
//!
//! # Envelopes
//!
//! | Purpose | Topic | Type | Payload |
//! |---------|-------|------|---------|
//! | Scripting call | 4 | `luascript` | `{function, arguments}` |
//! | Playback state query | 1 | `sessionRecording` | `{event: "refresh", properties: ["state"]}` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::script::Invocation;

// ============================================================================
// Constants
// ============================================================================

/// Topic number of the scripting channel.
pub const SCRIPT_TOPIC: u32 = 4;

/// Topic number of the session-recording state channel.
pub const STATE_TOPIC: u32 = 1;

/// Message type of a scripting call.
pub const SCRIPT_TYPE: &str = "luascript";

/// Message type of a playback state query.
pub const STATE_TYPE: &str = "sessionRecording";

/// Reported playback state once a command sequence has finished.
pub const IDLE_STATE: &str = "idle";

// ============================================================================
// ControlMessage
// ============================================================================

/// One outbound control envelope.
///
/// # Format
///
/// ```json
/// {
///   "topic": 4,
///   "type": "luascript",
///   "payload": {"function": "openspace.time.setPause", "arguments": [false]}
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ControlMessage {
    /// Channel/category number.
    pub topic: u32,

    /// Message kind within the channel.
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific payload.
    pub payload: MessagePayload,
}

impl ControlMessage {
    /// Wraps a scripting invocation in its wire envelope.
    #[inline]
    #[must_use]
    pub fn script(invocation: Invocation) -> Self {
        Self {
            topic: SCRIPT_TOPIC,
            kind: SCRIPT_TYPE.to_string(),
            payload: MessagePayload::Script(invocation),
        }
    }

    /// Builds the playback state-query envelope.
    #[inline]
    #[must_use]
    pub fn state_query() -> Self {
        Self {
            topic: STATE_TOPIC,
            kind: STATE_TYPE.to_string(),
            payload: MessagePayload::StateQuery(StateQueryPayload::refresh()),
        }
    }

    /// Serializes the envelope to its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// MessagePayload
// ============================================================================

/// Payload of a [`ControlMessage`], serialized untagged.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessagePayload {
    /// Scripting call payload: `{function, arguments}`.
    Script(Invocation),
    /// State query payload: `{event, properties}`.
    StateQuery(StateQueryPayload),
}

// ============================================================================
// StateQueryPayload
// ============================================================================

/// Payload of a playback state query.
#[derive(Debug, Clone, Serialize)]
pub struct StateQueryPayload {
    /// Query event name; always `refresh`.
    pub event: String,
    /// Properties to report; the driver only asks for `state`.
    pub properties: Vec<String>,
}

impl StateQueryPayload {
    /// Builds the refresh query asking for the `state` property.
    #[inline]
    #[must_use]
    pub fn refresh() -> Self {
        Self {
            event: "refresh".to_string(),
            properties: vec!["state".to_string()],
        }
    }
}

// ============================================================================
// StateReply
// ============================================================================

/// Inbound reply to a playback state query.
///
/// Only the reported state field is of interest; the rest of the envelope is
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct StateReply {
    /// Reply payload.
    pub payload: StateReplyPayload,
}

/// Payload of a [`StateReply`].
#[derive(Debug, Clone, Deserialize)]
pub struct StateReplyPayload {
    /// Reported playback state, e.g. `idle` or `playing`.
    #[serde(default)]
    pub state: String,
}

impl StateReply {
    /// Parses a reply from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the text is not a state reply.
    pub fn from_wire(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns the reported playback state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &str {
        &self.payload.state
    }

    /// Returns `true` if playback has finished.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.payload.state == IDLE_STATE
    }
}

// ============================================================================
// Tests
// ============================================================================
