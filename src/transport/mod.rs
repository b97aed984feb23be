//! WebSocket transport layer.
//!
//! This module owns communication with the engine's control socket. Each
//! operation uses a short-lived connection; see [`client`] for the retry
//! and polling semantics.

// ============================================================================
// Submodules
// ============================================================================

/// Transport client and connection state.
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{
    ConnectionState, DEFAULT_CONTROL_URL, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
    TransportClient,
};
