//! Scripting call parser.
//!
//! This module turns human-authored scripting expressions into typed
//! invocations ready for the wire codec:
//!
//! - [`parse_call`] - parse `name(arg, ...)` into an [`Invocation`]
//! - [`ScriptValue`] - argument scalars with inferred types
//! - [`NavigationState`] - the multi-field camera record argument
//!
//! # Example
//!
//! ```
//! use openspace_driver::script::{parse_call, ScriptValue};
//!
//! let inv = parse_call("openspace.time.setPause(False)").unwrap();
//! assert_eq!(inv.function(), "openspace.time.setPause");
//! assert_eq!(inv.arguments(), &[ScriptValue::Bool(false)]);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Call expression parsing and the [`Invocation`] type.
pub mod call;

/// Navigation-state record extraction rules.
mod navigation;

/// Argument value types.
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use call::{Invocation, NAVIGATION_STATE_FUNCTION, parse_call};
pub use value::{NavigationState, ScriptValue};
