//! Scripting call parsing.
//!
//! Converts a human-authored call expression such as
//! `openspace.time.setPause(False)` into a typed [`Invocation`]. Argument
//! tokens are split on commas and classified by [`ScriptValue::infer`];
//! calls to the navigation-state setter are routed to the dedicated record
//! sub-parser instead, since their argument text embeds commas inside
//! braces.
//!
//! Parsing is a pure function of the input string and is idempotent on the
//! rendered form of its output: `parse_call(inv.to_string())` yields an
//! equal [`Invocation`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

use super::navigation::parse_navigation_state;
use super::value::ScriptValue;

// ============================================================================
// Constants
// ============================================================================

/// Function name routed to the navigation-state record sub-parser.
pub const NAVIGATION_STATE_FUNCTION: &str = "openspace.navigation.setNavigationState";

/// Characters stripped from the start of a generic argument token.
const ARG_STRIP_START: &[char] = &[' ', '\'', '"', '['];

/// Characters stripped from the end of a generic argument token.
const ARG_STRIP_END: &[char] = &[' ', '\'', '"', ']'];

// ============================================================================
// Invocation
// ============================================================================

/// A typed remote invocation: function name plus ordered arguments.
///
/// Immutable once constructed. Serializes to the `luascript` payload shape
/// `{"function": ..., "arguments": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    /// Fully qualified function name, e.g. `openspace.time.setTime`.
    function: String,
    /// Ordered argument list.
    arguments: Vec<ScriptValue>,
}

impl Invocation {
    /// Creates an invocation from a function name and arguments.
    #[inline]
    #[must_use]
    pub fn new(function: impl Into<String>, arguments: Vec<ScriptValue>) -> Self {
        Self {
            function: function.into(),
            arguments,
        }
    }

    /// Returns the function name.
    #[inline]
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns the ordered argument list.
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[ScriptValue] {
        &self.arguments
    }
}

impl fmt::Display for Invocation {
    /// Renders the invocation back to call-string form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.arguments.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.function, args.join(", "))
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a textual call expression into an [`Invocation`].
///
/// The text before the first `(` is the function name, used verbatim. The
/// interior up to the first `)` is the argument text: split on commas and
/// classified per token, except for [`NAVIGATION_STATE_FUNCTION`] whose
/// record becomes the single argument.
///
/// # Errors
///
/// Returns [`Error::MalformedCall`] when either parenthesis is missing.
/// This is recoverable: callers log the offending command and skip it.
pub fn parse_call(src: &str) -> Result<Invocation> {
    let open = src.find('(').ok_or_else(|| Error::malformed_call(src))?;
    let close = src.find(')').ok_or_else(|| Error::malformed_call(src))?;
    if close < open {
        return Err(Error::malformed_call(src));
    }

    let function = &src[..open];
    let interior = &src[open + 1..close];

    if function == NAVIGATION_STATE_FUNCTION {
        let nav = parse_navigation_state(interior);
        return Ok(Invocation::new(
            function,
            vec![ScriptValue::Navigation(nav)],
        ));
    }

    if interior.trim().is_empty() {
        return Ok(Invocation::new(function, Vec::new()));
    }

    let arguments = interior
        .split(',')
        .map(|token| {
            let trimmed = token
                .trim()
                .trim_start_matches(ARG_STRIP_START)
                .trim_end_matches(ARG_STRIP_END);
            ScriptValue::infer(trimmed)
        })
        .collect();

    Ok(Invocation::new(function, arguments))
}

// ============================================================================
// Tests
// ============================================================================
