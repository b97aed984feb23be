//! Navigation-state sub-parser.
//!
//! `openspace.navigation.setNavigationState` takes a multi-field record
//! rather than a flat argument list, so its argument text is not split on
//! commas. Instead each field is located by its literal marker and extracted
//! independently by a named rule returning an optional typed value. Keeping
//! these rules isolated from the generic comma-split path means future field
//! additions do not perturb unrelated parsing.
//!
//! # Extraction Rules
//!
//! | Field | Marker | Rule |
//! |-------|--------|------|
//! | anchor | `Anchor` | scalar, kept as string |
//! | reference frame | `ReferenceFrame` | scalar, kept as string |
//! | pitch | `Pitch` | scalar, parsed as float |
//! | yaw | `Yaw` | scalar, parsed as float |
//! | position | `Position` | three-component float vector |
//! | up | `Up` | three-component float vector |
//!
//! Markers are matched case-sensitively, first occurrence only.

// ============================================================================
// Imports
// ============================================================================

use super::value::NavigationState;

// ============================================================================
// Constants
// ============================================================================

/// Characters stripped from the start of a scalar field value.
const SCALAR_STRIP_START: &[char] = &[' ', '\'', '"', '[', '{', '('];

/// Characters stripped from the end of a scalar field value.
const SCALAR_STRIP_END: &[char] = &[' ', '\'', '"', ')', '}', ']', ';'];

// ============================================================================
// Record Parsing
// ============================================================================

/// Extracts a [`NavigationState`] from the argument text of a
/// `setNavigationState` call.
///
/// Absent markers yield absent fields; the parse never fails.
#[must_use]
pub(crate) fn parse_navigation_state(text: &str) -> NavigationState {
    NavigationState {
        anchor: scalar_field(text, "Anchor"),
        reference_frame: scalar_field(text, "ReferenceFrame"),
        pitch: float_field(text, "Pitch"),
        yaw: float_field(text, "Yaw"),
        position: vector_field(text, "Position"),
        up: vector_field(text, "Up"),
    }
}

// ============================================================================
// Field Rules
// ============================================================================

/// Extracts a scalar field value as a string.
///
/// The value runs from the character after the `=` following the marker up
/// to the next `,` (or the end of the text), with quote/bracket characters
/// stripped from both ends.
fn scalar_field(text: &str, marker: &str) -> Option<String> {
    let marker_idx = text.find(marker)?;
    let rest = &text[marker_idx..];
    let eq_idx = rest.find('=')?;
    let after_eq = &rest[eq_idx + 1..];
    let raw = match after_eq.find(',') {
        Some(comma_idx) => &after_eq[..comma_idx],
        None => after_eq,
    };
    let value = raw
        .trim_start_matches(SCALAR_STRIP_START)
        .trim_end_matches(SCALAR_STRIP_END);
    Some(value.to_string())
}

/// Extracts a scalar field and parses it as a float.
///
/// An unparsable value is treated as absent rather than failing the record.
fn float_field(text: &str, marker: &str) -> Option<f64> {
    scalar_field(text, marker)?.parse::<f64>().ok()
}

/// Extracts a three-component float vector field.
///
/// The value is the content between the `{` and `}` following the marker.
/// A braced value without any internal comma yields `[0.0, 0.0, 0.0]` as an
/// intentional defensive fallback; a malformed component is treated as an
/// absent field.
fn vector_field(text: &str, marker: &str) -> Option<[f64; 3]> {
    let marker_idx = text.find(marker)?;
    let rest = &text[marker_idx..];
    let open_idx = rest.find('{')?;
    let close_idx = rest[open_idx..].find('}')? + open_idx;
    let body = &rest[open_idx + 1..close_idx];

    if !body.contains(',') {
        return Some([0.0, 0.0, 0.0]);
    }

    let mut components = body.splitn(3, ',');
    let x = components.next()?.trim().parse::<f64>().ok()?;
    let y = components.next()?.trim().parse::<f64>().ok()?;
    let z = components.next()?.trim().parse::<f64>().ok()?;
    Some([x, y, z])
}

// ============================================================================
// Tests
// ============================================================================
