//! Scripting argument values.
//!
//! Arguments of a scripting call are scalars with inferred types, plus one
//! special record type: the navigation state passed to
//! `openspace.navigation.setNavigationState`.
//!
//! # Type Inference
//!
//! Textual tokens are classified in a fixed order:
//!
//! | Order | Test | Result |
//! |-------|------|--------|
//! | 1 | parses as `i64` | [`ScriptValue::Int`] |
//! | 2 | parses as `f64` | [`ScriptValue::Float`] |
//! | 3 | equals `true`/`false` (case-insensitive) | [`ScriptValue::Bool`] |
//! | 4 | anything else | [`ScriptValue::Str`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// ScriptValue
// ============================================================================

/// A single argument of a scripting invocation.
///
/// Serializes untagged to the natural JSON value, which is what the engine's
/// `luascript` payload expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScriptValue {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Boolean literal (`true`/`false`, any case).
    Bool(bool),
    /// Anything that is not a number or boolean.
    Str(String),
    /// Navigation-state record, the single argument of
    /// `openspace.navigation.setNavigationState`.
    Navigation(NavigationState),
}

impl ScriptValue {
    /// Infers the value type of a trimmed argument token.
    ///
    /// Inference is pure and deterministic; see the module docs for the
    /// classification order.
    #[must_use]
    pub fn infer(token: &str) -> Self {
        if let Ok(i) = token.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Self::Float(f);
        }
        if token.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if token.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        Self::Str(token.to_string())
    }
}

// ============================================================================
// ScriptValue - Conversions
// ============================================================================

impl From<i64> for ScriptValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ScriptValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

// ============================================================================
// ScriptValue - Display
// ============================================================================

impl fmt::Display for ScriptValue {
    /// Renders the value in call-string form.
    ///
    /// Strings are single-quoted; floats always carry a decimal point so
    /// they re-parse as floats.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Navigation(nav) => write!(f, "{nav}"),
        }
    }
}

// ============================================================================
// NavigationState
// ============================================================================

/// Camera navigation state record.
///
/// All fields are optional; presence is keyed by the field markers found in
/// the source text. Serializes with the engine's PascalCase key names,
/// omitting absent fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationState {
    /// Anchor node name.
    #[serde(rename = "Anchor", skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    /// Reference frame node name.
    #[serde(rename = "ReferenceFrame", skip_serializing_if = "Option::is_none")]
    pub reference_frame: Option<String>,

    /// Camera pitch in radians.
    #[serde(rename = "Pitch", skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,

    /// Camera yaw in radians.
    #[serde(rename = "Yaw", skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,

    /// Camera position relative to the anchor.
    #[serde(rename = "Position", skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,

    /// Camera up vector.
    #[serde(rename = "Up", skip_serializing_if = "Option::is_none")]
    pub up: Option<[f64; 3]>,
}

// ============================================================================
// NavigationState - Builder Methods
// ============================================================================

impl NavigationState {
    /// Creates an empty navigation state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no field is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none()
            && self.reference_frame.is_none()
            && self.pitch.is_none()
            && self.yaw.is_none()
            && self.position.is_none()
            && self.up.is_none()
    }

    /// Sets the anchor node.
    #[inline]
    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Sets the reference frame.
    #[inline]
    #[must_use]
    pub fn with_reference_frame(mut self, frame: impl Into<String>) -> Self {
        self.reference_frame = Some(frame.into());
        self
    }

    /// Sets the pitch.
    #[inline]
    #[must_use]
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Sets the yaw.
    #[inline]
    #[must_use]
    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.yaw = Some(yaw);
        self
    }

    /// Sets the position vector.
    #[inline]
    #[must_use]
    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the up vector.
    #[inline]
    #[must_use]
    pub fn with_up(mut self, up: [f64; 3]) -> Self {
        self.up = Some(up);
        self
    }
}

// ============================================================================
// NavigationState - Display
// ============================================================================

impl fmt::Display for NavigationState {
    /// Renders the record in the navigation-state call syntax, e.g.
    /// `{Anchor = 'Earth', Pitch = 0.5, Position = {1.0, 2.0, 3.0}}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(6);
        if let Some(anchor) = &self.anchor {
            parts.push(format!("Anchor = '{anchor}'"));
        }
        if let Some(frame) = &self.reference_frame {
            parts.push(format!("ReferenceFrame = '{frame}'"));
        }
        if let Some(pitch) = self.pitch {
            parts.push(format!("Pitch = {pitch:?}"));
        }
        if let Some(yaw) = self.yaw {
            parts.push(format!("Yaw = {yaw:?}"));
        }
        if let Some([x, y, z]) = self.position {
            parts.push(format!("Position = {{{x:?}, {y:?}, {z:?}}}"));
        }
        if let Some([x, y, z]) = self.up {
            parts.push(format!("Up = {{{x:?}, {y:?}, {z:?}}}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_int() {
        assert_eq!(ScriptValue::infer("42"), ScriptValue::Int(42));
        assert_eq!(ScriptValue::infer("-7"), ScriptValue::Int(-7));
    }

    #[test]
    fn test_infer_float() {
        assert_eq!(ScriptValue::infer("0.5"), ScriptValue::Float(0.5));
        assert_eq!(ScriptValue::infer("-1.25e3"), ScriptValue::Float(-1250.0));
    }

    #[test]
    fn test_infer_bool_case_insensitive() {
        assert_eq!(ScriptValue::infer("True"), ScriptValue::Bool(true));
        assert_eq!(ScriptValue::infer("FALSE"), ScriptValue::Bool(false));
    }

    #[test]
    fn test_infer_string_fallback() {
        assert_eq!(
            ScriptValue::infer("Dashboard.IsEnabled"),
            ScriptValue::Str("Dashboard.IsEnabled".to_string())
        );
    }

    #[test]
    fn test_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            ScriptValue::Int(1),
            ScriptValue::Float(2.5),
            ScriptValue::Bool(false),
            ScriptValue::Str("Earth".to_string()),
        ])
        .expect("serialize");
        assert_eq!(json, r#"[1,2.5,false,"Earth"]"#);
    }

    #[test]
    fn test_display_round_trippable() {
        assert_eq!(ScriptValue::Int(3).to_string(), "3");
        assert_eq!(ScriptValue::Float(3.0).to_string(), "3.0");
        assert_eq!(ScriptValue::Bool(true).to_string(), "true");
        assert_eq!(ScriptValue::Str("Earth".to_string()).to_string(), "'Earth'");
    }

    #[test]
    fn test_navigation_serialize_skips_absent_fields() {
        let nav = NavigationState::new()
            .with_anchor("Earth")
            .with_pitch(0.5)
            .with_position([1.0, 2.0, 3.0]);

        let json = serde_json::to_value(&nav).expect("serialize");
        assert_eq!(json["Anchor"], "Earth");
        assert_eq!(json["Pitch"], 0.5);
        assert_eq!(json["Position"][2], 3.0);
        assert!(json.get("Up").is_none());
        assert!(json.get("Yaw").is_none());
        assert!(json.get("ReferenceFrame").is_none());
    }

    #[test]
    fn test_navigation_display() {
        let nav = NavigationState::new()
            .with_anchor("Mars")
            .with_yaw(0.25)
            .with_up([0.0, 1.0, 0.0]);
        assert_eq!(
            nav.to_string(),
            "{Anchor = 'Mars', Yaw = 0.25, Up = {0.0, 1.0, 0.0}}"
        );
    }

    #[test]
    fn test_navigation_is_empty() {
        assert!(NavigationState::new().is_empty());
        assert!(!NavigationState::new().with_pitch(0.0).is_empty());
    }
}
