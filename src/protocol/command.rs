//! Built-in engine commands.
//!
//! The driver issues a small fixed set of scripting functions besides
//! arbitrary parsed calls. [`EngineCommand`] names them and maps each to its
//! [`Invocation`].
//!
//! # Commands
//!
//! | Command | Engine function |
//! |---------|-----------------|
//! | [`EngineCommand::Quit`] | `openspace.toggleShutdown` |
//! | [`EngineCommand::SetPause`] | `openspace.time.setPause` |
//! | [`EngineCommand::SetTime`] | `openspace.time.setTime` |
//! | [`EngineCommand::SetProperty`] | `openspace.setPropertyValueSingle` |
//! | [`EngineCommand::TriggerAction`] | `openspace.action.triggerAction` |
//! | [`EngineCommand::SetScreenshotFolder`] | `openspace.setScreenshotFolder` |
//! | [`EngineCommand::TakeScreenshot`] | `openspace.takeScreenshot` |

// ============================================================================
// Imports
// ============================================================================

use crate::script::{Invocation, ScriptValue};

use super::message::ControlMessage;

// ============================================================================
// Constants
// ============================================================================

/// Overlay UI properties disabled before capturing screenshots.
pub const HUD_PROPERTIES: [&str; 5] = [
    "Dashboard.IsEnabled",
    "RenderEngine.ShowLog",
    "RenderEngine.ShowVersion",
    "RenderEngine.ShowCamera",
    "Modules.CefWebGui.Visible",
];

// ============================================================================
// EngineCommand
// ============================================================================

/// A built-in command understood by the engine's scripting channel.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Request a graceful engine shutdown.
    Quit,

    /// Pause or resume simulation time.
    SetPause {
        /// `true` pauses, `false` resumes.
        paused: bool,
    },

    /// Set the simulation time.
    SetTime {
        /// Time string in the engine's accepted format.
        time: String,
    },

    /// Set a single property value.
    SetProperty {
        /// Fully qualified property path.
        property: String,
        /// New value.
        value: ScriptValue,
    },

    /// Trigger a named action.
    TriggerAction {
        /// Action identifier.
        name: String,
    },

    /// Redirect screenshot output to a folder.
    SetScreenshotFolder {
        /// Target folder, engine-side path tokens allowed.
        folder: String,
    },

    /// Capture a screenshot into the current screenshot folder.
    TakeScreenshot,
}

// ============================================================================
// EngineCommand - Conversion
// ============================================================================

impl EngineCommand {
    /// Maps the command to its scripting invocation.
    #[must_use]
    pub fn into_invocation(self) -> Invocation {
        match self {
            Self::Quit => Invocation::new("openspace.toggleShutdown", Vec::new()),
            Self::SetPause { paused } => {
                Invocation::new("openspace.time.setPause", vec![ScriptValue::Bool(paused)])
            }
            Self::SetTime { time } => {
                Invocation::new("openspace.time.setTime", vec![ScriptValue::Str(time)])
            }
            Self::SetProperty { property, value } => Invocation::new(
                "openspace.setPropertyValueSingle",
                vec![ScriptValue::Str(property), value],
            ),
            Self::TriggerAction { name } => Invocation::new(
                "openspace.action.triggerAction",
                vec![ScriptValue::Str(name)],
            ),
            Self::SetScreenshotFolder { folder } => Invocation::new(
                "openspace.setScreenshotFolder",
                vec![ScriptValue::Str(folder)],
            ),
            Self::TakeScreenshot => Invocation::new("openspace.takeScreenshot", Vec::new()),
        }
    }

    /// Wraps the command in its wire envelope.
    #[inline]
    #[must_use]
    pub fn into_message(self) -> ControlMessage {
        ControlMessage::script(self.into_invocation())
    }
}

// ============================================================================
// HUD Helpers
// ============================================================================

/// Commands disabling every overlay UI element.
///
/// Sent before screenshots so captured frames contain only the rendered
/// scene.
#[must_use]
pub fn hide_hud_commands() -> Vec<EngineCommand> {
    HUD_PROPERTIES
        .iter()
        .map(|p| EngineCommand::SetProperty {
            property: (*p).to_string(),
            value: ScriptValue::Bool(false),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_invocation() {
        let inv = EngineCommand::Quit.into_invocation();
        assert_eq!(inv.function(), "openspace.toggleShutdown");
        assert!(inv.arguments().is_empty());
    }

    #[test]
    fn test_set_pause_wire_shape() {
        let wire = EngineCommand::SetPause { paused: false }
            .into_message()
            .to_wire()
            .expect("serialize");
        assert_eq!(
            wire,
            r#"{"topic":4,"type":"luascript","payload":{"function":"openspace.time.setPause","arguments":[false]}}"#
        );
    }

    #[test]
    fn test_set_time_invocation() {
        let inv = EngineCommand::SetTime {
            time: "2024-06-01T12:00:00".to_string(),
        }
        .into_invocation();
        assert_eq!(inv.function(), "openspace.time.setTime");
        assert_eq!(
            inv.arguments(),
            &[ScriptValue::Str("2024-06-01T12:00:00".to_string())]
        );
    }

    #[test]
    fn test_set_property_invocation() {
        let inv = EngineCommand::SetProperty {
            property: "Dashboard.IsEnabled".to_string(),
            value: ScriptValue::Bool(false),
        }
        .into_invocation();
        assert_eq!(inv.function(), "openspace.setPropertyValueSingle");
        assert_eq!(inv.arguments().len(), 2);
    }

    #[test]
    fn test_trigger_action_invocation() {
        let inv = EngineCommand::TriggerAction {
            name: "os.ToggleNightLayer".to_string(),
        }
        .into_invocation();
        assert_eq!(inv.function(), "openspace.action.triggerAction");
    }

    #[test]
    fn test_screenshot_invocations() {
        let folder = EngineCommand::SetScreenshotFolder {
            folder: "${BASE}/user/screenshots".to_string(),
        }
        .into_invocation();
        assert_eq!(folder.function(), "openspace.setScreenshotFolder");
        assert_eq!(folder.arguments().len(), 1);

        let shot = EngineCommand::TakeScreenshot.into_invocation();
        assert_eq!(shot.function(), "openspace.takeScreenshot");
        assert!(shot.arguments().is_empty());
    }

    #[test]
    fn test_hide_hud_covers_all_overlay_properties() {
        let commands = hide_hud_commands();
        assert_eq!(commands.len(), HUD_PROPERTIES.len());
        for (command, property) in commands.into_iter().zip(HUD_PROPERTIES) {
            let inv = command.into_invocation();
            assert_eq!(inv.function(), "openspace.setPropertyValueSingle");
            assert_eq!(
                inv.arguments()[0],
                ScriptValue::Str(property.to_string())
            );
            assert_eq!(inv.arguments()[1], ScriptValue::Bool(false));
        }
    }
}
