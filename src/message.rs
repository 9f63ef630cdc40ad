//! Messages exchanged between the controller and page renderers.
//!
//! On the wire each message is a JSON object tagged by `action`, e.g.
//! `{"action":"addHighlight","color":"#fee086"}`.

use serde::{Deserialize, Serialize};

use crate::state::{ColorState, ExtensionState};

/// Renderer to controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ToController {
    /// Answered with an [`ExtensionState`].
    GetExtensionState,
    SetStateFromShortcut { state: ColorState },
    TurnOff,
}

/// Controller to renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ToRenderer {
    UpdateExtensionState { active: bool, color: String },
    AddHighlight { color: String },
    ToggleHighlights,
    ClearPageHighlights,
    PurgeAllHighlights,
}

impl From<ExtensionState> for ToRenderer {
    fn from(state: ExtensionState) -> Self {
        Self::UpdateExtensionState {
            active: state.active,
            color: state.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_action_tags_on_the_wire() -> crate::Result<()> {
        let raw = serde_json::to_string(&ToRenderer::AddHighlight {
            color: "#fee086".into(),
        })?;
        assert_eq!(raw, r##"{"action":"addHighlight","color":"#fee086"}"##);

        let parsed: ToController =
            serde_json::from_str(r#"{"action":"setStateFromShortcut","state":"green"}"#)?;
        assert_eq!(
            parsed,
            ToController::SetStateFromShortcut {
                state: ColorState::Green
            }
        );

        let parsed: ToRenderer = serde_json::from_str(r#"{"action":"purgeAllHighlights"}"#)?;
        assert_eq!(parsed, ToRenderer::PurgeAllHighlights);
        Ok(())
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let parsed = serde_json::from_str::<ToController>(r#"{"action":"selfDestruct"}"#);
        assert!(parsed.is_err());
    }
}
