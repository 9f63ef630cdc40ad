//! The privileged side: owns the highlighter mode and tells pages about it.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::message::{ToController, ToRenderer};
use crate::state::{ColorState, ExtensionState, StateMachine};
use crate::storage::HighlightStore;
use crate::Result;

pub type TabId = u32;

pub const PURGE_PROMPT: &str =
    "Are you sure you want to purge all saved highlights? This action is irreversible.";

/// Entries of the page and toolbar context menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    AddHighlight,
    ToggleHighlights,
    ClearPageHighlights,
    PurgeAllHighlights,
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub tab: TabId,
    pub message: ToRenderer,
}

/// Result of handling one renderer message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Direct reply to the sender, for request-style messages.
    pub reply: Option<ExtensionState>,
    pub messages: Vec<Outgoing>,
}

#[derive(Debug, Clone, Default)]
pub struct Controller {
    state: StateMachine,
    tabs: HashMap<TabId, bool>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ColorState {
        self.state.current()
    }

    pub fn snapshot(&self) -> ExtensionState {
        self.state.snapshot()
    }

    /// Whether the tab was last told that highlighting is active.
    pub fn is_tab_active(&self, tab: TabId) -> bool {
        self.tabs.get(&tab).copied().unwrap_or(false)
    }

    /// "Add highlight" is offered only while highlighting mode is off.
    pub fn add_highlight_menu_visible(&self) -> bool {
        !self.state.current().is_active()
    }

    pub fn handle_message(&mut self, tab: TabId, message: ToController) -> Dispatch {
        match message {
            ToController::GetExtensionState => Dispatch {
                reply: Some(self.snapshot()),
                messages: Vec::new(),
            },
            ToController::SetStateFromShortcut { state } => {
                self.state.toggle(state);
                Dispatch {
                    reply: None,
                    messages: vec![self.push_state(tab)],
                }
            }
            ToController::TurnOff => {
                self.state.set(ColorState::Off);
                Dispatch {
                    reply: None,
                    messages: vec![self.push_state(tab)],
                }
            }
        }
    }

    /// Toolbar button: advance to the next state and notify the tab.
    pub fn toolbar_clicked(&mut self, tab: TabId) -> Outgoing {
        self.state.cycle();
        self.push_state(tab)
    }

    pub fn menu_clicked(
        &mut self,
        tab: TabId,
        item: MenuItem,
        store: &mut dyn HighlightStore,
        confirm: &mut dyn Confirm,
    ) -> Result<Vec<Outgoing>> {
        let message = match item {
            MenuItem::AddHighlight => ToRenderer::AddHighlight {
                color: ColorState::Off.color().to_string(),
            },
            MenuItem::ToggleHighlights => ToRenderer::ToggleHighlights,
            MenuItem::ClearPageHighlights => ToRenderer::ClearPageHighlights,
            MenuItem::PurgeAllHighlights => {
                if !confirm.confirm(PURGE_PROMPT) {
                    debug!(tab, "purge declined");
                    return Ok(Vec::new());
                }
                store.clear()?;
                info!("all highlights purged");
                ToRenderer::PurgeAllHighlights
            }
        };
        Ok(vec![Outgoing { tab, message }])
    }

    pub fn tab_removed(&mut self, tab: TabId) {
        self.tabs.remove(&tab);
    }

    fn push_state(&mut self, tab: TabId) -> Outgoing {
        let snapshot = self.snapshot();
        self.tabs.insert(tab, snapshot.active);
        info!(tab, state = %self.state.current(), "extension state updated");
        Outgoing {
            tab,
            message: snapshot.into(),
        }
    }
}
