//! The page-scoped side: owns one document and its markers.

use tracing::{debug, info, warn};

use crate::anchor::{self, ReapplyReport};
use crate::config::HighlighterConfig;
use crate::dom::{Dom, NodeId};
use crate::extract;
use crate::html::parse_html;
use crate::location::PageLocation;
use crate::marker;
use crate::message::{ToController, ToRenderer};
use crate::range::{self, DomRange};
use crate::record::HighlightSet;
use crate::state::{ColorState, ExtensionState};
use crate::storage::HighlightStore;
use crate::{Error, Result};

pub const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone)]
pub struct PageRenderer {
    dom: Dom,
    location: PageLocation,
    config: HighlighterConfig,
    selection: Option<DomRange>,
    active: bool,
    color: String,
    highlights_visible: bool,
    marker_menu: Option<NodeId>,
}

impl PageRenderer {
    pub fn from_html(url: &str, html: &str) -> Result<Self> {
        Self::with_config(url, html, HighlighterConfig::default())
    }

    pub fn with_config(url: &str, html: &str, config: HighlighterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dom: parse_html(html)?,
            location: PageLocation::parse(url)?,
            config,
            selection: None,
            active: false,
            color: ColorState::Off.color().to_string(),
            highlights_visible: true,
            marker_menu: None,
        })
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn storage_key(&self) -> String {
        self.location.storage_key()
    }

    pub fn config(&self) -> &HighlighterConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn highlights_visible(&self) -> bool {
        self.highlights_visible
    }

    pub fn markers(&self) -> Vec<NodeId> {
        marker::markers(&self.dom, &self.config.marker_class)
    }

    pub fn apply_extension_state(&mut self, state: &ExtensionState) {
        self.active = state.active;
        self.color = state.color.clone();
        debug!(active = self.active, color = %self.color, "page state updated");
    }

    pub fn selection(&self) -> Option<&DomRange> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, range: DomRange) {
        self.selection = Some(range);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Selects the first occurrence of `needle` that lies inside a single
    /// text node, searching the whole document.
    pub fn select_text(&mut self, needle: &str) -> Result<DomRange> {
        self.select_text_within(self.dom.root(), needle)
    }

    pub fn select_text_within(&mut self, container: NodeId, needle: &str) -> Result<DomRange> {
        let range = self
            .dom
            .descendants(container)
            .into_iter()
            .filter(|node| !self.in_raw_text_element(*node))
            .find_map(|node| {
                let offset = self.dom.text(node)?.find(needle)?;
                Some(DomRange::in_text(node, offset, offset + needle.len()))
            })
            .ok_or_else(|| Error::NodeNotFound(format!("text {needle:?}")))?;
        self.selection = Some(range);
        Ok(range)
    }

    fn in_raw_text_element(&self, node: NodeId) -> bool {
        self.dom
            .parent(node)
            .and_then(|parent| self.dom.tag_name(parent))
            .is_some_and(|tag| matches!(tag, "script" | "style"))
    }

    /// Reads this page's stored set and re-anchors it.
    pub fn load(&mut self, store: &dyn HighlightStore) -> Result<ReapplyReport> {
        let key = self.storage_key();
        let set = store.get(&key)?.unwrap_or_default();
        if set.is_empty() {
            debug!(key = %key, "no highlights stored for page");
            return Ok(ReapplyReport::default());
        }
        info!(key = %key, count = set.len(), "loaded highlights");
        self.reapply(&set)
    }

    pub fn reapply(&mut self, set: &HighlightSet) -> Result<ReapplyReport> {
        anchor::reapply(&mut self.dom, set, &self.config, self.highlights_visible)
    }

    /// Wraps the current selection in a marker and persists the page.
    ///
    /// An empty or collapsed selection does nothing. A selection the wrap
    /// primitive cannot enclose is logged and dropped.
    pub fn capture_selection(
        &mut self,
        color: &str,
        store: &mut dyn HighlightStore,
    ) -> Result<Option<NodeId>> {
        let Some(range) = self.selection.filter(|range| !range.is_collapsed()) else {
            return Ok(None);
        };
        let marker = match marker::wrap_range(&mut self.dom, &range, &self.config.marker_class, color)
        {
            Ok(marker) => marker,
            Err(err) => {
                warn!(error = %err, "could not highlight selection");
                return Ok(None);
            }
        };
        self.selection = None;
        if !self.highlights_visible {
            marker::apply_visibility(&mut self.dom, marker, false)?;
        }
        info!(marker = marker.index(), color, "new highlight created");
        self.save(store)?;
        Ok(Some(marker))
    }

    /// Recomputes the page's whole set from the markers in the document and
    /// overwrites the stored one.
    pub fn save(&self, store: &mut dyn HighlightStore) -> Result<HighlightSet> {
        let set = self.extract();
        store.set(&self.storage_key(), &set)?;
        Ok(set)
    }

    pub fn extract(&self) -> HighlightSet {
        extract::extract_records(&self.dom, &self.config)
    }

    /// Unwraps one marker and persists what remains. Returns `false` when
    /// `node` is not a marker.
    pub fn delete_marker(&mut self, node: NodeId, store: &mut dyn HighlightStore) -> Result<bool> {
        if !marker::is_marker(&self.dom, node, &self.config.marker_class)
            || !self.dom.is_connected(node)
        {
            return Ok(false);
        }
        range::unwrap(&mut self.dom, node)?;
        self.save(store)?;
        info!(marker = node.index(), "highlight deleted");
        Ok(true)
    }

    pub fn toggle_visibility(&mut self) -> Result<bool> {
        self.highlights_visible = !self.highlights_visible;
        marker::apply_visibility_all(&mut self.dom, &self.config.marker_class, self.highlights_visible)?;
        debug!(visible = self.highlights_visible, "highlight visibility toggled");
        Ok(self.highlights_visible)
    }

    pub fn clear_page(&mut self, store: &mut dyn HighlightStore) -> Result<()> {
        marker::unwrap_all(&mut self.dom, &self.config.marker_class)?;
        store.remove(&self.storage_key())?;
        info!(key = %self.storage_key(), "page highlights cleared");
        Ok(())
    }

    /// Removes the markers from this document only; stored sets are cleared
    /// by the controller before this runs.
    pub fn purge_page_markers(&mut self) -> Result<usize> {
        marker::unwrap_all(&mut self.dom, &self.config.marker_class)
    }

    pub fn handle_message(&mut self, message: ToRenderer, store: &mut dyn HighlightStore) -> Result<()> {
        match message {
            ToRenderer::UpdateExtensionState { active, color } => {
                self.apply_extension_state(&ExtensionState { active, color });
            }
            ToRenderer::AddHighlight { color } => {
                self.capture_selection(&color, store)?;
            }
            ToRenderer::ToggleHighlights => {
                self.toggle_visibility()?;
            }
            ToRenderer::ClearPageHighlights => self.clear_page(store)?,
            ToRenderer::PurgeAllHighlights => {
                self.purge_page_markers()?;
            }
        }
        Ok(())
    }

    /// Keyboard shortcuts. Color keys and Escape go to the controller; `h`
    /// toggles visibility locally. Keys typed into editable fields are
    /// ignored.
    pub fn handle_key(&mut self, key: &str, target: Option<NodeId>) -> Result<Option<ToController>> {
        if target.is_some_and(|node| self.is_editable(node)) {
            return Ok(None);
        }
        if key.eq_ignore_ascii_case(ESCAPE_KEY) {
            return Ok(Some(ToController::TurnOff));
        }
        let mut chars = key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return Ok(None);
        };
        if ch.eq_ignore_ascii_case(&'h') {
            self.toggle_visibility()?;
            return Ok(None);
        }
        Ok(ColorState::from_shortcut(ch).map(|state| ToController::SetStateFromShortcut { state }))
    }

    /// End of a mouse selection: highlight it when the mode is active and the
    /// press did not end on an existing marker.
    pub fn mouse_up(
        &mut self,
        target: Option<NodeId>,
        store: &mut dyn HighlightStore,
    ) -> Result<Option<NodeId>> {
        if !self.active {
            return Ok(None);
        }
        if target.is_some_and(|node| marker::is_marker(&self.dom, node, &self.config.marker_class)) {
            return Ok(None);
        }
        let color = self.color.clone();
        self.capture_selection(&color, store)
    }

    /// Ctrl+click on a marker deletes it. Any click also dismisses an open
    /// marker menu.
    pub fn ctrl_click(&mut self, target: NodeId, store: &mut dyn HighlightStore) -> Result<bool> {
        self.marker_menu = None;
        self.delete_marker(target, store)
    }

    /// Right-click. Over a marker this opens the page's own menu with a single
    /// delete entry and returns `true` (the native menu is suppressed);
    /// anywhere else it closes that menu and returns `false`.
    pub fn open_context_menu(&mut self, target: NodeId) -> bool {
        self.marker_menu = marker::is_marker(&self.dom, target, &self.config.marker_class)
            .then_some(target);
        self.marker_menu.is_some()
    }

    /// Marker the delete menu is currently open for.
    pub fn marker_menu(&self) -> Option<NodeId> {
        self.marker_menu
    }

    pub fn dismiss_context_menu(&mut self) {
        self.marker_menu = None;
    }

    /// Clicks the delete entry of the open marker menu. Returns `false` when
    /// no menu is open.
    pub fn delete_from_context_menu(&mut self, store: &mut dyn HighlightStore) -> Result<bool> {
        let Some(target) = self.marker_menu.take() else {
            return Ok(false);
        };
        self.delete_marker(target, store)
    }

    fn is_editable(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(element) = self.dom.element(current) {
                if matches!(element.tag_name.as_str(), "input" | "textarea" | "select") {
                    return true;
                }
                match element.attr("contenteditable") {
                    Some(value) if value.eq_ignore_ascii_case("false") => return false,
                    Some(_) => return true,
                    None => {}
                }
            }
            cursor = self.dom.parent(current);
        }
        false
    }
}
