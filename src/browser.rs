use std::collections::BTreeMap;

use tracing::debug;

use crate::anchor::ReapplyReport;
use crate::config::HighlighterConfig;
use crate::controller::{Confirm, Controller, MenuItem, Outgoing, TabId};
use crate::dom::NodeId;
use crate::message::ToController;
use crate::range::DomRange;
use crate::renderer::PageRenderer;
use crate::storage::{HighlightStore, MemoryStore};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Tab {
    url: String,
    html: String,
    renderer: PageRenderer,
}

/// One controller, one shared store and any number of tabs, with messages
/// delivered synchronously in both directions.
#[derive(Debug)]
pub struct MockBrowser<S: HighlightStore = MemoryStore> {
    controller: Controller,
    store: S,
    config: HighlighterConfig,
    tabs: BTreeMap<TabId, Tab>,
    next_tab_id: TabId,
}

impl MockBrowser<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), HighlighterConfig::default())
    }
}

impl Default for MockBrowser<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: HighlightStore> MockBrowser<S> {
    pub fn with_store(store: S, config: HighlighterConfig) -> Self {
        Self {
            controller: Controller::new(),
            store,
            config,
            tabs: BTreeMap::new(),
            next_tab_id: 1,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn open_tab(&mut self, url: &str, html: &str) -> Result<TabId> {
        let id = self.next_tab_id;
        self.next_tab_id += 1;
        let (renderer, _) = self.start_page(id, url, html)?;
        self.tabs.insert(
            id,
            Tab {
                url: url.to_string(),
                html: html.to_string(),
                renderer,
            },
        );
        Ok(id)
    }

    /// Re-parses the tab's original markup and restores its highlights, the
    /// way a full page reload would.
    pub fn reload(&mut self, tab: TabId) -> Result<ReapplyReport> {
        let (url, html) = {
            let entry = self.tab_entry(tab)?;
            (entry.url.clone(), entry.html.clone())
        };
        self.navigate(tab, &url, &html)
    }

    /// Loads new markup into an existing tab.
    pub fn navigate(&mut self, tab: TabId, url: &str, html: &str) -> Result<ReapplyReport> {
        self.tab_entry(tab)?;
        let (renderer, report) = self.start_page(tab, url, html)?;
        self.tabs.insert(
            tab,
            Tab {
                url: url.to_string(),
                html: html.to_string(),
                renderer,
            },
        );
        Ok(report)
    }

    pub fn close_tab(&mut self, tab: TabId) -> Result<()> {
        self.tabs
            .remove(&tab)
            .ok_or(Error::UnknownTab(tab))?;
        self.controller.tab_removed(tab);
        Ok(())
    }

    pub fn page(&self, tab: TabId) -> Result<&PageRenderer> {
        Ok(&self.tab_entry(tab)?.renderer)
    }

    pub fn page_mut(&mut self, tab: TabId) -> Result<&mut PageRenderer> {
        Ok(&mut self.tab_entry_mut(tab)?.renderer)
    }

    pub fn select_text(&mut self, tab: TabId, needle: &str) -> Result<DomRange> {
        self.page_mut(tab)?.select_text(needle)
    }

    pub fn mouse_up(&mut self, tab: TabId, target: Option<NodeId>) -> Result<Option<NodeId>> {
        let Self { tabs, store, .. } = self;
        let entry = tabs.get_mut(&tab).ok_or(Error::UnknownTab(tab))?;
        entry.renderer.mouse_up(target, store)
    }

    pub fn ctrl_click(&mut self, tab: TabId, target: NodeId) -> Result<bool> {
        let Self { tabs, store, .. } = self;
        let entry = tabs.get_mut(&tab).ok_or(Error::UnknownTab(tab))?;
        entry.renderer.ctrl_click(target, store)
    }

    pub fn context_menu(&mut self, tab: TabId, target: NodeId) -> Result<bool> {
        Ok(self.page_mut(tab)?.open_context_menu(target))
    }

    /// Picks "Delete" in the marker menu opened by [`Self::context_menu`].
    pub fn context_menu_delete(&mut self, tab: TabId) -> Result<bool> {
        let Self { tabs, store, .. } = self;
        let entry = tabs.get_mut(&tab).ok_or(Error::UnknownTab(tab))?;
        entry.renderer.delete_from_context_menu(store)
    }

    pub fn press_key(&mut self, tab: TabId, key: &str, target: Option<NodeId>) -> Result<()> {
        let request = self.page_mut(tab)?.handle_key(key, target)?;
        if let Some(request) = request {
            let dispatch = self.controller.handle_message(tab, request);
            self.deliver(dispatch.messages)?;
        }
        Ok(())
    }

    pub fn click_toolbar(&mut self, tab: TabId) -> Result<()> {
        self.tab_entry(tab)?;
        let outgoing = self.controller.toolbar_clicked(tab);
        self.deliver(vec![outgoing])
    }

    pub fn click_menu(&mut self, tab: TabId, item: MenuItem, confirm: &mut dyn Confirm) -> Result<()> {
        self.tab_entry(tab)?;
        let outgoing = self
            .controller
            .menu_clicked(tab, item, &mut self.store, confirm)?;
        self.deliver(outgoing)
    }

    /// Mirrors a content context starting up: ask the controller for the
    /// current mode, then restore the page's stored highlights.
    fn start_page(
        &mut self,
        tab: TabId,
        url: &str,
        html: &str,
    ) -> Result<(PageRenderer, ReapplyReport)> {
        let mut renderer = PageRenderer::with_config(url, html, self.config.clone())?;
        if let Some(state) = self
            .controller
            .handle_message(tab, ToController::GetExtensionState)
            .reply
        {
            renderer.apply_extension_state(&state);
        }
        let report = renderer.load(&self.store)?;
        Ok((renderer, report))
    }

    fn deliver(&mut self, outgoing: Vec<Outgoing>) -> Result<()> {
        for Outgoing { tab, message } in outgoing {
            let Some(entry) = self.tabs.get_mut(&tab) else {
                debug!(tab, ?message, "dropping message for closed tab");
                continue;
            };
            entry.renderer.handle_message(message, &mut self.store)?;
        }
        Ok(())
    }

    fn tab_entry(&self, tab: TabId) -> Result<&Tab> {
        self.tabs.get(&tab).ok_or(Error::UnknownTab(tab))
    }

    fn tab_entry_mut(&mut self, tab: TabId) -> Result<&mut Tab> {
        self.tabs.get_mut(&tab).ok_or(Error::UnknownTab(tab))
    }
}
