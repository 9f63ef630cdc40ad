//! Per-page text highlights that survive reloads.
//!
//! A highlight is a `<span>` marker wrapped around selected text. When the
//! page changes, every marker is serialized into a [`HighlightRecord`]: the
//! highlighted text, its color, up to fifty characters of literal context on
//! each side, and the tag and sibling index of its container. After a reload
//! the records are re-anchored by searching the new document for a container
//! with the same tag whose text contains `before + text + after`. No element
//! ids are needed, and a record that cannot be placed is skipped without
//! affecting the others.
//!
//! ```
//! use page_highlighter::{MemoryStore, PageRenderer};
//!
//! # fn main() -> page_highlighter::Result<()> {
//! let mut store = MemoryStore::new();
//! let html = "<p>The quick brown fox</p>";
//!
//! let mut page = PageRenderer::from_html("https://example.com/story", html)?;
//! page.select_text("quick")?;
//! page.capture_selection("#fee086", &mut store)?;
//!
//! let mut reloaded = PageRenderer::from_html("https://example.com/story", html)?;
//! let report = reloaded.load(&store)?;
//! assert_eq!(report.applied.len(), 1);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod anchor;
pub mod browser;
pub mod config;
pub mod controller;
pub mod dom;
pub mod extract;
pub mod html;
pub mod location;
pub mod marker;
pub mod message;
pub mod range;
pub mod record;
pub mod renderer;
pub mod state;
pub mod storage;

pub use anchor::{ReapplyReport, SkipReason, SkippedRecord, locate, locate_strict, reapply};
pub use browser::MockBrowser;
pub use config::HighlighterConfig;
pub use controller::{Confirm, Controller, Dispatch, MenuItem, Outgoing, TabId};
pub use dom::{Dom, NodeId};
pub use extract::extract_records;
pub use html::parse_html;
pub use location::PageLocation;
pub use message::{ToController, ToRenderer};
pub use range::{Boundary, DomRange};
pub use record::{HighlightRecord, HighlightSet};
pub use renderer::PageRenderer;
pub use state::{ColorState, ExtensionState, StateMachine};
pub use storage::{FileStore, HighlightStore, MemoryStore};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),
    #[error("offset {offset} is out of bounds or not on a character boundary (length {length})")]
    InvalidOffset { offset: usize, length: usize },
    #[error("cannot wrap range: {0}")]
    RangeWrap(String),
    #[error("invalid page location: {0}")]
    InvalidLocation(String),
    #[error("unknown color state: {0}")]
    UnknownColorState(String),
    #[error("unknown tab: {0}")]
    UnknownTab(TabId),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
