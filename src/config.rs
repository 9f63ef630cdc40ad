use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::marker::DEFAULT_MARKER_CLASS;
use crate::{Error, Result};

pub const DEFAULT_CONTEXT_CHARS: usize = 50;

/// Tunables for capture and re-anchoring.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighlighterConfig {
    /// Characters of surrounding text kept on each side of a highlight.
    pub context_chars: usize,
    /// Class that identifies marker elements.
    pub marker_class: String,
    /// Prefer candidates whose sibling index matches the recorded
    /// `parentIndex` before falling back to document order.
    pub strict_parent_index: bool,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            context_chars: DEFAULT_CONTEXT_CHARS,
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            strict_parent_index: false,
        }
    }
}

impl HighlighterConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let class = self.marker_class.trim();
        if class.is_empty() || class.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "marker class must be a single non-empty class name, got {:?}",
                self.marker_class
            )));
        }
        Ok(())
    }
}
