//! Key-value persistence for highlight sets.
//!
//! Each page's set is stored whole under its storage key and overwritten on
//! every change; the last write wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::record::HighlightSet;
use crate::{Error, Result};

pub trait HighlightStore {
    fn get(&self, key: &str) -> Result<Option<HighlightSet>>;

    fn set(&mut self, key: &str, set: &HighlightSet) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Drops every stored set, for every page.
    fn clear(&mut self) -> Result<()>;

    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store holding serialized JSON, so values round-trip through the
/// same encoding a persistent store would use.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert_raw(&mut self, key: &str, raw: &str) {
        self.entries.insert(key.to_string(), raw.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HighlightStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<HighlightSet>> {
        self.entries
            .get(key)
            .map(|raw| HighlightSet::from_json(raw))
            .transpose()
    }

    fn set(&mut self, key: &str, set: &HighlightSet) -> Result<()> {
        self.entries.insert(key.to_string(), set.to_json()?);
        debug!(key, count = set.len(), "highlights saved");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Store backed by a single JSON object file, rewritten on every write.
/// A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, HighlightSet>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(Error::Storage(format!("{}: {err}", self.path.display()))),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, HighlightSet>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| Error::Storage(format!("{}: {err}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)
            .map_err(|err| Error::Storage(format!("{}: {err}", self.path.display())))
    }
}

impl HighlightStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<HighlightSet>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, set: &HighlightSet) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), set.clone());
        self.write_all(&entries)?;
        debug!(key, count = set.len(), path = %self.path.display(), "highlights saved");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.write_all(&BTreeMap::new())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }
}
