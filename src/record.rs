use serde::{Deserialize, Serialize};

/// One persisted highlight.
///
/// The record is a fingerprint, not an address: `before_text` and
/// `after_text` are the literal text around the first occurrence of `text`
/// in its container, and `parent_tag` / `parent_index` describe where that
/// container sat when the highlight was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    pub text: String,
    pub color: String,
    #[serde(default)]
    pub before_text: String,
    #[serde(default)]
    pub after_text: String,
    pub parent_tag: String,
    #[serde(default)]
    pub parent_index: usize,
}

impl HighlightRecord {
    /// The string a candidate container must contain for the record to
    /// anchor there.
    pub fn context_needle(&self) -> String {
        let mut needle =
            String::with_capacity(self.before_text.len() + self.text.len() + self.after_text.len());
        needle.push_str(&self.before_text);
        needle.push_str(&self.text);
        needle.push_str(&self.after_text);
        needle
    }
}

/// Every highlight of one page, in document order of their markers at the
/// time of the last extraction. Records never refer to each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightSet {
    records: Vec<HighlightRecord>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: HighlightRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HighlightRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[HighlightRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<HighlightRecord> {
        self.records
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl From<Vec<HighlightRecord>> for HighlightSet {
    fn from(records: Vec<HighlightRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<HighlightRecord> for HighlightSet {
    fn from_iter<I: IntoIterator<Item = HighlightRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HighlightSet {
    type Item = &'a HighlightRecord;
    type IntoIter = std::slice::Iter<'a, HighlightRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
