//! Re-anchoring: finding a stored highlight again in a freshly loaded page.
//!
//! Matching is best effort. A record either lands on exactly the text it
//! describes or is skipped; a skipped record never disturbs the others.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::HighlighterConfig;
use crate::dom::{Dom, NodeId};
use crate::marker;
use crate::range::DomRange;
use crate::record::{HighlightRecord, HighlightSet};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No element with the recorded tag contains the text with its context.
    NoCandidate,
    /// The container matched but no direct text child holds the text.
    NoTextNode,
    /// The wrap primitive rejected the located range. Located ranges always
    /// sit inside one connected text node, which the primitive accepts, so
    /// this only fires if that contract is broken.
    WrapFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidate => write!(f, "no matching container"),
            Self::NoTextNode => write!(f, "no text node holds the highlighted text"),
            Self::WrapFailed(msg) => write!(f, "wrap failed: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the stored set.
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapplyReport {
    /// Markers created, in stored record order.
    pub applied: Vec<NodeId>,
    pub skipped: Vec<SkippedRecord>,
}

/// Locates `record` in `dom` without modifying it.
pub fn locate(dom: &Dom, record: &HighlightRecord) -> Option<DomRange> {
    resolve(dom, record, false).ok()
}

/// Like [`locate`], but among matching containers prefers the one whose
/// element index equals the recorded `parent_index`.
pub fn locate_strict(dom: &Dom, record: &HighlightRecord) -> Option<DomRange> {
    resolve(dom, record, true).ok()
}

pub fn resolve(
    dom: &Dom,
    record: &HighlightRecord,
    strict_parent_index: bool,
) -> std::result::Result<DomRange, SkipReason> {
    if record.text.is_empty() {
        return Err(SkipReason::NoTextNode);
    }
    let container = find_container(dom, record, strict_parent_index).ok_or(SkipReason::NoCandidate)?;
    locate_in_container(dom, container, record).ok_or(SkipReason::NoTextNode)
}

/// First element, in document order, whose tag matches and whose text
/// contains `before_text + text + after_text`.
pub fn find_container(dom: &Dom, record: &HighlightRecord, strict_parent_index: bool) -> Option<NodeId> {
    let needle = record.context_needle();
    let mut matching = dom
        .elements_by_tag_name(&record.parent_tag)
        .into_iter()
        .filter(|candidate| dom.text_content(*candidate).contains(&needle));

    if !strict_parent_index {
        return matching.next();
    }
    let matching = matching.collect::<Vec<_>>();
    matching
        .iter()
        .copied()
        .find(|candidate| dom.element_index(*candidate) == Some(record.parent_index))
        .or_else(|| matching.first().copied())
}

/// Range over `record.text` inside a direct text child of `container`.
///
/// The occurrence lined up with the stored context wins when it sits inside a
/// single text child. Otherwise this falls back to the plain lookup: the
/// first direct text child containing the text, at its first occurrence. On
/// an unchanged document both pick the same span.
pub fn locate_in_container(dom: &Dom, container: NodeId, record: &HighlightRecord) -> Option<DomRange> {
    let container_text = dom.text_content(container);
    if let Some(at) = container_text.find(&record.context_needle()) {
        let start = at + record.before_text.len();
        let end = start + record.text.len();
        let mut child_start = 0usize;
        for child in dom.children(container) {
            let child_len = match dom.text(*child) {
                Some(text) => text.len(),
                None => dom.text_content(*child).len(),
            };
            let child_end = child_start + child_len;
            if dom.is_text(*child) && child_start <= start && end <= child_end {
                return Some(DomRange::in_text(
                    *child,
                    start - child_start,
                    end - child_start,
                ));
            }
            if child_start > start {
                break;
            }
            child_start = child_end;
        }
    }

    dom.children(container).iter().find_map(|child| {
        let text = dom.text(*child)?;
        let offset = text.find(&record.text)?;
        Some(DomRange::in_text(*child, offset, offset + record.text.len()))
    })
}

/// Removes every marker, then restores each record of `set` in stored order
/// and applies `visible` to all markers that exist afterwards.
pub fn reapply(
    dom: &mut Dom,
    set: &HighlightSet,
    config: &HighlighterConfig,
    visible: bool,
) -> Result<ReapplyReport> {
    let removed = marker::unwrap_all(dom, &config.marker_class)?;
    if removed > 0 {
        debug!(removed, "cleared existing markers before re-anchoring");
    }

    let mut report = ReapplyReport::default();
    for (index, record) in set.iter().enumerate() {
        match apply_record(dom, record, config) {
            Ok(node) => {
                debug!(index, text = %record.text, "highlight applied");
                report.applied.push(node);
            }
            Err(reason) => {
                warn!(index, text = %record.text, %reason, "could not re-anchor highlight");
                report.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    marker::apply_visibility_all(dom, &config.marker_class, visible)?;
    info!(
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        "re-anchored highlights"
    );
    Ok(report)
}

fn apply_record(
    dom: &mut Dom,
    record: &HighlightRecord,
    config: &HighlighterConfig,
) -> std::result::Result<NodeId, SkipReason> {
    let range = resolve(dom, record, config.strict_parent_index)?;
    marker::wrap_range(dom, &range, &config.marker_class, &record.color)
        .map_err(|err| SkipReason::WrapFailed(err.to_string()))
}
