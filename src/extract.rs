use tracing::{debug, warn};

use crate::config::HighlighterConfig;
use crate::dom::{Dom, NodeId};
use crate::marker;
use crate::record::{HighlightRecord, HighlightSet};

/// Serializes every marker on the page, in document order.
///
/// Markers with no text, no color, or no element parent cannot be described
/// and are left out rather than persisted half-formed.
pub fn extract_records(dom: &Dom, config: &HighlighterConfig) -> HighlightSet {
    let records = marker::markers(dom, &config.marker_class)
        .into_iter()
        .filter_map(|node| extract_record(dom, node, config.context_chars))
        .collect::<HighlightSet>();
    debug!(count = records.len(), "extracted highlight records");
    records
}

pub fn extract_record(dom: &Dom, marker_node: NodeId, context_chars: usize) -> Option<HighlightRecord> {
    let text = dom.text_content(marker_node);
    if text.is_empty() {
        debug!(marker = marker_node.index(), "skipping empty marker");
        return None;
    }
    let Some(color) = marker::marker_color(dom, marker_node) else {
        warn!(marker = marker_node.index(), "marker has no data-color attribute");
        return None;
    };
    let container = dom.parent(marker_node)?;
    let Some(parent_tag) = dom.tag_name(container) else {
        warn!(marker = marker_node.index(), "marker is not inside an element");
        return None;
    };

    let container_text = dom.text_content(container);
    let (before_text, after_text) = match container_text.find(&text) {
        Some(at) => (
            tail_chars(&container_text[..at], context_chars),
            head_chars(&container_text[at + text.len()..], context_chars),
        ),
        None => ("", ""),
    };

    Some(HighlightRecord {
        text: text.clone(),
        color: color.to_string(),
        before_text: before_text.to_string(),
        after_text: after_text.to_string(),
        parent_tag: parent_tag.to_ascii_lowercase(),
        parent_index: dom.element_index(container).unwrap_or_default(),
    })
}

/// Last `n` characters of `text`.
pub(crate) fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((at, _)) => &text[at..],
        None => text,
    }
}

/// First `n` characters of `text`.
pub(crate) fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((at, _)) => &text[..at],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_windows_respect_multibyte_text() {
        assert_eq!(tail_chars("naïve café", 4), "café");
        assert_eq!(head_chars("naïve café", 3), "naï");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(head_chars("ab", 5), "ab");
        assert_eq!(tail_chars("ab", 0), "");
        assert_eq!(head_chars("ab", 0), "");
    }
}
