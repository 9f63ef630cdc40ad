//! Marker elements: the inline `<span>` that renders one highlight.
//!
//! A marker carries its color twice, as `data-color` (the source of truth
//! read back during extraction) and as the inline background style (what is
//! rendered, and what visibility toggling rewrites).

use crate::dom::{Dom, NodeId};
use crate::range::{self, DomRange};
use crate::{Error, Result};

pub const MARKER_TAG: &str = "span";
pub const DEFAULT_MARKER_CLASS: &str = "text-highlighter-span";
pub const COLOR_ATTR: &str = "data-color";
pub const HIDDEN_BACKGROUND: &str = "transparent";

pub(crate) fn background_style(color: &str) -> String {
    format!("background-color: {color};")
}

/// Builds a detached marker for `color`.
pub fn create_marker(dom: &mut Dom, class_name: &str, color: &str) -> Result<NodeId> {
    let marker = dom.create_detached_element(MARKER_TAG);
    dom.set_attr(marker, "class", class_name)?;
    dom.set_attr(marker, COLOR_ATTR, color)?;
    dom.set_attr(marker, "style", &background_style(color))?;
    Ok(marker)
}

/// Wraps `range` in a fresh marker and returns it. On failure the tree is
/// left as it was and the detached marker is discarded.
pub fn wrap_range(dom: &mut Dom, range: &DomRange, class_name: &str, color: &str) -> Result<NodeId> {
    let marker = create_marker(dom, class_name, color)?;
    range::surround_contents(dom, range, marker)?;
    Ok(marker)
}

pub fn is_marker(dom: &Dom, node: NodeId, class_name: &str) -> bool {
    dom.element(node)
        .is_some_and(|element| element.has_class(class_name))
}

/// Connected markers in document order.
pub fn markers(dom: &Dom, class_name: &str) -> Vec<NodeId> {
    dom.elements_by_class_name(class_name)
}

pub fn marker_color(dom: &Dom, marker: NodeId) -> Option<&str> {
    dom.attr(marker, COLOR_ATTR)
}

/// Background color currently rendered for `marker`, parsed back out of its
/// inline style.
pub fn rendered_background(dom: &Dom, marker: NodeId) -> Option<String> {
    dom.attr(marker, "style")?
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .find(|(property, _)| property.trim().eq_ignore_ascii_case("background-color"))
        .map(|(_, value)| value.trim().to_string())
}

pub fn apply_visibility(dom: &mut Dom, marker: NodeId, visible: bool) -> Result<()> {
    let color = marker_color(dom, marker)
        .ok_or_else(|| Error::NodeNotFound(format!("marker #{} has no color", marker.index())))?
        .to_string();
    let background = if visible {
        color.as_str()
    } else {
        HIDDEN_BACKGROUND
    };
    dom.set_attr(marker, "style", &background_style(background))
}

pub fn apply_visibility_all(dom: &mut Dom, class_name: &str, visible: bool) -> Result<usize> {
    let all = markers(dom, class_name);
    for marker in &all {
        apply_visibility(dom, *marker, visible)?;
    }
    Ok(all.len())
}

/// Unwraps every marker on the page. Nested markers are handled because the
/// list is collected up front and unwrapping never detaches a marker's
/// descendants from the document.
pub fn unwrap_all(dom: &mut Dom, class_name: &str) -> Result<usize> {
    let all = markers(dom, class_name);
    for marker in &all {
        range::unwrap(dom, *marker)?;
    }
    Ok(all.len())
}
