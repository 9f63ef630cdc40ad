use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

/// A position inside the tree.
///
/// For text nodes `offset` is a byte offset into the text (always on a char
/// boundary); for elements and the document it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl DomRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Range over `start..end` bytes of a single text node.
    pub fn in_text(node: NodeId, start: usize, end: usize) -> Self {
        Self {
            start: Boundary::new(node, start),
            end: Boundary::new(node, end),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Text covered by the range, in document order.
    pub fn text(&self, dom: &Dom) -> Result<String> {
        validate_boundary(dom, self.start)?;
        validate_boundary(dom, self.end)?;

        if self.start.node == self.end.node {
            if let Some(text) = dom.text(self.start.node) {
                return text
                    .get(self.start.offset..self.end.offset)
                    .map(str::to_string)
                    .ok_or_else(|| Error::RangeWrap("range end precedes its start".into()));
            }
        }

        let mut out = String::new();
        let mut inside = false;
        let mut finished = false;
        walk_boundaries(dom, dom.root(), self, &mut inside, &mut finished, &mut out);
        Ok(out)
    }
}

fn walk_boundaries(
    dom: &Dom,
    node: NodeId,
    range: &DomRange,
    inside: &mut bool,
    finished: &mut bool,
    out: &mut String,
) {
    if *finished {
        return;
    }
    if let Some(text) = dom.text(node) {
        let from = if node == range.start.node {
            *inside = true;
            range.start.offset
        } else {
            0
        };
        let to = if node == range.end.node {
            *finished = true;
            range.end.offset
        } else {
            text.len()
        };
        if *inside {
            out.push_str(text.get(from..to).unwrap_or_default());
        }
        return;
    }
    let children = dom.children(node);
    for (index, child) in children.iter().enumerate() {
        if node == range.start.node && index == range.start.offset {
            *inside = true;
        }
        if node == range.end.node && index == range.end.offset {
            *finished = true;
            return;
        }
        walk_boundaries(dom, *child, range, inside, finished, out);
        if *finished {
            return;
        }
    }
    if node == range.start.node && range.start.offset == children.len() {
        *inside = true;
    }
    if node == range.end.node && range.end.offset == children.len() {
        *finished = true;
    }
}

fn validate_boundary(dom: &Dom, boundary: Boundary) -> Result<()> {
    if dom.node_type(boundary.node).is_none() {
        return Err(Error::NodeNotFound(format!(
            "range boundary node #{}",
            boundary.node.index()
        )));
    }
    let length = match dom.text(boundary.node) {
        Some(text) => {
            if boundary.offset <= text.len() && !text.is_char_boundary(boundary.offset) {
                return Err(Error::InvalidOffset {
                    offset: boundary.offset,
                    length: text.len(),
                });
            }
            text.len()
        }
        None => dom.children(boundary.node).len(),
    };
    if boundary.offset > length {
        return Err(Error::InvalidOffset {
            offset: boundary.offset,
            length,
        });
    }
    Ok(())
}

fn inclusive_ancestors(dom: &Dom, node: NodeId) -> Vec<NodeId> {
    let mut out = vec![node];
    let mut cursor = dom.parent(node);
    while let Some(current) = cursor {
        out.push(current);
        cursor = dom.parent(current);
    }
    out
}

/// Child of `ancestor` that is `node` or contains it.
fn child_toward(dom: &Dom, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
    let mut cursor = node;
    loop {
        let parent = dom.parent(cursor)?;
        if parent == ancestor {
            return Some(cursor);
        }
        cursor = parent;
    }
}

/// Moves the contents of `range` into `wrapper` and puts `wrapper` where the
/// contents were, like DOM `Range.surroundContents`.
///
/// Fails without touching the tree when the range partially selects a
/// non-text node, when the boundaries are out of order, or when offsets are
/// invalid.
pub fn surround_contents(dom: &mut Dom, range: &DomRange, wrapper: NodeId) -> Result<()> {
    validate_boundary(dom, range.start)?;
    validate_boundary(dom, range.end)?;
    if dom.element(wrapper).is_none() {
        return Err(Error::RangeWrap("wrapper is not an element".into()));
    }

    let start = range.start;
    let end = range.end;

    if start.node == end.node && dom.is_text(start.node) {
        if start.offset > end.offset {
            return Err(Error::RangeWrap("range end precedes its start".into()));
        }
        let parent = dom
            .parent(start.node)
            .ok_or_else(|| Error::RangeWrap("text node has no parent".into()))?;
        dom.split_text(start.node, end.offset)?;
        let middle = dom.split_text(start.node, start.offset)?;
        dom.insert_before(parent, wrapper, Some(middle))?;
        dom.append_child(wrapper, middle)?;
        return Ok(());
    }

    let start_chain = inclusive_ancestors(dom, start.node);
    let end_chain = inclusive_ancestors(dom, end.node);
    let common = start_chain
        .iter()
        .copied()
        .find(|node| end_chain.contains(node))
        .ok_or_else(|| Error::RangeWrap("boundaries are in different trees".into()))?;

    let start_child = if start.node == common {
        None
    } else {
        let child = child_toward(dom, common, start.node)
            .ok_or_else(|| Error::RangeWrap("range start is detached".into()))?;
        if child != start.node || !dom.is_text(child) {
            return Err(Error::RangeWrap(
                "range partially selects a non-text node".into(),
            ));
        }
        Some(child)
    };
    let end_child = if end.node == common {
        None
    } else {
        let child = child_toward(dom, common, end.node)
            .ok_or_else(|| Error::RangeWrap("range end is detached".into()))?;
        if child != end.node || !dom.is_text(child) {
            return Err(Error::RangeWrap(
                "range partially selects a non-text node".into(),
            ));
        }
        Some(child)
    };

    let position_key = |boundary: Boundary, child: Option<NodeId>| -> usize {
        match child {
            None => boundary.offset * 2,
            Some(child) => dom.child_index(child).unwrap_or_default() * 2 + 1,
        }
    };
    if position_key(start, start_child) > position_key(end, end_child) {
        return Err(Error::RangeWrap("range end precedes its start".into()));
    }

    // Resolve both ends to node references before splitting, since splits
    // shift child indices.
    let end_before: Option<NodeId> = match end_child {
        None => dom.children(common).get(end.offset).copied(),
        Some(child) => {
            let len = dom.text(child).map(str::len).unwrap_or_default();
            if end.offset < len {
                Some(dom.split_text(child, end.offset)?)
            } else {
                let index = dom.child_index(child).unwrap_or_default();
                dom.children(common).get(index + 1).copied()
            }
        }
    };
    let first: Option<NodeId> = match start_child {
        None => dom.children(common).get(start.offset).copied(),
        Some(child) => {
            if start.offset == 0 {
                Some(child)
            } else {
                Some(dom.split_text(child, start.offset)?)
            }
        }
    };

    let children = dom.children(common).to_vec();
    let index_of = |node: Option<NodeId>| -> usize {
        node.and_then(|node| children.iter().position(|child| *child == node))
            .unwrap_or(children.len())
    };
    let first_index = index_of(first);
    let end_index = index_of(end_before).max(first_index);
    let contents = children[first_index..end_index].to_vec();

    dom.insert_before(common, wrapper, children.get(first_index).copied())?;
    for node in contents {
        dom.append_child(wrapper, node)?;
    }
    Ok(())
}

/// Replaces `node` with its children and merges the text nodes this leaves
/// adjacent.
pub fn unwrap(dom: &mut Dom, node: NodeId) -> Result<()> {
    let parent = dom
        .parent(node)
        .ok_or_else(|| Error::NodeNotFound("unwrap target has no parent".into()))?;
    for child in dom.children(node).to_vec() {
        dom.insert_before(parent, child, Some(node))?;
    }
    dom.remove_child(parent, node)?;
    dom.normalize(parent);
    Ok(())
}
