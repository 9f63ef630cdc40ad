use std::collections::HashMap;

use crate::html::{escape_html_attr, escape_html_text, is_void_tag};
use crate::{Error, Result};

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag_name: String,
    pub attrs: HashMap<String, String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
    }
}

/// Arena-backed document tree.
///
/// Nodes are never freed; detached nodes simply lose their parent link.
/// Every traversal starts from `root`, so detached nodes are invisible to
/// queries.
#[derive(Debug, Clone)]
pub struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, node_id: NodeId) -> Result<&Node> {
        self.nodes
            .get(node_id.0)
            .ok_or_else(|| Error::NodeNotFound(format!("node #{}", node_id.0)))
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: &str,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element = Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs,
        };
        self.create_node(Some(parent), NodeType::Element(element))
    }

    pub fn create_detached_element(&mut self, tag_name: &str) -> NodeId {
        let element = Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: HashMap::new(),
        };
        self.create_node(None, NodeType::Element(element))
    }

    pub fn create_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text.to_string()))
    }

    pub fn create_detached_text(&mut self, text: &str) -> NodeId {
        self.create_node(None, NodeType::Text(text.to_string()))
    }

    pub fn node_type(&self, node_id: NodeId) -> Option<&NodeType> {
        self.nodes.get(node_id.0).map(|node| &node.node_type)
    }

    pub fn element(&self, node_id: NodeId) -> Option<&Element> {
        match self.node_type(node_id)? {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, node_id: NodeId) -> Option<&str> {
        match self.node_type(node_id)? {
            NodeType::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, node_id: NodeId) -> bool {
        self.text(node_id).is_some()
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.element(node_id)?.attr(name)
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::NodeNotFound(format!("setAttribute target #{}", node_id.0)))?;
        element
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, node_id: NodeId) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    /// Position of `node_id` among its parent's element children,
    /// regardless of tag name.
    pub fn element_index(&self, node_id: NodeId) -> Option<usize> {
        let parent = self.parent(node_id)?;
        self.element_children(parent)
            .iter()
            .position(|child| *child == node_id)
    }

    pub fn child_index(&self, node_id: NodeId) -> Option<usize> {
        let parent = self.parent(node_id)?;
        self.children(parent)
            .iter()
            .position(|child| *child == node_id)
    }

    pub fn is_connected(&self, node_id: NodeId) -> bool {
        node_id == self.root || self.is_descendant_of(node_id, self.root)
    }

    pub fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    pub fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document | NodeType::Element(_) => {
                    for child in &self.nodes[node_id.0].children {
                        self.collect_text(*child, out);
                    }
                }
                NodeType::Text(text) => out.push_str(text),
            }
        })
    }

    /// All nodes below `node_id` in document (pre-)order, excluding itself.
    pub fn descendants(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(node_id).iter().rev().copied().collect::<Vec<_>>();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|node| {
                self.tag_name(*node)
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(tag_name))
            })
            .collect()
    }

    pub fn elements_by_class_name(&self, class_name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|node| {
                self.element(*node)
                    .is_some_and(|element| element.has_class(class_name))
            })
            .collect()
    }

    pub fn first_element_by_tag_name(&self, tag_name: &str) -> Option<NodeId> {
        self.elements_by_tag_name(tag_name).into_iter().next()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(Error::HierarchyRequest(
                "cannot append a node to itself or its descendant".into(),
            ));
        }
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(Error::HierarchyRequest(
                "cannot insert a node into itself or its descendant".into(),
            ));
        }
        if reference == Some(child) {
            return Ok(());
        }
        if reference.is_some_and(|reference| self.parent(reference) != Some(parent)) {
            return Err(Error::NodeNotFound(
                "insertBefore reference is not a child".into(),
            ));
        }
        self.detach(child);
        let position = match reference {
            Some(reference) => self.nodes[parent.0]
                .children
                .iter()
                .position(|node| *node == reference)
                .ok_or_else(|| {
                    Error::NodeNotFound("insertBefore reference is not a child".into())
                })?,
            None => self.nodes[parent.0].children.len(),
        };
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::NodeNotFound(
                "removeChild target is not a child".into(),
            ));
        }
        self.detach(child);
        Ok(())
    }

    fn detach(&mut self, node_id: NodeId) {
        if let Some(parent) = self.nodes[node_id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node_id);
        }
    }

    /// Splits a text node at a byte offset, returning the new node that holds
    /// the tail. The tail is inserted right after the original node.
    pub fn split_text(&mut self, node_id: NodeId, offset: usize) -> Result<NodeId> {
        let text = self
            .text(node_id)
            .ok_or_else(|| Error::RangeWrap("splitText target is not a text node".into()))?;
        if offset > text.len() || !text.is_char_boundary(offset) {
            return Err(Error::InvalidOffset {
                offset,
                length: text.len(),
            });
        }
        let tail = text[offset..].to_string();
        if let NodeType::Text(text) = &mut self.nodes[node_id.0].node_type {
            text.truncate(offset);
        }
        let tail_node = self.create_node(None, NodeType::Text(tail));
        if let Some(parent) = self.parent(node_id) {
            let position = self
                .child_index(node_id)
                .ok_or_else(|| Error::NodeNotFound("split text node lost its parent".into()))?;
            self.nodes[parent.0].children.insert(position + 1, tail_node);
            self.nodes[tail_node.0].parent = Some(parent);
        }
        Ok(tail_node)
    }

    /// Merges adjacent text children and drops empty ones below `node_id`.
    pub fn normalize(&mut self, node_id: NodeId) {
        let children = self.children(node_id).to_vec();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            if let NodeType::Text(text) = &self.nodes[child.0].node_type {
                if text.is_empty() {
                    self.nodes[child.0].parent = None;
                    continue;
                }
                let text = text.clone();
                if let Some(previous) = kept.last().copied() {
                    if let NodeType::Text(previous_text) = &mut self.nodes[previous.0].node_type {
                        previous_text.push_str(&text);
                        self.nodes[child.0].parent = None;
                        continue;
                    }
                }
            } else {
                self.normalize(child);
            }
            kept.push(child);
        }
        self.nodes[node_id.0].children = kept;
    }

    pub fn to_html(&self) -> String {
        self.dump_node(self.root)
    }

    pub fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(node_id, &mut out);
        out
    }

    fn dump_into(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document => {
                    for child in &self.nodes[node_id.0].children {
                        self.dump_into(*child, out);
                    }
                }
                NodeType::Text(text) => out.push_str(&escape_html_text(text)),
                NodeType::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag_name);
                    let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                    attrs.sort_by(|(left, _), (right, _)| left.cmp(right));
                    for (k, v) in attrs {
                        out.push(' ');
                        out.push_str(k);
                        out.push_str("=\"");
                        out.push_str(&escape_html_attr(v));
                        out.push('"');
                    }
                    out.push('>');
                    if is_void_tag(&element.tag_name) {
                        return;
                    }
                    let raw_text_container = element.tag_name == "script"
                        || element.tag_name == "style";
                    for child in &self.nodes[node_id.0].children {
                        match &self.nodes[child.0].node_type {
                            NodeType::Text(text) if raw_text_container => out.push_str(text),
                            _ => self.dump_into(*child, out),
                        }
                    }
                    out.push_str("</");
                    out.push_str(&element.tag_name);
                    out.push('>');
                }
            }
        })
    }
}
