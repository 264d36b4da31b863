//! Document - arena-backed host page tree.

use tracing::trace;

use super::node::{DomRect, ElementData, InlineStyle, Node, NodeData, NodeId};
use super::selector::Selector;
use crate::types::errors::DomError;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// An HTML document. Detached nodes stay in the arena; only attached nodes are reachable from queries.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new_html()
    }
}

impl Document {
    /// Creates `#document > html > (head, body)`.
    pub fn new_html() -> Self {
        let mut doc = Self {
            nodes: vec![Node::new(NodeData::Document)],
            root: NodeId(0),
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.link(doc.root, html);
        doc.link(html, head);
        doc.link(html, body);
        doc.html = html;
        doc.head = head;
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(DomError::NodeNotFound(id.0))?;
        node.as_element_mut().ok_or(DomError::NotAnElement(id.0))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_element)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    // --- Construction -----------------------------------------------------

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Raw link used while both ends are known to be valid.
    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Appends `child` as the last child of `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_node = self.node(parent).ok_or(DomError::NodeNotFound(parent.0))?;
        if !parent_node.is_container() {
            return Err(DomError::HierarchyRequest(format!(
                "{} cannot have children",
                parent
            )));
        }
        let child_node = self.node(child).ok_or(DomError::NodeNotFound(child.0))?;
        if matches!(child_node.data, NodeData::Document | NodeData::ShadowRoot { .. }) {
            return Err(DomError::HierarchyRequest(format!(
                "{} cannot be inserted",
                child
            )));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest(format!(
                "{} is an ancestor of {}",
                child, parent
            )));
        }
        self.detach(child);
        self.link(parent, child);
        Ok(())
    }

    /// Detaches a node (and its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.node(id).is_none() {
            return Err(DomError::NodeNotFound(id.0));
        }
        self.detach(id);
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    /// Attaches an open shadow root to an element.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        let el = self.element_mut(host)?;
        if el.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host.0));
        }
        let shadow = self.push(NodeData::ShadowRoot { host });
        self.element_mut(host)?.shadow_root = Some(shadow);
        Ok(shadow)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host).and_then(|el| el.shadow_root)
    }

    /// Host element of a shadow root node.
    pub fn shadow_host(&self, shadow: NodeId) -> Option<NodeId> {
        match self.node(shadow)?.data {
            NodeData::ShadowRoot { host } => Some(host),
            _ => None,
        }
    }

    // --- Navigation -------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Topmost ancestor: the document, a shadow root, or a detached subtree root.
    pub fn root_node(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether the node is in the document's light tree.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.root_node(id) == self.root
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Inclusive light-tree containment, like `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_inclusive_ancestor(ancestor, node)
    }

    /// Light-tree descendants of `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // --- Queries ----------------------------------------------------------

    /// First element with the given id in the light tree.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.get_element_by_id_in(self.root, id)
    }

    /// First element with the given id below `scope` (a shadow root, for instance).
    pub fn get_element_by_id_in(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| self.element(*n).and_then(ElementData::id) == Some(id))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select_all(scope, &selector))
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n)))
    }

    /// Matches a pre-parsed selector against the light-tree descendants of `scope`.
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool, DomError> {
        Ok(Selector::parse(selector)?.matches(self, id))
    }

    /// Nearest inclusive ancestor element matching the selector.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.is_element(node) {
                return None;
            }
            if selector.matches(self, node) {
                return Some(node);
            }
            current = self.parent_element(node);
        }
        None
    }

    /// Concatenated text of all light-tree text descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(Node { data: NodeData::Text(t), .. }) = self.node(id) {
            return t.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match &self.nodes[n.index()].data {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Deepest connected element whose rect contains the point; later siblings win.
    ///
    /// Elements with inline `pointer-events: none` or `display: none` are transparent
    /// to hit testing together with their subtree.
    pub fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        let mut hit = None;
        let mut stack: Vec<NodeId> = self.children(self.root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(el) = self.element(id) else {
                continue;
            };
            let transparent = el.style.value("pointer-events") == Some("none")
                || el.style.value("display") == Some("none");
            if transparent {
                continue;
            }
            if el.rect.is_some_and(|r| r.contains_point(x, y)) {
                hit = Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        trace!(x, y, ?hit, "element_from_point");
        hit
    }

    // --- Element helpers --------------------------------------------------

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<bool, DomError> {
        Ok(self.element_mut(id)?.set_attribute(name, value))
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        Ok(self.element_mut(id)?.remove_attribute(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        Ok(self.element_mut(id)?.add_class(class))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        Ok(self.element_mut(id)?.remove_class(class))
    }

    pub fn style(&self, id: NodeId) -> Option<&InlineStyle> {
        self.element(id).map(|el| &el.style)
    }

    pub fn style_value(&self, id: NodeId, property: &str) -> Option<&str> {
        self.style(id).and_then(|s| s.value(property))
    }

    pub fn set_style(
        &mut self,
        id: NodeId,
        property: &str,
        value: &str,
        important: bool,
    ) -> Result<bool, DomError> {
        Ok(self.element_mut(id)?.style.set(property, value, important))
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) -> Result<bool, DomError> {
        Ok(self.element_mut(id)?.style.remove(property).is_some())
    }

    pub fn set_rect(&mut self, id: NodeId, rect: DomRect) -> Result<(), DomError> {
        self.element_mut(id)?.rect = Some(rect);
        Ok(())
    }

    pub fn rect(&self, id: NodeId) -> Option<DomRect> {
        self.element(id).and_then(|el| el.rect)
    }

    /// Replaces every child of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }

    // --- Serialization ----------------------------------------------------

    /// Debug HTML of a subtree. Shadow trees are rendered as `<template shadowrootmode="open">`.
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Document | NodeData::ShadowRoot { .. } => {
                for child in &node.children {
                    self.write_node(*child, out);
                }
            }
            NodeData::Text(t) => out.push_str(&escape(t, false)),
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
                }
                if let Some(class) = el.attribute("class") {
                    out.push_str(&format!(" class=\"{}\"", escape(&class, true)));
                }
                if let Some(style) = el.attribute("style") {
                    out.push_str(&format!(" style=\"{}\"", escape(&style, true)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                if let Some(shadow) = el.shadow_root {
                    out.push_str("<template shadowrootmode=\"open\">");
                    self.write_node(shadow, out);
                    out.push_str("</template>");
                }
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    // --- Parsing ----------------------------------------------------------

    /// Parses host page markup with browser error recovery.
    ///
    /// The parsed `<html>`, `<head>` and `<body>` map onto the document's own skeleton.
    pub fn parse_html(markup: &str) -> Result<Self, DomError> {
        let mut doc = Self::new_html();
        super::parser::parse_into(&mut doc, markup)?;
        Ok(doc)
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
