//! Node storage for the host document arena.

use std::fmt;

/// Index of a node in its [`Document`](super::Document) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layout box of an element, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DomRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DomRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the point lies inside the box (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// One inline style declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDecl {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Ordered inline `style` declarations of an element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineStyle {
    decls: Vec<StyleDecl>,
}

impl InlineStyle {
    /// Parses `style` attribute text such as `color: red; font-size: 16px !important`.
    pub fn parse(text: &str) -> Self {
        let mut style = InlineStyle::default();
        for part in text.split(';') {
            let Some((property, value)) = part.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let mut important = false;
            if let Some(stripped) = value.strip_suffix("!important") {
                value = stripped.trim_end();
                important = true;
            }
            if !property.is_empty() && !value.is_empty() {
                style.set(&property, value, important);
            }
        }
        style
    }

    pub fn get(&self, property: &str) -> Option<&StyleDecl> {
        self.decls.iter().find(|d| d.property == property)
    }

    pub fn value(&self, property: &str) -> Option<&str> {
        self.get(property).map(|d| d.value.as_str())
    }

    /// Sets a declaration, keeping its position when it already exists.
    /// An empty value removes the property. Returns whether anything changed.
    pub fn set(&mut self, property: &str, value: &str, important: bool) -> bool {
        if value.is_empty() {
            return self.remove(property).is_some();
        }
        match self.decls.iter_mut().find(|d| d.property == property) {
            Some(decl) if decl.value == value && decl.important == important => false,
            Some(decl) => {
                decl.value = value.to_string();
                decl.important = important;
                true
            }
            None => {
                self.decls.push(StyleDecl {
                    property: property.to_string(),
                    value: value.to_string(),
                    important,
                });
                true
            }
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<StyleDecl> {
        let pos = self.decls.iter().position(|d| d.property == property)?;
        Some(self.decls.remove(pos))
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleDecl> {
        self.decls.iter()
    }

    /// Serializes back to `style` attribute text.
    pub fn to_css_text(&self) -> String {
        self.decls
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.property, d.value)
                } else {
                    format!("{}: {};", d.property, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Element payload: tag, attributes, class list, inline style and geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes other than `class` and `style`, in insertion order.
    pub attributes: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub style: InlineStyle,
    pub rect: Option<DomRect>,
    pub shadow_root: Option<NodeId>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            classes: Vec::new(),
            style: InlineStyle::default(),
            rect: None,
            shadow_root: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.raw_attribute("id")
    }

    fn raw_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Reads an attribute. `class` and `style` are synthesized from the class list and inline style.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            "class" => None,
            "style" if !self.style.is_empty() => Some(self.style.to_css_text()),
            "style" => None,
            _ => self.raw_attribute(name).map(str::to_string),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        match name {
            "class" => !self.classes.is_empty(),
            "style" => !self.style.is_empty(),
            _ => self.raw_attribute(name).is_some(),
        }
    }

    /// Sets an attribute; returns whether the stored value changed.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => {
                let classes: Vec<String> = value.split_whitespace().map(str::to_string).collect();
                let changed = classes != self.classes;
                self.classes = classes;
                changed
            }
            "style" => {
                let style = InlineStyle::parse(value);
                let changed = style != self.style;
                self.style = style;
                changed
            }
            _ => match self.attributes.iter_mut().find(|(n, _)| *n == name) {
                Some((_, v)) if v == value => false,
                Some((_, v)) => {
                    *v = value.to_string();
                    true
                }
                None => {
                    self.attributes.push((name, value.to_string()));
                    true
                }
            },
        }
    }

    /// Removes an attribute; returns whether it was present.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        match name {
            "class" => {
                let had = !self.classes.is_empty();
                self.classes.clear();
                had
            }
            "style" => {
                let had = !self.style.is_empty();
                self.style = InlineStyle::default();
                had
            }
            _ => {
                let before = self.attributes.len();
                self.attributes.retain(|(n, _)| n != name);
                before != self.attributes.len()
            }
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        self.classes.push(class.to_string());
        true
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        before != self.classes.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    /// Root of an attached shadow tree.
    ShadowRoot { host: NodeId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self { parent: None, children: Vec::new(), data }
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Whether children may be appended to this node.
    pub fn is_container(&self) -> bool {
        matches!(
            self.data,
            NodeData::Document | NodeData::Element(_) | NodeData::ShadowRoot { .. }
        )
    }
}
