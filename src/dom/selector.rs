//! Selector parsing and matching.
//!
//! Supports comma-separated lists of compound selectors built from a tag or `*`,
//! `#id`, `.class`, `[attr]` and `[attr="value"]`, joined by descendant (whitespace)
//! or child (`>`) combinators.

use super::document::Document;
use super::node::NodeId;
use crate::types::errors::DomError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    universal: bool,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if &el.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match &a.value {
            None => el.has_attribute(&a.name),
            Some(v) => el.attribute(&a.name).as_deref() == Some(v.as_str()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A chain of compounds; the last one is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// `parts[i].0` relates `parts[i]` to `parts[i - 1]`; ignored for `i == 0`.
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches_at(&self, doc: &Document, node: NodeId, idx: usize) -> bool {
        let (combinator, compound) = &self.parts[idx];
        if !compound.matches(doc, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => doc
                .parent_element(node)
                .is_some_and(|p| self.matches_at(doc, p, idx - 1)),
            Combinator::Descendant => {
                let mut current = doc.parent_element(node);
                while let Some(ancestor) = current {
                    if self.matches_at(doc, ancestor, idx - 1) {
                        return true;
                    }
                    current = doc.parent_element(ancestor);
                }
                false
            }
        }
    }
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector, DomError> {
        let mut parser = Parser { chars: input.chars().collect(), pos: 0, source: input };
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                Some(',') => parser.pos += 1,
                None => break,
                Some(c) => return Err(parser.error(&format!("unexpected '{}'", c))),
            }
        }
        Ok(Selector { alternatives })
    }

    /// Whether the element matches any alternative. Non-elements never match.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|c| c.matches_at(doc, node, c.parts.len() - 1))
    }
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, msg: &str) -> DomError {
        DomError::InvalidSelector(format!("{} ({} at {})", self.source, msg, self.pos))
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn ident(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn complex(&mut self) -> Result<Complex, DomError> {
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    if parts.is_empty() {
                        return Err(self.error("leading combinator"));
                    }
                    self.pos += 1;
                    combinator = Combinator::Child;
                    continue;
                }
                _ => {}
            }
            let compound = self.compound()?;
            parts.push((combinator, compound));
            combinator = Combinator::Descendant;
        }
        if parts.is_empty() {
            return Err(self.error("empty selector"));
        }
        if combinator == Combinator::Child {
            return Err(self.error("trailing combinator"));
        }
        Ok(Complex { parts })
    }

    fn compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        loop {
            match self.peek() {
                Some('*') if compound.is_empty() => {
                    self.pos += 1;
                    compound.universal = true;
                }
                Some(c) if (c.is_ascii_alphabetic()) && compound.is_empty() => {
                    compound.tag = Some(self.ident()?.to_ascii_lowercase());
                }
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(c) if c.is_whitespace() || c == ',' || c == '>' => break,
                None => break,
                Some(c) => return Err(self.error(&format!("unsupported '{}'", c))),
            }
        }
        if compound.is_empty() {
            return Err(self.error("empty compound"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, DomError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let value = match self.peek() {
            Some(']') => None,
            Some('=') => {
                self.pos += 1;
                self.skip_ws();
                Some(self.attribute_value()?)
            }
            _ => return Err(self.error("expected '=' or ']'")),
        };
        self.skip_ws();
        if self.peek() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        self.pos += 1;
        Ok(AttrSelector { name, value })
    }

    fn attribute_value(&mut self) -> Result<String, DomError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Ok(value)
            }
            _ => self.ident(),
        }
    }
}
