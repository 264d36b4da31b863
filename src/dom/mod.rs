//! Virtual host document.
//!
//! The page the widget is injected into, modelled as an arena of nodes addressed by
//! [`NodeId`]. Queries walk the light tree only and never pierce shadow roots.

pub mod document;
mod parser;
pub mod node;
pub mod selector;

pub use document::Document;
pub use node::{DomRect, ElementData, InlineStyle, Node, NodeData, NodeId, StyleDecl};
pub use selector::Selector;
