// Host page markup parser.
// html5ever builds the tree with browser recovery rules (implied end tags, implied
// html/head/body, entities, raw-text elements); the RcDom result is copied into the arena.
// The doctype and document-level comments are dropped.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use tracing::debug;

use super::document::Document;
use super::node::NodeId;
use crate::types::errors::DomError;

pub(crate) fn parse_into(doc: &mut Document, markup: &str) -> Result<(), DomError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut markup.as_bytes())
        .map_err(|e| DomError::ParseError(e.to_string()))?;

    for child in dom.document.children.borrow().iter() {
        if element_name(child) == Some("html") {
            convert_skeleton(doc, child)?;
        }
    }
    debug!(nodes = doc.len(), "parsed host page");
    Ok(())
}

/// Maps the parsed `<html>`, `<head>` and `<body>` onto the document's own skeleton.
fn convert_skeleton(doc: &mut Document, html: &Handle) -> Result<(), DomError> {
    let root = doc.document_element();
    copy_attributes(doc, html, root)?;
    for child in html.children.borrow().iter() {
        let target = match element_name(child) {
            Some("head") => doc.head(),
            Some("body") => doc.body(),
            _ => {
                convert_node(doc, child, root)?;
                continue;
            }
        };
        copy_attributes(doc, child, target)?;
        convert_children(doc, child, target)?;
    }
    Ok(())
}

fn convert_children(doc: &mut Document, handle: &Handle, parent: NodeId) -> Result<(), DomError> {
    for child in handle.children.borrow().iter() {
        convert_node(doc, child, parent)?;
    }
    Ok(())
}

fn convert_node(doc: &mut Document, handle: &Handle, parent: NodeId) -> Result<(), DomError> {
    match &handle.data {
        RcNodeData::Text { contents } => {
            let text = contents.borrow();
            if !text.trim().is_empty() {
                let id = doc.create_text(&text);
                doc.append_child(parent, id)?;
            }
        }
        RcNodeData::Comment { contents } => {
            let id = doc.create_comment(contents);
            doc.append_child(parent, id)?;
        }
        RcNodeData::Element { name, .. } => {
            let id = doc.create_element(&name.local);
            copy_attributes(doc, handle, id)?;
            doc.append_child(parent, id)?;
            convert_children(doc, handle, id)?;
        }
        RcNodeData::Document | RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}
    }
    Ok(())
}

fn copy_attributes(doc: &mut Document, handle: &Handle, target: NodeId) -> Result<(), DomError> {
    if let RcNodeData::Element { attrs, .. } = &handle.data {
        for attr in attrs.borrow().iter() {
            doc.set_attribute(target, &attr.name.local, &attr.value)?;
        }
    }
    Ok(())
}

fn element_name(handle: &Handle) -> Option<&str> {
    match &handle.data {
        RcNodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}
