// Accessbar self-exclusion oracle
// The single predicate every DOM-mutating effect consults, per node, so that sweeps over the
// host page never touch the widget's own host element, shadow tree, marked elements or dialog.

use crate::dom::{Document, NodeId};

/// Class carried by every element the widget renders into the light tree (overlays, panels).
pub const OWN_UI_MARKER_CLASS: &str = "accessibility-bar";
/// Class of the shadow host element.
pub const EMBED_HOST_CLASS: &str = "a11y-embed-host";
pub const DIALOG_ROLE: &str = "dialog";
pub const DIALOG_LABEL: &str = "Accessibility options";

#[derive(Debug, Clone)]
pub struct SelfExclusionOracle {
    host_id: String,
}

impl SelfExclusionOracle {
    pub fn new(host_id: &str) -> Self {
        Self { host_id: host_id.to_string() }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    fn is_own_element(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if el.id() == Some(self.host_id.as_str())
            || el.has_class(OWN_UI_MARKER_CLASS)
            || el.has_class(EMBED_HOST_CLASS)
        {
            return true;
        }
        el.attribute("role").as_deref() == Some(DIALOG_ROLE)
            && el.attribute("aria-label").as_deref() == Some(DIALOG_LABEL)
    }

    /// Whether `node` is, or is contained by, the widget's own UI.
    ///
    /// The ancestor walk crosses shadow boundaries: a node inside a shadow root is judged
    /// by that root's host chain.
    pub fn is_own_ui(&self, doc: &Document, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if self.is_own_element(doc, current) {
                return true;
            }
            match doc.parent(current).or_else(|| doc.shadow_host(current)) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    /// Splits candidates into host-page elements and the number of excluded nodes.
    /// Non-element nodes are dropped and counted as excluded.
    pub fn filter_foreign(&self, doc: &Document, nodes: Vec<NodeId>) -> (Vec<NodeId>, usize) {
        let total = nodes.len();
        let kept: Vec<NodeId> = nodes
            .into_iter()
            .filter(|n| doc.is_element(*n) && !self.is_own_ui(doc, *n))
            .collect();
        let skipped = total - kept.len();
        (kept, skipped)
    }
}
