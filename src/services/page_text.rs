// Accessbar page text extraction
// Collects host-page text for the summary, simplification and pronunciation features.
// Widget UI never contributes text.

use crate::dom::{Document, NodeData, NodeId, Selector};
use crate::services::self_exclusion::SelfExclusionOracle;

pub const SUMMARY_SOURCE_SELECTOR: &str = "p, h1, h2, h3, article, section, li";
pub const SUMMARY_MAX_CHARS: usize = 10_000;
/// Below this many characters the main/article text is considered too thin to simplify.
pub const SIMPLIFY_MIN_CHARS: usize = 200;
pub const PRONUNCIATION_MAX_CHARS: usize = 100;
pub const PRONUNCIATION_MAX_WORDS: usize = 10;

/// Text sent to the summarizer: trimmed text of every summary source element, space-joined,
/// capped at [`SUMMARY_MAX_CHARS`] characters.
pub fn summary_source_text(doc: &Document, oracle: &SelfExclusionOracle) -> String {
    let Ok(selector) = Selector::parse(SUMMARY_SOURCE_SELECTOR) else {
        return String::new();
    };
    let (nodes, _) = oracle.filter_foreign(doc, doc.select_all(doc.root(), &selector));
    let joined = nodes
        .into_iter()
        .map(|n| doc.text_content(n).trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().take(SUMMARY_MAX_CHARS).collect()
}

/// Text sent to the simplifier: `<main>`, else `<article>`, falling back to `<body>`
/// when the chosen container is too short.
pub fn simplify_source_text(doc: &Document, oracle: &SelfExclusionOracle) -> String {
    let body_text = || visible_text(doc, oracle, doc.body());
    let container = ["main", "article"].into_iter().find_map(|tag| {
        Selector::parse(tag)
            .ok()
            .and_then(|sel| {
                doc.select_all(doc.root(), &sel)
                    .into_iter()
                    .find(|n| !oracle.is_own_ui(doc, *n))
            })
    });
    match container {
        Some(node) => {
            let text = visible_text(doc, oracle, node);
            if text.chars().count() < SIMPLIFY_MIN_CHARS {
                body_text()
            } else {
                text
            }
        }
        None => body_text(),
    }
}

/// Trimmed text under `scope` that does not belong to the widget, one block per text node.
fn visible_text(doc: &Document, oracle: &SelfExclusionOracle, scope: NodeId) -> String {
    doc.descendants(scope)
        .into_iter()
        .filter(|n| matches!(doc.node(*n).map(|node| &node.data), Some(NodeData::Text(_))))
        .filter(|n| doc.parent(*n).is_some_and(|p| !oracle.is_own_ui(doc, p)))
        .filter(|n| {
            !matches!(
                doc.parent(*n).and_then(|p| doc.tag_name(p)),
                Some("script") | Some("style")
            )
        })
        .map(|n| doc.text_content(n).trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether a selection is short enough for the pronunciation guide.
pub fn is_pronounceable(selection: &str) -> bool {
    let text = selection.trim();
    !text.is_empty()
        && text.chars().count() < PRONUNCIATION_MAX_CHARS
        && text.split_whitespace().count() <= PRONUNCIATION_MAX_WORDS
}
