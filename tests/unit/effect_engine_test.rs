//! Unit tests for the effect engine: sweeps scoped to host content, root classes and
//! attributes, restore-to-original semantics and idempotent re-application.

use accessbar::dom::{Document, NodeId};
use accessbar::managers::preference_store::{PreferenceStore, PreferenceStoreTrait};
use accessbar::services::effect_engine::{EffectContext, EffectEngine};
use accessbar::services::effects::{EffectId, CURSOR_STYLE_ID};
use accessbar::services::self_exclusion::SelfExclusionOracle;
use accessbar::types::preferences::{PrefValue, PreferenceKey};

const HOST_ID: &str = "a11y-embed-host-react";

const PAGE: &str = r#"<html lang="fr"><body>
<header><h1 id="title">Library</h1></header>
<main data-accessible-content="">
<p id="intro" style="font-size: 12px; color: #333333">Welcome</p>
<h2 id="events">Events</h2>
<img id="map" src="/map.png" alt="Map of the east wing">
<img id="spacer" src="/spacer.gif" alt="">
<div class="accessibility-bar" id="overlay"><span id="overlay-label">ruler</span></div>
</main>
</body></html>"#;

struct Fixture {
    doc: Document,
    prefs: PreferenceStore,
    engine: EffectEngine,
    ctx: EffectContext,
}

impl Fixture {
    fn new() -> Self {
        Self::with_selector("[data-accessible-content]")
    }

    fn with_selector(selector: &str) -> Self {
        let doc = Document::parse_html(PAGE).unwrap();
        let oracle = SelfExclusionOracle::new(HOST_ID);
        let ctx = EffectContext::resolve(&doc, selector, &oracle);
        Self { doc, prefs: PreferenceStore::new(), engine: EffectEngine::new(oracle), ctx }
    }

    fn set(&mut self, key: PreferenceKey, value: impl Into<PrefValue>) -> usize {
        self.prefs.set(key, value.into());
        let mut mutated = 0;
        for effect in EffectId::affected_by(key) {
            mutated += self.engine.run(&mut self.doc, &self.ctx, effect, &self.prefs).mutated;
        }
        mutated
    }

    fn node(&self, id: &str) -> NodeId {
        self.doc.get_element_by_id(id).unwrap()
    }

    fn style(&self, id: &str, property: &str) -> Option<String> {
        self.doc.style_value(self.node(id), property).map(str::to_string)
    }
}

// ─── Content root ───

#[test]
fn test_content_root_falls_back_to_body() {
    let fx = Fixture::with_selector("#does-not-exist");
    assert_eq!(fx.ctx.content_root, fx.doc.body());
    let fx = Fixture::new();
    assert_eq!(fx.doc.tag_name(fx.ctx.content_root), Some("main"));
}

// ─── Font size ───

#[test]
fn test_font_size_sweeps_host_content_only() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::FontSize, 20.0);
    assert_eq!(fx.style("intro", "font-size").as_deref(), Some("20px"));
    assert_eq!(fx.style("events", "font-size").as_deref(), Some("20px"));
    assert_eq!(fx.doc.style_value(fx.ctx.content_root, "font-size"), Some("20px"));
    // outside the content root
    assert_eq!(fx.style("title", "font-size"), None);
    // own UI
    assert_eq!(fx.style("overlay", "font-size"), None);
    assert_eq!(fx.style("overlay-label", "font-size"), None);
}

#[test]
fn test_reapplying_same_state_mutates_nothing() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::FontSize, 24.0);
    let report = fx.engine.run(&mut fx.doc, &fx.ctx, EffectId::FontSize, &fx.prefs);
    assert_eq!(report.mutated, 0);
    assert!(report.unchanged > 0);
    assert!(report.skipped >= 2);
}

#[test]
fn test_revert_restores_page_font_size() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::FontSize, 28.0);
    fx.engine.revert_effect(&mut fx.doc, EffectId::FontSize);
    assert_eq!(fx.style("intro", "font-size").as_deref(), Some("12px"));
    assert_eq!(fx.style("events", "font-size"), None);
    assert!(!fx.engine.is_active(EffectId::FontSize));
}

// ─── Root classes and attributes ───

#[test]
fn test_flag_effects_toggle_root_classes() {
    let mut fx = Fixture::new();
    let root = fx.doc.document_element();
    fx.set(PreferenceKey::HighContrast, true);
    fx.set(PreferenceKey::ReduceMotion, true);
    assert!(fx.doc.has_class(root, "high-contrast"));
    assert!(fx.doc.has_class(root, "reduce-motion"));
    fx.set(PreferenceKey::HighContrast, false);
    assert!(!fx.doc.has_class(root, "high-contrast"));
    assert!(fx.doc.has_class(root, "reduce-motion"));
}

#[test]
fn test_turning_off_keeps_a_class_the_page_had() {
    let mut fx = Fixture::new();
    let root = fx.doc.document_element();
    fx.doc.add_class(root, "dark-mode").unwrap();
    fx.set(PreferenceKey::DarkMode, true);
    fx.set(PreferenceKey::DarkMode, false);
    assert!(fx.doc.has_class(root, "dark-mode"));
}

#[test]
fn test_language_attribute_restores_page_value() {
    let mut fx = Fixture::new();
    let root = fx.doc.document_element();
    fx.set(PreferenceKey::Language, "es");
    assert_eq!(fx.doc.get_attribute(root, "lang").as_deref(), Some("es"));
    fx.engine.revert_all(&mut fx.doc);
    assert_eq!(fx.doc.get_attribute(root, "lang").as_deref(), Some("fr"));
}

#[test]
fn test_color_blind_filter_attribute() {
    let mut fx = Fixture::new();
    let root = fx.doc.document_element();
    fx.set(PreferenceKey::ColorBlindFilter, "protanopia");
    assert_eq!(fx.doc.get_attribute(root, "data-color-blind").as_deref(), Some("protanopia"));
    fx.set(PreferenceKey::ColorBlindFilter, "none");
    assert_eq!(fx.doc.get_attribute(root, "data-color-blind"), None);
}

#[test]
fn test_plain_text_size_only_while_enabled() {
    let mut fx = Fixture::new();
    let root = fx.doc.document_element();
    fx.set(PreferenceKey::PlainTextSize, "large");
    assert_eq!(fx.doc.get_attribute(root, "data-plain-text-size"), None);
    fx.set(PreferenceKey::PlainTextMode, true);
    assert_eq!(fx.doc.get_attribute(root, "data-plain-text-size").as_deref(), Some("large"));
    assert!(fx.doc.has_class(root, "plain-text-mode"));
}

// ─── Inline sweeps ───

#[test]
fn test_text_align_default_restores() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::TextAlign, "justify");
    assert_eq!(fx.style("intro", "text-align").as_deref(), Some("justify"));
    fx.set(PreferenceKey::TextAlign, "left");
    assert_eq!(fx.style("intro", "text-align"), None);
}

#[test]
fn test_text_spacing_sets_three_properties() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::LineHeight, 2.0);
    fx.set(PreferenceKey::CharacterSpacing, 0.1);
    assert_eq!(fx.style("intro", "line-height").as_deref(), Some("3"));
    assert_eq!(fx.style("intro", "letter-spacing").as_deref(), Some("0.1em"));
    assert_eq!(fx.style("intro", "word-spacing").as_deref(), Some("0.2em"));
    fx.set(PreferenceKey::CharacterSpacing, 0.0);
    assert_eq!(fx.style("intro", "letter-spacing"), None);
    assert_eq!(fx.style("intro", "word-spacing"), None);
    assert_eq!(fx.style("intro", "line-height").as_deref(), Some("3"));
}

#[test]
fn test_text_color_restores_page_color() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::TextColor, "#FFFFFF");
    assert_eq!(fx.style("intro", "color").as_deref(), Some("#FFFFFF"));
    let intro = fx.node("intro");
    assert!(fx.doc.style(intro).unwrap().get("color").unwrap().important);
    fx.set(PreferenceKey::TextColor, "#000000");
    assert_eq!(fx.style("intro", "color").as_deref(), Some("#333333"));
}

#[test]
fn test_background_sweep_skips_own_ui() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::BackgroundColor, "#FFFFE0");
    assert_eq!(fx.style("intro", "background-color").as_deref(), Some("#FFFFE0"));
    assert_eq!(fx.style("overlay", "background-color"), None);
    let root = fx.doc.document_element();
    assert_eq!(fx.doc.style_value(root, "--background-color"), Some("#FFFFE0"));
}

#[test]
fn test_page_zoom_scales_content_root_only() {
    let mut fx = Fixture::new();
    let body = fx.doc.body();
    fx.doc.set_style(body, "zoom", "90%", false).unwrap();
    fx.set(PreferenceKey::PageZoom, 150.0);
    assert_eq!(fx.doc.style_value(fx.ctx.content_root, "zoom"), Some("150%"));
    assert_eq!(fx.doc.style_value(body, "zoom"), None);
    fx.set(PreferenceKey::PageZoom, 100.0);
    assert_eq!(fx.doc.style_value(fx.ctx.content_root, "zoom"), None);
    assert_eq!(fx.doc.style_value(body, "zoom"), Some("90%"));
}

// ─── Attributes and injected styles ───

#[test]
fn test_image_descriptions_mirror_non_empty_alt() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::ShowImageDescriptions, true);
    assert_eq!(
        fx.doc.get_attribute(fx.node("map"), "data-alt").as_deref(),
        Some("Map of the east wing")
    );
    assert_eq!(fx.doc.get_attribute(fx.node("spacer"), "data-alt"), None);
    fx.set(PreferenceKey::ShowImageDescriptions, false);
    assert_eq!(fx.doc.get_attribute(fx.node("map"), "data-alt"), None);
}

#[test]
fn test_cursor_stylesheet_lifecycle() {
    let mut fx = Fixture::new();
    fx.set(PreferenceKey::CursorSize, 2.0);
    let style = fx.doc.get_element_by_id(CURSOR_STYLE_ID).expect("cursor stylesheet");
    assert_eq!(fx.doc.parent(style), Some(fx.doc.head()));
    assert!(fx.doc.has_class(fx.doc.document_element(), "large-cursor"));
    fx.set(PreferenceKey::CursorSize, 1.0);
    assert!(fx.doc.get_element_by_id(CURSOR_STYLE_ID).is_none());
    assert!(!fx.doc.has_class(fx.doc.document_element(), "large-cursor"));
}

// ─── Full revert ───

#[test]
fn test_revert_all_restores_original_markup() {
    let mut fx = Fixture::new();
    let original = fx.doc.serialize(fx.doc.root());
    fx.engine.run_all(&mut fx.doc, &fx.ctx, &fx.prefs);
    fx.set(PreferenceKey::FontSize, 30.0);
    fx.set(PreferenceKey::HighlightLinks, true);
    fx.set(PreferenceKey::BackgroundColor, "#202020");
    fx.set(PreferenceKey::ShowImageDescriptions, true);
    fx.set(PreferenceKey::CursorColor, "#FF0000");
    assert_ne!(fx.doc.serialize(fx.doc.root()), original);

    assert!(fx.engine.revert_all(&mut fx.doc) > 0);
    assert_eq!(fx.engine.ledger_len(), 0);
    assert_eq!(fx.doc.serialize(fx.doc.root()), original);
}
