//! Unit tests for the accessibility context: the facade UI code talks to.
//!
//! Covers mount-time application, stepping mutators, cross-preference rules,
//! persistence across reloads, capability gating and full reset.

use std::cell::RefCell;
use std::rc::Rc;

use accessbar::app::AccessibilityContext;
use accessbar::dom::Document;
use accessbar::managers::preference_slice::SetOutcome;
use accessbar::services::persistence::{KeyValueStorage, MemoryStorage};
use accessbar::services::speech::{FeatureStatus, STT_UNSUPPORTED};
use accessbar::types::config::{SpeechCapabilities, WidgetConfig};
use accessbar::types::preferences::{PrefValue, PreferenceKey};
use serde_json::json;
use tempfile::TempDir;

const PAGE: &str = r#"<body>
<main data-accessible-content="">
<h1 id="title">Opening hours</h1>
<p id="body-text" style="font-size: 13px">Monday to Friday, nine to five.</p>
<a id="link" href="/holidays">Holidays</a>
</main>
</body>"#;

fn context() -> AccessibilityContext {
    AccessibilityContext::in_memory(Document::parse_html(PAGE).unwrap(), WidgetConfig::default())
}

fn style(ctx: &AccessibilityContext, id: &str, property: &str) -> Option<String> {
    let doc = ctx.document();
    let node = doc.get_element_by_id(id).unwrap();
    doc.style_value(node, property).map(str::to_string)
}

fn text_colors(ctx: &AccessibilityContext) -> (String, String) {
    (
        ctx.prefs().get_str(PreferenceKey::TextColor).to_string(),
        ctx.prefs().get_str(PreferenceKey::HeadingColor).to_string(),
    )
}

// ─── Mount ───

#[test]
fn test_font_size_applied_at_mount() {
    let ctx = context();
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("16px"));
    assert_eq!(style(&ctx, "title", "font-size").as_deref(), Some("16px"));
}

#[test]
fn test_loaded_preferences_applied_at_mount() {
    let mut storage = MemoryStorage::new();
    storage.set_item("accessibility-fontSize", "22").unwrap();
    storage.set_item("accessibility-highlightLinks", "true").unwrap();
    storage.set_item("accessibility-textAlign", "sideways").unwrap();
    let ctx = AccessibilityContext::new(Document::parse_html(PAGE).unwrap(), WidgetConfig::default(), Box::new(storage));

    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 22.0);
    assert_eq!(ctx.prefs().get_str(PreferenceKey::TextAlign), "left");
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("22px"));
    let root = ctx.document().document_element();
    assert!(ctx.document().has_class(root, "highlight-links"));
}

// ─── Mutators ───

#[test]
fn test_font_size_steps_and_clamps() {
    let mut ctx = context();
    ctx.increase_font_size();
    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 18.0);
    for _ in 0..20 {
        ctx.increase_font_size();
    }
    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 32.0);
    assert_eq!(ctx.increase_font_size(), SetOutcome::Unchanged);
    ctx.reset_font_size();
    for _ in 0..3 {
        ctx.decrease_font_size();
    }
    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 12.0);
}

#[test]
fn test_font_size_boundaries_on_paragraph() {
    let mut ctx = context();
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("16px"));
    for _ in 0..9 {
        ctx.increase_font_size();
    }
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("32px"));
    ctx.increase_font_size();
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("32px"));

    ctx.reset_font_size();
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("16px"));
    for _ in 0..8 {
        ctx.decrease_font_size();
    }
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("12px"));
    assert_eq!(ctx.decrease_font_size(), SetOutcome::Unchanged);
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("12px"));
}

#[test]
fn test_page_zoom_steps() {
    let mut ctx = context();
    ctx.increase_page_zoom();
    ctx.increase_page_zoom();
    assert_eq!(ctx.prefs().get_number(PreferenceKey::PageZoom), 120.0);
    let main = ctx.content_root();
    assert_eq!(ctx.document().style_value(main, "zoom"), Some("120%"));
    ctx.decrease_page_zoom();
    ctx.decrease_page_zoom();
    assert_eq!(ctx.document().style_value(main, "zoom"), None);
}

#[test]
fn test_toggle_flips_flags() {
    let mut ctx = context();
    assert!(ctx.toggle(PreferenceKey::Grayscale).is_committed());
    assert!(ctx.prefs().get_bool(PreferenceKey::Grayscale));
    ctx.toggle(PreferenceKey::Grayscale);
    assert!(!ctx.prefs().get_bool(PreferenceKey::Grayscale));
}

#[test]
fn test_get_by_name_and_alias() {
    let mut ctx = context();
    ctx.set_by_name("textSpacing", &json!(1.5)).unwrap();
    assert_eq!(ctx.get_by_name("lineHeight"), Some(PrefValue::Number(1.5)));
    assert_eq!(ctx.get_by_name("nope"), None);
    assert!(ctx.set_by_name("nope", &json!(1)).is_err());
}

#[test]
fn test_repeated_set_is_idempotent() {
    let mut ctx = context();
    ctx.set(PreferenceKey::FontSize, 20.0);
    let before = ctx.document().serialize(ctx.document().root());
    assert_eq!(ctx.set(PreferenceKey::FontSize, 20.0), SetOutcome::Unchanged);
    assert_eq!(ctx.document().serialize(ctx.document().root()), before);
}

#[test]
fn test_subscribers_see_committed_values() {
    let mut ctx = context();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let id = ctx.subscribe(PreferenceKey::FontSize, Box::new(move |_, v| log.borrow_mut().push(v.clone())));
    ctx.set(PreferenceKey::FontSize, 100.0);
    ctx.set(PreferenceKey::FontSize, 32.0);
    assert!(ctx.unsubscribe(id));
    ctx.set(PreferenceKey::FontSize, 14.0);
    assert_eq!(*seen.borrow(), vec![PrefValue::Number(32.0)]);
}

// ─── Cross-preference rules ───

#[test]
fn test_dark_mode_drives_text_colors_without_background() {
    let mut ctx = context();
    ctx.set(PreferenceKey::DarkMode, true);
    assert_eq!(text_colors(&ctx), ("#FFFFFF".to_string(), "#FFFFFF".to_string()));
    assert_eq!(style(&ctx, "body-text", "color").as_deref(), Some("#FFFFFF"));
    ctx.set(PreferenceKey::DarkMode, false);
    assert_eq!(text_colors(&ctx), ("#000000".to_string(), "#000000".to_string()));
    assert_eq!(style(&ctx, "body-text", "color"), None);
}

#[test]
fn test_background_picks_contrasting_text() {
    let mut ctx = context();
    ctx.set(PreferenceKey::BackgroundColor, "#FFFFE0");
    assert_eq!(text_colors(&ctx).0, "#000000");
    ctx.set(PreferenceKey::BackgroundColor, "#1E293B");
    assert_eq!(text_colors(&ctx), ("#FFFFFF".to_string(), "#FFFFFF".to_string()));
    assert_eq!(style(&ctx, "body-text", "background-color").as_deref(), Some("#1E293B"));
}

#[test]
fn test_dark_mode_ignored_while_background_set() {
    let mut ctx = context();
    ctx.set(PreferenceKey::BackgroundColor, "#FFFFE0");
    ctx.set(PreferenceKey::DarkMode, true);
    assert_eq!(text_colors(&ctx).0, "#000000");
}

#[test]
fn test_clearing_background_returns_to_dark_mode_colors() {
    let mut ctx = context();
    ctx.set(PreferenceKey::DarkMode, true);
    ctx.set(PreferenceKey::BackgroundColor, "#FFFFE0");
    assert_eq!(text_colors(&ctx).0, "#000000");
    ctx.set(PreferenceKey::BackgroundColor, "");
    assert_eq!(text_colors(&ctx).0, "#FFFFFF");
    assert_eq!(style(&ctx, "body-text", "background-color"), None);
}

#[test]
fn test_filter_and_background_exclude_each_other() {
    let mut ctx = context();
    ctx.set(PreferenceKey::BackgroundColor, "#000080");
    ctx.set(PreferenceKey::ColorBlindFilter, "deuteranopia");
    assert_eq!(ctx.prefs().get_str(PreferenceKey::BackgroundColor), "");
    assert_eq!(text_colors(&ctx).0, "#000000");
    let root = ctx.document().document_element();
    assert_eq!(ctx.document().get_attribute(root, "data-color-blind").as_deref(), Some("deuteranopia"));

    ctx.set(PreferenceKey::BackgroundColor, "#F5F5DC");
    assert_eq!(ctx.prefs().get_str(PreferenceKey::ColorBlindFilter), "none");
    assert_eq!(ctx.document().get_attribute(root, "data-color-blind"), None);
}

// ─── Capabilities ───

#[test]
fn test_speech_toggle_reports_missing_capability() {
    let config = WidgetConfig {
        speech: SpeechCapabilities { synthesis: true, recognition: false },
        ..WidgetConfig::default()
    };
    let mut ctx = AccessibilityContext::in_memory(Document::new_html(), config);
    assert_eq!(ctx.toggle_speech_to_text(), FeatureStatus::Unavailable(STT_UNSUPPORTED.to_string()));
    assert!(!ctx.prefs().get_bool(PreferenceKey::SpeechToText));
    assert!(ctx.toggle_text_to_speech().is_ready());
    assert!(ctx.prefs().get_bool(PreferenceKey::TextToSpeech));
    // turning off never needs the capability
    assert!(ctx.toggle_text_to_speech().is_ready());
    assert!(!ctx.prefs().get_bool(PreferenceKey::TextToSpeech));
}

// ─── Persistence ───

#[test]
fn test_preferences_survive_reload() {
    let tmp = TempDir::new().unwrap();
    let config = WidgetConfig { data_dir: Some(tmp.path().to_path_buf()), ..WidgetConfig::default() };
    {
        let mut ctx = AccessibilityContext::open(Document::parse_html(PAGE).unwrap(), config.clone());
        ctx.set(PreferenceKey::FontSize, 24.0);
        ctx.set(PreferenceKey::ReadingRulerWidth, 90.0);
        ctx.set(PreferenceKey::PageSummary, true);
        ctx.set(PreferenceKey::SimplifiedLayout, true);
    }
    let ctx = AccessibilityContext::open(Document::parse_html(PAGE).unwrap(), config);
    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 24.0);
    assert_eq!(ctx.prefs().get_number(PreferenceKey::ReadingRulerWidth), 90.0);
    assert!(!ctx.prefs().get_bool(PreferenceKey::PageSummary));
    assert!(!ctx.prefs().get_bool(PreferenceKey::SimplifiedLayout));
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("24px"));
}

#[test]
fn test_unavailable_storage_keeps_working_in_memory() {
    let mut ctx = AccessibilityContext::new(
        Document::parse_html(PAGE).unwrap(),
        WidgetConfig::default(),
        Box::new(MemoryStorage::unavailable()),
    );
    assert!(ctx.persistence().is_degraded());
    assert!(ctx.set(PreferenceKey::FontSize, 20.0).is_committed());
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("20px"));
}

// ─── Reset ───

#[test]
fn test_reset_all_restores_page_and_defaults() {
    let original = Document::parse_html(PAGE).unwrap();
    let expected = original.serialize(original.root());
    let mut ctx = AccessibilityContext::in_memory(original, WidgetConfig::default());

    ctx.set(PreferenceKey::FontSize, 26.0);
    ctx.set(PreferenceKey::DarkMode, true);
    ctx.set(PreferenceKey::ReadingGuide, true);
    ctx.set(PreferenceKey::CursorSize, 3.0);
    ctx.set(PreferenceKey::HideImages, true);
    assert!(ctx.persistence().raw(PreferenceKey::FontSize).is_some());

    assert!(ctx.reset_all() > 0);
    assert_eq!(ctx.document().serialize(ctx.document().root()), expected);
    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 16.0);
    assert!(!ctx.prefs().get_bool(PreferenceKey::DarkMode));
    assert_eq!(ctx.persistence().raw(PreferenceKey::FontSize), None);
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("13px"));
}

#[test]
fn test_reset_leaves_pre_mount_sizes_until_next_mount() {
    let mut ctx = context();
    ctx.set(PreferenceKey::FontSize, 24.0);
    ctx.reset_all();
    assert_eq!(ctx.prefs().get_number(PreferenceKey::FontSize), 16.0);
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("13px"));
    assert_eq!(style(&ctx, "title", "font-size"), None);

    ctx.refresh_effects();
    assert_eq!(style(&ctx, "body-text", "font-size").as_deref(), Some("16px"));
    assert_eq!(style(&ctx, "title", "font-size").as_deref(), Some("16px"));
}

#[test]
fn test_refresh_effects_reaches_new_content() {
    let mut ctx = context();
    ctx.set(PreferenceKey::FontSize, 20.0);
    let main = ctx.content_root();
    let doc = ctx.document_mut();
    let late = doc.create_element("p");
    doc.set_attribute(late, "id", "late").unwrap();
    doc.append_child(main, late).unwrap();
    assert_eq!(style(&ctx, "late", "font-size"), None);
    let report = ctx.refresh_effects();
    assert!(report.mutated >= 1);
    assert_eq!(style(&ctx, "late", "font-size").as_deref(), Some("20px"));
}
