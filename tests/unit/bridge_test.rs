//! Unit tests for the bridge handler: every method dispatched by `handle_method`, through the
//! same code path the `accessbar-bridge` binary uses.

use std::sync::Mutex;

use serde_json::{json, Value};

use accessbar::bridge_handler::{handle_method, route};
use accessbar::dom::Document;
use accessbar::embed::AccessibilityBarEmbed;
use accessbar::types::config::{SpeechCapabilities, WidgetConfig};

const PAGE: &str = r#"<html><body><main><p id="intro">Reading room</p></main></body></html>"#;

fn unmounted() -> Mutex<AccessibilityBarEmbed> {
    let config = WidgetConfig { speech: SpeechCapabilities::none(), ..WidgetConfig::default() };
    Mutex::new(AccessibilityBarEmbed::in_memory(Document::parse_html(PAGE).unwrap(), config))
}

fn setup() -> Mutex<AccessibilityBarEmbed> {
    let embed = unmounted();
    let res = handle_method(&embed, "embed.init", &json!({})).unwrap();
    assert_eq!(res, json!({"mounted": true}));
    embed
}

fn call(embed: &Mutex<AccessibilityBarEmbed>, method: &str, params: Value) -> Value {
    handle_method(embed, method, &params).unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

// ─── Ping ───

#[test]
fn test_ping() {
    let embed = unmounted();
    assert_eq!(call(&embed, "ping", json!({})), json!({"pong": true}));
}

// ─── Unknown method ───

#[test]
fn test_unknown_method_returns_error() {
    let embed = setup();
    let res = handle_method(&embed, "bookmark.add", &json!({}));
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Embed API ───

#[test]
fn test_init_twice_reports_not_mounted() {
    let embed = setup();
    assert_eq!(call(&embed, "embed.init", Value::Null), json!({"mounted": false}));
}

#[test]
fn test_embed_calls_report_outcome() {
    let embed = setup();
    assert_eq!(call(&embed, "embed.setFontSize", json!({"size": 20})), json!({"outcome": "committed"}));
    assert_eq!(call(&embed, "embed.setFontSize", json!({"size": 20})), json!({"outcome": "unchanged"}));
    assert_eq!(call(&embed, "embed.setTextAlign", json!({"align": "center"})), json!({"outcome": "committed"}));
    assert_eq!(
        call(&embed, "embed.toggleHighContrast", json!({"enabled": true})),
        json!({"outcome": "committed"})
    );
}

#[test]
fn test_embed_invalid_values_error() {
    let embed = setup();
    assert!(handle_method(&embed, "embed.setFontStyle", &json!({"style": "comic"})).unwrap_err().contains("setFontStyle"));
    assert!(handle_method(&embed, "embed.setFontSize", &json!({})).unwrap_err().contains("missing size"));
}

#[test]
fn test_embed_api_before_init_fails() {
    let embed = unmounted();
    let err = handle_method(&embed, "embed.setFontSize", &json!({"size": 20})).unwrap_err();
    assert!(err.contains("not mounted"));
}

#[test]
fn test_bare_message_is_routed_to_embed() {
    let embed = unmounted();
    let (_, method, params) = route(&json!({"type": "init"}));
    assert_eq!(call(&embed, &method, params), json!({"handled": false}));

    let (_, method, params) = route(&json!({"type": "setFontSize", "payload": 24}));
    assert_eq!(call(&embed, &method, params), json!({"handled": true, "outcome": "committed"}));

    let (_, method, params) = route(&json!({"type": "resize"}));
    assert_eq!(call(&embed, &method, params), json!({"handled": false}));
}

// ─── Preferences ───

#[test]
fn test_prefs_set_and_get() {
    let embed = setup();
    assert_eq!(
        call(&embed, "prefs.set", json!({"key": "backgroundColor", "value": "#1E293B"})),
        json!({"outcome": "committed"})
    );
    assert_eq!(call(&embed, "prefs.get", json!({"key": "textColor"})), json!("#FFFFFF"));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "textSpacing"})), json!(1.0));

    let all = call(&embed, "prefs.all", json!({}));
    assert_eq!(all["backgroundColor"], json!("#1E293B"));
    assert_eq!(all["colorBlindFilter"], json!("none"));
}

#[test]
fn test_prefs_errors() {
    let embed = setup();
    assert!(handle_method(&embed, "prefs.get", &json!({"key": "fontWeight"})).unwrap_err().contains("unknown preference"));
    assert!(handle_method(&embed, "prefs.set", &json!({"key": "fontSize"})).unwrap_err().contains("missing value"));
    assert!(handle_method(&embed, "prefs.toggle", &json!({"key": "fontSize"})).unwrap_err().contains("not a toggle"));
}

#[test]
fn test_prefs_toggle_flips() {
    let embed = setup();
    call(&embed, "prefs.toggle", json!({"key": "highlightLinks"}));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "highlightLinks"})), json!(true));
    call(&embed, "prefs.toggle", json!({"key": "highlightLinks"}));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "highlightLinks"})), json!(false));
}

#[test]
fn test_font_and_zoom_steps() {
    let embed = setup();
    call(&embed, "font.increase", json!({}));
    call(&embed, "font.increase", json!({}));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "fontSize"})), json!(20.0));
    call(&embed, "font.decrease", json!({}));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "fontSize"})), json!(18.0));
    assert_eq!(call(&embed, "font.reset", json!({})), json!({"outcome": "committed"}));

    call(&embed, "zoom.increase", json!({}));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "pageZoom"})), json!(110.0));
    call(&embed, "zoom.decrease", json!({}));
    assert_eq!(call(&embed, "zoom.decrease", json!({})), json!({"outcome": "committed"}));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "pageZoom"})), json!(90.0));
}

#[test]
fn test_reset_restores_page() {
    let embed = setup();
    let before = call(&embed, "document.html", json!({}))["html"].clone();
    call(&embed, "prefs.set", json!({"key": "highContrast", "value": true}));
    assert_ne!(call(&embed, "document.html", json!({}))["html"], before);

    let res = call(&embed, "prefs.reset", json!({}));
    assert!(res["restored"].as_u64().unwrap() > 0);
    assert_eq!(call(&embed, "prefs.get", json!({"key": "highContrast"})), json!(false));
    let guard = embed.lock().unwrap();
    let doc = guard.document().unwrap();
    assert!(!doc.has_class(doc.document_element(), "high-contrast"));
}

// ─── Speech ───

#[test]
fn test_speech_unavailable_without_platform_support() {
    let embed = setup();
    let res = call(&embed, "speech.toggleTextToSpeech", json!({}));
    assert_eq!(res["ready"], json!(false));
    assert!(res["status"].as_str().unwrap().starts_with("unavailable"));
    let res = call(&embed, "speech.toggleSpeechToText", json!({}));
    assert_eq!(res["ready"], json!(false));
    assert_eq!(call(&embed, "prefs.get", json!({"key": "textToSpeech"})), json!(false));
}

// ─── Pointer tracking ───

#[test]
fn test_pointer_moves_and_frames() {
    let embed = setup();
    assert_eq!(call(&embed, "pointer.move", json!({"x": 10, "y": 10})), json!({"frames": 0}));
    call(&embed, "prefs.set", json!({"key": "readingRuler", "value": true}));
    assert_eq!(call(&embed, "pointer.move", json!({"x": 10, "y": 10})), json!({"frames": 1}));
    assert_eq!(call(&embed, "pointer.move", json!({"x": 12, "y": 40})), json!({"frames": 0}));
    assert_eq!(call(&embed, "frame.tick", json!({})), json!({"updated": 1}));
    assert_eq!(call(&embed, "frame.tick", json!({})), json!({"updated": 0}));
    assert!(handle_method(&embed, "pointer.move", &json!({"x": 1})).unwrap_err().contains("missing y"));
}

// ─── Document ───

#[test]
fn test_document_refresh_reaches_new_content() {
    let embed = setup();
    call(&embed, "embed.setFontSize", json!({"size": 22}));
    {
        let mut guard = embed.lock().unwrap();
        let doc = guard.context_mut().unwrap().document_mut();
        let main = doc.query_selector(doc.root(), "main").unwrap().unwrap();
        let late = doc.create_element("p");
        doc.set_attribute(late, "id", "late").unwrap();
        doc.append_child(main, late).unwrap();
    }
    let report = call(&embed, "document.refresh", json!({}));
    assert!(report["mutated"].as_u64().unwrap() >= 1);
    let guard = embed.lock().unwrap();
    let doc = guard.document().unwrap();
    let late = doc.get_element_by_id("late").unwrap();
    assert_eq!(doc.style_value(late, "font-size"), Some("22px"));
}
