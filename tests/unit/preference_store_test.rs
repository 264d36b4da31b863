//! Unit tests for the preference store: domains, clamping, idempotent writes,
//! subscriptions, hydration and reset.

use std::cell::RefCell;
use std::rc::Rc;

use accessbar::managers::preference_slice::SetOutcome;
use accessbar::managers::preference_store::{PreferenceStore, PreferenceStoreTrait};
use accessbar::types::errors::PreferenceError;
use accessbar::types::preferences::{PrefValue, PreferenceKey, PreferenceSnapshot, SliceKind};
use rstest::rstest;
use serde_json::json;

// ─── Defaults ───

#[rstest]
#[case(PreferenceKey::FontSize, PrefValue::Number(16.0))]
#[case(PreferenceKey::LineHeight, PrefValue::Number(1.0))]
#[case(PreferenceKey::PageZoom, PrefValue::Number(100.0))]
#[case(PreferenceKey::TextAlign, PrefValue::Choice("left"))]
#[case(PreferenceKey::ColorBlindFilter, PrefValue::Choice("none"))]
#[case(PreferenceKey::BackgroundColor, PrefValue::Text(String::new()))]
#[case(PreferenceKey::TextColor, PrefValue::Text("#000000".to_string()))]
#[case(PreferenceKey::SmartSuggestions, PrefValue::Bool(true))]
#[case(PreferenceKey::ButtonPosition, PrefValue::Choice("bottom-right"))]
#[case(PreferenceKey::PanelPosition, PrefValue::Choice("left"))]
fn test_defaults(#[case] key: PreferenceKey, #[case] expected: PrefValue) {
    let store = PreferenceStore::new();
    assert_eq!(store.get(key), expected);
}

#[test]
fn test_every_key_has_exactly_one_slice() {
    let store = PreferenceStore::new();
    for key in PreferenceKey::all() {
        let owners = SliceKind::ALL.iter().filter(|k| store.slice(**k).owns(key)).count();
        assert_eq!(owners, 1, "{} owned by {} slices", key, owners);
    }
}

// ─── Writes ───

#[rstest]
#[case(PreferenceKey::FontSize, 40.0, 32.0)]
#[case(PreferenceKey::FontSize, 4.0, 12.0)]
#[case(PreferenceKey::PageZoom, 250.0, 200.0)]
#[case(PreferenceKey::LineHeight, 0.1, 0.5)]
#[case(PreferenceKey::CharacterSpacing, -1.0, 0.0)]
#[case(PreferenceKey::CursorSize, 9.0, 5.0)]
#[case(PreferenceKey::TtsReadingSpeed, 0.1, 0.25)]
fn test_numbers_clamp(#[case] key: PreferenceKey, #[case] input: f64, #[case] expected: f64) {
    let mut store = PreferenceStore::new();
    store.set(key, PrefValue::Number(input));
    assert_eq!(store.get_number(key), expected);
}

#[test]
fn test_non_finite_numbers_are_rejected() {
    let mut store = PreferenceStore::new();
    assert_eq!(store.set(PreferenceKey::FontSize, PrefValue::Number(f64::NAN)), SetOutcome::Rejected);
    assert_eq!(store.set(PreferenceKey::FontSize, PrefValue::Number(f64::INFINITY)), SetOutcome::Rejected);
    assert_eq!(store.get_number(PreferenceKey::FontSize), 16.0);
}

#[test]
fn test_unknown_choice_is_rejected_silently() {
    let mut store = PreferenceStore::new();
    store.set(PreferenceKey::TextAlign, PrefValue::from("center"));
    assert_eq!(store.set(PreferenceKey::TextAlign, PrefValue::from("diagonal")), SetOutcome::Rejected);
    assert_eq!(store.get_str(PreferenceKey::TextAlign), "center");
}

#[test]
fn test_color_validation() {
    let mut store = PreferenceStore::new();
    assert!(store.set(PreferenceKey::BackgroundColor, PrefValue::from("#abc")).is_committed());
    assert!(store.set(PreferenceKey::BackgroundColor, PrefValue::from("rgb(1, 2, 3)")).is_committed());
    assert_eq!(store.set(PreferenceKey::BackgroundColor, PrefValue::from("blue-ish")), SetOutcome::Rejected);
    assert!(store.set(PreferenceKey::BackgroundColor, PrefValue::from("")).is_committed());
    // text color cannot be unset
    assert_eq!(store.set(PreferenceKey::TextColor, PrefValue::from("")), SetOutcome::Rejected);
}

#[test]
fn test_type_mismatch_is_rejected() {
    let mut store = PreferenceStore::new();
    assert_eq!(store.set(PreferenceKey::DarkMode, PrefValue::Number(1.0)), SetOutcome::Rejected);
    assert_eq!(store.set(PreferenceKey::FontSize, PrefValue::Bool(true)), SetOutcome::Rejected);
}

#[test]
fn test_setting_current_value_is_unchanged() {
    let mut store = PreferenceStore::new();
    assert_eq!(store.set(PreferenceKey::FontSize, PrefValue::Number(16.0)), SetOutcome::Unchanged);
    assert!(store.set(PreferenceKey::FontSize, PrefValue::Number(18.0)).is_committed());
    assert_eq!(store.set(PreferenceKey::FontSize, PrefValue::Number(18.0)), SetOutcome::Unchanged);
}

#[test]
fn test_text_spacing_alias() {
    let mut store = PreferenceStore::new();
    store.set_by_name("textSpacing", &json!(1.5)).unwrap();
    assert_eq!(store.get_number(PreferenceKey::LineHeight), 1.5);
}

#[test]
fn test_set_by_name_errors() {
    let mut store = PreferenceStore::new();
    assert!(matches!(
        store.set_by_name("fontWeight", &json!(700)),
        Err(PreferenceError::UnknownKey(_))
    ));
    assert!(matches!(
        store.set_by_name("darkMode", &json!("yes")),
        Err(PreferenceError::InvalidValue(_))
    ));
    assert_eq!(store.set_by_name("fontSize", &json!("20")).unwrap(), SetOutcome::Committed);
}

// ─── Subscriptions ───

#[test]
fn test_listeners_fire_in_commit_order() {
    let mut store = PreferenceStore::new();
    let seen: Rc<RefCell<Vec<(PreferenceKey, PrefValue)>>> = Rc::new(RefCell::new(Vec::new()));
    for key in [PreferenceKey::FontSize, PreferenceKey::DarkMode] {
        let log = Rc::clone(&seen);
        store.subscribe(key, Box::new(move |k, v| log.borrow_mut().push((k, v.clone()))));
    }
    store.set(PreferenceKey::DarkMode, PrefValue::Bool(true));
    store.set(PreferenceKey::FontSize, PrefValue::Number(50.0));
    store.set(PreferenceKey::FontSize, PrefValue::Number(32.0));

    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec![
            (PreferenceKey::DarkMode, PrefValue::Bool(true)),
            (PreferenceKey::FontSize, PrefValue::Number(32.0)),
        ]
    );
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let mut store = PreferenceStore::new();
    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let id = store.subscribe(PreferenceKey::Grayscale, Box::new(move |_, _| *counter.borrow_mut() += 1));
    store.set(PreferenceKey::Grayscale, PrefValue::Bool(true));
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.set(PreferenceKey::Grayscale, PrefValue::Bool(false));
    assert_eq!(*count.borrow(), 1);
}

// ─── Hydration and reset ───

#[test]
fn test_hydrate_counts_changed_values() {
    let mut store = PreferenceStore::new();
    let mut snapshot = PreferenceSnapshot::new();
    snapshot.insert(PreferenceKey::FontSize, PrefValue::Number(16.0));
    snapshot.insert(PreferenceKey::DarkMode, PrefValue::Bool(true));
    snapshot.insert(PreferenceKey::TextAlign, PrefValue::Choice("justify"));
    assert_eq!(store.hydrate(&snapshot), 2);
    assert!(store.get_bool(PreferenceKey::DarkMode));
}

#[test]
fn test_reset_defaults_returns_changed_keys() {
    let mut store = PreferenceStore::new();
    store.set(PreferenceKey::FontSize, PrefValue::Number(20.0));
    store.set(PreferenceKey::CursorSize, PrefValue::Number(2.0));
    let mut changed = store.reset_defaults();
    changed.sort();
    assert_eq!(changed, vec![PreferenceKey::FontSize, PreferenceKey::CursorSize]);
    assert_eq!(store.snapshot(), PreferenceStore::new().snapshot());
}

#[test]
fn test_to_json_uses_wire_names() {
    let store = PreferenceStore::new();
    let json = store.to_json();
    assert_eq!(json["fontSize"], json!(16.0));
    assert_eq!(json["colorBlindFilter"], json!("none"));
    assert_eq!(json["smartSuggestions"], json!(true));
    assert_eq!(json.as_object().unwrap().len(), PreferenceKey::all().count());
}
