//! Unit tests for the storage backends and the persistence adapter.
//!
//! Exercises namespacing, lenient loading of malformed values, degraded mode on
//! storage failure, and the durable SQLite store across reopen.

use accessbar::database::connection::Database;
use accessbar::database::kv_store::SqliteStorage;
use accessbar::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use accessbar::services::persistence::{KeyValueStorage, MemoryStorage, PersistenceAdapter};
use accessbar::types::preferences::{PrefValue, PreferenceKey};
use tempfile::TempDir;

fn adapter_with(items: &[(&str, &str)]) -> PersistenceAdapter {
    let mut storage = MemoryStorage::new();
    for (k, v) in items {
        storage.set_item(k, v).unwrap();
    }
    PersistenceAdapter::new(Box::new(storage), "accessibility-")
}

// ─── Namespacing ───

#[test]
fn test_storage_key_uses_prefix() {
    let adapter = PersistenceAdapter::in_memory("accessibility-");
    assert_eq!(adapter.storage_key(PreferenceKey::FontSize), "accessibility-fontSize");
    assert_eq!(adapter.storage_key(PreferenceKey::ColorBlindFilter), "accessibility-colorBlindFilter");
}

#[test]
fn test_save_writes_storage_spelling() {
    let mut adapter = PersistenceAdapter::in_memory("accessibility-");
    adapter.save(PreferenceKey::FontSize, &PrefValue::Number(20.0));
    adapter.save(PreferenceKey::DarkMode, &PrefValue::Bool(true));
    adapter.save(PreferenceKey::TextAlign, &PrefValue::Choice("center"));
    assert_eq!(adapter.raw(PreferenceKey::FontSize).as_deref(), Some("20"));
    assert_eq!(adapter.raw(PreferenceKey::DarkMode).as_deref(), Some("true"));
    assert_eq!(adapter.raw(PreferenceKey::TextAlign).as_deref(), Some("center"));
}

#[test]
fn test_transient_preferences_are_not_written() {
    let mut adapter = PersistenceAdapter::in_memory("accessibility-");
    adapter.save(PreferenceKey::PageSummary, &PrefValue::Bool(true));
    adapter.save(PreferenceKey::TextToSpeech, &PrefValue::Bool(true));
    adapter.save(PreferenceKey::SimplifiedLayout, &PrefValue::Bool(true));
    assert_eq!(adapter.raw(PreferenceKey::PageSummary), None);
    assert_eq!(adapter.raw(PreferenceKey::TextToSpeech), None);
    assert_eq!(adapter.raw(PreferenceKey::SimplifiedLayout), None);
}

// ─── Loading ───

#[test]
fn test_load_reads_present_values_only() {
    let mut adapter = adapter_with(&[
        ("accessibility-fontSize", "24"),
        ("accessibility-highContrast", "true"),
        ("accessibility-fontStyle", "dyslexic"),
    ]);
    let snapshot = adapter.load();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[&PreferenceKey::FontSize], PrefValue::Number(24.0));
    assert_eq!(snapshot[&PreferenceKey::HighContrast], PrefValue::Bool(true));
    assert_eq!(snapshot[&PreferenceKey::FontStyle], PrefValue::Choice("dyslexic"));
}

#[test]
fn test_load_skips_malformed_values() {
    let mut adapter = adapter_with(&[
        ("accessibility-fontSize", "huge"),
        ("accessibility-darkMode", "yes"),
        ("accessibility-textAlign", "diagonal"),
        ("accessibility-lineHeight", "1.5"),
    ]);
    let snapshot = adapter.load();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[&PreferenceKey::LineHeight], PrefValue::Number(1.5));
    assert!(!adapter.is_degraded());
}

#[test]
fn test_load_clamps_out_of_range_numbers() {
    let mut adapter = adapter_with(&[("accessibility-fontSize", "99")]);
    let snapshot = adapter.load();
    assert_eq!(snapshot[&PreferenceKey::FontSize], PrefValue::Number(32.0));
}

#[test]
fn test_load_ignores_other_namespaces() {
    let mut adapter = adapter_with(&[("fontSize", "24"), ("other-fontSize", "24")]);
    assert!(adapter.load().is_empty());
}

// ─── Degraded mode ───

#[test]
fn test_unavailable_storage_degrades_without_failing() {
    let mut adapter = PersistenceAdapter::new(Box::new(MemoryStorage::unavailable()), "accessibility-");
    assert!(adapter.load().is_empty());
    assert!(adapter.is_degraded());
    adapter.save(PreferenceKey::FontSize, &PrefValue::Number(20.0));
    assert_eq!(adapter.clear_all(), 0);
}

#[test]
fn test_quota_exceeded_degrades_and_stops_writing() {
    let mut adapter = PersistenceAdapter::new(Box::new(MemoryStorage::with_quota(30)), "accessibility-");
    adapter.save(PreferenceKey::FontSize, &PrefValue::Number(20.0));
    assert!(!adapter.is_degraded());
    adapter.save(PreferenceKey::ReadingRulerColor, &PrefValue::Text("rgba(22, 163, 74, 0.8)".to_string()));
    assert!(adapter.is_degraded());
    adapter.save(PreferenceKey::DarkMode, &PrefValue::Bool(true));
    assert_eq!(adapter.raw(PreferenceKey::DarkMode), None);
    assert_eq!(adapter.raw(PreferenceKey::FontSize).as_deref(), Some("20"));
}

// ─── Clearing ───

#[test]
fn test_clear_all_removes_only_prefixed_keys() {
    let mut adapter = adapter_with(&[
        ("accessibility-fontSize", "20"),
        ("accessibility-legacyOption", "1"),
        ("session-token", "abc"),
    ]);
    assert_eq!(adapter.clear_all(), 2);
    assert_eq!(adapter.raw(PreferenceKey::FontSize), None);
}

// ─── SQLite backend ───

#[test]
fn test_migrations_reach_current_version() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_sqlite_values_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("prefs.db");
    {
        let storage = SqliteStorage::open(&path).unwrap();
        let mut adapter = PersistenceAdapter::new(Box::new(storage), "accessibility-");
        adapter.save(PreferenceKey::FontSize, &PrefValue::Number(22.0));
        adapter.save(PreferenceKey::BackgroundColor, &PrefValue::Text("#FFFFE0".to_string()));
    }
    let storage = SqliteStorage::open(&path).unwrap();
    let mut adapter = PersistenceAdapter::new(Box::new(storage), "accessibility-");
    let snapshot = adapter.load();
    assert_eq!(snapshot[&PreferenceKey::FontSize], PrefValue::Number(22.0));
    assert_eq!(snapshot[&PreferenceKey::BackgroundColor], PrefValue::Text("#FFFFE0".to_string()));
}

#[test]
fn test_sqlite_clear_all() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut adapter = PersistenceAdapter::new(Box::new(storage), "accessibility-");
    adapter.save(PreferenceKey::DarkMode, &PrefValue::Bool(true));
    adapter.save(PreferenceKey::Grayscale, &PrefValue::Bool(true));
    assert_eq!(adapter.clear_all(), 2);
    assert!(adapter.load().is_empty());
}
