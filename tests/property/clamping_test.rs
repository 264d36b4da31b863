//! Property-based tests for numeric preference domains.
//!
//! Any finite number written to a range preference lands inside the range and equals the input
//! when the input was already inside it; non-finite numbers never change the stored value.

use accessbar::app::AccessibilityContext;
use accessbar::dom::Document;
use accessbar::managers::preference_slice::SetOutcome;
use accessbar::managers::preference_store::{PreferenceStore, PreferenceStoreTrait};
use accessbar::types::config::WidgetConfig;
use accessbar::types::preferences::{Domain, PrefValue, PreferenceKey};
use proptest::prelude::*;
use serde_json::json;

fn range_keys() -> Vec<(PreferenceKey, f64, f64)> {
    PreferenceKey::all()
        .filter_map(|key| match key.domain() {
            Domain::Range { min, max, .. } => Some((key, min, max)),
            _ => None,
        })
        .collect()
}

fn arb_range_key() -> impl Strategy<Value = (PreferenceKey, f64, f64)> {
    prop::sample::select(range_keys())
}

fn arb_non_finite() -> impl Strategy<Value = f64> {
    prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_numbers_land_in_range((key, min, max) in arb_range_key(), n in -1.0e6f64..1.0e6) {
        let mut store = PreferenceStore::new();
        store.set(key, PrefValue::Number(n));
        let stored = store.get_number(key);
        prop_assert!(stored >= min && stored <= max, "{} = {} outside [{}, {}]", key, stored, min, max);
        if n >= min && n <= max {
            prop_assert_eq!(stored, n);
        }
    }

    #[test]
    fn prop_json_writes_clamp_like_typed_writes((key, _min, _max) in arb_range_key(), n in -1.0e4f64..1.0e4) {
        let mut typed = PreferenceStore::new();
        let mut by_name = PreferenceStore::new();
        typed.set(key, PrefValue::Number(n));
        by_name.set_by_name(key.name(), &json!(n)).unwrap();
        prop_assert_eq!(typed.get(key), by_name.get(key));
    }

    #[test]
    fn prop_non_finite_is_rejected((key, _min, _max) in arb_range_key(), start in -1.0e3f64..1.0e3, bad in arb_non_finite()) {
        let mut store = PreferenceStore::new();
        store.set(key, PrefValue::Number(start));
        let before = store.get(key);
        prop_assert_eq!(store.set(key, PrefValue::Number(bad)), SetOutcome::Rejected);
        prop_assert_eq!(store.get(key), before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Stepping font size and zoom in any order never leaves their ranges.
    #[test]
    fn prop_steps_stay_in_range(steps in prop::collection::vec(0u8..4, 1..60)) {
        let doc = Document::parse_html("<body><p>Hours: 9 to 5</p></body>").unwrap();
        let mut ctx = AccessibilityContext::in_memory(doc, WidgetConfig::default());
        for step in steps {
            match step {
                0 => ctx.increase_font_size(),
                1 => ctx.decrease_font_size(),
                2 => ctx.increase_page_zoom(),
                _ => ctx.decrease_page_zoom(),
            };
            let size = ctx.prefs().get_number(PreferenceKey::FontSize);
            let zoom = ctx.prefs().get_number(PreferenceKey::PageZoom);
            prop_assert!((12.0..=32.0).contains(&size));
            prop_assert!((50.0..=200.0).contains(&zoom));
        }
    }
}
