// Accessbar preference store
// Composes the six peer slices behind one get/set/subscribe surface.

use serde_json::{Map, Value};
use tracing::debug;

use super::preference_slice::{Listener, PreferenceSlice, SetOutcome, SubscriptionId};
use crate::types::errors::PreferenceError;
use crate::types::preferences::{PrefValue, PreferenceKey, PreferenceSnapshot, SliceKind};

/// Trait defining the preference store interface.
pub trait PreferenceStoreTrait {
    fn get(&self, key: PreferenceKey) -> PrefValue;
    fn set(&mut self, key: PreferenceKey, value: PrefValue) -> SetOutcome;
    fn subscribe(&mut self, key: PreferenceKey, listener: Listener) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
    fn hydrate(&mut self, snapshot: &PreferenceSnapshot) -> usize;
    fn reset_defaults(&mut self) -> Vec<PreferenceKey>;
    fn snapshot(&self) -> PreferenceSnapshot;
}

pub struct PreferenceStore {
    slices: Vec<PreferenceSlice>,
    next_subscription: u64,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore {
    /// Creates a store with every preference at its default.
    pub fn new() -> Self {
        Self {
            slices: SliceKind::ALL.iter().map(|k| PreferenceSlice::new(*k)).collect(),
            next_subscription: 1,
        }
    }

    pub fn slice(&self, kind: SliceKind) -> &PreferenceSlice {
        &self.slices[kind as usize]
    }

    fn slice_mut(&mut self, kind: SliceKind) -> &mut PreferenceSlice {
        &mut self.slices[kind as usize]
    }

    pub fn get_bool(&self, key: PreferenceKey) -> bool {
        self.slice(key.slice())
            .get(key)
            .and_then(PrefValue::as_bool)
            .unwrap_or(false)
    }

    pub fn get_number(&self, key: PreferenceKey) -> f64 {
        self.slice(key.slice())
            .get(key)
            .and_then(PrefValue::as_number)
            .unwrap_or(0.0)
    }

    pub fn get_str(&self, key: PreferenceKey) -> &str {
        self.slice(key.slice())
            .get(key)
            .and_then(PrefValue::as_str)
            .unwrap_or("")
    }

    /// Sets a preference from a wire name and JSON value, for callers outside the typed API.
    pub fn set_by_name(&mut self, name: &str, value: &Value) -> Result<SetOutcome, PreferenceError> {
        let (key, parsed) = PreferenceKey::parse_named(name, value)?;
        Ok(self.set(key, parsed))
    }

    /// Every preference as a JSON object keyed by wire name.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .snapshot()
            .iter()
            .map(|(k, v)| (k.name().to_string(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl PreferenceStoreTrait for PreferenceStore {
    fn get(&self, key: PreferenceKey) -> PrefValue {
        self.slice(key.slice())
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.default_value())
    }

    /// Normalizes and commits a value. Out-of-range numbers clamp; out-of-domain values are refused.
    fn set(&mut self, key: PreferenceKey, value: PrefValue) -> SetOutcome {
        let outcome = self.slice_mut(key.slice()).set(key, value);
        if outcome.is_committed() {
            debug!(key = key.name(), value = ?self.get(key), "preference committed");
        }
        outcome
    }

    fn subscribe(&mut self, key: PreferenceKey, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.slice_mut(key.slice()).subscribe(id, key, listener);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.slices.iter_mut().any(|s| s.unsubscribe(id))
    }

    /// Applies a loaded snapshot. Returns how many values differed from the current state.
    fn hydrate(&mut self, snapshot: &PreferenceSnapshot) -> usize {
        snapshot
            .iter()
            .filter(|(key, value)| self.set(**key, (*value).clone()).is_committed())
            .count()
    }

    fn reset_defaults(&mut self) -> Vec<PreferenceKey> {
        self.slices.iter_mut().flat_map(|s| s.reset()).collect()
    }

    fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceKey::all().map(|k| (k, self.get(k))).collect()
    }
}
