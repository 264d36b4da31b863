// Accessbar preference slice
// One reactive container per slice kind: owns the cells of its preferences and their listeners.
// Slices are peers and never look at each other's cells.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::preferences::{PrefValue, PreferenceKey, SliceKind};

/// Identifier returned by `subscribe`; unique across the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Callback fired after a committed change.
pub type Listener = Box<dyn FnMut(PreferenceKey, &PrefValue)>;

/// Result of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The value changed and listeners were notified.
    Committed,
    /// The normalized value equals the current one; nothing fired.
    Unchanged,
    /// The value does not fit the preference's domain; the previous value stays.
    Rejected,
}

impl SetOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SetOutcome::Committed)
    }
}

struct Subscription {
    id: SubscriptionId,
    key: PreferenceKey,
    listener: Listener,
}

pub struct PreferenceSlice {
    kind: SliceKind,
    cells: BTreeMap<PreferenceKey, PrefValue>,
    subscriptions: Vec<Subscription>,
}

impl PreferenceSlice {
    /// Creates the slice with every owned preference at its default.
    pub fn new(kind: SliceKind) -> Self {
        let cells = PreferenceKey::all()
            .filter(|k| k.slice() == kind)
            .map(|k| (k, k.default_value()))
            .collect();
        Self { kind, cells, subscriptions: Vec::new() }
    }

    pub fn kind(&self) -> SliceKind {
        self.kind
    }

    pub fn owns(&self, key: PreferenceKey) -> bool {
        self.cells.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = PreferenceKey> + '_ {
        self.cells.keys().copied()
    }

    pub fn get(&self, key: PreferenceKey) -> Option<&PrefValue> {
        self.cells.get(&key)
    }

    pub fn set(&mut self, key: PreferenceKey, value: PrefValue) -> SetOutcome {
        let Some(current) = self.cells.get(&key) else {
            return SetOutcome::Rejected;
        };
        let Some(normalized) = key.domain().normalize(value.clone()) else {
            debug!(slice = self.kind.as_str(), key = key.name(), ?value, "rejected preference value");
            return SetOutcome::Rejected;
        };
        if *current == normalized {
            return SetOutcome::Unchanged;
        }
        self.cells.insert(key, normalized.clone());
        for sub in self.subscriptions.iter_mut().filter(|s| s.key == key) {
            (sub.listener)(key, &normalized);
        }
        SetOutcome::Committed
    }

    pub(crate) fn subscribe(&mut self, id: SubscriptionId, key: PreferenceKey, listener: Listener) {
        self.subscriptions.push(Subscription { id, key, listener });
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    /// Restores every cell to its default. Returns the keys that changed.
    pub fn reset(&mut self) -> Vec<PreferenceKey> {
        let keys: Vec<PreferenceKey> = self.keys().collect();
        keys.into_iter()
            .filter(|k| self.set(*k, k.default_value()).is_committed())
            .collect()
    }
}
