// Accessbar DOM effect engine
// Applies PatchOps to the host document through the self-exclusion oracle and keeps a ledger of
// every original value it overwrote, so any effect (or all of them) can be reverted exactly.

use std::collections::{BTreeMap, HashMap};
use std::ops::AddAssign;

use tracing::{debug, info, warn};

use super::effects::{compute, EffectId, PatchOp, StyleValue, Target};
use super::self_exclusion::SelfExclusionOracle;
use crate::dom::{Document, NodeId, Selector};
use crate::managers::preference_store::PreferenceStore;

/// Outcome counters of one apply pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Writes or restores that changed the document.
    pub mutated: usize,
    /// Candidates left alone because they belong to the widget or are not elements.
    pub skipped: usize,
    /// Writes that found the document already in the desired state.
    pub unchanged: usize,
}

impl ApplyReport {
    fn record(&mut self, changed: bool) {
        if changed {
            self.mutated += 1;
        } else {
            self.unchanged += 1;
        }
    }
}

impl AddAssign for ApplyReport {
    fn add_assign(&mut self, other: Self) {
        self.mutated += other.mutated;
        self.skipped += other.skipped;
        self.unchanged += other.unchanged;
    }
}

/// Elements the ops resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectContext {
    pub root: NodeId,
    pub head: NodeId,
    pub body: NodeId,
    pub content_root: NodeId,
}

impl EffectContext {
    /// Resolves the content root: the first host-page match of `selector`, else `<body>`.
    pub fn resolve(doc: &Document, selector: &str, oracle: &SelfExclusionOracle) -> Self {
        let body = doc.body();
        let content_root = match Selector::parse(selector) {
            Ok(sel) => doc
                .select_all(doc.root(), &sel)
                .into_iter()
                .find(|n| !oracle.is_own_ui(doc, *n))
                .unwrap_or(body),
            Err(err) => {
                warn!(error = %err, "invalid content root selector, using <body>");
                body
            }
        };
        Self { root: doc.document_element(), head: doc.head(), body, content_root }
    }

    fn target(&self, target: Target) -> Option<NodeId> {
        match target {
            Target::Root => Some(self.root),
            Target::ContentRoot => Some(self.content_root),
            Target::BodyOutsideContentRoot => (self.content_root != self.body).then_some(self.body),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Slot {
    Style(&'static str),
    Class(&'static str),
    Attribute(&'static str),
    HeadStyle(&'static str),
}

/// What the page had before the first write of an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Original {
    Style(Option<(String, bool)>),
    Class(bool),
    Attribute(Option<String>),
    /// `None` when the engine created the element itself.
    HeadStyle(Option<String>),
}

type LedgerKey = (EffectId, NodeId, Slot);

#[derive(Debug, Clone)]
struct LedgerEntry {
    seq: u64,
    original: Original,
}

pub struct EffectEngine {
    oracle: SelfExclusionOracle,
    ledger: BTreeMap<LedgerKey, LedgerEntry>,
    next_seq: u64,
    selectors: HashMap<&'static str, Selector>,
}

impl EffectEngine {
    pub fn new(oracle: SelfExclusionOracle) -> Self {
        Self { oracle, ledger: BTreeMap::new(), next_seq: 0, selectors: HashMap::new() }
    }

    pub fn oracle(&self) -> &SelfExclusionOracle {
        &self.oracle
    }

    /// Number of (owner, node, slot) originals currently remembered.
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    /// Whether `effect` currently has any write outstanding.
    pub fn is_active(&self, effect: EffectId) -> bool {
        self.ledger.keys().any(|(owner, _, _)| *owner == effect)
    }

    /// Computes and applies one effect from the current preference values.
    pub fn run(
        &mut self,
        doc: &mut Document,
        ctx: &EffectContext,
        effect: EffectId,
        prefs: &PreferenceStore,
    ) -> ApplyReport {
        let ops = compute(effect, prefs, self.oracle.host_id());
        self.apply(doc, ctx, effect, &ops)
    }

    /// Runs every effect, e.g. at mount or after host content changed.
    pub fn run_all(&mut self, doc: &mut Document, ctx: &EffectContext, prefs: &PreferenceStore) -> ApplyReport {
        let mut report = ApplyReport::default();
        for effect in EffectId::ALL {
            report += self.run(doc, ctx, effect, prefs);
        }
        report
    }

    /// Applies ops on behalf of `owner`. Never fails: problems are logged and the op skipped.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        ctx: &EffectContext,
        owner: EffectId,
        ops: &[PatchOp],
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        for op in ops {
            match op {
                PatchOp::RootClass { class, present } => {
                    let slot = Slot::Class(*class);
                    if *present {
                        self.remember(doc, owner, ctx.root, slot);
                        let changed = doc.add_class(ctx.root, class).unwrap_or(false);
                        report.record(changed);
                    } else {
                        self.restore_slot(doc, owner, slot, &mut report);
                    }
                }
                PatchOp::RootAttribute { name, value } => {
                    let slot = Slot::Attribute(*name);
                    match value {
                        Some(value) => {
                            self.remember(doc, owner, ctx.root, slot);
                            let changed = doc.set_attribute(ctx.root, name, value).unwrap_or(false);
                            report.record(changed);
                        }
                        None => self.restore_slot(doc, owner, slot, &mut report),
                    }
                }
                PatchOp::Style { target, property, value, important } => {
                    let Some(node) = ctx.target(*target) else {
                        continue;
                    };
                    if self.oracle.is_own_ui(doc, node) {
                        report.skipped += 1;
                        continue;
                    }
                    self.write_style(doc, owner, node, *property, value, *important, &mut report);
                }
                PatchOp::Sweep { selector, skip_tags, property, value, important } => {
                    if *value == StyleValue::Restore {
                        self.restore_slot(doc, owner, Slot::Style(*property), &mut report);
                        continue;
                    }
                    let Some(nodes) = self.sweep_targets(doc, ctx, *selector, skip_tags, &mut report) else {
                        continue;
                    };
                    for node in nodes {
                        self.write_style(doc, owner, node, *property, value, *important, &mut report);
                    }
                }
                PatchOp::MirrorAttribute { selector, from, to, enabled } => {
                    if !*enabled {
                        self.restore_slot(doc, owner, Slot::Attribute(*to), &mut report);
                        continue;
                    }
                    let Some(nodes) = self.sweep_targets(doc, ctx, *selector, &[], &mut report) else {
                        continue;
                    };
                    for node in nodes {
                        let Some(source) = doc.get_attribute(node, from).filter(|v| !v.is_empty()) else {
                            continue;
                        };
                        self.remember(doc, owner, node, Slot::Attribute(*to));
                        let changed = doc.set_attribute(node, to, &source).unwrap_or(false);
                        report.record(changed);
                    }
                }
                PatchOp::HeadStyle { id, css } => match css {
                    Some(css) => {
                        let changed = self.write_head_style(doc, ctx, owner, *id, css);
                        report.record(changed);
                    }
                    None => self.restore_slot(doc, owner, Slot::HeadStyle(*id), &mut report),
                },
            }
        }
        debug!(
            effect = owner.name(),
            mutated = report.mutated,
            skipped = report.skipped,
            unchanged = report.unchanged,
            "effect applied"
        );
        report
    }

    /// Restores every original written on behalf of `effect`.
    pub fn revert_effect(&mut self, doc: &mut Document, effect: EffectId) -> usize {
        let keys: Vec<LedgerKey> = self
            .ledger
            .keys()
            .filter(|(owner, _, _)| *owner == effect)
            .copied()
            .collect();
        self.restore_keys(doc, keys)
    }

    /// Restores every original the engine ever overwrote, newest first, and empties the ledger.
    pub fn revert_all(&mut self, doc: &mut Document) -> usize {
        let keys: Vec<LedgerKey> = self.ledger.keys().copied().collect();
        let restored = self.restore_keys(doc, keys);
        info!(restored, "reverted all effects");
        restored
    }

    // --- internals ------------------------------------------------------

    fn selector(&mut self, source: &'static str) -> Option<Selector> {
        if let Some(sel) = self.selectors.get(source) {
            return Some(sel.clone());
        }
        match Selector::parse(source) {
            Ok(sel) => {
                self.selectors.insert(source, sel.clone());
                Some(sel)
            }
            Err(err) => {
                warn!(error = %err, "skipping sweep with invalid selector");
                None
            }
        }
    }

    /// Host-page elements under the content root (inclusive) matching `selector`.
    fn sweep_targets(
        &mut self,
        doc: &Document,
        ctx: &EffectContext,
        selector: &'static str,
        skip_tags: &[&str],
        report: &mut ApplyReport,
    ) -> Option<Vec<NodeId>> {
        let sel = self.selector(selector)?;
        let mut candidates = doc.select_all(ctx.content_root, &sel);
        if sel.matches(doc, ctx.content_root) {
            candidates.insert(0, ctx.content_root);
        }
        let (nodes, skipped) = self.oracle.filter_foreign(doc, candidates);
        report.skipped += skipped;
        Some(
            nodes
                .into_iter()
                .filter(|n| doc.tag_name(*n).is_some_and(|t| !skip_tags.contains(&t)))
                .collect(),
        )
    }

    /// Records the page's current value of `slot` unless `owner` already did.
    fn remember(&mut self, doc: &Document, owner: EffectId, node: NodeId, slot: Slot) {
        let key = (owner, node, slot);
        if self.ledger.contains_key(&key) {
            return;
        }
        let original = match slot {
            Slot::Style(property) => Original::Style(
                doc.style(node)
                    .and_then(|s| s.get(property))
                    .map(|d| (d.value.clone(), d.important)),
            ),
            Slot::Class(class) => Original::Class(doc.has_class(node, class)),
            Slot::Attribute(name) => Original::Attribute(doc.get_attribute(node, name)),
            Slot::HeadStyle(id) => {
                Original::HeadStyle(doc.get_element_by_id(id).map(|el| doc.text_content(el)))
            }
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ledger.insert(key, LedgerEntry { seq, original });
    }

    #[allow(clippy::too_many_arguments)]
    fn write_style(
        &mut self,
        doc: &mut Document,
        owner: EffectId,
        node: NodeId,
        property: &'static str,
        value: &StyleValue,
        important: bool,
        report: &mut ApplyReport,
    ) {
        let slot = Slot::Style(property);
        match value {
            StyleValue::Set(v) => {
                self.remember(doc, owner, node, slot);
                report.record(doc.set_style(node, property, v, important).unwrap_or(false));
            }
            StyleValue::Clear => {
                self.remember(doc, owner, node, slot);
                report.record(doc.remove_style(node, property).unwrap_or(false));
            }
            StyleValue::Restore => {
                if let Some(entry) = self.ledger.remove(&(owner, node, slot)) {
                    report.record(restore(doc, node, slot, &entry.original));
                }
            }
        }
    }

    fn write_head_style(
        &mut self,
        doc: &mut Document,
        ctx: &EffectContext,
        owner: EffectId,
        id: &'static str,
        css: &str,
    ) -> bool {
        self.remember(doc, owner, ctx.head, Slot::HeadStyle(id));
        let element = match doc.get_element_by_id(id) {
            Some(el) => el,
            None => {
                let el = doc.create_element("style");
                if doc.set_attribute(el, "id", id).is_err() || doc.append_child(ctx.head, el).is_err() {
                    warn!(id, "could not inject stylesheet");
                    return false;
                }
                el
            }
        };
        if doc.text_content(element) == css {
            return false;
        }
        doc.set_text_content(element, css).is_ok()
    }

    fn restore_slot(&mut self, doc: &mut Document, owner: EffectId, slot: Slot, report: &mut ApplyReport) {
        let keys: Vec<LedgerKey> = self
            .ledger
            .keys()
            .filter(|(o, _, s)| *o == owner && *s == slot)
            .copied()
            .collect();
        if keys.is_empty() {
            report.unchanged += 1;
            return;
        }
        for key in keys {
            if let Some(entry) = self.ledger.remove(&key) {
                report.record(restore(doc, key.1, key.2, &entry.original));
            }
        }
    }

    fn restore_keys(&mut self, doc: &mut Document, keys: Vec<LedgerKey>) -> usize {
        let mut entries: Vec<(LedgerKey, LedgerEntry)> = keys
            .into_iter()
            .filter_map(|k| self.ledger.remove(&k).map(|e| (k, e)))
            .collect();
        entries.sort_by(|a, b| b.1.seq.cmp(&a.1.seq));
        entries
            .iter()
            .filter(|((_, node, slot), entry)| restore(doc, *node, *slot, &entry.original))
            .count()
    }
}

/// Puts one original back. Returns whether the document changed.
fn restore(doc: &mut Document, node: NodeId, slot: Slot, original: &Original) -> bool {
    let result = match (slot, original) {
        (Slot::Style(property), Original::Style(Some((value, important)))) => {
            doc.set_style(node, property, value, *important)
        }
        (Slot::Style(property), Original::Style(None)) => doc.remove_style(node, property),
        (Slot::Class(class), Original::Class(true)) => doc.add_class(node, class),
        (Slot::Class(class), Original::Class(false)) => doc.remove_class(node, class),
        (Slot::Attribute(name), Original::Attribute(Some(value))) => doc.set_attribute(node, name, value),
        (Slot::Attribute(name), Original::Attribute(None)) => doc.remove_attribute(node, name),
        (Slot::HeadStyle(id), Original::HeadStyle(previous)) => match (doc.get_element_by_id(id), previous) {
            (Some(el), None) => doc.remove(el).map(|_| true),
            (Some(el), Some(text)) => {
                let changed = doc.text_content(el) != *text;
                doc.set_text_content(el, text).map(|_| changed)
            }
            (None, _) => Ok(false),
        },
        _ => Ok(false),
    };
    result.unwrap_or_else(|err| {
        warn!(error = %err, node = %node, "could not restore original value");
        false
    })
}
