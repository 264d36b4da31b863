//! Accessibility context for Accessbar.
//!
//! The one read/write surface UI code talks to. It owns the preference slices, the persistence
//! adapter, the effect engine and the overlays, and keeps them in step on every change.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::database::kv_store::SqliteStorage;
use crate::dom::{Document, NodeId};
use crate::managers::preference_slice::{Listener, SetOutcome, SubscriptionId};
use crate::managers::preference_store::{PreferenceStore, PreferenceStoreTrait};
use crate::services::effect_engine::{ApplyReport, EffectContext, EffectEngine};
use crate::services::effects::EffectId;
use crate::services::feature_api::FeatureApiClient;
use crate::services::overlays::OverlayManager;
use crate::services::page_text;
use crate::services::persistence::{KeyValueStorage, MemoryStorage, PersistenceAdapter};
use crate::services::request_sequencer::{RequestChannel, RequestSequencer, RequestTicket};
use crate::services::self_exclusion::SelfExclusionOracle;
use crate::services::speech::{self, FeatureStatus};
use crate::types::config::WidgetConfig;
use crate::types::errors::{PreferenceError, ServiceError};
use crate::types::feature::{
    DictionaryEntry, PronunciationResponse, SimplifyResponse, SummaryHistoryItem, SummaryResponse,
};
use crate::types::preferences::{
    contrast_text_color, ColorBlindFilter, PrefValue, PreferenceKey, DARK_MODE_TEXT_COLOR,
    DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR, FONT_SIZE_STEP, PAGE_ZOOM_STEP,
};

/// Aggregation facade over every preference slice and the DOM it drives.
pub struct AccessibilityContext {
    pub config: WidgetConfig,
    document: Document,
    prefs: PreferenceStore,
    persistence: PersistenceAdapter,
    engine: EffectEngine,
    effect_ctx: EffectContext,
    overlays: OverlayManager,
    sequencer: Mutex<RequestSequencer>,
    api: Option<FeatureApiClient>,
    summary_history: Mutex<Vec<SummaryHistoryItem>>,
}

impl AccessibilityContext {
    /// Loads persisted preferences from `storage`, then applies every effect to `document`.
    pub fn new(document: Document, config: WidgetConfig, storage: Box<dyn KeyValueStorage>) -> Self {
        let mut persistence = PersistenceAdapter::new(storage, &config.namespace_prefix);
        let mut prefs = PreferenceStore::new();
        let loaded = prefs.hydrate(&persistence.load());

        let oracle = SelfExclusionOracle::new(&config.host_id);
        let effect_ctx = EffectContext::resolve(&document, &config.content_root_selector, &oracle);
        let api = match FeatureApiClient::from_config(&config) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "feature services disabled");
                None
            }
        };

        let mut ctx = Self {
            config,
            document,
            prefs,
            persistence,
            engine: EffectEngine::new(oracle),
            effect_ctx,
            overlays: OverlayManager::new(),
            sequencer: Mutex::new(RequestSequencer::new()),
            api,
            summary_history: Mutex::new(Vec::new()),
        };
        let report = ctx.engine.run_all(&mut ctx.document, &ctx.effect_ctx, &ctx.prefs);
        ctx.overlays.sync(&mut ctx.document, &ctx.prefs);
        info!(loaded, mutated = report.mutated, "accessibility context ready");
        ctx
    }

    /// Context backed by a fresh in-memory store.
    pub fn in_memory(document: Document, config: WidgetConfig) -> Self {
        Self::new(document, config, Box::new(MemoryStorage::new()))
    }

    /// Context backed by the durable SQLite store at `config.database_path()`.
    /// Falls back to memory when the database cannot be opened.
    pub fn open(document: Document, config: WidgetConfig) -> Self {
        let storage: Box<dyn KeyValueStorage> = match SqliteStorage::open(config.database_path()) {
            Ok(storage) => Box::new(storage),
            Err(err) => {
                warn!(error = %err, "durable preference store unavailable, using memory");
                Box::new(MemoryStorage::new())
            }
        };
        Self::new(document, config, storage)
    }

    // --- accessors ----------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the host document. Call [`refresh_effects`](Self::refresh_effects)
    /// after adding host content so the active effects reach it.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn prefs(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn engine(&self) -> &EffectEngine {
        &self.engine
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.persistence
    }

    pub fn into_storage(self) -> Box<dyn KeyValueStorage> {
        self.persistence.into_storage()
    }

    pub fn oracle(&self) -> &SelfExclusionOracle {
        self.engine.oracle()
    }

    pub fn content_root(&self) -> NodeId {
        self.effect_ctx.content_root
    }

    pub fn get(&self, key: PreferenceKey) -> PrefValue {
        self.prefs.get(key)
    }

    pub fn get_by_name(&self, name: &str) -> Option<PrefValue> {
        PreferenceKey::from_name(name).map(|key| self.prefs.get(key))
    }

    /// Every preference as a JSON object keyed by wire name.
    pub fn to_json(&self) -> Value {
        self.prefs.to_json()
    }

    // --- writes ---------------------------------------------------------------

    /// Sets a preference and brings the page, the overlays and storage in line with it.
    ///
    /// Speech features are refused while the platform lacks the matching capability.
    pub fn set(&mut self, key: PreferenceKey, value: impl Into<PrefValue>) -> SetOutcome {
        let value = value.into();
        if value.as_bool() == Some(true) {
            if let FeatureStatus::Unavailable(reason) = speech::availability(self.config.speech, key) {
                info!(key = key.name(), %reason, "feature unavailable");
                return SetOutcome::Rejected;
            }
        }
        let outcome = self.commit(key, value);
        if outcome.is_committed() {
            self.cascade(key);
        }
        outcome
    }

    /// Sets a preference by wire name, for the embed API and the bridge.
    pub fn set_by_name(&mut self, name: &str, value: &Value) -> Result<SetOutcome, PreferenceError> {
        let (key, parsed) = PreferenceKey::parse_named(name, value)?;
        Ok(self.set(key, parsed))
    }

    /// Flips a boolean preference.
    pub fn toggle(&mut self, key: PreferenceKey) -> SetOutcome {
        let current = self.prefs.get_bool(key);
        self.set(key, !current)
    }

    pub fn toggle_text_to_speech(&mut self) -> FeatureStatus {
        self.toggle_speech_feature(PreferenceKey::TextToSpeech)
    }

    pub fn toggle_speech_to_text(&mut self) -> FeatureStatus {
        self.toggle_speech_feature(PreferenceKey::SpeechToText)
    }

    fn toggle_speech_feature(&mut self, key: PreferenceKey) -> FeatureStatus {
        let turning_on = !self.prefs.get_bool(key);
        if turning_on {
            let status = speech::availability(self.config.speech, key);
            if !status.is_ready() {
                return status;
            }
        }
        self.set(key, turning_on);
        FeatureStatus::Ready
    }

    pub fn increase_font_size(&mut self) -> SetOutcome {
        let next = self.prefs.get_number(PreferenceKey::FontSize) + FONT_SIZE_STEP;
        self.set(PreferenceKey::FontSize, next)
    }

    pub fn decrease_font_size(&mut self) -> SetOutcome {
        let next = self.prefs.get_number(PreferenceKey::FontSize) - FONT_SIZE_STEP;
        self.set(PreferenceKey::FontSize, next)
    }

    pub fn reset_font_size(&mut self) -> SetOutcome {
        self.set(PreferenceKey::FontSize, DEFAULT_FONT_SIZE)
    }

    pub fn increase_page_zoom(&mut self) -> SetOutcome {
        let next = self.prefs.get_number(PreferenceKey::PageZoom) + PAGE_ZOOM_STEP;
        self.set(PreferenceKey::PageZoom, next)
    }

    pub fn decrease_page_zoom(&mut self) -> SetOutcome {
        let next = self.prefs.get_number(PreferenceKey::PageZoom) - PAGE_ZOOM_STEP;
        self.set(PreferenceKey::PageZoom, next)
    }

    pub fn subscribe(&mut self, key: PreferenceKey, listener: Listener) -> SubscriptionId {
        self.prefs.subscribe(key, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.prefs.unsubscribe(id)
    }

    /// Undoes every DOM change, removes the overlays, purges persisted keys and restores defaults.
    ///
    /// Nothing is re-applied afterwards: the page is left exactly as it was before mount, even
    /// though the defaults now read 16px. The next `refresh_effects` applies them again.
    pub fn reset_all(&mut self) -> usize {
        let restored = self.engine.revert_all(&mut self.document);
        self.overlays.unmount_all(&mut self.document);
        let removed = self.persistence.clear_all();
        let changed = self.prefs.reset_defaults();
        let sequencer = self.sequencer.get_mut().unwrap_or_else(PoisonError::into_inner);
        for channel in [RequestChannel::Summary, RequestChannel::Pronunciation, RequestChannel::Simplify] {
            sequencer.cancel(channel);
        }
        info!(restored, removed, changed = changed.len(), "accessibility preferences reset");
        restored
    }

    /// Re-resolves the content root and re-runs every effect against the current document.
    pub fn refresh_effects(&mut self) -> ApplyReport {
        self.effect_ctx = EffectContext::resolve(
            &self.document,
            &self.config.content_root_selector,
            self.engine.oracle(),
        );
        self.engine.run_all(&mut self.document, &self.effect_ctx, &self.prefs)
    }

    /// Container inside the widget's shadow root; the magnifier lens renders there.
    pub fn set_widget_container(&mut self, container: Option<NodeId>) {
        self.overlays.set_lens_parent(container);
    }

    // --- pointer tracking -------------------------------------------------------

    /// Records a pointer move for the active overlays. Returns how many frames were opened.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> usize {
        self.overlays.pointer_move(x, y)
    }

    /// Delivers at most one coalesced update per active overlay.
    pub fn animation_frame(&mut self) -> usize {
        self.overlays
            .animation_frame(&mut self.document, &self.prefs, self.engine.oracle())
    }

    // --- internals --------------------------------------------------------------

    /// Writes one value and reacts to it, without the cross-preference rules.
    fn commit(&mut self, key: PreferenceKey, value: PrefValue) -> SetOutcome {
        let outcome = self.prefs.set(key, value);
        if outcome.is_committed() {
            let mut report = ApplyReport::default();
            for effect in EffectId::affected_by(key) {
                report += self.engine.run(&mut self.document, &self.effect_ctx, effect, &self.prefs);
            }
            self.overlays.sync_key(&mut self.document, &self.prefs, key);
            self.persistence.save(key, &self.prefs.get(key));
            debug!(key = key.name(), mutated = report.mutated, skipped = report.skipped, "preference applied");
        }
        outcome
    }

    /// Cross-preference rules: filters and custom backgrounds exclude each other, and text
    /// colors follow dark mode while no custom background is set.
    fn cascade(&mut self, key: PreferenceKey) {
        match key {
            PreferenceKey::ColorBlindFilter => {
                if self.prefs.get_str(key) != ColorBlindFilter::None.as_str() {
                    self.commit(PreferenceKey::BackgroundColor, PrefValue::Text(String::new()));
                    self.set_text_colors(DEFAULT_TEXT_COLOR);
                }
            }
            PreferenceKey::BackgroundColor => {
                let background = self.prefs.get_str(key).to_string();
                if background.is_empty() {
                    self.follow_dark_mode();
                } else {
                    self.commit(PreferenceKey::ColorBlindFilter, ColorBlindFilter::None.as_str().into());
                    self.set_text_colors(contrast_text_color(&background));
                }
            }
            PreferenceKey::DarkMode => {
                if self.prefs.get_str(PreferenceKey::BackgroundColor).is_empty() {
                    self.follow_dark_mode();
                }
            }
            _ => {}
        }
    }

    fn follow_dark_mode(&mut self) {
        let color = if self.prefs.get_bool(PreferenceKey::DarkMode) {
            DARK_MODE_TEXT_COLOR
        } else {
            DEFAULT_TEXT_COLOR
        };
        self.set_text_colors(color);
    }

    fn set_text_colors(&mut self, color: &str) {
        self.commit(PreferenceKey::TextColor, color.into());
        self.commit(PreferenceKey::HeadingColor, color.into());
    }

    // --- feature services ---------------------------------------------------------

    fn client(&self) -> Result<&FeatureApiClient, ServiceError> {
        self.api
            .as_ref()
            .ok_or_else(|| ServiceError::ClientBuild("feature API client unavailable".to_string()))
    }

    fn sequencer(&self) -> MutexGuard<'_, RequestSequencer> {
        self.sequencer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn history(&self) -> MutexGuard<'_, Vec<SummaryHistoryItem>> {
        self.summary_history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a request on `channel`; only the newest ticket's response is accepted.
    pub fn begin_request(&self, channel: RequestChannel) -> RequestTicket {
        self.sequencer().issue(channel)
    }

    /// Accepts a response for `ticket`, or `ServiceError::Superseded` if a newer request exists.
    pub fn finish_request<T>(&self, ticket: RequestTicket, response: Result<T, ServiceError>) -> Result<T, ServiceError> {
        self.sequencer().accept(ticket, response)
    }

    pub fn api(&self) -> Option<&FeatureApiClient> {
        self.api.as_ref()
    }

    /// Snapshot of the cached summarization history.
    pub fn summary_history(&self) -> Vec<SummaryHistoryItem> {
        self.history().clone()
    }

    // Feature calls take `&self` and hold no lock across `.await`, so calls on the same channel
    // can overlap; whichever was issued last wins.

    pub async fn lookup_word(&self, word: &str) -> Result<DictionaryEntry, ServiceError> {
        let client = self.client()?.clone();
        let ticket = self.begin_request(RequestChannel::Dictionary);
        let response = client.lookup_word(word).await;
        self.finish_request(ticket, response)
    }

    /// Summarizes the host page's text.
    pub async fn summarize_page(&self) -> Result<SummaryResponse, ServiceError> {
        let client = self.client()?.clone();
        let text = page_text::summary_source_text(&self.document, self.engine.oracle());
        let ticket = self.begin_request(RequestChannel::Summary);
        let response = client.summarize(&text).await;
        self.finish_request(ticket, response)
    }

    /// Replaces the cached history with the server's. A failed fetch keeps the cache.
    pub async fn fetch_summarization_history(&self) -> Result<usize, ServiceError> {
        let client = self.client()?.clone();
        let ticket = self.begin_request(RequestChannel::SummaryHistory);
        let response = client.summary_history().await;
        let items = self.finish_request(ticket, response)?;
        let mut history = self.history();
        *history = items;
        Ok(history.len())
    }

    /// Deletes one history entry remotely, then drops it from the cache.
    pub async fn delete_history_item(&self, id: &str) -> Result<(), ServiceError> {
        let client = self.client()?.clone();
        client.delete_history_item(id).await?;
        self.history().retain(|item| item.id != id);
        Ok(())
    }

    /// Pronunciation breakdown of a selection. `Ok(None)` when the selection is too long.
    pub async fn pronounce_selection(&self, selection: &str) -> Result<Option<PronunciationResponse>, ServiceError> {
        if !page_text::is_pronounceable(selection) {
            return Ok(None);
        }
        let client = self.client()?.clone();
        let language = self.prefs.get_str(PreferenceKey::Language).to_string();
        let ticket = self.begin_request(RequestChannel::Pronunciation);
        let response = client.pronounce(selection.trim(), &language).await;
        self.finish_request(ticket, response).map(Some)
    }

    pub async fn simplify_page(&self) -> Result<SimplifyResponse, ServiceError> {
        let client = self.client()?.clone();
        let text = page_text::simplify_source_text(&self.document, self.engine.oracle());
        let ticket = self.begin_request(RequestChannel::Simplify);
        let response = client.simplify(&text).await;
        self.finish_request(ticket, response)
    }

    /// Synthesizes `text` with the current voice preferences.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ServiceError> {
        let client = self.client()?.clone();
        let request = speech::tts_request(&self.prefs, text);
        let ticket = self.begin_request(RequestChannel::Speech);
        let response = client.synthesize(&request).await;
        self.finish_request(ticket, response)
    }
}
