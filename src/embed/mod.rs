//! Embed bootstrapper for Accessbar.
//!
//! Mounts the widget on a page it does not own: one fixed host element with an open shadow root
//! holding the widget and its stylesheet, plus the global stylesheet and color filters in the
//! host `<head>`. Exposes the narrow global API (`init`, `setFontSize`, `setFontStyle`,
//! `setTextAlign`, `toggleHighContrast`) and the cross-frame message entry point.

pub mod bridge;
pub mod styles;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::AccessibilityContext;
use crate::dom::{Document, NodeId};
use crate::managers::preference_slice::SetOutcome;
use crate::services::persistence::{KeyValueStorage, MemoryStorage};
use crate::services::self_exclusion::{DIALOG_LABEL, DIALOG_ROLE, EMBED_HOST_CLASS};
use crate::types::config::{EmbedOptions, WidgetConfig};
use crate::types::errors::{DomError, EmbedError};
use crate::types::preferences::{PrefValue, PreferenceKey};

use bridge::{parse_message, EmbedMessage, OutboundMessage, ParentFrame};

pub const SHADOW_CONTAINER_ID: &str = "a11y-react-root";
pub const HOST_Z_INDEX: &str = "2147483647";
pub const HOST_OFFSET: &str = "12px";
pub const LAUNCHER_CLASS: &str = "a11y-launcher";
pub const PANEL_CLASS: &str = "a11y-panel";

/// Elements created by a successful mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedMount {
    pub host: NodeId,
    pub shadow_root: NodeId,
    pub container: NodeId,
    pub launcher: NodeId,
    pub panel: NodeId,
}

pub struct AccessibilityBarEmbed {
    config: WidgetConfig,
    /// The page before mount; moves into the context once mounted.
    document: Option<Document>,
    storage: Option<Box<dyn KeyValueStorage>>,
    context: Option<AccessibilityContext>,
    mount: Option<EmbedMount>,
    parent: Option<Box<dyn ParentFrame>>,
}

impl AccessibilityBarEmbed {
    pub fn new(document: Document, config: WidgetConfig, storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            config,
            document: Some(document),
            storage: Some(storage),
            context: None,
            mount: None,
            parent: None,
        }
    }

    pub fn in_memory(document: Document, config: WidgetConfig) -> Self {
        Self::new(document, config, Box::new(MemoryStorage::new()))
    }

    /// Frame that receives the `embed-ready` notice.
    pub fn with_parent(mut self, parent: Box<dyn ParentFrame>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.context.is_some()
    }

    pub fn mount_info(&self) -> Option<&EmbedMount> {
        self.mount.as_ref()
    }

    pub fn context(&self) -> Option<&AccessibilityContext> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut AccessibilityContext> {
        self.context.as_mut()
    }

    /// The page, before or after mount.
    pub fn document(&self) -> Option<&Document> {
        match &self.context {
            Some(ctx) => Some(ctx.document()),
            None => self.document.as_ref(),
        }
    }

    /// Mounts the widget. Returns `Ok(false)` when it is already mounted, by this instance or by
    /// another copy of the script that created the host element first.
    pub fn init(&mut self, options: EmbedOptions) -> Result<bool, EmbedError> {
        if self.context.is_some() {
            debug!("init called again, already mounted");
            return Ok(false);
        }
        let original = self
            .document
            .take()
            .ok_or_else(|| EmbedError::MountFailed("no document to mount into".to_string()))?;
        if original.get_element_by_id(&self.config.host_id).is_some() {
            info!(host = %self.config.host_id, "widget host already present, skipping mount");
            self.document = Some(original);
            return Ok(false);
        }

        let mut document = original.clone();
        let (host, shadow_root, container) = match build_host(&mut document, &self.config.host_id) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(error = %err, "embed mount failed");
                self.document = Some(original);
                return Err(err.into());
            }
        };

        if let Some(selector) = options.target_selector {
            self.config.content_root_selector = selector;
        }
        let storage = self
            .storage
            .take()
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));
        let mut context = AccessibilityContext::new(document, self.config.clone(), storage);
        context.set_widget_container(Some(container));
        self.install(original, context, host, shadow_root, container)
    }

    /// Renders the widget into `container` and keeps `context` only once that succeeded. On
    /// failure the page and the storage handle go back to their pre-mount state.
    fn install(
        &mut self,
        original: Document,
        mut context: AccessibilityContext,
        host: NodeId,
        shadow_root: NodeId,
        container: NodeId,
    ) -> Result<bool, EmbedError> {
        let (launcher, panel) = match render_widget(&mut context, container) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(error = %err, "widget render failed, page left unmounted");
                self.storage = Some(context.into_storage());
                self.document = Some(original);
                return Err(err.into());
            }
        };
        self.context = Some(context);
        self.mount = Some(EmbedMount { host, shadow_root, container, launcher, panel });
        if let Some(parent) = self.parent.as_mut() {
            parent.post_message(&OutboundMessage::EmbedReady.to_json());
        }
        info!(host = %self.config.host_id, "accessibility bar mounted");
        Ok(true)
    }

    // --- global API -----------------------------------------------------------

    pub fn set_font_size(&mut self, size: f64) -> Result<SetOutcome, EmbedError> {
        self.apply(PreferenceKey::FontSize, size.into(), "setFontSize")
    }

    pub fn set_font_style(&mut self, style: &str) -> Result<SetOutcome, EmbedError> {
        self.apply(PreferenceKey::FontStyle, style.into(), "setFontStyle")
    }

    pub fn set_text_align(&mut self, align: &str) -> Result<SetOutcome, EmbedError> {
        self.apply(PreferenceKey::TextAlign, align.into(), "setTextAlign")
    }

    pub fn toggle_high_contrast(&mut self, enabled: bool) -> Result<SetOutcome, EmbedError> {
        self.apply(PreferenceKey::HighContrast, enabled.into(), "toggleHighContrast")
    }

    fn apply(
        &mut self,
        key: PreferenceKey,
        value: PrefValue,
        call: &str,
    ) -> Result<SetOutcome, EmbedError> {
        let context = self.context.as_mut().ok_or(EmbedError::NotMounted)?;
        let shown = format!("{:?}", value);
        match context.set(key, value) {
            SetOutcome::Rejected => Err(EmbedError::InvalidPayload(format!("{}: {}", call, shown))),
            outcome => Ok(outcome),
        }
    }

    /// Dispatches one cross-frame message. Unknown message types are ignored with `Ok(None)`.
    pub fn handle_message(&mut self, message: &Value) -> Result<Option<SetOutcome>, EmbedError> {
        let Some(parsed) = parse_message(message)? else {
            return Ok(None);
        };
        debug!(kind = parsed.kind(), "cross-frame message");
        let outcome = match parsed {
            EmbedMessage::Init(options) => {
                self.init(options)?;
                return Ok(None);
            }
            EmbedMessage::SetFontSize(size) => self.set_font_size(size)?,
            EmbedMessage::SetFontStyle(style) => self.set_font_style(&style)?,
            EmbedMessage::SetTextAlign(align) => self.set_text_align(&align)?,
            EmbedMessage::ToggleHighContrast(enabled) => self.toggle_high_contrast(enabled)?,
        };
        Ok(Some(outcome))
    }
}

/// Host stylesheet, color filters, fixed host element, shadow root and widget container.
fn build_host(doc: &mut Document, host_id: &str) -> Result<(NodeId, NodeId, NodeId), DomError> {
    styles::inject_document_styles(doc, host_id)?;
    styles::inject_color_filters(doc)?;

    let host = doc.create_element("div");
    doc.set_attribute(host, "id", host_id)?;
    doc.add_class(host, EMBED_HOST_CLASS)?;
    for (property, value) in [
        ("position", "fixed"),
        ("right", HOST_OFFSET),
        ("bottom", HOST_OFFSET),
        ("z-index", HOST_Z_INDEX),
    ] {
        doc.set_style(host, property, value, false)?;
    }
    let shadow_root = doc.attach_shadow(host)?;
    styles::inject_widget_styles(doc, shadow_root)?;
    let container = doc.create_element("div");
    doc.set_attribute(container, "id", SHADOW_CONTAINER_ID)?;
    doc.append_child(shadow_root, container)?;
    doc.append_child(doc.document_element(), host)?;
    Ok((host, shadow_root, container))
}

/// Launcher button and the (closed) options dialog, positioned from the UI preferences.
fn render_widget(context: &mut AccessibilityContext, container: NodeId) -> Result<(NodeId, NodeId), DomError> {
    let button_position = context.prefs().get_str(PreferenceKey::ButtonPosition).to_string();
    let panel_position = context.prefs().get_str(PreferenceKey::PanelPosition).to_string();
    let doc = context.document_mut();

    let launcher = doc.create_element("button");
    doc.add_class(launcher, LAUNCHER_CLASS)?;
    doc.set_attribute(launcher, "type", "button")?;
    doc.set_attribute(launcher, "aria-label", "Open accessibility options")?;
    doc.set_attribute(launcher, "data-position", &button_position)?;
    doc.set_text_content(launcher, "Accessibility")?;
    doc.append_child(container, launcher)?;

    let panel = doc.create_element("div");
    doc.add_class(panel, PANEL_CLASS)?;
    doc.set_attribute(panel, "role", DIALOG_ROLE)?;
    doc.set_attribute(panel, "aria-label", DIALOG_LABEL)?;
    doc.set_attribute(panel, "data-position", &panel_position)?;
    doc.set_attribute(panel, "hidden", "")?;
    doc.append_child(container, panel)?;
    Ok((launcher, panel))
}
