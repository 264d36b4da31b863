// Accessbar reading overlays
// Guide, ruler, mask, spotlight and magnifier lens: widget-owned elements that follow the pointer.
// Every overlay is marked as widget UI, hidden from assistive technology and transparent to
// pointer events. Each one toggles on its own; none of them deactivates another.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::effects::css_number;
use super::frame::{FrameCoalescer, PointerPosition};
use super::self_exclusion::{SelfExclusionOracle, OWN_UI_MARKER_CLASS};
use crate::dom::{Document, NodeId, Selector};
use crate::managers::preference_store::PreferenceStore;
use crate::types::errors::DomError;
use crate::types::preferences::PreferenceKey;

pub const GUIDE_VERTICAL_ID: &str = "a11y-reading-guide-vertical";
pub const GUIDE_HORIZONTAL_ID: &str = "a11y-reading-guide-horizontal";
pub const RULER_ID: &str = "a11y-reading-ruler";
pub const MASK_ID: &str = "a11y-reading-mask-overlay";
pub const SPOTLIGHT_ID: &str = "a11y-reading-spotlight";
pub const LENS_CLASS: &str = "magnifier-lens";

pub const OVERLAY_Z_INDEX: &str = "2147483646";
pub const SPOTLIGHT_Z_INDEX: &str = "2147483645";
pub const LENS_Z_INDEX: &str = "2147483647";

/// Height used for the mask cut-out when nothing is under the pointer.
pub const MASK_FALLBACK_HEIGHT: f64 = 200.0;
pub const MASK_MIN_SIZE: f64 = 100.0;
pub const SPOTLIGHT_RADIUS: u32 = 140;
pub const LENS_MAX_CHARS: usize = 150;
/// Lens floats this far above the pointer.
pub const LENS_OFFSET_Y: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    Guide,
    Ruler,
    Mask,
    Spotlight,
    Magnifier,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 5] = [
        OverlayKind::Guide,
        OverlayKind::Ruler,
        OverlayKind::Mask,
        OverlayKind::Spotlight,
        OverlayKind::Magnifier,
    ];

    /// The flag that switches this overlay on.
    pub fn toggle_key(self) -> PreferenceKey {
        match self {
            OverlayKind::Guide => PreferenceKey::ReadingGuide,
            OverlayKind::Ruler => PreferenceKey::ReadingRuler,
            OverlayKind::Mask => PreferenceKey::ReadingMask,
            OverlayKind::Spotlight => PreferenceKey::ReadingSpotlight,
            OverlayKind::Magnifier => PreferenceKey::Magnifier,
        }
    }

    fn style_keys(self) -> &'static [PreferenceKey] {
        match self {
            OverlayKind::Guide => &[PreferenceKey::ReadingGuideColor, PreferenceKey::ReadingGuideThickness],
            OverlayKind::Ruler => &[PreferenceKey::ReadingRulerColor, PreferenceKey::ReadingRulerWidth],
            OverlayKind::Mask => &[PreferenceKey::ReadingMaskColor],
            OverlayKind::Spotlight | OverlayKind::Magnifier => &[],
        }
    }

    /// Whether a change of `key` requires this overlay to re-sync.
    pub fn depends_on(self, key: PreferenceKey) -> bool {
        self.toggle_key() == key || self.style_keys().contains(&key)
    }

    pub fn name(self) -> &'static str {
        match self {
            OverlayKind::Guide => "reading-guide",
            OverlayKind::Ruler => "reading-ruler",
            OverlayKind::Mask => "reading-mask",
            OverlayKind::Spotlight => "reading-spotlight",
            OverlayKind::Magnifier => "magnifier",
        }
    }
}

#[derive(Debug, Default)]
struct OverlayState {
    active: bool,
    nodes: Vec<NodeId>,
    frame: FrameCoalescer<PointerPosition>,
}

pub struct OverlayManager {
    states: BTreeMap<OverlayKind, OverlayState>,
    /// Container inside the widget's shadow root; the lens renders there when set.
    lens_parent: Option<NodeId>,
    lens_text: Option<String>,
    exclude_lens: Option<Selector>,
}

impl Default for OverlayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayManager {
    pub fn new() -> Self {
        Self {
            states: OverlayKind::ALL.iter().map(|k| (*k, OverlayState::default())).collect(),
            lens_parent: None,
            lens_text: None,
            exclude_lens: Selector::parse(&format!(".{}", LENS_CLASS)).ok(),
        }
    }

    pub fn set_lens_parent(&mut self, parent: Option<NodeId>) {
        self.lens_parent = parent;
    }

    pub fn is_active(&self, kind: OverlayKind) -> bool {
        self.states.get(&kind).is_some_and(|s| s.active)
    }

    /// Elements currently rendered for `kind`.
    pub fn nodes(&self, kind: OverlayKind) -> &[NodeId] {
        self.states.get(&kind).map(|s| s.nodes.as_slice()).unwrap_or(&[])
    }

    pub fn has_pending_frame(&self, kind: OverlayKind) -> bool {
        self.states.get(&kind).is_some_and(|s| s.frame.is_pending())
    }

    /// Text currently shown by the magnifier lens.
    pub fn lens_text(&self) -> Option<&str> {
        self.lens_text.as_deref()
    }

    /// Mounts, restyles or removes every overlay to match the preferences.
    pub fn sync(&mut self, doc: &mut Document, prefs: &PreferenceStore) {
        for kind in OverlayKind::ALL {
            self.sync_one(doc, prefs, kind);
        }
    }

    /// Re-syncs the overlays that depend on `key`.
    pub fn sync_key(&mut self, doc: &mut Document, prefs: &PreferenceStore, key: PreferenceKey) {
        for kind in OverlayKind::ALL.into_iter().filter(|k| k.depends_on(key)) {
            self.sync_one(doc, prefs, kind);
        }
    }

    fn sync_one(&mut self, doc: &mut Document, prefs: &PreferenceStore, kind: OverlayKind) {
        let wanted = prefs.get_bool(kind.toggle_key());
        let active = self.is_active(kind);
        let result = match (wanted, active) {
            (true, false) => self.mount(doc, prefs, kind),
            (true, true) => self.restyle(doc, prefs, kind),
            (false, true) => {
                self.unmount(doc, kind);
                Ok(())
            }
            (false, false) => Ok(()),
        };
        if let Err(err) = result {
            warn!(overlay = kind.name(), error = %err, "overlay update failed");
        }
    }

    /// Schedules a frame for every active overlay. Returns how many new frames were opened.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> usize {
        let position = PointerPosition::new(x, y);
        self.states
            .values_mut()
            .filter(|s| s.active)
            .map(|s| s.frame.request(position))
            .filter(|opened| *opened)
            .count()
    }

    /// Delivers pending frames. Returns how many overlays were updated.
    pub fn animation_frame(&mut self, doc: &mut Document, prefs: &PreferenceStore, oracle: &SelfExclusionOracle) -> usize {
        let mut updated = 0;
        for kind in OverlayKind::ALL {
            let Some(position) = self.states.get_mut(&kind).and_then(|s| s.frame.take()) else {
                continue;
            };
            match self.track(doc, prefs, oracle, kind, position) {
                Ok(()) => updated += 1,
                Err(err) => warn!(overlay = kind.name(), error = %err, "overlay frame failed"),
            }
        }
        updated
    }

    /// Removes every overlay and cancels their pending frames.
    pub fn unmount_all(&mut self, doc: &mut Document) {
        for kind in OverlayKind::ALL {
            if self.is_active(kind) {
                self.unmount(doc, kind);
            }
        }
    }

    // --- lifecycle --------------------------------------------------------

    fn mount(&mut self, doc: &mut Document, prefs: &PreferenceStore, kind: OverlayKind) -> Result<(), DomError> {
        let body = doc.body();
        let nodes = match kind {
            OverlayKind::Guide => vec![
                overlay_element(doc, body, GUIDE_VERTICAL_ID, OVERLAY_Z_INDEX)?,
                overlay_element(doc, body, GUIDE_HORIZONTAL_ID, OVERLAY_Z_INDEX)?,
            ],
            OverlayKind::Ruler => vec![overlay_element(doc, body, RULER_ID, OVERLAY_Z_INDEX)?],
            OverlayKind::Mask => vec![overlay_element(doc, body, MASK_ID, OVERLAY_Z_INDEX)?],
            OverlayKind::Spotlight => vec![overlay_element(doc, body, SPOTLIGHT_ID, SPOTLIGHT_Z_INDEX)?],
            // The lens appears on the first frame that finds text.
            OverlayKind::Magnifier => Vec::new(),
        };
        if let Some(state) = self.states.get_mut(&kind) {
            state.active = true;
            state.nodes = nodes;
        }
        debug!(overlay = kind.name(), "overlay mounted");
        self.restyle(doc, prefs, kind)
    }

    fn unmount(&mut self, doc: &mut Document, kind: OverlayKind) {
        let Some(state) = self.states.get_mut(&kind) else {
            return;
        };
        let cancelled = state.frame.cancel();
        state.active = false;
        for node in state.nodes.drain(..) {
            if let Err(err) = doc.remove(node) {
                debug!(overlay = kind.name(), error = %err, "overlay node already gone");
            }
        }
        if kind == OverlayKind::Magnifier {
            self.lens_text = None;
        }
        debug!(overlay = kind.name(), cancelled, "overlay unmounted");
    }

    /// Applies the preference-driven part of the overlay's look.
    fn restyle(&mut self, doc: &mut Document, prefs: &PreferenceStore, kind: OverlayKind) -> Result<(), DomError> {
        let nodes = self.nodes(kind).to_vec();
        match (kind, nodes.as_slice()) {
            (OverlayKind::Guide, [vertical, horizontal]) => {
                let color = prefs.get_str(PreferenceKey::ReadingGuideColor).to_string();
                let thickness = css_number(prefs.get_number(PreferenceKey::ReadingGuideThickness));
                let line = format!("{}px solid {}", thickness, color);
                set_styles(doc, *vertical, &[
                    ("top", "0"),
                    ("bottom", "0"),
                    ("width", &format!("{}px", thickness)),
                    ("border-left", &line),
                    ("transform", "translateX(-50%)"),
                ])?;
                set_styles(doc, *horizontal, &[
                    ("left", "0"),
                    ("right", "0"),
                    ("height", &format!("{}px", thickness)),
                    ("border-top", &line),
                    ("transform", "translateY(-50%)"),
                ])?;
            }
            (OverlayKind::Ruler, [ruler]) => {
                let width = prefs.get_number(PreferenceKey::ReadingRulerWidth);
                set_styles(doc, *ruler, &[
                    ("top", "0"),
                    ("left", "0"),
                    ("right", "0"),
                    ("height", &format!("{}px", css_number(width))),
                    ("background-color", prefs.get_str(PreferenceKey::ReadingRulerColor)),
                    ("border-top", "1px solid rgba(255,255,255,0.2)"),
                    ("border-bottom", "2px solid rgba(0,0,0,0.3)"),
                ])?;
            }
            (OverlayKind::Mask, [mask]) => {
                set_styles(doc, *mask, &[
                    ("top", "0"),
                    ("left", "0"),
                    ("right", "0"),
                    ("bottom", "0"),
                    ("background-color", prefs.get_str(PreferenceKey::ReadingMaskColor)),
                    ("opacity", "0.5"),
                ])?;
            }
            (OverlayKind::Spotlight, [spot]) => {
                set_styles(doc, *spot, &[("top", "0"), ("left", "0"), ("right", "0"), ("bottom", "0")])?;
            }
            _ => {}
        }
        Ok(())
    }

    // --- pointer tracking -------------------------------------------------

    fn track(
        &mut self,
        doc: &mut Document,
        prefs: &PreferenceStore,
        oracle: &SelfExclusionOracle,
        kind: OverlayKind,
        at: PointerPosition,
    ) -> Result<(), DomError> {
        let nodes = self.nodes(kind).to_vec();
        match (kind, nodes.as_slice()) {
            (OverlayKind::Guide, [vertical, horizontal]) => {
                doc.set_style(*vertical, "left", &px(at.x), false)?;
                doc.set_style(*horizontal, "top", &px(at.y), false)?;
            }
            (OverlayKind::Ruler, [ruler]) => {
                let width = prefs.get_number(PreferenceKey::ReadingRulerWidth);
                let transform = format!("translateY({})", px(at.y - width / 2.0));
                doc.set_style(*ruler, "transform", &transform, false)?;
            }
            (OverlayKind::Mask, [mask]) => {
                let image = mask_image(doc, at);
                doc.set_style(*mask, "mask-image", &image, false)?;
                doc.set_style(*mask, "-webkit-mask-image", &image, false)?;
            }
            (OverlayKind::Spotlight, [spot]) => {
                doc.set_style(*spot, "background", &spotlight_background(at), false)?;
            }
            (OverlayKind::Magnifier, _) => self.track_lens(doc, oracle, at)?,
            _ => {}
        }
        Ok(())
    }

    fn track_lens(&mut self, doc: &mut Document, oracle: &SelfExclusionOracle, at: PointerPosition) -> Result<(), DomError> {
        let Some(target) = doc.element_from_point(at.x, at.y) else {
            return Ok(());
        };
        let on_lens = self
            .exclude_lens
            .as_ref()
            .is_some_and(|sel| doc.closest(target, sel).is_some());
        if on_lens || oracle.is_own_ui(doc, target) {
            return Ok(());
        }
        match lens_text_for(doc, target) {
            Some(text) => self.show_lens(doc, at, text),
            None => {
                self.hide_lens(doc);
                Ok(())
            }
        }
    }

    fn show_lens(&mut self, doc: &mut Document, at: PointerPosition, text: String) -> Result<(), DomError> {
        let existing = self.nodes(OverlayKind::Magnifier).first().copied();
        let lens = match existing {
            Some(lens) => lens,
            None => {
                let parent = self.lens_parent.unwrap_or_else(|| doc.body());
                let lens = doc.create_element("div");
                doc.add_class(lens, LENS_CLASS)?;
                if self.lens_parent.is_none() {
                    doc.add_class(lens, OWN_UI_MARKER_CLASS)?;
                }
                doc.set_attribute(lens, "aria-hidden", "true")?;
                set_styles(doc, lens, &[
                    ("position", "fixed"),
                    ("z-index", LENS_Z_INDEX),
                    ("pointer-events", "none"),
                    ("width", "300px"),
                    ("height", "150px"),
                    ("transform", "translateX(-50%)"),
                    ("border-radius", "20px"),
                ])?;
                doc.append_child(parent, lens)?;
                if let Some(state) = self.states.get_mut(&OverlayKind::Magnifier) {
                    state.nodes.push(lens);
                }
                lens
            }
        };
        doc.set_style(lens, "left", &px(at.x), false)?;
        doc.set_style(lens, "top", &px(at.y - LENS_OFFSET_Y), false)?;
        if self.lens_text.as_deref() != Some(text.as_str()) {
            doc.set_text_content(lens, &text)?;
            self.lens_text = Some(text);
        }
        Ok(())
    }

    fn hide_lens(&mut self, doc: &mut Document) {
        if let Some(state) = self.states.get_mut(&OverlayKind::Magnifier) {
            for node in state.nodes.drain(..) {
                let _ = doc.remove(node);
            }
        }
        self.lens_text = None;
    }
}

fn px(n: f64) -> String {
    format!("{}px", css_number(n))
}

fn set_styles(doc: &mut Document, node: NodeId, styles: &[(&str, &str)]) -> Result<(), DomError> {
    for (property, value) in styles {
        doc.set_style(node, property, value, false)?;
    }
    Ok(())
}

/// Creates a fixed, inert, widget-marked `<div>` under `parent`.
fn overlay_element(doc: &mut Document, parent: NodeId, id: &str, z_index: &str) -> Result<NodeId, DomError> {
    let el = doc.create_element("div");
    doc.set_attribute(el, "id", id)?;
    doc.add_class(el, OWN_UI_MARKER_CLASS)?;
    doc.set_attribute(el, "aria-hidden", "true")?;
    set_styles(doc, el, &[("position", "fixed"), ("pointer-events", "none"), ("z-index", z_index)])?;
    doc.append_child(parent, el)?;
    Ok(el)
}

/// Elliptical cut-out sized from the height of the element under the pointer.
pub fn mask_image(doc: &Document, at: PointerPosition) -> String {
    let hovered = doc.element_from_point(at.x, at.y);
    let height = hovered
        .and_then(|n| doc.rect(n))
        .map(|r| r.height)
        .unwrap_or(MASK_FALLBACK_HEIGHT);
    let center_y = if hovered.is_some() { at.y - height / 2.0 } else { at.y };
    let size = (height * 1.5).max(MASK_MIN_SIZE);
    format!(
        "radial-gradient(ellipse 300px {} at {} {}, transparent 30%, black 60%)",
        px(size),
        px(at.x),
        px(center_y)
    )
}

pub fn spotlight_background(at: PointerPosition) -> String {
    format!(
        "radial-gradient(circle {}px at {} {}, transparent 0, rgba(0, 0, 0, 0.7) 100%)",
        SPOTLIGHT_RADIUS,
        px(at.x),
        px(at.y)
    )
}

/// `aria-label`, then `alt`, then visible text; trimmed and capped at [`LENS_MAX_CHARS`].
pub fn lens_text_for(doc: &Document, node: NodeId) -> Option<String> {
    let candidates = [
        doc.get_attribute(node, "aria-label"),
        doc.get_attribute(node, "alt"),
        Some(doc.text_content(node)),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .map(|t| t.chars().take(LENS_MAX_CHARS).collect())
}
