//! Effect catalogue: one pure "desired DOM patch" function per preference group.
//!
//! [`compute`] reads preference values and returns the [`PatchOp`]s describing the
//! DOM state that group wants. It never touches a document; the
//! [`EffectEngine`](super::effect_engine::EffectEngine) applies the ops and keeps
//! the originals so every op can be undone.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::managers::preference_store::PreferenceStore;
use crate::types::preferences::{PreferenceKey, DEFAULT_TEXT_COLOR, DEFAULT_TEXT_SPACING};

use super::self_exclusion::OWN_UI_MARKER_CLASS;

pub const FONT_SIZE_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, div, span, article, section, main, aside, li, td, th, blockquote, a, button, input, textarea, select, label";
pub const TEXT_ALIGN_SELECTOR: &str =
    "p, h1, h2, h3, h4, h5, h6, div, span, article, section, main, aside, li, td, th, blockquote";
pub const SPACING_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, div, span, article, section, main, aside, li, td, th, blockquote, a, button, input, textarea, select, label, header, footer, nav";
pub const TEXT_COLOR_SELECTOR: &str = "p, span, div, li, td, th, label, a, button, input, textarea, select, article, section, aside, main, header, footer, nav, blockquote";
pub const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";
pub const BACKGROUND_SELECTOR: &str = "*";
pub const BACKGROUND_SKIP_TAGS: &[&str] = &["script", "style", "meta", "link", "title", "noscript"];
pub const IMAGE_SELECTOR: &str = "img";

pub const CURSOR_STYLE_ID: &str = "a11y-cursor-style";
pub const CURSOR_BASE_SIZE: f64 = 24.0;
pub const CURSOR_PATH: &str = "M3 3l7.07 16.97 2.51-7.39 7.39-2.51L3 3z";

/// Element an op addresses when it is not a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `<html>`
    Root,
    /// The accessible-content container, or `<body>` when there is none.
    ContentRoot,
    /// `<body>`, but only when a separate content root is in use.
    BodyOutsideContentRoot,
}

/// Desired state of one inline style property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleValue {
    /// Write this value.
    Set(String),
    /// Remove the property, remembering what the page had.
    Clear,
    /// Put back whatever the page had before this effect wrote.
    Restore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOp {
    /// Class on `<html>`. `false` restores the page's own state.
    RootClass { class: &'static str, present: bool },
    /// Attribute on `<html>`. `None` restores the page's own value.
    RootAttribute { name: &'static str, value: Option<String> },
    /// One inline property on a single element.
    Style {
        target: Target,
        property: &'static str,
        value: StyleValue,
        important: bool,
    },
    /// One inline property on every host-page element under the content root matching `selector`.
    Sweep {
        selector: &'static str,
        skip_tags: &'static [&'static str],
        property: &'static str,
        value: StyleValue,
        important: bool,
    },
    /// Copies attribute `from` into `to` on matching elements that carry a non-empty `from`.
    MirrorAttribute {
        selector: &'static str,
        from: &'static str,
        to: &'static str,
        enabled: bool,
    },
    /// A `<style id=..>` element in `<head>`. `None` removes it.
    HeadStyle { id: &'static str, css: Option<String> },
}

/// Preference groups that own DOM side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectId {
    FontSize,
    FontStyle,
    TextAlign,
    Language,
    TextSpacing,
    HighContrast,
    Grayscale,
    InvertColors,
    DarkMode,
    ReduceMotion,
    HighlightLinks,
    HighlightHeadings,
    LargeButtons,
    KeyboardNavigation,
    OnPageDictionary,
    HideImages,
    ShowImageDescriptions,
    PlainText,
    PauseAnimations,
    StopVideos,
    PageSummary,
    ColorBlindFilter,
    PageZoom,
    BackgroundColor,
    TextColor,
    HeadingColor,
    Cursor,
}

impl EffectId {
    pub const ALL: [EffectId; 27] = [
        EffectId::FontSize,
        EffectId::FontStyle,
        EffectId::TextAlign,
        EffectId::Language,
        EffectId::TextSpacing,
        EffectId::HighContrast,
        EffectId::Grayscale,
        EffectId::InvertColors,
        EffectId::DarkMode,
        EffectId::ReduceMotion,
        EffectId::HighlightLinks,
        EffectId::HighlightHeadings,
        EffectId::LargeButtons,
        EffectId::KeyboardNavigation,
        EffectId::OnPageDictionary,
        EffectId::HideImages,
        EffectId::ShowImageDescriptions,
        EffectId::PlainText,
        EffectId::PauseAnimations,
        EffectId::StopVideos,
        EffectId::PageSummary,
        EffectId::ColorBlindFilter,
        EffectId::PageZoom,
        EffectId::BackgroundColor,
        EffectId::TextColor,
        EffectId::HeadingColor,
        EffectId::Cursor,
    ];

    /// Preferences whose change re-runs this effect.
    pub fn keys(self) -> &'static [PreferenceKey] {
        use PreferenceKey as K;
        match self {
            EffectId::FontSize => &[K::FontSize],
            EffectId::FontStyle => &[K::FontStyle],
            EffectId::TextAlign => &[K::TextAlign],
            EffectId::Language => &[K::Language],
            EffectId::TextSpacing => &[K::LineHeight, K::CharacterSpacing],
            EffectId::ShowImageDescriptions => &[K::ShowImageDescriptions],
            EffectId::PlainText => &[K::PlainTextMode, K::PlainTextSize],
            EffectId::ColorBlindFilter => &[K::ColorBlindFilter],
            EffectId::PageZoom => &[K::PageZoom],
            EffectId::BackgroundColor => &[K::BackgroundColor],
            EffectId::TextColor => &[K::TextColor, K::BackgroundColor, K::DarkMode],
            EffectId::HeadingColor => &[K::HeadingColor, K::BackgroundColor, K::DarkMode],
            EffectId::Cursor => &[K::CursorSize, K::CursorColor],
            EffectId::HighContrast => &[K::HighContrast],
            EffectId::Grayscale => &[K::Grayscale],
            EffectId::InvertColors => &[K::InvertColors],
            EffectId::DarkMode => &[K::DarkMode],
            EffectId::ReduceMotion => &[K::ReduceMotion],
            EffectId::HighlightLinks => &[K::HighlightLinks],
            EffectId::HighlightHeadings => &[K::HighlightHeadings],
            EffectId::LargeButtons => &[K::LargeButtons],
            EffectId::KeyboardNavigation => &[K::KeyboardNavigation],
            EffectId::OnPageDictionary => &[K::OnPageDictionary],
            EffectId::HideImages => &[K::HideImages],
            EffectId::PauseAnimations => &[K::PauseAnimations],
            EffectId::StopVideos => &[K::StopVideos],
            EffectId::PageSummary => &[K::PageSummary],
        }
    }

    /// The single root class toggled by a flag effect.
    pub fn root_class(self) -> Option<&'static str> {
        let class = match self {
            EffectId::HighContrast => "high-contrast",
            EffectId::Grayscale => "grayscale-mode",
            EffectId::InvertColors => "invert-colors",
            EffectId::DarkMode => "dark-mode",
            EffectId::ReduceMotion => "reduce-motion",
            EffectId::HighlightLinks => "highlight-links",
            EffectId::HighlightHeadings => "highlight-headings",
            EffectId::LargeButtons => "large-buttons",
            EffectId::KeyboardNavigation => "keyboard-navigation",
            EffectId::OnPageDictionary => "on-page-dictionary",
            EffectId::HideImages => "hide-images",
            EffectId::ShowImageDescriptions => "show-image-descriptions",
            EffectId::PlainText => "plain-text-mode",
            EffectId::PauseAnimations => "pause-animations",
            EffectId::StopVideos => "stop-videos",
            EffectId::PageSummary => "page-summary-active",
            EffectId::Cursor => "large-cursor",
            _ => return None,
        };
        Some(class)
    }

    /// Effects to re-run after `key` changed, in catalogue order.
    pub fn affected_by(key: PreferenceKey) -> Vec<EffectId> {
        EffectId::ALL
            .iter()
            .copied()
            .filter(|e| e.keys().contains(&key))
            .collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectId::FontSize => "font-size",
            EffectId::FontStyle => "font-style",
            EffectId::TextAlign => "text-align",
            EffectId::Language => "language",
            EffectId::TextSpacing => "text-spacing",
            EffectId::ColorBlindFilter => "color-blind-filter",
            EffectId::PageZoom => "page-zoom",
            EffectId::BackgroundColor => "background-color",
            EffectId::TextColor => "text-color",
            EffectId::HeadingColor => "heading-color",
            EffectId::Cursor => "cursor",
            other => other.root_class().unwrap_or("effect"),
        }
    }
}

/// Formats a CSS number with at most four decimals (`1.5`, `16`, `0.05`).
pub fn css_number(n: f64) -> String {
    let rounded = (n * 10_000.0).round() / 10_000.0;
    (rounded + 0.0).to_string()
}

/// `true` while a custom color would merely restate the page's light-mode default.
fn is_neutral_color(prefs: &PreferenceStore, key: PreferenceKey) -> bool {
    prefs.get_str(key).eq_ignore_ascii_case(DEFAULT_TEXT_COLOR)
        && prefs.get_str(PreferenceKey::BackgroundColor).is_empty()
        && !prefs.get_bool(PreferenceKey::DarkMode)
}

fn root_flag(effect: EffectId, prefs: &PreferenceStore) -> PatchOp {
    let key = effect.keys()[0];
    PatchOp::RootClass {
        class: effect.root_class().unwrap_or(OWN_UI_MARKER_CLASS),
        present: prefs.get_bool(key),
    }
}

fn sweep(selector: &'static str, property: &'static str, value: StyleValue, important: bool) -> PatchOp {
    PatchOp::Sweep { selector, skip_tags: &[], property, value, important }
}

fn set_or_restore(apply: bool, value: impl FnOnce() -> String) -> StyleValue {
    if apply {
        StyleValue::Set(value())
    } else {
        StyleValue::Restore
    }
}

/// Builds the large-cursor stylesheet, or `None` when the cursor is at its default size and color.
pub fn cursor_css(multiplier: f64, color: &str, host_id: &str) -> Option<String> {
    let color = if color.is_empty() { DEFAULT_TEXT_COLOR } else { color };
    if multiplier <= 1.0 && color.eq_ignore_ascii_case(DEFAULT_TEXT_COLOR) {
        return None;
    }
    let size = (CURSOR_BASE_SIZE * multiplier).round();
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 24 24"><path fill="{color}" d="{CURSOR_PATH}"/></svg>"#
    );
    let uri = format!("data:image/svg+xml;base64,{}", BASE64.encode(svg));
    let hotspot = (3.0 * size / CURSOR_BASE_SIZE).round();
    let marker = OWN_UI_MARKER_CLASS;
    Some(format!(
        ".large-cursor body *:not(#{host_id}):not(#{host_id} *):not(.{marker}):not(.{marker} *) {{\n  cursor: url(\"{uri}\") {hotspot} {hotspot}, auto !important;\n}}\n#{host_id}, #{host_id} *, .{marker}, .{marker} * {{\n  cursor: default !important;\n}}\n"
    ))
}

/// Computes the desired DOM patch of one effect from the current preference values.
pub fn compute(effect: EffectId, prefs: &PreferenceStore, host_id: &str) -> Vec<PatchOp> {
    use PreferenceKey as K;
    match effect {
        EffectId::FontSize => {
            let px = format!("{}px", css_number(prefs.get_number(K::FontSize)));
            vec![
                sweep(FONT_SIZE_SELECTOR, "font-size", StyleValue::Set(px.clone()), false),
                PatchOp::Style {
                    target: Target::ContentRoot,
                    property: "font-size",
                    value: StyleValue::Set(px),
                    important: false,
                },
            ]
        }
        EffectId::FontStyle => vec![PatchOp::RootAttribute {
            name: "data-font-style",
            value: Some(prefs.get_str(K::FontStyle).to_string()),
        }],
        EffectId::TextAlign => {
            let align = prefs.get_str(K::TextAlign);
            let value = set_or_restore(align != "left", || align.to_string());
            vec![sweep(TEXT_ALIGN_SELECTOR, "text-align", value, false)]
        }
        EffectId::Language => vec![PatchOp::RootAttribute {
            name: "lang",
            value: Some(prefs.get_str(K::Language).to_string()),
        }],
        EffectId::TextSpacing => {
            let line_height = prefs.get_number(K::LineHeight);
            let spacing = prefs.get_number(K::CharacterSpacing);
            vec![
                sweep(
                    SPACING_SELECTOR,
                    "line-height",
                    set_or_restore(line_height != DEFAULT_TEXT_SPACING, || css_number(1.5 * line_height)),
                    false,
                ),
                sweep(
                    SPACING_SELECTOR,
                    "letter-spacing",
                    set_or_restore(spacing > 0.0, || format!("{}em", css_number(spacing))),
                    false,
                ),
                sweep(
                    SPACING_SELECTOR,
                    "word-spacing",
                    set_or_restore(spacing > 0.0, || format!("{}em", css_number(2.0 * spacing))),
                    false,
                ),
            ]
        }
        EffectId::ShowImageDescriptions => {
            let enabled = prefs.get_bool(K::ShowImageDescriptions);
            vec![
                root_flag(effect, prefs),
                PatchOp::MirrorAttribute { selector: IMAGE_SELECTOR, from: "alt", to: "data-alt", enabled },
            ]
        }
        EffectId::PlainText => {
            let enabled = prefs.get_bool(K::PlainTextMode);
            vec![
                root_flag(effect, prefs),
                PatchOp::RootAttribute {
                    name: "data-plain-text-size",
                    value: enabled.then(|| prefs.get_str(K::PlainTextSize).to_string()),
                },
            ]
        }
        EffectId::ColorBlindFilter => {
            let filter = prefs.get_str(K::ColorBlindFilter);
            vec![PatchOp::RootAttribute {
                name: "data-color-blind",
                value: (filter != "none").then(|| filter.to_string()),
            }]
        }
        EffectId::PageZoom => {
            let zoom = prefs.get_number(K::PageZoom);
            let scaled = zoom != 100.0;
            vec![
                PatchOp::Style {
                    target: Target::ContentRoot,
                    property: "zoom",
                    value: set_or_restore(scaled, || format!("{}%", css_number(zoom))),
                    important: false,
                },
                PatchOp::Style {
                    target: Target::BodyOutsideContentRoot,
                    property: "zoom",
                    value: if scaled { StyleValue::Clear } else { StyleValue::Restore },
                    important: false,
                },
            ]
        }
        EffectId::BackgroundColor => {
            let color = prefs.get_str(K::BackgroundColor);
            let value = set_or_restore(!color.is_empty(), || color.to_string());
            vec![
                PatchOp::Style {
                    target: Target::Root,
                    property: "--background-color",
                    value: value.clone(),
                    important: true,
                },
                PatchOp::Sweep {
                    selector: BACKGROUND_SELECTOR,
                    skip_tags: BACKGROUND_SKIP_TAGS,
                    property: "background-color",
                    value,
                    important: true,
                },
            ]
        }
        EffectId::TextColor | EffectId::HeadingColor => {
            let (key, custom_property, selector) = if effect == EffectId::TextColor {
                (K::TextColor, "--text-color", TEXT_COLOR_SELECTOR)
            } else {
                (K::HeadingColor, "--heading-color", HEADING_SELECTOR)
            };
            let color = prefs.get_str(key);
            let value = set_or_restore(!is_neutral_color(prefs, key), || color.to_string());
            vec![
                PatchOp::Style {
                    target: Target::Root,
                    property: custom_property,
                    value: value.clone(),
                    important: true,
                },
                sweep(selector, "color", value, true),
            ]
        }
        EffectId::Cursor => {
            let css = cursor_css(prefs.get_number(K::CursorSize), prefs.get_str(K::CursorColor), host_id);
            let present = css.is_some();
            vec![
                PatchOp::HeadStyle { id: CURSOR_STYLE_ID, css },
                PatchOp::RootClass { class: "large-cursor", present },
            ]
        }
        _ => vec![root_flag(effect, prefs)],
    }
}
