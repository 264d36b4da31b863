//! Preference catalogue: every accessibility preference, its slice, its value domain and default.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::errors::PreferenceError;

pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const MIN_FONT_SIZE: f64 = 12.0;
pub const MAX_FONT_SIZE: f64 = 32.0;
pub const FONT_SIZE_STEP: f64 = 2.0;

pub const DEFAULT_PAGE_ZOOM: f64 = 100.0;
pub const MIN_PAGE_ZOOM: f64 = 50.0;
pub const MAX_PAGE_ZOOM: f64 = 200.0;
pub const PAGE_ZOOM_STEP: f64 = 10.0;

pub const DEFAULT_TEXT_SPACING: f64 = 1.0;
pub const MIN_TEXT_SPACING: f64 = 0.5;
pub const MAX_TEXT_SPACING: f64 = 2.5;

pub const MIN_CHARACTER_SPACING: f64 = 0.0;
pub const MAX_CHARACTER_SPACING: f64 = 0.5;

pub const DEFAULT_CURSOR_SIZE: f64 = 1.0;
pub const MIN_CURSOR_SIZE: f64 = 1.0;
pub const MAX_CURSOR_SIZE: f64 = 5.0;

pub const MIN_READING_SPEED: f64 = 0.25;
pub const MAX_READING_SPEED: f64 = 4.0;

pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DARK_MODE_TEXT_COLOR: &str = "#FFFFFF";

/// Declares a string-backed enumeration preference.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every accepted wire/storage spelling, in declaration order.
            pub const OPTIONS: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    /// Font family substitution applied through the `data-font-style` root attribute.
    FontStyle {
        Default => "default",
        Dyslexic => "dyslexic",
        Readable => "readable",
        Serif => "serif",
        Sans => "sans",
        Mono => "mono",
    } default Default
}

choice_enum! {
    /// Color-vision simulation filter.
    ColorBlindFilter {
        None => "none",
        Protanopia => "protanopia",
        Deuteranopia => "deuteranopia",
        Tritanopia => "tritanopia",
    } default None
}

choice_enum! {
    TextAlign {
        Left => "left",
        Center => "center",
        Right => "right",
        Justify => "justify",
    } default Left
}

choice_enum! {
    /// Corner of the viewport holding the launcher button.
    ButtonPosition {
        TopLeft => "top-left",
        TopRight => "top-right",
        BottomLeft => "bottom-left",
        BottomRight => "bottom-right",
    } default BottomRight
}

choice_enum! {
    PanelPosition {
        Left => "left",
        Right => "right",
        Top => "top",
        Bottom => "bottom",
    } default Left
}

choice_enum! {
    PlainTextSize {
        Small => "small",
        Medium => "medium",
        Large => "large",
    } default Medium
}

choice_enum! {
    VoiceGender {
        Male => "male",
        Female => "female",
    } default Female
}

/// Cohesive group of preferences. Slices are peers and never read each other's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceKind {
    Text,
    Visual,
    Reading,
    Content,
    Tools,
    Ui,
}

impl SliceKind {
    pub const ALL: [SliceKind; 6] = [
        SliceKind::Text,
        SliceKind::Visual,
        SliceKind::Reading,
        SliceKind::Content,
        SliceKind::Tools,
        SliceKind::Ui,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SliceKind::Text => "text",
            SliceKind::Visual => "visual",
            SliceKind::Reading => "reading",
            SliceKind::Content => "content",
            SliceKind::Tools => "tools",
            SliceKind::Ui => "ui",
        }
    }
}

/// A committed preference value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    Bool(bool),
    Number(f64),
    /// One of the static options of a choice domain.
    Choice(&'static str),
    /// Free-form string (colors, language codes).
    Text(String),
}

impl PrefValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PrefValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::Choice(s) => Some(s),
            PrefValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Storage spelling: `"true"`/`"false"`, decimal text, or the raw string.
    pub fn to_storage_string(&self) -> String {
        match self {
            PrefValue::Bool(b) => b.to_string(),
            PrefValue::Number(n) => n.to_string(),
            PrefValue::Choice(s) => (*s).to_string(),
            PrefValue::Text(s) => s.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PrefValue::Bool(b) => Value::Bool(*b),
            PrefValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PrefValue::Choice(s) => Value::String((*s).to_string()),
            PrefValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Bool(b)
    }
}

impl From<f64> for PrefValue {
    fn from(n: f64) -> Self {
        PrefValue::Number(n)
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::Text(s.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        PrefValue::Text(s)
    }
}

/// Validates a CSS color string: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(...)` or `rgba(...)`.
pub fn is_valid_color(color: &str) -> bool {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = color.to_ascii_lowercase();
    let (inner, expected) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest, 4)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest, 3)
    } else {
        return false;
    };
    let Some(inner) = inner.strip_suffix(')') else {
        return false;
    };
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    parts.len() == expected && parts.iter().all(|p| p.parse::<f64>().is_ok())
}

/// Red, green and blue channels of a valid color string.
pub fn color_channels(color: &str) -> Option<(u8, u8, u8)> {
    if !is_valid_color(color) {
        return None;
    }
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return if hex.len() == 3 {
            let mut digits = hex.chars().map(|c| c.to_string().repeat(2));
            Some((
                channel(&digits.next()?)?,
                channel(&digits.next()?)?,
                channel(&digits.next()?)?,
            ))
        } else {
            Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?))
        };
    }
    let open = color.find('(')?;
    let mut parts = color[open + 1..color.len() - 1]
        .split(',')
        .map(|p| p.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8));
    Some((parts.next()??, parts.next()??, parts.next()??))
}

/// Readable text color over `background`: black on bright backgrounds, white on dark ones.
pub fn contrast_text_color(background: &str) -> &'static str {
    match color_channels(background) {
        Some((r, g, b)) => {
            let brightness = (r as f64 * 299.0 + g as f64 * 587.0 + b as f64 * 114.0) / 1000.0;
            if brightness > 128.0 {
                DEFAULT_TEXT_COLOR
            } else {
                DARK_MODE_TEXT_COLOR
            }
        }
        None => DEFAULT_TEXT_COLOR,
    }
}

/// Value domain of a preference. Owns validation, clamping and storage parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    Flag { default: bool },
    Range { min: f64, max: f64, default: f64 },
    Choice { options: &'static [&'static str], default: &'static str },
    Color { default: &'static str, allow_unset: bool },
    Text { default: &'static str },
}

impl Domain {
    pub fn default_value(&self) -> PrefValue {
        match *self {
            Domain::Flag { default } => PrefValue::Bool(default),
            Domain::Range { default, .. } => PrefValue::Number(default),
            Domain::Choice { default, .. } => PrefValue::Choice(default),
            Domain::Color { default, .. } | Domain::Text { default } => {
                PrefValue::Text(default.to_string())
            }
        }
    }

    /// Coerces a candidate value into this domain.
    ///
    /// Numbers are clamped to `[min, max]`; non-finite numbers, unknown choices,
    /// malformed colors and type mismatches yield `None`.
    pub fn normalize(&self, value: PrefValue) -> Option<PrefValue> {
        match (*self, value) {
            (Domain::Flag { .. }, PrefValue::Bool(b)) => Some(PrefValue::Bool(b)),
            (Domain::Range { min, max, .. }, PrefValue::Number(n)) => {
                if !n.is_finite() {
                    return None;
                }
                // `+ 0.0` folds a negative zero into zero.
                Some(PrefValue::Number(n.clamp(min, max) + 0.0))
            }
            (Domain::Choice { options, .. }, PrefValue::Choice(s)) => {
                options.iter().find(|o| **o == s).map(|o| PrefValue::Choice(*o))
            }
            (Domain::Choice { options, .. }, PrefValue::Text(s)) => options
                .iter()
                .find(|o| **o == s.as_str())
                .map(|o| PrefValue::Choice(*o)),
            (Domain::Color { allow_unset, .. }, PrefValue::Text(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    allow_unset.then(|| PrefValue::Text(String::new()))
                } else if is_valid_color(trimmed) {
                    Some(PrefValue::Text(trimmed.to_string()))
                } else {
                    None
                }
            }
            (Domain::Text { .. }, PrefValue::Text(s)) => {
                let trimmed = s.trim();
                let valid = !trimmed.is_empty()
                    && trimmed.len() <= 35
                    && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                valid.then(|| PrefValue::Text(trimmed.to_string()))
            }
            _ => None,
        }
    }

    /// Parses a persisted string. Unparseable text yields `None`, meaning "use the default".
    pub fn parse_stored(&self, raw: &str) -> Option<PrefValue> {
        match self {
            Domain::Flag { .. } => match raw {
                "true" => Some(PrefValue::Bool(true)),
                "false" => Some(PrefValue::Bool(false)),
                _ => None,
            },
            Domain::Range { .. } => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|n| self.normalize(PrefValue::Number(n))),
            _ => self.normalize(PrefValue::Text(raw.to_string())),
        }
    }

    /// Reads a JSON value sent by a parent frame or host script.
    pub fn from_json(&self, value: &Value) -> Option<PrefValue> {
        match self {
            Domain::Flag { .. } => value.as_bool().map(PrefValue::Bool),
            Domain::Range { .. } => {
                let n = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }?;
                self.normalize(PrefValue::Number(n))
            }
            _ => value
                .as_str()
                .and_then(|s| self.normalize(PrefValue::Text(s.to_string()))),
        }
    }
}

/// Static description of one preference.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceSpec {
    pub key: PreferenceKey,
    /// Storage key suffix and wire name.
    pub name: &'static str,
    pub slice: SliceKind,
    pub domain: Domain,
    /// Whether the value survives a page reload.
    pub persisted: bool,
}

/// Identifier of every preference. Discriminants index [`CATALOGUE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreferenceKey {
    FontSize,
    FontStyle,
    TextAlign,
    Language,
    LineHeight,
    CharacterSpacing,
    HighContrast,
    Grayscale,
    InvertColors,
    DarkMode,
    Magnifier,
    ColorBlindFilter,
    PageZoom,
    BackgroundColor,
    TextColor,
    HeadingColor,
    ReadingGuide,
    ReadingGuideColor,
    ReadingGuideThickness,
    ReadingRuler,
    ReadingRulerColor,
    ReadingRulerWidth,
    ReadingMask,
    ReadingMaskColor,
    ReadingSpotlight,
    HighlightLinks,
    HighlightHeadings,
    LargeButtons,
    HideImages,
    ShowImageDescriptions,
    PlainTextMode,
    PlainTextSize,
    PauseAnimations,
    StopVideos,
    ReduceMotion,
    SimplifiedLayout,
    TextToSpeech,
    SpeechToText,
    OnPageDictionary,
    KeyboardNavigation,
    PronunciationGuide,
    PageSummary,
    SmartSuggestions,
    TtsAutoPlay,
    TtsReadWholePage,
    TtsMovableControls,
    TtsReadSelectedText,
    TtsVoiceGender,
    TtsReadingSpeed,
    CursorSize,
    CursorColor,
    ButtonPosition,
    PanelPosition,
}

const fn flag(key: PreferenceKey, name: &'static str, slice: SliceKind, default: bool) -> PreferenceSpec {
    PreferenceSpec { key, name, slice, domain: Domain::Flag { default }, persisted: true }
}

const fn transient(key: PreferenceKey, name: &'static str, slice: SliceKind) -> PreferenceSpec {
    PreferenceSpec { key, name, slice, domain: Domain::Flag { default: false }, persisted: false }
}

const fn range(
    key: PreferenceKey,
    name: &'static str,
    slice: SliceKind,
    min: f64,
    max: f64,
    default: f64,
) -> PreferenceSpec {
    PreferenceSpec { key, name, slice, domain: Domain::Range { min, max, default }, persisted: true }
}

const fn choice(
    key: PreferenceKey,
    name: &'static str,
    slice: SliceKind,
    options: &'static [&'static str],
    default: &'static str,
) -> PreferenceSpec {
    PreferenceSpec { key, name, slice, domain: Domain::Choice { options, default }, persisted: true }
}

const fn color(
    key: PreferenceKey,
    name: &'static str,
    slice: SliceKind,
    default: &'static str,
    allow_unset: bool,
) -> PreferenceSpec {
    PreferenceSpec { key, name, slice, domain: Domain::Color { default, allow_unset }, persisted: true }
}

use PreferenceKey as K;
use SliceKind as S;

/// The full preference catalogue, in [`PreferenceKey`] discriminant order.
pub static CATALOGUE: [PreferenceSpec; 53] = [
    range(K::FontSize, "fontSize", S::Text, MIN_FONT_SIZE, MAX_FONT_SIZE, DEFAULT_FONT_SIZE),
    choice(K::FontStyle, "fontStyle", S::Text, FontStyle::OPTIONS, "default"),
    choice(K::TextAlign, "textAlign", S::Text, TextAlign::OPTIONS, "left"),
    PreferenceSpec {
        key: K::Language,
        name: "language",
        slice: S::Text,
        domain: Domain::Text { default: "en" },
        persisted: true,
    },
    range(K::LineHeight, "lineHeight", S::Text, MIN_TEXT_SPACING, MAX_TEXT_SPACING, DEFAULT_TEXT_SPACING),
    range(K::CharacterSpacing, "characterSpacing", S::Text, MIN_CHARACTER_SPACING, MAX_CHARACTER_SPACING, 0.0),
    flag(K::HighContrast, "highContrast", S::Visual, false),
    flag(K::Grayscale, "grayscale", S::Visual, false),
    flag(K::InvertColors, "invertColors", S::Visual, false),
    flag(K::DarkMode, "darkMode", S::Visual, false),
    flag(K::Magnifier, "magnifier", S::Visual, false),
    choice(K::ColorBlindFilter, "colorBlindFilter", S::Visual, ColorBlindFilter::OPTIONS, "none"),
    range(K::PageZoom, "pageZoom", S::Visual, MIN_PAGE_ZOOM, MAX_PAGE_ZOOM, DEFAULT_PAGE_ZOOM),
    color(K::BackgroundColor, "backgroundColor", S::Visual, "", true),
    color(K::TextColor, "textColor", S::Visual, DEFAULT_TEXT_COLOR, false),
    color(K::HeadingColor, "headingColor", S::Visual, DEFAULT_TEXT_COLOR, false),
    flag(K::ReadingGuide, "readingGuide", S::Reading, false),
    color(K::ReadingGuideColor, "readingGuideColor", S::Reading, "rgba(59,130,246,0.5)", false),
    range(K::ReadingGuideThickness, "readingGuideThickness", S::Reading, 1.0, 20.0, 4.0),
    flag(K::ReadingRuler, "readingRuler", S::Reading, false),
    color(K::ReadingRulerColor, "readingRulerColor", S::Reading, "rgba(22, 163, 74, 0.8)", false),
    range(K::ReadingRulerWidth, "readingRulerWidth", S::Reading, 20.0, 200.0, 60.0),
    flag(K::ReadingMask, "readingMask", S::Reading, false),
    color(K::ReadingMaskColor, "readingMaskColor", S::Reading, "rgba(0, 0, 0, 1)", false),
    flag(K::ReadingSpotlight, "readingSpotlight", S::Reading, false),
    flag(K::HighlightLinks, "highlightLinks", S::Reading, false),
    flag(K::HighlightHeadings, "highlightHeadings", S::Reading, false),
    flag(K::LargeButtons, "largeButtons", S::Reading, false),
    flag(K::HideImages, "hideImages", S::Content, false),
    flag(K::ShowImageDescriptions, "showImageDescriptions", S::Content, false),
    flag(K::PlainTextMode, "plainTextMode", S::Content, false),
    choice(K::PlainTextSize, "plainTextSize", S::Content, PlainTextSize::OPTIONS, "medium"),
    flag(K::PauseAnimations, "pauseAnimations", S::Content, false),
    flag(K::StopVideos, "stopVideos", S::Content, false),
    flag(K::ReduceMotion, "reduceMotion", S::Content, false),
    transient(K::SimplifiedLayout, "simplifiedLayout", S::Content),
    transient(K::TextToSpeech, "textToSpeech", S::Tools),
    transient(K::SpeechToText, "speechToText", S::Tools),
    flag(K::OnPageDictionary, "onPageDictionary", S::Tools, false),
    flag(K::KeyboardNavigation, "keyboardNavigation", S::Tools, false),
    flag(K::PronunciationGuide, "pronunciationGuide", S::Tools, false),
    transient(K::PageSummary, "pageSummary", S::Tools),
    flag(K::SmartSuggestions, "smartSuggestions", S::Tools, true),
    flag(K::TtsAutoPlay, "ttsAutoPlay", S::Tools, false),
    flag(K::TtsReadWholePage, "ttsReadWholePage", S::Tools, false),
    flag(K::TtsMovableControls, "ttsMovableControls", S::Tools, false),
    flag(K::TtsReadSelectedText, "ttsReadSelectedText", S::Tools, false),
    choice(K::TtsVoiceGender, "ttsVoiceGender", S::Tools, VoiceGender::OPTIONS, "female"),
    range(K::TtsReadingSpeed, "ttsReadingSpeed", S::Tools, MIN_READING_SPEED, MAX_READING_SPEED, 1.0),
    range(K::CursorSize, "cursorSize", S::Ui, MIN_CURSOR_SIZE, MAX_CURSOR_SIZE, DEFAULT_CURSOR_SIZE),
    color(K::CursorColor, "cursorColor", S::Ui, DEFAULT_TEXT_COLOR, false),
    choice(K::ButtonPosition, "buttonPosition", S::Ui, ButtonPosition::OPTIONS, "bottom-right"),
    choice(K::PanelPosition, "panelPosition", S::Ui, PanelPosition::OPTIONS, "left"),
];

impl PreferenceKey {
    /// Every key, in catalogue order.
    pub fn all() -> impl Iterator<Item = PreferenceKey> {
        CATALOGUE.iter().map(|spec| spec.key)
    }

    pub fn spec(self) -> &'static PreferenceSpec {
        &CATALOGUE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn slice(self) -> SliceKind {
        self.spec().slice
    }

    pub fn domain(self) -> Domain {
        self.spec().domain
    }

    pub fn is_persisted(self) -> bool {
        self.spec().persisted
    }

    pub fn default_value(self) -> PrefValue {
        self.domain().default_value()
    }

    /// Looks a key up by its wire name. `textSpacing` is accepted as an alias of `lineHeight`.
    pub fn from_name(name: &str) -> Option<PreferenceKey> {
        if name == "textSpacing" {
            return Some(PreferenceKey::LineHeight);
        }
        CATALOGUE.iter().find(|spec| spec.name == name).map(|spec| spec.key)
    }

    /// Resolves a wire name and decodes its JSON value against the key's domain.
    pub fn parse_named(name: &str, value: &Value) -> Result<(PreferenceKey, PrefValue), PreferenceError> {
        let key = PreferenceKey::from_name(name)
            .ok_or_else(|| PreferenceError::UnknownKey(name.to_string()))?;
        let parsed = key.domain().from_json(value).ok_or_else(|| {
            PreferenceError::InvalidValue(format!("{} for {}", value, key.name()))
        })?;
        Ok((key, parsed))
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A partial set of preference values, e.g. what persistence managed to load.
pub type PreferenceSnapshot = BTreeMap<PreferenceKey, PrefValue>;
