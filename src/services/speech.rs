// Accessbar speech capability gate
// Speech synthesis and recognition are platform services; a feature whose service is missing
// stays off and reports why instead of failing.

use std::fmt;

use crate::managers::preference_store::PreferenceStore;
use crate::types::config::SpeechCapabilities;
use crate::types::feature::TtsRequest;
use crate::types::preferences::PreferenceKey;

pub const TTS_UNSUPPORTED: &str = "Text-to-speech is not supported in your browser";
pub const STT_UNSUPPORTED: &str = "Speech recognition is not supported in your browser";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureStatus {
    /// The preference changed as requested.
    Ready,
    /// The preference was left off; the reason can be shown to the user.
    Unavailable(String),
}

impl FeatureStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, FeatureStatus::Ready)
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureStatus::Ready => write!(f, "ready"),
            FeatureStatus::Unavailable(reason) => write!(f, "unavailable: {}", reason),
        }
    }
}

/// Whether turning `key` on is possible with the given capabilities.
/// Keys without a platform dependency are always ready.
pub fn availability(capabilities: SpeechCapabilities, key: PreferenceKey) -> FeatureStatus {
    match key {
        PreferenceKey::TextToSpeech if !capabilities.synthesis => {
            FeatureStatus::Unavailable(TTS_UNSUPPORTED.to_string())
        }
        PreferenceKey::SpeechToText if !capabilities.recognition => {
            FeatureStatus::Unavailable(STT_UNSUPPORTED.to_string())
        }
        _ => FeatureStatus::Ready,
    }
}

/// Synthesis request for `text` using the current voice preferences.
pub fn tts_request(prefs: &PreferenceStore, text: &str) -> TtsRequest {
    TtsRequest {
        text: text.trim().to_string(),
        voice_gender: prefs.get_str(PreferenceKey::TtsVoiceGender).to_string(),
        speed: prefs.get_number(PreferenceKey::TtsReadingSpeed),
    }
}
