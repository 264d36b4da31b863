// Network schemas of the feature services (dictionary, summary, pronunciation, simplify, TTS).
// Responses are decoded into these types at the boundary; anything that does not fit is
// reported as a malformed response instead of leaking half-filled values into the UI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /api/dictionary/{word}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub simple_phonetic: Option<String>,
    pub meaning: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// `POST /api/summarize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(default)]
    pub simplified_summary: Option<String>,
    /// Acronym to its expansion.
    #[serde(default)]
    pub acronyms: BTreeMap<String, String>,
}

/// One entry of `GET /api/summarize/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryHistoryItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub summary_text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationRequest {
    pub text: String,
    pub language: String,
}

/// `POST /api/pronunciation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationResponse {
    pub ipa: String,
    #[serde(default)]
    pub syllables: Vec<String>,
    pub simple_pronunciation: String,
    #[serde(default)]
    pub translation: Option<String>,
}

/// `POST /api/simplify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyResponse {
    pub html: String,
}

/// `POST /api/tts`; the response body is raw audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    pub text: String,
    pub voice_gender: String,
    pub speed: f64,
}

/// Error body returned by the services on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
