//! Widget configuration.
//!
//! Defaults describe a widget talking to a local feature backend; `from_env`
//! overrides the backend URL and the durable data directory.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::platform;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_NAMESPACE_PREFIX: &str = "accessibility-";
pub const DEFAULT_CONTENT_ROOT_SELECTOR: &str = "[data-accessible-content]";
pub const DEFAULT_HOST_ID: &str = "a11y-embed-host-react";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DATABASE_FILE_NAME: &str = "accessbar.db";

/// Availability of the platform speech services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechCapabilities {
    pub synthesis: bool,
    pub recognition: bool,
}

impl SpeechCapabilities {
    pub fn none() -> Self {
        Self { synthesis: false, recognition: false }
    }
}

impl Default for SpeechCapabilities {
    fn default() -> Self {
        Self { synthesis: true, recognition: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Prefix of every persisted key.
    pub namespace_prefix: String,
    pub api_base_url: String,
    /// Selector of the designated accessible-content container. Falls back to `<body>`.
    pub content_root_selector: String,
    /// Id of the shadow host element the widget mounts into.
    pub host_id: String,
    /// Directory of the durable store. `None` means the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub speech: SpeechCapabilities,
    pub request_timeout_secs: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            content_root_selector: DEFAULT_CONTENT_ROOT_SELECTOR.to_string(),
            host_id: DEFAULT_HOST_ID.to_string(),
            data_dir: None,
            speech: SpeechCapabilities::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl WidgetConfig {
    /// Builds the default config, overridden by `ACCESSBAR_API_URL` and `ACCESSBAR_DATA_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("ACCESSBAR_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.api_base_url = url.to_string();
            }
        }
        if let Ok(dir) = env::var("ACCESSBAR_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    /// Path of the SQLite file backing durable preferences.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(platform::get_data_dir)
            .join(DATABASE_FILE_NAME)
    }
}

/// Options accepted by the embed `init` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedOptions {
    /// Overrides the content root the effects are scoped to.
    #[serde(default)]
    pub target_selector: Option<String>,
}
