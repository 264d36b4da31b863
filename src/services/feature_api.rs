// Accessbar feature API client
// Async HTTP client for the remote feature services. Every response is decoded into an explicit
// schema here; callers only ever see typed values or a ServiceError.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::config::WidgetConfig;
use crate::types::errors::ServiceError;
use crate::types::feature::{
    ApiErrorBody, DictionaryEntry, PronunciationRequest, PronunciationResponse, SimplifyResponse,
    SummaryHistoryItem, SummaryResponse, TextRequest, TtsRequest,
};

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct FeatureApiClient {
    http: Client,
    base_url: String,
}

impl FeatureApiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_config(config: &WidgetConfig) -> Result<Self, ServiceError> {
        Self::new(&config.api_base_url, config.request_timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `<base>/api/<segments...>`, percent-encoding every segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ServiceError::ClientBuild(format!("invalid base url: {}", e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ServiceError::ClientBuild("base url cannot carry a path".to_string()))?;
            path.pop_if_empty().push("api");
            path.extend(segments);
        }
        Ok(url)
    }

    // --- endpoints --------------------------------------------------------

    pub async fn lookup_word(&self, word: &str) -> Result<DictionaryEntry, ServiceError> {
        let url = self.endpoint(&["dictionary", word.trim()])?;
        self.send_json::<(), _>(Method::GET, url, None).await
    }

    pub async fn summarize(&self, text: &str) -> Result<SummaryResponse, ServiceError> {
        let url = self.endpoint(&["summarize"])?;
        let body = TextRequest { text: text.to_string() };
        self.send_json(Method::POST, url, Some(&body)).await
    }

    pub async fn summary_history(&self) -> Result<Vec<SummaryHistoryItem>, ServiceError> {
        let url = self.endpoint(&["summarize", "history"])?;
        self.send_json::<(), _>(Method::GET, url, None).await
    }

    pub async fn delete_history_item(&self, id: &str) -> Result<(), ServiceError> {
        let url = self.endpoint(&["summarize", "history", id])?;
        let (status, body) = self.send(Method::DELETE, url, None::<&()>).await?;
        check_status(status, &body)
    }

    pub async fn pronounce(&self, text: &str, language: &str) -> Result<PronunciationResponse, ServiceError> {
        let url = self.endpoint(&["pronunciation"])?;
        let body = PronunciationRequest { text: text.to_string(), language: language.to_string() };
        self.send_json(Method::POST, url, Some(&body)).await
    }

    pub async fn simplify(&self, text: &str) -> Result<SimplifyResponse, ServiceError> {
        let url = self.endpoint(&["simplify"])?;
        let body = TextRequest { text: text.to_string() };
        self.send_json(Method::POST, url, Some(&body)).await
    }

    /// Returns the synthesized audio bytes.
    pub async fn synthesize(&self, request: &TtsRequest) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint(&["tts"])?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &String::from_utf8_lossy(&bytes)));
        }
        if bytes.is_empty() {
            return Err(ServiceError::MalformedResponse("empty audio body".to_string()));
        }
        Ok(bytes.to_vec())
    }

    // --- transport --------------------------------------------------------

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<(u16, String), ServiceError> {
        debug!(%method, %url, "feature request");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        Ok((status, text))
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, ServiceError> {
        let (status, text) = self.send(method, url, body).await?;
        parse_response(status, &text)
    }
}

/// Turns a non-2xx status into `ServiceError::Status`, preferring the service's `error` field.
pub fn check_status(status: u16, body: &str) -> Result<(), ServiceError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(status_error(status, body))
    }
}

fn status_error(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().chars().take(200).collect());
    warn!(status, %message, "feature service returned an error");
    ServiceError::Status { status, message }
}

/// Decodes a response body into `T` after checking the status.
pub fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ServiceError> {
    check_status(status, body)?;
    serde_json::from_str(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
}
