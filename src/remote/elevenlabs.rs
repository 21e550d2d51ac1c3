//! ElevenLabs API client
//!
//! `GET /voices` for the preset list, `POST /text-to-speech/{voice_id}` for
//! synthesis. Audio comes back as MPEG.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{SpeechService, VoiceSettings};
use crate::asset::{AudioBlob, MIME_MPEG};
use crate::catalog::Voice;
use crate::error::RemoteServiceError;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";
const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Global HTTP client for reuse across requests (avoids TLS handshake overhead)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            })
    })
}

/// Get the API key from the environment
fn get_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty())
}

/// Check if an API key is configured (for status display)
pub fn is_api_key_configured() -> bool {
    get_api_key().is_some()
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
struct VoiceEntry {
    voice_id: String,
    name: String,
    #[serde(default)]
    preview_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Error body. `detail` is either a plain string or `{status, message}`.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    detail: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorDetail {
    Message { message: String },
    Text(String),
}

fn error_message(body: String) -> String {
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(ApiErrorResponse {
            detail: ApiErrorDetail::Message { message },
        }) => message,
        Ok(ApiErrorResponse {
            detail: ApiErrorDetail::Text(message),
        }) => message,
        Err(_) => body,
    }
}

async fn api_error(response: Response) -> RemoteServiceError {
    let status = response.status().as_u16();
    let message = error_message(response.text().await.unwrap_or_default());
    log::error!("Speech service error ({}): {}", status, message);
    RemoteServiceError::Api { status, message }
}

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    base_url: String,
    model_id: String,
    api_key: Option<String>,
    http: Option<Client>,
}

impl ElevenLabsClient {
    /// Client using `ELEVENLABS_API_KEY` from the environment.
    pub fn from_env(base_url: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model_id: model_id.into(),
            api_key: get_api_key(),
            http: None,
        }
    }

    /// Use `client` instead of the shared one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn http(&self) -> &Client {
        self.http.as_ref().unwrap_or_else(|| get_http_client())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Result<&str, RemoteServiceError> {
        self.api_key
            .as_deref()
            .ok_or(RemoteServiceError::MissingApiKey)
    }
}

impl Default for ElevenLabsClient {
    fn default() -> Self {
        Self::from_env(DEFAULT_BASE_URL, DEFAULT_MODEL_ID)
    }
}

#[async_trait]
impl SpeechService for ElevenLabsClient {
    async fn list_voices(&self) -> Result<Vec<Voice>, RemoteServiceError> {
        let api_key = self.api_key()?;

        let response = self
            .http()
            .get(self.endpoint("voices"))
            .header("xi-api-key", api_key)
            .send()
            .await
            .map_err(|e| RemoteServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| RemoteServiceError::Parse(e.to_string()))?;

        log::info!("Fetched {} preset voices", body.voices.len());

        Ok(body
            .voices
            .into_iter()
            .map(|v| Voice {
                voice_id: v.voice_id,
                name: v.name,
                preview_url: v.preview_url,
                is_custom: false,
            })
            .collect())
    }

    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        settings: VoiceSettings,
    ) -> Result<AudioBlob, RemoteServiceError> {
        let api_key = self.api_key()?;

        log::info!("Requesting speech from voice {} ({} chars)", voice_id, text.len());

        let response = self
            .http()
            .post(self.endpoint(&format!("text-to-speech/{}", voice_id)))
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, MIME_MPEG)
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
                voice_settings: settings,
            })
            .send()
            .await
            .map_err(|e| RemoteServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| ct.starts_with("audio/"))
            .unwrap_or(MIME_MPEG)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteServiceError::Network(e.to_string()))?;

        log::info!("Speech received: {} bytes ({})", bytes.len(), content_type);
        Ok(AudioBlob::new(bytes.to_vec(), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_error_display() {
        let err = RemoteServiceError::MissingApiKey;
        assert!(err.to_string().contains("ELEVENLABS_API_KEY"));
    }

    #[test]
    fn error_body_with_structured_detail() {
        let body = r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#;
        assert_eq!(error_message(body.to_string()), "Invalid API key");
    }

    #[test]
    fn error_body_with_text_detail() {
        let body = r#"{"detail":"Not Found"}"#;
        assert_eq!(error_message(body.to_string()), "Not Found");
    }

    #[test]
    fn unparseable_error_body_is_passed_through() {
        assert_eq!(error_message("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn speech_request_body_shape() {
        let body = serde_json::to_value(SpeechRequest {
            text: "hello",
            model_id: DEFAULT_MODEL_ID,
            voice_settings: VoiceSettings::default(),
        })
        .unwrap();
        assert_eq!(body["model_id"], "eleven_monolingual_v1");
        assert_eq!(body["voice_settings"]["stability"], 0.5);
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ElevenLabsClient::from_env("http://localhost:9/v1/", DEFAULT_MODEL_ID);
        assert_eq!(client.endpoint("voices"), "http://localhost:9/v1/voices");
    }

    #[test]
    fn shared_http_client_unless_overridden() {
        let shared = ElevenLabsClient::from_env(DEFAULT_BASE_URL, DEFAULT_MODEL_ID);
        assert!(std::ptr::eq(shared.http(), get_http_client()));

        let own = shared.with_http_client(Client::new());
        assert!(!std::ptr::eq(own.http(), get_http_client()));
    }

    #[tokio::test]
    async fn calls_without_key_fail_before_network() {
        let client = ElevenLabsClient {
            base_url: "http://127.0.0.1:9".into(),
            model_id: DEFAULT_MODEL_ID.into(),
            api_key: None,
            http: None,
        };
        assert!(matches!(
            client.list_voices().await,
            Err(RemoteServiceError::MissingApiKey)
        ));
        assert!(matches!(
            client.synthesize("v", "hi", VoiceSettings::default()).await,
            Err(RemoteServiceError::MissingApiKey)
        ));
    }
}
