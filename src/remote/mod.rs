//! Remote text-to-speech service for preset voices.

mod elevenlabs;

pub use elevenlabs::{is_api_key_configured, ElevenLabsClient};

use async_trait::async_trait;

use crate::asset::AudioBlob;
use crate::catalog::Voice;
use crate::error::RemoteServiceError;

/// Voice tuning sent with each synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Preset voices offered by the service.
    async fn list_voices(&self) -> Result<Vec<Voice>, RemoteServiceError>;

    /// Render `text` with a preset voice. Returns encoded audio.
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        settings: VoiceSettings,
    ) -> Result<AudioBlob, RemoteServiceError>;
}
