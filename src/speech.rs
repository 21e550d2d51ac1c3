//! Speech generation for the selected voice.
//!
//! Custom voices are rendered locally through [`SynthesisCapture`]; preset
//! voices go to the remote [`SpeechService`]. The result is a transient
//! `Synthesized` asset shown in the panel's playback slot.

use std::sync::Arc;

use crate::asset::{AssetOrigin, AudioAsset};
use crate::catalog::{is_custom_voice_id, Voice};
use crate::error::SpeechError;
use crate::playback::{PlaybackRegistry, PlaybackSlot};
use crate::remote::{SpeechService, VoiceSettings};
use crate::synthesis::{SynthesisCapture, SynthesisRequest};

/// Per-request parameters for both synthesis paths.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub rate: f32,
    pub pitch: f32,
    /// Engine voice used for custom voices, if any.
    pub engine_voice: Option<String>,
    pub voice_settings: VoiceSettings,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            engine_voice: None,
            voice_settings: VoiceSettings::default(),
        }
    }
}

pub struct SpeechPanel {
    capture: SynthesisCapture,
    service: Arc<dyn SpeechService>,
    registry: PlaybackRegistry,
    slot: PlaybackSlot,
    options: SpeechOptions,
}

impl SpeechPanel {
    pub fn new(
        capture: SynthesisCapture,
        service: Arc<dyn SpeechService>,
        registry: PlaybackRegistry,
        options: SpeechOptions,
    ) -> Self {
        Self {
            capture,
            service,
            registry,
            slot: PlaybackSlot::new(),
            options,
        }
    }

    pub fn options(&self) -> &SpeechOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SpeechOptions) {
        self.options = options;
    }

    pub fn capture(&self) -> &SynthesisCapture {
        &self.capture
    }

    /// Asset currently playing, if any.
    pub fn current(&self) -> Option<&AudioAsset> {
        self.slot.current()
    }

    /// Release the displayed asset.
    pub fn clear(&mut self) {
        self.slot.clear();
    }

    /// Generate speech for `text` with `voice`.
    ///
    /// On failure the previously displayed asset keeps playing.
    pub async fn generate(
        &mut self,
        voice: Option<&Voice>,
        text: &str,
    ) -> Result<&AudioAsset, SpeechError> {
        let voice = voice.ok_or(SpeechError::NoVoiceSelected)?;
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let blob = if is_custom_voice_id(&voice.voice_id) {
            let mut request = SynthesisRequest::new(text)
                .with_rate(self.options.rate)
                .with_pitch(self.options.pitch);
            if let Some(engine_voice) = &self.options.engine_voice {
                request = request.with_voice(engine_voice.clone());
            }
            self.capture.capture(request).await?
        } else {
            self.service
                .synthesize(&voice.voice_id, text, self.options.voice_settings)
                .await?
        };

        let asset = AudioAsset::new(
            display_name(voice),
            blob,
            AssetOrigin::Synthesized,
            &self.registry,
        )?;
        log::info!(
            "Generated speech with {:?}: {} bytes",
            voice.name,
            asset.blob().len()
        );
        Ok(self.slot.show(asset))
    }
}

/// Remote voices may come back with an empty name; fall back to the id.
fn display_name(voice: &Voice) -> &str {
    if voice.name.trim().is_empty() {
        &voice.voice_id
    } else {
        &voice.name
    }
}
