//! Studio façade: one object per open window.
//!
//! Wires the recorder, intake, import form, catalog and speech panel around
//! a shared [`PlaybackRegistry`], and turns every outcome into a single
//! user-facing [`Notice`]. Dropping the studio releases every live resource.

use std::sync::Arc;

use crate::asset::AudioAsset;
use crate::audio::{AudioInput, Recorder};
use crate::catalog::{InMemoryCatalog, Voice, VoiceCatalog};
use crate::error::{SpeechError, StudioError};
use crate::import::{ImportOrchestrator, SampleProcessor, SimulatedTraining};
use crate::intake::CandidateFile;
use crate::playback::PlaybackRegistry;
use crate::remote::SpeechService;
use crate::settings::StudioSettings;
use crate::speech::SpeechPanel;
use crate::synthesis::{SpeechEngine, SynthesisCapture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Message for the user, one per completed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&StudioError> for Notice {
    fn from(err: &StudioError) -> Self {
        Notice::error(err.to_string())
    }
}

pub struct Studio {
    registry: PlaybackRegistry,
    recorder: Recorder,
    import: ImportOrchestrator,
    catalog: InMemoryCatalog,
    speech: SpeechPanel,
    service: Arc<dyn SpeechService>,
    notices: Vec<Notice>,
}

impl Studio {
    pub fn new(
        input: Arc<dyn AudioInput>,
        engine: Arc<dyn SpeechEngine>,
        service: Arc<dyn SpeechService>,
        settings: &StudioSettings,
    ) -> Self {
        let processor = Arc::new(SimulatedTraining::new(settings.import_delay()));
        Self::with_processor(input, engine, service, processor, settings)
    }

    pub fn with_processor(
        input: Arc<dyn AudioInput>,
        engine: Arc<dyn SpeechEngine>,
        service: Arc<dyn SpeechService>,
        processor: Arc<dyn SampleProcessor>,
        settings: &StudioSettings,
    ) -> Self {
        let registry = PlaybackRegistry::new();
        Self {
            recorder: Recorder::new(input),
            import: ImportOrchestrator::new(registry.clone(), processor),
            catalog: InMemoryCatalog::new(),
            speech: SpeechPanel::new(
                SynthesisCapture::new(engine),
                service.clone(),
                registry.clone(),
                settings.speech_options(),
            ),
            service,
            registry,
            notices: Vec::new(),
        }
    }

    pub fn registry(&self) -> &PlaybackRegistry {
        &self.registry
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn import(&self) -> &ImportOrchestrator {
        &self.import
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn speech(&self) -> &SpeechPanel {
        &self.speech
    }

    /// Drain notices produced since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => log::info!("Notice: {}", notice.message),
            NoticeLevel::Error => log::warn!("Notice: {}", notice.message),
        }
        self.notices.push(notice);
    }

    fn fail<T, E: Into<StudioError>>(&mut self, err: E) -> Result<T, StudioError> {
        let err = err.into();
        self.notify(Notice::from(&err));
        Err(err)
    }

    /// Fetch preset voices from the remote service.
    pub async fn refresh_voices(&mut self) -> Result<usize, StudioError> {
        match self.service.list_voices().await {
            Ok(voices) => {
                let count = voices.len();
                self.catalog.set_presets(voices);
                Ok(count)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.catalog.voices()
    }

    pub fn selected_voice(&self) -> Option<&Voice> {
        self.catalog.selected()
    }

    /// Sample behind an imported voice.
    pub fn catalog_asset(&self, voice_id: &str) -> Option<&AudioAsset> {
        self.catalog.custom_asset(voice_id)
    }

    pub fn select_voice(&mut self, voice_id: &str) -> Result<Voice, StudioError> {
        match self.catalog.select(voice_id).cloned() {
            Some(voice) => Ok(voice),
            None => self.fail(StudioError::UnknownVoice(voice_id.to_string())),
        }
    }

    pub fn remove_voice(&mut self, voice_id: &str) -> Result<(), StudioError> {
        if self.catalog.remove(voice_id) {
            Ok(())
        } else {
            self.fail(StudioError::UnknownVoice(voice_id.to_string()))
        }
    }

    pub async fn start_recording(&mut self) -> Result<(), StudioError> {
        match self.recorder.start().await {
            Ok(_) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Stop recording and make the take the pending import sample.
    /// Returns false if no recording was running.
    pub async fn stop_recording(&mut self) -> Result<bool, StudioError> {
        match self.recorder.stop().await {
            Ok(Some(blob)) => {
                self.import.recording_complete(blob);
                self.notify(Notice::success("Recording saved successfully"));
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => self.fail(err),
        }
    }

    pub fn cancel_recording(&mut self) {
        self.recorder.cancel();
    }

    /// Drag-drop or file picker result.
    pub fn offer_files(&mut self, files: Vec<CandidateFile>) -> Result<(), StudioError> {
        match self.import.offer_files(files) {
            Ok(()) => {
                self.notify(Notice::success("Audio file selected successfully"));
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn set_voice_name(&mut self, name: impl Into<String>) {
        self.import.set_name(name);
    }

    /// Import the pending sample and select the new custom voice.
    pub async fn import_voice(&mut self) -> Result<Voice, StudioError> {
        let imported = self.import.submit(&mut self.catalog).await.map(Voice::custom);
        let voice = match imported {
            Ok(voice) => voice,
            Err(err) => return self.fail(err),
        };
        self.catalog.select(&voice.voice_id);
        self.notify(Notice::success("Voice model imported successfully!"));
        Ok(voice)
    }

    /// Speak `text` with the selected voice.
    pub async fn generate_speech(&mut self, text: &str) -> Result<&AudioAsset, StudioError> {
        let selected = self.catalog.selected().cloned();
        let generated = self
            .speech
            .generate(selected.as_ref(), text)
            .await
            .map(|_| ());
        if let Err(err) = generated {
            return self.fail(err);
        }
        self.notify(Notice::success("Speech generated successfully!"));
        self.speech
            .current()
            .ok_or(StudioError::Speech(SpeechError::EmptyAudio))
    }
}
