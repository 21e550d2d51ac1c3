//! Voice import: turn a pending sample and a name into a catalog entry.
//!
//! The pending sample comes either from the [`Recorder`](crate::audio::Recorder)
//! or from [`FileIntake`]. A successful submit builds a fresh
//! [`AudioAsset`], runs it through the [`SampleProcessor`] seam, hands it to
//! the catalog and resets the form.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::asset::{AssetOrigin, AudioAsset, AudioBlob};
use crate::catalog::VoiceCatalog;
use crate::error::ImportError;
use crate::intake::{AudioFile, CandidateFile, FileIntake};
use crate::playback::PlaybackRegistry;

/// Name shown for a sample captured from the microphone.
pub const RECORDING_FILE_NAME: &str = "recording.wav";

/// Work performed on an asset before it joins the catalog.
#[async_trait]
pub trait SampleProcessor: Send + Sync {
    async fn process(&self, asset: &AudioAsset) -> Result<(), ImportError>;
}

/// Stand-in for a cloning backend: waits, then accepts the sample.
#[derive(Debug, Clone)]
pub struct SimulatedTraining {
    delay: Duration,
}

impl SimulatedTraining {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedTraining {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl SampleProcessor for SimulatedTraining {
    async fn process(&self, asset: &AudioAsset) -> Result<(), ImportError> {
        log::info!(
            "Processing voice sample {:?} ({} bytes)",
            asset.display_name(),
            asset.blob().len()
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Sample waiting for a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSample {
    pub file_name: String,
    pub blob: AudioBlob,
    pub origin: AssetOrigin,
}

pub struct ImportOrchestrator {
    intake: FileIntake,
    processor: Arc<dyn SampleProcessor>,
    registry: PlaybackRegistry,
    pending: Option<PendingSample>,
    name: String,
}

impl ImportOrchestrator {
    pub fn new(registry: PlaybackRegistry, processor: Arc<dyn SampleProcessor>) -> Self {
        Self {
            intake: FileIntake::new(),
            processor,
            registry,
            pending: None,
            name: String::new(),
        }
    }

    /// Recorder completion: the recording becomes the pending sample.
    pub fn recording_complete(&mut self, blob: AudioBlob) {
        log::info!("Import: recording ready ({} bytes)", blob.len());
        self.pending = Some(PendingSample {
            file_name: RECORDING_FILE_NAME.to_string(),
            blob,
            origin: AssetOrigin::Recorded,
        });
    }

    /// An upload that already passed intake.
    pub fn file_selected(&mut self, file: AudioFile) {
        log::info!("Import: file selected {:?}", file.name);
        self.pending = Some(PendingSample {
            file_name: file.name,
            blob: file.blob,
            origin: AssetOrigin::Uploaded,
        });
    }

    /// Run an intake action. On rejection the pending sample is unchanged.
    pub fn offer_files(&mut self, files: Vec<CandidateFile>) -> Result<(), ImportError> {
        let file = self.intake.accept(files)?;
        self.file_selected(file);
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pending(&self) -> Option<&PendingSample> {
        self.pending.as_ref()
    }

    /// File name of the pending sample, for display next to the form.
    pub fn pending_name(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.file_name.as_str())
    }

    /// Reset the form.
    pub fn clear(&mut self) {
        self.pending = None;
        self.name.clear();
    }

    /// Import the pending sample under the current name.
    ///
    /// Precondition failures leave the form untouched. A processing failure
    /// releases the new asset and also leaves the form untouched, so the user
    /// can retry.
    pub async fn submit<'c, C>(&mut self, catalog: &'c mut C) -> Result<&'c AudioAsset, ImportError>
    where
        C: VoiceCatalog + ?Sized,
    {
        let pending = self.pending.as_ref().ok_or(ImportError::MissingInput)?;
        if self.name.trim().is_empty() {
            return Err(ImportError::MissingName);
        }

        let asset = AudioAsset::new(&self.name, pending.blob.clone(), pending.origin, &self.registry)?;

        if let Err(err) = self.processor.process(&asset).await {
            log::warn!("Import of {:?} failed: {}", asset.display_name(), err);
            asset.release();
            return Err(err);
        }

        log::info!(
            "Imported voice {:?} ({:?}, {})",
            asset.display_name(),
            asset.origin(),
            asset.id()
        );
        self.clear();
        Ok(catalog.add(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    struct Reject;

    #[async_trait]
    impl SampleProcessor for Reject {
        async fn process(&self, _asset: &AudioAsset) -> Result<(), ImportError> {
            Err(ImportError::Processing("backend offline".into()))
        }
    }

    fn orchestrator(registry: &PlaybackRegistry) -> ImportOrchestrator {
        ImportOrchestrator::new(
            registry.clone(),
            Arc::new(SimulatedTraining::new(Duration::from_millis(2000))),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn submit_without_sample_is_missing_input() {
        let registry = PlaybackRegistry::new();
        let mut catalog = InMemoryCatalog::new();
        let mut import = orchestrator(&registry);
        import.set_name("Voice");

        let err = import.submit(&mut catalog).await.unwrap_err();
        assert_eq!(err, ImportError::MissingInput);
        assert_eq!(import.name(), "Voice");
        assert_eq!(registry.created(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_name_is_missing_name_without_side_effects() {
        let registry = PlaybackRegistry::new();
        let mut catalog = InMemoryCatalog::new();
        let mut import = orchestrator(&registry);
        import.recording_complete(AudioBlob::wav(vec![1u8, 2, 3]));
        import.set_name("   ");

        let err = import.submit(&mut catalog).await.unwrap_err();
        assert_eq!(err, ImportError::MissingName);
        assert_eq!(import.pending_name(), Some(RECORDING_FILE_NAME));
        assert_eq!(catalog.custom_count(), 0);
        assert_eq!(registry.created(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_upload_is_rejected_at_submit() {
        let registry = PlaybackRegistry::new();
        let mut catalog = InMemoryCatalog::new();
        let mut import = orchestrator(&registry);
        import
            .offer_files(vec![CandidateFile::new("empty.wav", None, Vec::<u8>::new())])
            .unwrap();
        import.set_name("Voice");

        let err = import.submit(&mut catalog).await.unwrap_err();
        assert_eq!(err, ImportError::EmptySample);
        assert!(import.pending().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn processing_failure_releases_asset_and_keeps_form() {
        let registry = PlaybackRegistry::new();
        let mut catalog = InMemoryCatalog::new();
        let mut import = ImportOrchestrator::new(registry.clone(), Arc::new(Reject));
        import.recording_complete(AudioBlob::wav(vec![1u8]));
        import.set_name("Voice");

        let err = import.submit(&mut catalog).await.unwrap_err();
        assert!(matches!(err, ImportError::Processing(_)));
        assert_eq!(registry.created(), 1);
        assert_eq!(registry.released(), 1);
        assert!(import.pending().is_some());
        assert_eq!(import.name(), "Voice");
    }

    #[tokio::test(start_paused = true)]
    async fn processing_waits_on_the_timer() {
        let registry = PlaybackRegistry::new();
        let mut catalog = InMemoryCatalog::new();
        let mut import = orchestrator(&registry);
        import.recording_complete(AudioBlob::wav(vec![1u8]));
        import.set_name("Voice");

        let started = tokio::time::Instant::now();
        import.submit(&mut catalog).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[test]
    fn rejected_offer_keeps_previous_sample() {
        let registry = PlaybackRegistry::new();
        let mut import = orchestrator(&registry);
        import.recording_complete(AudioBlob::wav(vec![1u8]));

        let err = import
            .offer_files(vec![CandidateFile::new("song.pdf", None, vec![1u8])])
            .unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFile(_)));
        assert_eq!(import.pending_name(), Some(RECORDING_FILE_NAME));
    }

    #[test]
    fn new_upload_replaces_recording() {
        let registry = PlaybackRegistry::new();
        let mut import = orchestrator(&registry);
        import.recording_complete(AudioBlob::wav(vec![1u8]));
        import
            .offer_files(vec![CandidateFile::new("take2.mp3", None, vec![9u8])])
            .unwrap();

        let pending = import.pending().unwrap();
        assert_eq!(pending.file_name, "take2.mp3");
        assert_eq!(pending.origin, AssetOrigin::Uploaded);
        assert_eq!(pending.blob.content_type(), "audio/mpeg");
    }
}
