//! Voice sample acquisition and synthesis capture.
//!
//! Samples enter through the microphone [`Recorder`](audio::Recorder) or
//! [`FileIntake`](intake::FileIntake), become named [`AudioAsset`]s through
//! the [`ImportOrchestrator`](import::ImportOrchestrator), and can be spoken
//! with through [`SynthesisCapture`](synthesis::SynthesisCapture) or the
//! remote [`SpeechService`](remote::SpeechService). [`Studio`] wires them
//! together.

pub mod asset;
pub mod audio;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod import;
pub mod intake;
pub mod playback;
pub mod remote;
pub mod settings;
pub mod speech;
pub mod state_machine;
pub mod studio;
pub mod synthesis;

pub use asset::{AssetId, AssetOrigin, AudioAsset, AudioBlob};
pub use catalog::{InMemoryCatalog, Voice, VoiceCatalog};
pub use error::{
    ImportError, IntakeRejection, RecorderError, RemoteServiceError, SpeechError, StudioError,
    SynthesisError,
};
pub use playback::{PlaybackRegistry, PlaybackSlot};
pub use studio::{Notice, NoticeLevel, Studio};
