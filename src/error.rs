//! Error taxonomy for the capture pipeline.
//!
//! Each component owns its error enum. `StudioError` wraps them so the
//! façade can turn any failure into a single user-facing notice.

/// Construction failures of an `AudioAsset`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Audio payload is empty")]
    EmptyPayload,

    #[error("Display name is blank")]
    BlankName,
}

/// Errors raised by the microphone recorder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecorderError {
    /// No audio input device found.
    #[error("No audio input device found")]
    NoInputDevice,

    /// The device refused access (permissions, busy device, ...).
    #[error("Microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device exposes no sample format we can record.
    #[error("No supported audio configuration")]
    NoSupportedConfig,

    /// The capture stream could not be created or started.
    #[error("Failed to create audio stream: {0}")]
    StreamCreationFailed(String),

    /// A session is already running.
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// The session finished without a single sample.
    #[error("Recording captured no audio")]
    EmptyCapture,

    /// WAV assembly failed.
    #[error("Failed to finalize recording: {0}")]
    FinalizeFailed(String),
}

/// Reasons FileIntake refuses to forward a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeRejection {
    #[error("No file was provided")]
    NoFile,

    #[error("Only one file can be imported at a time ({0} given)")]
    TooManyFiles(usize),

    #[error("Unsupported file '{name}' (expected MP3, WAV or M4A)")]
    UnsupportedType { name: String },

    #[error("Failed to read '{name}': {reason}")]
    Unreadable { name: String, reason: String },
}

/// Errors raised while rendering speech into a blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// The engine reported a failure mid-utterance.
    #[error("Speech synthesis failed: {0}")]
    EngineFailed(String),

    /// The engine could not be started at all.
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine went away without signalling end or error.
    #[error("Speech engine stopped without completing the utterance")]
    EngineVanished,

    /// Another capture session holds the output device.
    #[error("Another speech capture is already running")]
    Busy,

    /// The engine finished but nothing was rendered.
    #[error("Speech synthesis produced no audio")]
    NoAudio,

    #[error("Failed to encode synthesized audio: {0}")]
    Encode(String),
}

/// Errors raised by the import orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("Please provide an audio file")]
    MissingInput,

    #[error("Please provide a name for your voice")]
    MissingName,

    #[error(transparent)]
    UnsupportedFile(#[from] IntakeRejection),

    #[error("The audio sample is empty")]
    EmptySample,

    #[error("Failed to import voice model: {0}")]
    Processing(String),
}

impl From<AssetError> for ImportError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::EmptyPayload => ImportError::EmptySample,
            AssetError::BlankName => ImportError::MissingName,
        }
    }
}

/// Opaque failure of the remote speech service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteServiceError {
    #[error("Speech service API key not configured. Set ELEVENLABS_API_KEY environment variable.")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Speech service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse speech service response: {0}")]
    Parse(String),
}

/// Errors raised when generating speech for the selected voice.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Please select a voice first")]
    NoVoiceSelected,

    #[error("Please enter some text")]
    EmptyText,

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    #[error("The generated audio is empty")]
    EmptyAudio,

    #[error(transparent)]
    Asset(AssetError),
}

impl From<AssetError> for SpeechError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::EmptyPayload => SpeechError::EmptyAudio,
            other => SpeechError::Asset(other),
        }
    }
}

/// Umbrella error for the studio façade.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    #[error("Unknown voice '{0}'")]
    UnknownVoice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_errors_read_as_user_messages() {
        assert_eq!(
            ImportError::MissingName.to_string(),
            "Please provide a name for your voice"
        );
        let err = ImportError::from(IntakeRejection::UnsupportedType {
            name: "song.pdf".into(),
        });
        assert!(err.to_string().contains("song.pdf"));
    }

    #[test]
    fn api_error_display() {
        let err = RemoteServiceError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StudioError>();
        assert_send_sync::<SynthesisError>();
    }
}
