//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use voice_studio::audio::{AudioChunk, AudioInput, AudioSink, CaptureSession, CapturedAudio, PcmFormat};
use voice_studio::remote::{SpeechService, VoiceSettings};
use voice_studio::synthesis::{EngineSignal, SignalSender, SpeechEngine, SynthesisRequest};
use voice_studio::{AudioBlob, RecorderError, RemoteServiceError, SynthesisError, Voice};

pub const SAMPLE_RATE: u32 = 16_000;

/// Microphone that "captures" a fixed number of silent samples.
pub struct FakeInput {
    samples: usize,
    fail_with: Option<RecorderError>,
    pub opened: AtomicUsize,
}

impl FakeInput {
    pub fn silence(seconds: u32) -> Arc<Self> {
        Arc::new(Self {
            samples: (SAMPLE_RATE * seconds) as usize,
            fail_with: None,
            opened: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: RecorderError) -> Arc<Self> {
        Arc::new(Self {
            samples: 0,
            fail_with: Some(err),
            opened: AtomicUsize::new(0),
        })
    }
}

struct FakeSession {
    samples: usize,
}

impl CaptureSession for FakeSession {
    fn finish(self: Box<Self>) -> Result<CapturedAudio, RecorderError> {
        Ok(CapturedAudio {
            samples: vec![0; self.samples],
            format: PcmFormat::new(SAMPLE_RATE, 1),
        })
    }
}

impl AudioInput for FakeInput {
    fn open(&self) -> Result<Box<dyn CaptureSession>, RecorderError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(Box::new(FakeSession {
                samples: self.samples,
            })),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Audio(Vec<i16>),
    Signal(EngineSignal),
}

/// Engine that plays a script from a spawned task, yielding between steps.
pub struct ScriptedEngine {
    steps: Vec<Step>,
    pub requests: Mutex<Vec<SynthesisRequest>>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Start, a short burst of audio, end.
    pub fn speaking() -> Arc<Self> {
        Self::new(vec![
            Step::Signal(EngineSignal::Start),
            Step::Audio(vec![300; 800]),
            Step::Audio(vec![-300; 800]),
            Step::Signal(EngineSignal::End),
        ])
    }

    pub fn failing_immediately() -> Arc<Self> {
        Self::new(vec![Step::Signal(EngineSignal::Error(
            "synthesis-failed".to_string(),
        ))])
    }
}

impl SpeechEngine for ScriptedEngine {
    fn speak(
        &self,
        request: SynthesisRequest,
        sink: AudioSink,
        signals: SignalSender,
    ) -> Result<(), SynthesisError> {
        self.requests.lock().unwrap().push(request);
        let steps = self.steps.clone();
        tokio::spawn(async move {
            for step in steps {
                tokio::task::yield_now().await;
                match step {
                    Step::Audio(samples) => {
                        sink.write(AudioChunk {
                            samples,
                            format: PcmFormat::new(SAMPLE_RATE, 1),
                        });
                    }
                    Step::Signal(signal) => {
                        let _ = signals.send(signal);
                    }
                }
            }
        });
        Ok(())
    }
}

/// Remote service with a fixed preset list.
pub struct FakeService {
    pub presets: Vec<Voice>,
    pub fail: bool,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            presets: vec![
                Voice::preset("21m00Tcm4TlvDq8ikWAM", "Rachel"),
                Voice::preset("AZnzlk1XvdvUeBnXmlld", "Domi"),
            ],
            fail: false,
        })
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            presets: vec![],
            fail: true,
        })
    }
}

#[async_trait]
impl SpeechService for FakeService {
    async fn list_voices(&self) -> Result<Vec<Voice>, RemoteServiceError> {
        if self.fail {
            return Err(RemoteServiceError::Network("connection refused".to_string()));
        }
        Ok(self.presets.clone())
    }

    async fn synthesize(
        &self,
        _voice_id: &str,
        _text: &str,
        _settings: VoiceSettings,
    ) -> Result<AudioBlob, RemoteServiceError> {
        if self.fail {
            return Err(RemoteServiceError::Api {
                status: 401,
                message: "Invalid API key".to_string(),
            });
        }
        Ok(AudioBlob::new(vec![0xFFu8, 0xFB, 0x90, 0x00], "audio/mpeg"))
    }
}
