//! Synthesis capture: render speech and record it into a blob.
//!
//! A [`SpeechEngine`] reports its lifecycle (start, end, error) on one
//! channel and writes rendered audio into an [`AudioSink`] on another. The
//! sink belongs to a per-session [`AudioContext`] whose stream is recorded,
//! never played. [`SynthesisCapture`] arms the recorder before the engine is
//! started, stops it only after the engine's first terminal signal, and
//! resolves exactly once.

mod espeak;

pub use espeak::EspeakEngine;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::asset::AudioBlob;
use crate::audio::{AudioContext, AudioSink, ContextTracker, StreamRecorder};
use crate::error::SynthesisError;
use crate::state_machine::synthesis::{reduce, Effect, Event, State};

/// What to say and how.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    /// Speaking rate, 1.0 is the engine default.
    pub rate: f32,
    /// Voice pitch, 1.0 is the engine default.
    pub pitch: f32,
    /// Engine-specific voice name.
    pub voice: Option<String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 1.0,
            pitch: 1.0,
            voice: None,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

/// Lifecycle signals emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSignal {
    Start,
    End,
    Error(String),
}

pub type SignalSender = mpsc::UnboundedSender<EngineSignal>;

/// Text-to-speech capability, passed in per capture.
pub trait SpeechEngine: Send + Sync {
    /// Start rendering `request` into `sink` and return without waiting.
    /// Progress is reported on `signals`; audio written to `sink` before the
    /// `End` signal is part of the utterance.
    fn speak(
        &self,
        request: SynthesisRequest,
        sink: AudioSink,
        signals: SignalSender,
    ) -> Result<(), SynthesisError>;
}

/// Clears the busy flag however the capture exits.
struct SessionGuard {
    busy: Arc<AtomicBool>,
}

impl SessionGuard {
    fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { busy: busy.clone() })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

pub struct SynthesisCapture {
    engine: Arc<dyn SpeechEngine>,
    contexts: ContextTracker,
    busy: Arc<AtomicBool>,
}

impl SynthesisCapture {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            contexts: ContextTracker::new(),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Audio contexts currently open on behalf of this capture.
    pub fn open_contexts(&self) -> usize {
        self.contexts.open_contexts()
    }

    /// Render `request` and return the recorded utterance as a WAV blob.
    ///
    /// Only one capture runs at a time; a concurrent call fails with
    /// [`SynthesisError::Busy`]. Dropping the returned future closes the
    /// context and frees the session.
    pub async fn capture(&self, request: SynthesisRequest) -> Result<AudioBlob, SynthesisError> {
        let _guard = SessionGuard::acquire(&self.busy).ok_or(SynthesisError::Busy)?;

        let id = Uuid::new_v4();
        let context = AudioContext::open(&self.contexts);
        let (sink, stream) = context.create_stream_destination();
        let mut recorder = StreamRecorder::arm(stream);
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();

        let mut engine_io = Some((sink, signal_tx));
        let mut state = State::new(id);
        let mut queue = VecDeque::from([Event::RecorderArmed { id }]);
        let mut finished: Option<AudioBlob> = None;
        let mut result: Option<Result<AudioBlob, SynthesisError>> = None;
        let mut stream_live = true;

        log::info!("Synthesis capture {} armed ({} chars)", id, request.text.len());

        loop {
            while let Some(event) = queue.pop_front() {
                let (next, effects) = reduce(&state, event);
                if std::mem::discriminant(&state) != std::mem::discriminant(&next) {
                    log::debug!("Synthesis transition: {:?} -> {:?}", state, next);
                }
                state = next;

                for effect in effects {
                    match effect {
                        Effect::StartSynthesis => {
                            let Some((sink, signals)) = engine_io.take() else {
                                continue;
                            };
                            if let Err(err) = self.engine.speak(request.clone(), sink, signals) {
                                queue.push_back(Event::EngineFailed {
                                    id,
                                    err: err.to_string(),
                                });
                            }
                        }
                        Effect::StopRecorder => recorder.stop(),
                        Effect::CloseContext => context.close(),
                        Effect::Finalize => match recorder.finalize() {
                            Ok(blob) => {
                                finished = Some(blob);
                                queue.push_back(Event::FinalizeOk { id });
                            }
                            Err(err) => queue.push_back(Event::FinalizeFail { id, err }),
                        },
                        Effect::DiscardPartial => {
                            recorder.discard();
                            finished = None;
                        }
                        Effect::Resolve => result = finished.take().map(Ok),
                        Effect::Reject(err) => result = Some(Err(err)),
                    }
                }
            }

            if state.is_terminal() {
                break;
            }

            tokio::select! {
                biased;
                more = recorder.capture_next(), if stream_live && recorder.is_recording() => {
                    stream_live = more;
                }
                signal = signal_rx.recv() => {
                    let event = match signal {
                        Some(EngineSignal::Start) => Event::EngineStarted { id },
                        Some(EngineSignal::End) => Event::EngineEnded { id },
                        Some(EngineSignal::Error(err)) => Event::EngineFailed { id, err },
                        None => Event::EngineVanished { id },
                    };
                    queue.push_back(event);
                }
            }
        }

        context.close();
        match result {
            Some(Ok(blob)) => {
                log::info!("Synthesis capture {} complete: {} bytes", id, blob.len());
                Ok(blob)
            }
            Some(Err(err)) => {
                log::warn!("Synthesis capture {} failed: {}", id, err);
                Err(err)
            }
            None => Err(SynthesisError::EngineVanished),
        }
    }
}
