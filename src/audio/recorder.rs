//! Microphone recorder.
//!
//! `Recorder` wraps an [`AudioInput`] into start/stop controls. Every
//! transition goes through the recorder reducer; this type only executes the
//! effects. A successful cycle yields exactly one WAV blob from `stop()`.

use std::collections::VecDeque;
use std::sync::Arc;

use uuid::Uuid;

use super::input::{AudioInput, CaptureSession, CapturedAudio};
use super::wav::encode_wav;
use crate::asset::AudioBlob;
use crate::error::RecorderError;
use crate::state_machine::recorder::{reduce, Effect, Event, State};

/// What a run of the effect loop produced.
#[derive(Default)]
struct Outcome {
    delivered: Option<AudioBlob>,
    failure: Option<RecorderError>,
}

pub struct Recorder {
    input: Arc<dyn AudioInput>,
    state: State,
    session: Option<Box<dyn CaptureSession>>,
    finished: Option<AudioBlob>,
    last_error: Option<RecorderError>,
}

impl Recorder {
    pub fn new(input: Arc<dyn AudioInput>) -> Self {
        Self {
            input,
            state: State::default(),
            session: None,
            finished: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Begin capturing from the input device.
    ///
    /// Rejected with [`RecorderError::AlreadyRecording`] while a session is
    /// active. Device failures are returned after the recorder is back to
    /// idle, so the caller can retry.
    pub async fn start(&mut self) -> Result<Uuid, RecorderError> {
        self.recover_interrupted();
        if !self.state.is_idle() {
            return Err(RecorderError::AlreadyRecording);
        }

        let outcome = self.run(Event::Start).await;
        if let Some(err) = outcome.failure {
            return Err(err);
        }
        self.state
            .session_id()
            .ok_or_else(|| RecorderError::StreamCreationFailed("session not started".to_string()))
    }

    /// End capture and wait for the blob.
    ///
    /// Returns `Ok(None)` when nothing was being recorded.
    pub async fn stop(&mut self) -> Result<Option<AudioBlob>, RecorderError> {
        self.recover_interrupted();
        if !self.is_recording() {
            log::debug!("Stop requested with no active recording");
            return Ok(None);
        }

        let outcome = self.run(Event::Stop).await;
        match (outcome.delivered, outcome.failure) {
            (_, Some(err)) => Err(err),
            (Some(blob), None) => Ok(Some(blob)),
            (None, None) => Ok(None),
        }
    }

    /// Abort the current session (view unmounted, navigation away).
    pub fn cancel(&mut self) {
        let (next, effects) = reduce(&self.state, Event::Cancel);
        self.transition(next);
        for effect in effects {
            match effect {
                Effect::CloseDevice { id } | Effect::Discard { id } => self.release(id),
                other => log::warn!("Unexpected effect on cancel: {:?}", other),
            }
        }
    }

    /// Most recent failure, kept for display until the next session.
    pub fn last_error(&self) -> Option<&RecorderError> {
        self.last_error.as_ref()
    }

    /// A `start()` or `stop()` future dropped mid-flight leaves a transitional
    /// state behind with nothing left to drive it. Nothing else can be running
    /// while we hold `&mut self`, so treat it as a cancelled session.
    fn recover_interrupted(&mut self) {
        let interrupted = match self.state {
            State::Idle => false,
            State::Recording { .. } => self.session.is_none(),
            State::Finalizing { .. } | State::Failed { .. } => true,
        };
        if interrupted {
            log::warn!("Recovering recorder left in {:?} by an interrupted call", self.state);
            self.cancel();
        }
    }

    fn transition(&mut self, next: State) {
        if std::mem::discriminant(&self.state) != std::mem::discriminant(&next) {
            log::info!("Recorder transition: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    fn release(&mut self, id: Uuid) {
        if self.session.take().is_some() {
            log::info!("Recorder session {} released device", id);
        }
        self.finished = None;
    }

    /// Feed `event` through the reducer and execute effects until quiet.
    async fn run(&mut self, event: Event) -> Outcome {
        let mut outcome = Outcome::default();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let (next, effects) = reduce(&self.state, event);
            self.transition(next);

            for effect in effects {
                match effect {
                    Effect::OpenDevice { id } => {
                        self.last_error = None;
                        match self.open_device().await {
                            Ok(session) => {
                                log::info!("Recording {} started", id);
                                self.session = Some(session);
                            }
                            Err(err) => {
                                queue.push_back(Event::DeviceFail {
                                    id,
                                    err: err.to_string(),
                                });
                                outcome.failure = Some(err);
                            }
                        }
                    }
                    Effect::CloseDevice { id } | Effect::Discard { id } => self.release(id),
                    Effect::Finalize { id } => match self.finalize().await {
                        Ok(blob) => {
                            log::info!("Recording {} finalized: {} bytes", id, blob.len());
                            self.finished = Some(blob);
                            queue.push_back(Event::FinalizeOk { id });
                        }
                        Err(err) => {
                            queue.push_back(Event::FinalizeFail {
                                id,
                                err: err.to_string(),
                            });
                            outcome.failure = Some(err);
                        }
                    },
                    Effect::Deliver { .. } => outcome.delivered = self.finished.take(),
                    Effect::ReportFailure { id, message } => {
                        log::error!("Recording {} failed: {}", id, message);
                        self.last_error = outcome.failure.clone();
                        queue.push_back(Event::Acknowledge { id });
                    }
                }
            }
        }

        outcome
    }

    async fn open_device(&self) -> Result<Box<dyn CaptureSession>, RecorderError> {
        let input = self.input.clone();
        tokio::task::spawn_blocking(move || input.open())
            .await
            .map_err(|e| RecorderError::StreamCreationFailed(e.to_string()))?
    }

    /// Stop the stream and assemble the WAV blob off the event loop.
    async fn finalize(&mut self) -> Result<AudioBlob, RecorderError> {
        let session = self
            .session
            .take()
            .ok_or_else(|| RecorderError::FinalizeFailed("no active capture".to_string()))?;

        let captured = tokio::task::spawn_blocking(move || session.finish())
            .await
            .map_err(|e| RecorderError::FinalizeFailed(e.to_string()))??;

        encode_captured(captured).await
    }
}

async fn encode_captured(captured: CapturedAudio) -> Result<AudioBlob, RecorderError> {
    if captured.samples.is_empty() {
        return Err(RecorderError::EmptyCapture);
    }
    let bytes = tokio::task::spawn_blocking(move || encode_wav(&captured.samples, captured.format))
        .await
        .map_err(|e| RecorderError::FinalizeFailed(e.to_string()))?
        .map_err(|e| RecorderError::FinalizeFailed(e.to_string()))?;
    Ok(AudioBlob::wav(bytes))
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.cancel();
    }
}
