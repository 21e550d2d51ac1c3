//! Per-session render context.
//!
//! An [`AudioContext`] owns a destination whose output is a recordable
//! [`MediaStream`] instead of the speaker. Engines write into the
//! [`AudioSink`] side; a [`StreamRecorder`] armed on the stream keeps every
//! chunk in arrival order. Closing the context (explicitly or on drop) makes
//! further writes no-ops.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::wav::{encode_wav, PcmFormat};
use crate::asset::AudioBlob;
use crate::error::SynthesisError;

/// A block of interleaved PCM rendered by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub format: PcmFormat,
}

/// Counts contexts that are open right now.
#[derive(Debug, Clone, Default)]
pub struct ContextTracker {
    open: Arc<AtomicUsize>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_contexts(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct AudioContext {
    id: Uuid,
    closed: Arc<AtomicBool>,
    tracker: ContextTracker,
}

impl AudioContext {
    pub fn open(tracker: &ContextTracker) -> Self {
        tracker.open.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4();
        log::debug!("Audio context {} opened", id);
        Self {
            id,
            closed: Arc::new(AtomicBool::new(false)),
            tracker: tracker.clone(),
        }
    }

    /// Create a destination routed into a recordable stream.
    pub fn create_stream_destination(&self) -> (AudioSink, MediaStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            AudioSink {
                tx,
                closed: self.closed.clone(),
            },
            MediaStream { rx },
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.tracker.open.fetch_sub(1, Ordering::SeqCst);
            log::debug!("Audio context {} closed", self.id);
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// Write side handed to the speech engine.
#[derive(Debug, Clone)]
pub struct AudioSink {
    tx: mpsc::UnboundedSender<AudioChunk>,
    closed: Arc<AtomicBool>,
}

impl AudioSink {
    /// Push rendered audio. Returns false once the context is closed or the
    /// stream has no reader; the chunk is dropped in that case.
    pub fn write(&self, chunk: AudioChunk) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        if chunk.samples.is_empty() {
            return true;
        }
        self.tx.send(chunk).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Read side of a stream destination.
#[derive(Debug)]
pub struct MediaStream {
    rx: mpsc::UnboundedReceiver<AudioChunk>,
}

/// Accumulates stream chunks between arm and stop.
#[derive(Debug)]
pub struct StreamRecorder {
    stream: MediaStream,
    chunks: Vec<AudioChunk>,
    recording: bool,
}

impl StreamRecorder {
    pub fn arm(stream: MediaStream) -> Self {
        Self {
            stream,
            chunks: Vec::new(),
            recording: true,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Wait for the next chunk. Returns false when the stream is exhausted
    /// or the recorder is stopped.
    pub async fn capture_next(&mut self) -> bool {
        if !self.recording {
            return false;
        }
        match self.stream.rx.recv().await {
            Some(chunk) => {
                self.chunks.push(chunk);
                true
            }
            None => false,
        }
    }

    /// Stop recording, keeping every chunk already delivered to the stream.
    pub fn stop(&mut self) {
        if !self.recording {
            return;
        }
        while let Ok(chunk) = self.stream.rx.try_recv() {
            self.chunks.push(chunk);
        }
        self.stream.rx.close();
        self.recording = false;
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatenate chunks in arrival order into one WAV blob.
    pub fn finalize(&mut self) -> Result<AudioBlob, SynthesisError> {
        self.stop();
        let chunks = std::mem::take(&mut self.chunks);
        let Some(format) = chunks.first().map(|c| c.format) else {
            return Err(SynthesisError::NoAudio);
        };
        if chunks.iter().any(|c| c.format != format) {
            return Err(SynthesisError::Encode(
                "chunks with mixed sample formats".to_string(),
            ));
        }

        let samples: Vec<i16> = chunks.into_iter().flat_map(|c| c.samples).collect();
        let bytes = encode_wav(&samples, format).map_err(|e| SynthesisError::Encode(e.to_string()))?;
        Ok(AudioBlob::wav(bytes))
    }

    /// Drop everything recorded so far.
    pub fn discard(&mut self) {
        self.stop();
        let dropped = std::mem::take(&mut self.chunks).len();
        if dropped > 0 {
            log::debug!("Discarded {} partial chunks", dropped);
        }
    }
}
