//! Audio capture and rendering plumbing.
//!
//! Microphone capture goes through CPAL, WAV assembly through hound.
//! Synthesized speech is rendered into a per-session [`AudioContext`] whose
//! output is recorded instead of played.

pub mod context;
pub mod input;
mod paths;
pub mod recorder;
pub mod wav;

pub use context::{AudioChunk, AudioContext, AudioSink, ContextTracker, MediaStream, StreamRecorder};
pub use input::{AudioInput, CaptureSession, CapturedAudio, CpalInput};
pub use paths::{cleanup_old_samples, create_samples_dir, generate_sample_path};
pub use recorder::Recorder;
pub use wav::PcmFormat;
