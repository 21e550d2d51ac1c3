//! `espeak-ng` speech engine.
//!
//! Runs `espeak-ng --stdout --stdin`, decodes the WAV it writes and feeds it
//! into the session sink in fixed-size chunks.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

use super::{EngineSignal, SignalSender, SpeechEngine, SynthesisRequest};
use crate::audio::wav::decode_streamed_wav;
use crate::audio::{AudioChunk, AudioSink};
use crate::error::SynthesisError;

/// espeak-ng default speaking rate in words per minute.
const BASE_WPM: f32 = 175.0;
/// espeak-ng default pitch on its 0-99 scale.
const BASE_PITCH: f32 = 50.0;
/// Frames per chunk written to the sink (~46 ms at 22.05 kHz).
const CHUNK_FRAMES: usize = 1024;

#[derive(Debug, Clone)]
pub struct EspeakEngine {
    program: String,
}

impl EspeakEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

/// Command line for `request`; the text itself goes through stdin.
fn command_args(request: &SynthesisRequest) -> Vec<String> {
    let wpm = (BASE_WPM * request.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (BASE_PITCH * request.pitch).round().clamp(0.0, 99.0) as u32;

    let mut args = vec![
        "--stdout".to_string(),
        "--stdin".to_string(),
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
    ];
    if let Some(voice) = &request.voice {
        args.push("-v".to_string());
        args.push(voice.clone());
    }
    args
}

impl SpeechEngine for EspeakEngine {
    fn speak(
        &self,
        request: SynthesisRequest,
        sink: AudioSink,
        signals: SignalSender,
    ) -> Result<(), SynthesisError> {
        let child = Command::new(&self.program)
            .args(command_args(&request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SynthesisError::EngineUnavailable(format!("{}: {}", self.program, e)))?;

        log::debug!("Spawned {} for {} chars", self.program, request.text.len());
        tokio::spawn(render(child, request.text, sink, signals));
        Ok(())
    }
}

async fn render(mut child: Child, text: String, sink: AudioSink, signals: SignalSender) {
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()).await {
            let _ = signals.send(EngineSignal::Error(format!("failed to send text: {}", e)));
            return;
        }
        // Closing stdin ends the utterance.
        drop(stdin);
    }

    let _ = signals.send(EngineSignal::Start);

    let output = match child.wait_with_output().await {
        Ok(output) => output,
        Err(e) => {
            let _ = signals.send(EngineSignal::Error(e.to_string()));
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let _ = signals.send(EngineSignal::Error(format!(
            "espeak-ng exited with {}: {}",
            output.status, stderr
        )));
        return;
    }

    match decode_streamed_wav(&output.stdout) {
        Ok((format, samples)) => {
            let step = CHUNK_FRAMES * usize::from(format.channels.max(1));
            for block in samples.chunks(step) {
                if !sink.write(AudioChunk {
                    samples: block.to_vec(),
                    format,
                }) {
                    log::debug!("Sink closed while rendering, dropping remaining audio");
                    break;
                }
            }
            let _ = signals.send(EngineSignal::End);
        }
        Err(e) => {
            let _ = signals.send(EngineSignal::Error(format!("unreadable engine output: {}", e)));
        }
    }
}
