//! Microphone input capability.
//!
//! [`AudioInput`] is the seam the [`Recorder`](super::Recorder) records
//! through, so tests can substitute a scripted device. [`CpalInput`] captures
//! from the default input device using CPAL.
//!
//! `cpal::Stream` is `!Send` on some platforms, so each capture session
//! confines its stream to a dedicated thread and is controlled over a
//! channel.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use super::wav::{sample_to_i16, PcmFormat};
use crate::error::RecorderError;

/// PCM captured during one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub samples: Vec<i16>,
    pub format: PcmFormat,
}

/// A device that can open exclusive capture sessions.
pub trait AudioInput: Send + Sync {
    /// Open the device and start capturing. Blocks until the device is
    /// either streaming or has failed.
    fn open(&self) -> Result<Box<dyn CaptureSession>, RecorderError>;
}

/// An open capture. Dropping it releases the device without producing audio.
pub trait CaptureSession: Send {
    /// Stop capturing and hand back everything captured so far.
    fn finish(self: Box<Self>) -> Result<CapturedAudio, RecorderError>;
}

/// Captures from the host's default input device.
pub struct CpalInput {
    device_name: Option<String>,
}

impl CpalInput {
    /// Probe the default input device.
    pub fn new() -> Result<Self, RecorderError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(RecorderError::NoInputDevice)?;

        let device_name = device.name().ok();
        log::info!("Using audio input device: {:?}", device_name);

        let supported_config = device
            .default_input_config()
            .map_err(|_| RecorderError::NoSupportedConfig)?;

        log::info!(
            "Audio config: {} Hz, {} channels, {:?}",
            supported_config.sample_rate().0,
            supported_config.channels(),
            supported_config.sample_format()
        );

        Ok(Self { device_name })
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }
}

impl AudioInput for CpalInput {
    fn open(&self) -> Result<Box<dyn CaptureSession>, RecorderError> {
        let (init_tx, init_rx) = mpsc::channel::<Result<(), RecorderError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("voice-studio-capture".into())
            .spawn(move || run_capture(init_tx, stop_rx))
            .map_err(|e| {
                RecorderError::StreamCreationFailed(format!("failed to spawn capture thread: {e}"))
            })?;

        match init_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalSession {
                stop_tx,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(RecorderError::StreamCreationFailed(
                    "capture thread exited during start".to_string(),
                ))
            }
        }
    }
}

type CaptureResult = Result<CapturedAudio, RecorderError>;

struct CpalSession {
    stop_tx: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<CaptureResult>>,
}

impl CpalSession {
    fn stop_and_join(&mut self) -> Option<CaptureResult> {
        let thread = self.thread.take()?;
        let _ = self.stop_tx.send(());
        match thread.join() {
            Ok(result) => Some(result),
            Err(_) => Some(Err(RecorderError::FinalizeFailed(
                "capture thread panicked".to_string(),
            ))),
        }
    }
}

impl CaptureSession for CpalSession {
    fn finish(mut self: Box<Self>) -> Result<CapturedAudio, RecorderError> {
        self.stop_and_join().unwrap_or(Err(RecorderError::FinalizeFailed(
            "capture already finished".to_string(),
        )))
    }
}

impl Drop for CpalSession {
    fn drop(&mut self) {
        if self.stop_and_join().is_some() {
            log::debug!("Capture session dropped, device released");
        }
    }
}

struct LiveCapture {
    _stream: Stream,
    samples: Arc<Mutex<Vec<i16>>>,
    stream_error: Arc<Mutex<Option<String>>>,
    format: PcmFormat,
}

/// Body of the capture thread. Owns the stream for its whole lifetime.
fn run_capture(
    init_tx: mpsc::Sender<Result<(), RecorderError>>,
    stop_rx: mpsc::Receiver<()>,
) -> CaptureResult {
    let live = match start_stream() {
        Ok(live) => live,
        Err(e) => {
            let _ = init_tx.send(Err(e.clone()));
            return Err(e);
        }
    };
    let _ = init_tx.send(Ok(()));
    log::info!(
        "Capture started: {} Hz, {} channels",
        live.format.sample_rate,
        live.format.channels
    );

    // Returns on stop or when the session handle is gone.
    let _ = stop_rx.recv();

    let LiveCapture {
        _stream,
        samples,
        stream_error,
        format,
    } = live;
    drop(_stream);

    if let Some(err) = stream_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
    {
        return Err(RecorderError::DeviceUnavailable(err));
    }

    let samples = std::mem::take(&mut *samples.lock().unwrap_or_else(PoisonError::into_inner));
    log::info!("Capture stopped: {} samples", samples.len());
    Ok(CapturedAudio { samples, format })
}

fn start_stream() -> Result<LiveCapture, RecorderError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(RecorderError::NoInputDevice)?;

    let supported_config = device
        .default_input_config()
        .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;
    let sample_format = supported_config.sample_format();
    let config: StreamConfig = supported_config.into();
    let format = PcmFormat::new(config.sample_rate.0, config.channels);

    let samples = Arc::new(Mutex::new(Vec::new()));
    let stream_error = Arc::new(Mutex::new(None));

    let stream = match sample_format {
        SampleFormat::I16 => build_stream::<i16>(&device, &config, &samples, &stream_error),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, &samples, &stream_error),
        SampleFormat::F32 => build_stream::<f32>(&device, &config, &samples, &stream_error),
        _ => Err(RecorderError::NoSupportedConfig),
    }?;

    stream
        .play()
        .map_err(|e| RecorderError::StreamCreationFailed(format!("Failed to start stream: {}", e)))?;

    Ok(LiveCapture {
        _stream: stream,
        samples,
        stream_error,
        format,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: &Arc<Mutex<Vec<i16>>>,
    stream_error: &Arc<Mutex<Option<String>>>,
) -> Result<Stream, RecorderError>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let sink = samples.clone();
    let errors = stream_error.clone();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
                guard.extend(data.iter().map(|&s| sample_to_i16(s)));
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
                errors
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert_with(|| err.to_string());
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                RecorderError::DeviceUnavailable(e.to_string())
            }
            other => RecorderError::StreamCreationFailed(other.to_string()),
        })
}
