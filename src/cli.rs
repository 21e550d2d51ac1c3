//! Command-line front end.
//!
//! Each invocation builds one [`Studio`], runs a single action through it and
//! writes any produced audio into the samples directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::asset::AudioAsset;
use crate::audio::{
    cleanup_old_samples, create_samples_dir, generate_sample_path, AudioInput, CaptureSession,
    CpalInput,
};
use crate::error::RecorderError;
use crate::intake::CandidateFile;
use crate::remote::ElevenLabsClient;
use crate::settings::{load_settings, StudioSettings};
use crate::studio::{Notice, NoticeLevel, Studio};
use crate::synthesis::EspeakEngine;

#[derive(Parser)]
#[command(name = "voice-studio")]
#[command(about = "Record, import and speak with voice samples")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the preset voices offered by the speech service
    Voices,

    /// Record a voice sample from the default microphone and import it
    Record {
        /// Name for the new voice
        #[arg(long)]
        name: String,

        /// Recording length in seconds
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },

    /// Import an MP3, WAV or M4A file as a custom voice
    Import {
        file: PathBuf,

        /// Name for the new voice
        #[arg(long)]
        name: String,
    },

    /// Speak text with a preset voice or with a sample imported on the fly
    Speak {
        text: String,

        /// Preset voice id (see `voices`)
        #[arg(long, conflicts_with = "sample", required_unless_present = "sample")]
        voice: Option<String>,

        /// Import this file and speak with it as a custom voice. Importing
        /// waits `import_processing_ms` from the settings file first.
        #[arg(long)]
        sample: Option<PathBuf>,

        /// Write the result here instead of the samples directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Stands in for the microphone when none could be opened.
struct UnavailableInput(RecorderError);

impl AudioInput for UnavailableInput {
    fn open(&self) -> Result<Box<dyn CaptureSession>, RecorderError> {
        Err(self.0.clone())
    }
}

fn build_studio(settings: &StudioSettings, need_microphone: bool) -> Result<Studio, RecorderError> {
    let input: Arc<dyn AudioInput> = match CpalInput::new() {
        Ok(input) => Arc::new(input),
        Err(e) if need_microphone => return Err(e),
        Err(e) => {
            log::debug!("No microphone: {}", e);
            Arc::new(UnavailableInput(e))
        }
    };
    let engine = Arc::new(EspeakEngine::new(settings.espeak_program.clone()));
    let service = Arc::new(ElevenLabsClient::from_env(
        settings.api_base_url.clone(),
        settings.model_id.clone(),
    ));
    Ok(Studio::new(input, engine, service, settings))
}

fn print_notices(studio: &mut Studio) {
    for Notice { level, message } in studio.take_notices() {
        match level {
            NoticeLevel::Success => println!("{}", message),
            NoticeLevel::Error => eprintln!("{}", message),
        }
    }
}

/// Write `asset` into the samples directory (or `out`) and prune old files.
async fn export(asset: &AudioAsset, out: Option<&Path>, keep: usize) -> std::io::Result<PathBuf> {
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = create_samples_dir()?;
            generate_sample_path(&dir, asset.id(), asset.blob().extension())
        }
    };
    tokio::fs::write(&path, asset.blob().bytes()).await?;
    log::info!("Saved {} bytes to {:?}", asset.blob().len(), path);

    if out.is_none() {
        if let Some(dir) = path.parent() {
            match cleanup_old_samples(dir, keep) {
                Ok(0) => {}
                Ok(n) => log::info!("Cleaned up {} old samples", n),
                Err(e) => log::warn!("Failed to clean up samples: {}", e),
            }
        }
    }
    Ok(path)
}

async fn import_file(studio: &mut Studio, file: &Path, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let candidate = CandidateFile::from_path(file).await?;
    studio.offer_files(vec![candidate])?;
    studio.set_voice_name(name);
    studio.import_voice().await?;
    Ok(())
}

async fn execute(studio: &mut Studio, command: Commands, settings: &StudioSettings) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Voices => {
            studio.refresh_voices().await?;
            for voice in studio.voices() {
                println!("{}\t{}", voice.voice_id, voice.name);
            }
        }
        Commands::Record { name, seconds } => {
            studio.start_recording().await?;
            println!("Recording for {} s...", seconds);
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            studio.stop_recording().await?;
            studio.set_voice_name(name);
            let voice = studio.import_voice().await?;
            if let Some(asset) = studio.catalog_asset(&voice.voice_id) {
                let path = export(asset, None, settings.max_saved_samples).await?;
                println!("{}\t{}", voice.voice_id, path.display());
            }
        }
        Commands::Import { file, name } => {
            import_file(studio, &file, &name).await?;
            if let Some(voice) = studio.selected_voice() {
                println!("{}\t{}", voice.voice_id, voice.name);
            }
        }
        Commands::Speak {
            text,
            voice,
            sample,
            out,
        } => {
            if let Some(sample) = sample {
                let name = sample
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("sample")
                    .to_string();
                import_file(studio, &sample, &name).await?;
            } else if let Some(voice) = voice {
                studio.refresh_voices().await?;
                studio.select_voice(&voice)?;
            }

            let keep = settings.max_saved_samples;
            let asset = studio.generate_speech(&text).await?;
            let path = export(asset, out.as_deref(), keep).await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings();
    let need_microphone = matches!(cli.command, Commands::Record { .. });
    let mut studio = build_studio(&settings, need_microphone)?;

    let result = execute(&mut studio, cli.command, &settings).await;
    print_notices(&mut studio);
    result
}
