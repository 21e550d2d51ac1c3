use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::remote::VoiceSettings;
use crate::speech::SpeechOptions;

const APP_DIR_NAME: &str = "voice-studio";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    /// How long the placeholder cloning step takes before an import completes.
    pub import_processing_ms: u64,

    /// Local synthesis rate for custom voices (1.0 = engine default).
    pub speech_rate: f32,

    /// Local synthesis pitch for custom voices (1.0 = engine default).
    pub speech_pitch: f32,

    /// Remote voice stability, 0.0..=1.0.
    pub stability: f32,

    /// Remote voice similarity boost, 0.0..=1.0.
    pub similarity_boost: f32,

    /// Speech engine executable used for custom voices.
    pub espeak_program: String,

    /// Engine voice passed as `-v`, if set.
    pub espeak_voice: Option<String>,

    pub api_base_url: String,

    pub model_id: String,

    /// Exported samples beyond this count are deleted, oldest first.
    pub max_saved_samples: usize,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            import_processing_ms: 2000,
            speech_rate: 1.0,
            speech_pitch: 1.0,
            stability: 0.5,
            similarity_boost: 0.75,
            espeak_program: "espeak-ng".to_string(),
            espeak_voice: None,
            api_base_url: "https://api.elevenlabs.io/v1".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            max_saved_samples: 20,
        }
    }
}

impl StudioSettings {
    pub fn import_delay(&self) -> Duration {
        Duration::from_millis(self.import_processing_ms)
    }

    pub fn speech_options(&self) -> SpeechOptions {
        SpeechOptions {
            rate: self.speech_rate,
            pitch: self.speech_pitch,
            engine_voice: self.espeak_voice.clone(),
            voice_settings: VoiceSettings {
                stability: self.stability.clamp(0.0, 1.0),
                similarity_boost: self.similarity_boost.clamp(0.0, 1.0),
            },
        }
    }
}

/// `<config_dir>/voice-studio/settings.json`
pub fn settings_path() -> Result<PathBuf, String> {
    let dir = dirs::config_dir().ok_or("Could not determine config directory")?;
    Ok(dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

pub fn load_settings() -> StudioSettings {
    match settings_path() {
        Ok(path) => load_settings_from(&path),
        Err(e) => {
            log::warn!("Settings: {}", e);
            StudioSettings::default()
        }
    }
}

pub fn load_settings_from(path: &Path) -> StudioSettings {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<StudioSettings>(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}: {}", path, e);
                StudioSettings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StudioSettings::default(),
        Err(e) => {
            log::warn!("Settings: failed to read {:?}: {}", path, e);
            StudioSettings::default()
        }
    }
}

pub fn save_settings(settings: &StudioSettings) -> Result<(), String> {
    save_settings_to(&settings_path()?, settings)
}

pub fn save_settings_to(path: &Path, settings: &StudioSettings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory {:?}: {}", parent, e))?;
    }

    let contents =
        serde_json::to_string_pretty(settings).map_err(|e| format!("Serialize settings: {}", e))?;

    // Write to a sibling temp file, then rename over the target.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents)
        .map_err(|e| format!("Write temp settings {:?}: {}", tmp_path, e))?;

    // Windows rename fails if the destination exists.
    if cfg!(windows) && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(format!("Remove existing settings file {:?}: {}", path, e));
            }
        }
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("Rename temp settings {:?} to {:?}: {}", tmp_path, path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(settings, StudioSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{"speech_rate": 1.5, "max_saved_samples": 3}"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.speech_rate, 1.5);
        assert_eq!(settings.max_saved_samples, 3);
        assert_eq!(settings.import_processing_ms, 2000);
        assert_eq!(settings.model_id, "eleven_monolingual_v1");
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path), StudioSettings::default());
    }

    #[test]
    fn save_then_load_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let settings = StudioSettings {
            espeak_voice: Some("en-gb".into()),
            stability: 0.9,
            ..StudioSettings::default()
        };

        save_settings_to(&path, &settings).unwrap();
        save_settings_to(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path), settings);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn speech_options_clamp_remote_settings() {
        let settings = StudioSettings {
            stability: 3.0,
            similarity_boost: -1.0,
            ..StudioSettings::default()
        };
        let options = settings.speech_options();
        assert_eq!(options.voice_settings.stability, 1.0);
        assert_eq!(options.voice_settings.similarity_boost, 0.0);
    }
}
