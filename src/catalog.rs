//! Voice catalog: preset voices from the remote service plus custom voices
//! built from imported samples.
//!
//! The catalog owns every custom voice's [`AudioAsset`]; removing the voice
//! (or dropping the catalog) releases the asset's playback reference.

use serde::{Deserialize, Serialize};

use crate::asset::AudioAsset;

/// Prefix that marks a voice id as locally imported.
pub const CUSTOM_VOICE_PREFIX: &str = "custom-";

pub fn is_custom_voice_id(voice_id: &str) -> bool {
    voice_id.starts_with(CUSTOM_VOICE_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

impl Voice {
    pub fn preset(voice_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            name: name.into(),
            preview_url: None,
            is_custom: false,
        }
    }

    /// Catalog entry for an imported asset. The preview plays the asset's
    /// own bytes.
    pub fn custom(asset: &AudioAsset) -> Self {
        Self {
            voice_id: format!("{}{}", CUSTOM_VOICE_PREFIX, asset.id()),
            name: asset.display_name().to_string(),
            preview_url: Some(asset.playback_url().to_string()),
            is_custom: true,
        }
    }
}

/// Receives completed imports and tracks the selected voice.
pub trait VoiceCatalog: Send {
    /// Take ownership of an imported asset and list it as a custom voice.
    fn add(&mut self, asset: AudioAsset) -> &AudioAsset;

    /// Presets first, then custom voices in import order.
    fn voices(&self) -> Vec<Voice>;

    /// Select by id. Returns the selected voice, or `None` (selection
    /// unchanged) if the id is unknown.
    fn select(&mut self, voice_id: &str) -> Option<&Voice>;

    fn selected(&self) -> Option<&Voice>;

    /// Remove a custom voice. Preset voices cannot be removed.
    fn remove(&mut self, voice_id: &str) -> bool;

    /// Replace the preset list (e.g. after fetching from the remote service).
    fn set_presets(&mut self, presets: Vec<Voice>);

    /// The sample behind a custom voice.
    fn custom_asset(&self, voice_id: &str) -> Option<&AudioAsset>;
}

struct CustomVoice {
    voice: Voice,
    asset: AudioAsset,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    presets: Vec<Voice>,
    custom: Vec<CustomVoice>,
    selected: Option<String>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    fn find(&self, voice_id: &str) -> Option<&Voice> {
        self.presets
            .iter()
            .find(|v| v.voice_id == voice_id)
            .or_else(|| {
                self.custom
                    .iter()
                    .map(|c| &c.voice)
                    .find(|v| v.voice_id == voice_id)
            })
    }
}

impl VoiceCatalog for InMemoryCatalog {
    fn add(&mut self, asset: AudioAsset) -> &AudioAsset {
        let voice = Voice::custom(&asset);
        log::info!("Catalog: added custom voice {} ({:?})", voice.voice_id, voice.name);
        self.custom.push(CustomVoice { voice, asset });
        let idx = self.custom.len() - 1;
        &self.custom[idx].asset
    }

    fn voices(&self) -> Vec<Voice> {
        self.presets
            .iter()
            .cloned()
            .chain(self.custom.iter().map(|c| c.voice.clone()))
            .collect()
    }

    fn select(&mut self, voice_id: &str) -> Option<&Voice> {
        if self.find(voice_id).is_none() {
            log::debug!("Catalog: ignoring selection of unknown voice {}", voice_id);
            return None;
        }
        self.selected = Some(voice_id.to_string());
        self.find(voice_id)
    }

    fn selected(&self) -> Option<&Voice> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    fn remove(&mut self, voice_id: &str) -> bool {
        let Some(pos) = self.custom.iter().position(|c| c.voice.voice_id == voice_id) else {
            return false;
        };
        let removed = self.custom.remove(pos);
        removed.asset.release();
        if self.selected.as_deref() == Some(voice_id) {
            self.selected = None;
        }
        log::info!("Catalog: removed custom voice {}", voice_id);
        true
    }

    fn set_presets(&mut self, presets: Vec<Voice>) {
        log::info!("Catalog: {} preset voices", presets.len());
        self.presets = presets;
        let stale = self
            .selected
            .as_deref()
            .is_some_and(|id| self.find(id).is_none());
        if stale {
            self.selected = None;
        }
    }

    fn custom_asset(&self, voice_id: &str) -> Option<&AudioAsset> {
        self.custom
            .iter()
            .find(|c| c.voice.voice_id == voice_id)
            .map(|c| &c.asset)
    }
}
