//! Normalized audio artifacts shared by every acquisition path.
//!
//! `AudioBlob` is the raw payload handed between components. `AudioAsset` is
//! the immutable value the rest of the app consumes: bytes, a display name,
//! an origin tag and a playback reference whose lifetime is the asset's.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AssetError;
use crate::playback::{PlaybackRef, PlaybackRegistry};

pub const MIME_WAV: &str = "audio/wav";
pub const MIME_MPEG: &str = "audio/mpeg";
pub const MIME_MP4: &str = "audio/mp4";

/// Immutable in-memory binary payload tagged with a content type.
///
/// Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioBlob {
    data: Arc<[u8]>,
    content_type: String,
}

impl AudioBlob {
    pub fn new(data: impl Into<Arc<[u8]>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn wav(data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(data, MIME_WAV)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_audio(&self) -> bool {
        self.content_type.starts_with("audio/")
    }

    /// File extension matching the content type, used when exporting.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            MIME_MPEG | "audio/mp3" => "mp3",
            MIME_MP4 | "audio/x-m4a" | "audio/m4a" => "m4a",
            _ => "wav",
        }
    }

    /// True when both blobs share the same buffer (no copy was made).
    pub fn shares_buffer_with(&self, other: &AudioBlob) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for AudioBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBlob")
            .field("len", &self.data.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Opaque asset identifier, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(Uuid);

impl AssetId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which acquisition path produced an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetOrigin {
    Recorded,
    Uploaded,
    Synthesized,
}

/// Normalized audio artifact.
///
/// Never mutated. Dropping the asset (or calling [`AudioAsset::release`])
/// releases its playback reference exactly once.
pub struct AudioAsset {
    id: AssetId,
    display_name: String,
    blob: AudioBlob,
    playback: PlaybackRef,
    origin: AssetOrigin,
    created_at: DateTime<Utc>,
}

impl AudioAsset {
    /// Build an asset and register its playback reference.
    ///
    /// Validation happens before the reference is created, so a failed
    /// construction leaves nothing to release.
    pub fn new(
        display_name: &str,
        blob: AudioBlob,
        origin: AssetOrigin,
        registry: &PlaybackRegistry,
    ) -> Result<Self, AssetError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AssetError::BlankName);
        }
        if blob.is_empty() {
            return Err(AssetError::EmptyPayload);
        }

        let playback = registry.create(&blob);
        Ok(Self {
            id: AssetId::generate(),
            display_name: display_name.to_string(),
            blob,
            playback,
            origin,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn blob(&self) -> &AudioBlob {
        &self.blob
    }

    pub fn origin(&self) -> AssetOrigin {
        self.origin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// URL a player can use to render the bytes without re-reading them.
    pub fn playback_url(&self) -> &str {
        self.playback.url()
    }

    /// Discard the asset, releasing its playback reference now.
    pub fn release(self) {
        let AudioAsset { playback, .. } = self;
        playback.release();
    }
}

impl fmt::Debug for AudioAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioAsset")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("blob", &self.blob)
            .field("playback_url", &self.playback.url())
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_a_construction_failure() {
        let registry = PlaybackRegistry::new();
        let err = AudioAsset::new("Voice", AudioBlob::wav(Vec::new()), AssetOrigin::Recorded, &registry)
            .unwrap_err();
        assert_eq!(err, AssetError::EmptyPayload);
        assert_eq!(registry.created(), 0);
    }

    #[test]
    fn display_name_is_trimmed_and_required() {
        let registry = PlaybackRegistry::new();
        let blob = AudioBlob::wav(vec![1u8, 2, 3]);

        let err = AudioAsset::new("   ", blob.clone(), AssetOrigin::Uploaded, &registry).unwrap_err();
        assert_eq!(err, AssetError::BlankName);

        let asset = AudioAsset::new("  My Voice ", blob, AssetOrigin::Uploaded, &registry).unwrap();
        assert_eq!(asset.display_name(), "My Voice");
        assert_eq!(asset.origin(), AssetOrigin::Uploaded);
    }

    #[test]
    fn ids_are_unique() {
        let registry = PlaybackRegistry::new();
        let blob = AudioBlob::wav(vec![0u8; 4]);
        let a = AudioAsset::new("a", blob.clone(), AssetOrigin::Recorded, &registry).unwrap();
        let b = AudioAsset::new("a", blob, AssetOrigin::Recorded, &registry).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.playback_url(), b.playback_url());
    }

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(AudioBlob::new(vec![1u8], MIME_MPEG).extension(), "mp3");
        assert_eq!(AudioBlob::new(vec![1u8], MIME_MP4).extension(), "m4a");
        assert_eq!(AudioBlob::wav(vec![1u8]).extension(), "wav");
    }
}
