//! File intake for uploaded voice samples.
//!
//! Accepts at most one file per intake action, restricted to MP3, WAV and
//! M4A. Accepted files are forwarded unchanged; no transcoding happens here.

use std::path::Path;
use std::sync::Arc;

use crate::asset::{AudioBlob, MIME_MP4, MIME_MPEG, MIME_WAV};
use crate::error::IntakeRejection;

/// Extensions accepted for upload, lowercase.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// A file offered by drag-drop or the file picker.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    /// Type declared by the picker, if any.
    pub content_type: Option<String>,
    pub data: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content_type,
            data: data.into(),
        }
    }

    /// Read a candidate from disk.
    pub async fn from_path(path: &Path) -> Result<Self, IntakeRejection> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| IntakeRejection::Unreadable {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self::new(name, None, data))
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// A file that passed intake, ready for the import form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub name: String,
    pub blob: AudioBlob,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileIntake;

impl FileIntake {
    pub fn new() -> Self {
        Self
    }

    /// Whether `candidate` matches the accepted audio types.
    pub fn accepts(&self, candidate: &CandidateFile) -> bool {
        let extension_ok = candidate
            .extension()
            .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        let declared_ok = candidate
            .content_type
            .as_deref()
            .map(|ct| ct.is_empty() || ct.starts_with("audio/"))
            .unwrap_or(true);
        extension_ok && declared_ok
    }

    /// Validate one intake action. Nothing is forwarded on rejection.
    pub fn accept(&self, mut files: Vec<CandidateFile>) -> Result<AudioFile, IntakeRejection> {
        if files.len() > 1 {
            return Err(IntakeRejection::TooManyFiles(files.len()));
        }
        let candidate = files.pop().ok_or(IntakeRejection::NoFile)?;

        if !self.accepts(&candidate) {
            log::debug!("Rejected upload {:?}", candidate.name);
            return Err(IntakeRejection::UnsupportedType {
                name: candidate.name,
            });
        }

        let content_type = match candidate.content_type.as_deref() {
            Some(ct) if ct.starts_with("audio/") => ct.to_string(),
            _ => content_type_for(candidate.extension().as_deref()).to_string(),
        };

        log::info!(
            "Accepted upload {:?} ({}, {} bytes)",
            candidate.name,
            content_type,
            candidate.data.len()
        );

        Ok(AudioFile {
            name: candidate.name,
            blob: AudioBlob::new(candidate.data, content_type),
        })
    }
}

fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("mp3") => MIME_MPEG,
        Some("m4a") => MIME_MP4,
        _ => MIME_WAV,
    }
}
