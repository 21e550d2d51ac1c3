//! XDG path helpers for exported samples
//!
//! Samples are stored in: ~/.local/share/voice-studio/samples/

use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::AssetId;

/// Get the samples directory path.
/// Returns: ~/.local/share/voice-studio/samples/
fn samples_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voice-studio")
        .join("samples")
}

/// Create the samples directory if it doesn't exist.
pub fn create_samples_dir() -> std::io::Result<PathBuf> {
    let dir = samples_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Generate a unique file path for an exported asset inside `dir`.
/// Format: <timestamp>_<asset id>.<extension>
pub fn generate_sample_path(dir: &Path, id: AssetId, extension: &str) -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.{}", timestamp, id, extension))
}

fn is_sample_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext, "wav" | "mp3" | "m4a"))
        .unwrap_or(false)
}

/// Clean up old samples in `dir`, keeping only the most recent `keep` files.
pub fn cleanup_old_samples(dir: &Path, keep: usize) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| is_sample_file(&e.path()))
        .collect();

    if entries.len() <= keep {
        return Ok(0);
    }

    // Sort by modified time (oldest first)
    entries.sort_by(|a, b| {
        let time_a = a.metadata().and_then(|m| m.modified()).ok();
        let time_b = b.metadata().and_then(|m| m.modified()).ok();
        time_a.cmp(&time_b)
    });

    let to_delete = entries.len() - keep;
    let mut deleted = 0;

    for entry in entries.into_iter().take(to_delete) {
        if fs::remove_file(entry.path()).is_ok() {
            log::debug!("Cleaned up old sample: {:?}", entry.path());
            deleted += 1;
        }
    }

    Ok(deleted)
}
