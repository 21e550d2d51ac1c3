//! Revocable playback references.
//!
//! A [`PlaybackRegistry`] hands out `blob:` style URLs that resolve to the
//! registered bytes without copying them. Each [`PlaybackRef`] is released
//! exactly once: explicitly via [`PlaybackRef::release`] or on drop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::asset::{AudioAsset, AudioBlob};

const URL_PREFIX: &str = "blob:voice-studio/";

#[derive(Default)]
struct RegistryInner {
    entries: Mutex<HashMap<String, AudioBlob>>,
    created: AtomicUsize,
    released: AtomicUsize,
}

/// Shared table of live playback references.
///
/// The counters make leaks and double releases observable in tests.
#[derive(Clone, Default)]
pub struct PlaybackRegistry {
    inner: Arc<RegistryInner>,
}

impl PlaybackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blob` and return the reference that owns the registration.
    pub fn create(&self, blob: &AudioBlob) -> PlaybackRef {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), blob.clone());
        self.inner.created.fetch_add(1, Ordering::SeqCst);
        log::debug!("Playback reference created: {}", url);

        PlaybackRef {
            url,
            registry: self.inner.clone(),
            released: false,
        }
    }

    /// Look up the bytes behind a live URL. Shares the buffer.
    pub fn resolve(&self, url: &str) -> Option<AudioBlob> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn created(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Owned handle to a registered playback URL. Not `Clone`: ownership moves,
/// it is never duplicated.
pub struct PlaybackRef {
    url: String,
    registry: Arc<RegistryInner>,
    released: bool,
}

impl PlaybackRef {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Release the reference now instead of at drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let removed = self
            .registry
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.url);
        if removed.is_none() {
            log::error!("Playback reference {} was not registered", self.url);
            return;
        }
        self.registry.released.fetch_add(1, Ordering::SeqCst);
        log::debug!("Playback reference released: {}", self.url);
    }
}

impl Drop for PlaybackRef {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for PlaybackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PlaybackRef").field(&self.url).finish()
    }
}

/// A UI slot that displays at most one asset.
///
/// Showing a new asset releases the previous one; dropping the slot (view
/// unmount) releases whatever it still holds.
#[derive(Debug, Default)]
pub struct PlaybackSlot {
    current: Option<AudioAsset>,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, asset: AudioAsset) -> &AudioAsset {
        if let Some(previous) = self.current.take() {
            log::debug!("Replacing asset {} in playback slot", previous.id());
            previous.release();
        }
        self.current.insert(asset)
    }

    pub fn current(&self) -> Option<&AudioAsset> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.release();
        }
    }
}
