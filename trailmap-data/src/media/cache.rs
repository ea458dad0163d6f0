use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::OnceCell;

use super::{MediaAsset, MediaAssetError};

/// How a media asset was resolved.
#[derive(Debug)]
pub enum AssetOutcome {
    /// Fetched during this run.
    Downloaded {
        /// Size of the stored body.
        bytes: usize,
    },
    /// Already present on disk from an earlier run.
    Adopted,
    /// Could not be localised.
    Failed(MediaAssetError),
}

impl AssetOutcome {
    /// Whether the asset exists locally.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// One URL's entry in the cache. The outcome is resolved at most once.
#[derive(Debug)]
pub(crate) struct CacheSlot {
    asset: MediaAsset,
    outcome: OnceCell<AssetOutcome>,
}

impl CacheSlot {
    pub(crate) const fn asset(&self) -> &MediaAsset {
        &self.asset
    }

    pub(crate) const fn outcome_cell(&self) -> &OnceCell<AssetOutcome> {
        &self.outcome
    }

    /// Local path, once the asset has been resolved successfully.
    pub(crate) fn local_path(&self) -> Option<&Utf8Path> {
        self.outcome
            .get()
            .filter(|outcome| outcome.is_available())
            .map(|_| self.asset.relative_path())
    }
}

/// Deduplicates media by URL for the lifetime of one run.
///
/// Each URL is bound to the [`MediaAsset`] derived on first registration,
/// and its download outcome is resolved once even when several tasks await
/// it concurrently.
#[derive(Debug, Default)]
pub struct MediaCache {
    slots: Mutex<HashMap<String, Arc<CacheSlot>>>,
}

impl MediaCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the slot for `url`, creating it with `derive` if absent.
    ///
    /// The flag is `true` when the slot was created by this call.
    pub(crate) fn register<F>(&self, url: &str, derive: F) -> (Arc<CacheSlot>, bool)
    where
        F: FnOnce() -> MediaAsset,
    {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slots.get(url) {
            return (Arc::clone(existing), false);
        }
        let slot = Arc::new(CacheSlot {
            asset: derive(),
            outcome: OnceCell::new(),
        });
        slots.insert(url.to_owned(), Arc::clone(&slot));
        (slot, true)
    }

    /// Asset registered for `url`, if any.
    #[must_use]
    pub fn asset(&self, url: &str) -> Option<MediaAsset> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(url).map(|slot| slot.asset().clone())
    }

    /// Local path for `url` if it has been resolved successfully.
    #[must_use]
    pub fn local_path(&self, url: &str) -> Option<Utf8PathBuf> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(url)
            .and_then(|slot| slot.local_path().map(Utf8Path::to_path_buf))
    }

    /// Number of registered URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no URL has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
