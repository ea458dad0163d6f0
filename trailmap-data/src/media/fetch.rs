use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use futures_util::{StreamExt, stream};
use log::{debug, info, warn};
use serde_json::Value;
use trailmap_core::{Feature, LayerName};

use super::cache::CacheSlot;
use super::{AssetOutcome, MediaAsset, MediaAssetError, MediaCache, MediaTransport, split_links};

/// Property holding media links in converted exports.
pub const DEFAULT_MEDIA_PROPERTY: &str = "media_links";

/// Directory, relative to the output directory, that stores media.
pub const DEFAULT_MEDIA_DIR: &str = "media";

/// Default number of concurrent downloads.
pub const DEFAULT_MEDIA_WORKERS: usize = 4;

/// Where and how media is localised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSettings {
    /// Property holding the links.
    pub property: String,
    /// Media directory relative to the output directory.
    pub media_dir: Utf8PathBuf,
    /// Maximum concurrent downloads.
    pub workers: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            property: DEFAULT_MEDIA_PROPERTY.to_owned(),
            media_dir: Utf8PathBuf::from(DEFAULT_MEDIA_DIR),
            workers: DEFAULT_MEDIA_WORKERS,
        }
    }
}

impl MediaSettings {
    /// Read links from `property`.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    /// Store media under `media_dir`, relative to the output directory.
    #[must_use]
    pub fn with_media_dir(mut self, media_dir: impl Into<Utf8PathBuf>) -> Self {
        self.media_dir = media_dir.into();
        self
    }

    /// Allow at most `workers` downloads in flight. Zero is treated as one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Counters describing one media pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaReport {
    /// URL references found across all features.
    pub referenced: usize,
    /// Distinct URLs first seen during this pass.
    pub unique: usize,
    /// Assets downloaded.
    pub downloaded: usize,
    /// Assets found on disk from an earlier run.
    pub adopted: usize,
    /// References served from the cache without another lookup.
    pub reused: usize,
    /// Assets that could not be localised.
    pub failed: usize,
    /// Features whose media property was removed because every link failed.
    pub stripped_features: usize,
}

impl fmt::Display for MediaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} already on disk, {} reused, {} skipped",
            self.downloaded, self.adopted, self.reused, self.failed
        )
    }
}

/// Localises media links for one layer.
#[derive(Debug)]
pub struct MediaFetcher<'a, T: ?Sized> {
    transport: &'a T,
    cache: &'a MediaCache,
    settings: &'a MediaSettings,
    output_dir: &'a Utf8Path,
}

struct FeaturePlan {
    index: usize,
    slots: Vec<Arc<CacheSlot>>,
}

impl<'a, T: MediaTransport + ?Sized> MediaFetcher<'a, T> {
    /// Create a fetcher storing media beneath `output_dir`.
    #[must_use]
    pub const fn new(
        transport: &'a T,
        cache: &'a MediaCache,
        settings: &'a MediaSettings,
        output_dir: &'a Utf8Path,
    ) -> Self {
        Self {
            transport,
            cache,
            settings,
            output_dir,
        }
    }

    /// Download referenced media and rewrite the links property in place.
    ///
    /// Each feature's property becomes the space-joined local paths of the
    /// assets that succeeded, in link order. When none succeeded the
    /// property is removed. Other features are left untouched.
    pub async fn localize(&self, layer: &LayerName, features: &mut [Feature]) -> MediaReport {
        let mut report = MediaReport::default();
        let (plans, pending) = self.register(layer, features, &mut report);
        report.unique = pending.len();
        if !pending.is_empty() {
            info!(
                "fetching {} media assets for layer {layer} with {} workers",
                pending.len(),
                self.settings.workers
            );
        }

        stream::iter(pending.iter().cloned())
            .map(|slot| self.resolve(slot))
            .buffer_unordered(self.settings.workers.max(1))
            .collect::<Vec<()>>()
            .await;

        for slot in &pending {
            match slot.outcome_cell().get() {
                Some(AssetOutcome::Downloaded { .. }) => report.downloaded += 1,
                Some(AssetOutcome::Adopted) => report.adopted += 1,
                Some(AssetOutcome::Failed(_)) | None => report.failed += 1,
            }
        }

        for plan in plans {
            if let Some(feature) = features.get_mut(plan.index) {
                self.rewrite(feature, &plan.slots, &mut report);
            }
        }
        report
    }

    fn register(
        &self,
        layer: &LayerName,
        features: &[Feature],
        report: &mut MediaReport,
    ) -> (Vec<FeaturePlan>, Vec<Arc<CacheSlot>>) {
        let mut plans = Vec::new();
        let mut pending = Vec::new();
        for (index, feature) in features.iter().enumerate() {
            let Some(links) = feature.string_property(&self.settings.property) else {
                continue;
            };
            let mut slots = Vec::new();
            for url in split_links(links) {
                report.referenced += 1;
                let (slot, created) = self.cache.register(url, || {
                    MediaAsset::derive(url, layer, feature.position(), &self.settings.media_dir)
                });
                if created {
                    pending.push(Arc::clone(&slot));
                } else {
                    report.reused += 1;
                }
                slots.push(slot);
            }
            plans.push(FeaturePlan { index, slots });
        }
        (plans, pending)
    }

    async fn resolve(&self, slot: Arc<CacheSlot>) {
        slot.outcome_cell()
            .get_or_init(|| self.acquire(slot.asset()))
            .await;
    }

    async fn acquire(&self, asset: &MediaAsset) -> AssetOutcome {
        let target = self.output_dir.join(asset.relative_path());
        match trailmap_fs::path_is_file(&target) {
            Ok(true) => {
                debug!("media {} already stored at {target}", asset.url());
                return AssetOutcome::Adopted;
            }
            Ok(false) => {}
            Err(err) => warn!("could not inspect {target}, downloading again: {err}"),
        }

        let bytes = match self.transport.fetch(asset.url()).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let error = MediaAssetError::Transport { source };
                warn!("skipping media {}: {error}", asset.url());
                return AssetOutcome::Failed(error);
            }
        };
        if let Err(source) = trailmap_fs::write_atomically(&target, &bytes) {
            let error = MediaAssetError::Persist {
                url: asset.url().to_owned(),
                path: target,
                source,
            };
            warn!("skipping media {}: {error}", asset.url());
            return AssetOutcome::Failed(error);
        }
        debug!(
            "downloaded {} bytes from {} to {target}",
            bytes.len(),
            asset.url()
        );
        AssetOutcome::Downloaded { bytes: bytes.len() }
    }

    fn rewrite(&self, feature: &mut Feature, slots: &[Arc<CacheSlot>], report: &mut MediaReport) {
        let paths: Vec<&str> = slots
            .iter()
            .filter_map(|slot| slot.local_path())
            .map(Utf8Path::as_str)
            .collect();
        if paths.is_empty() {
            feature.remove_property(&self.settings.property);
            if !slots.is_empty() {
                report.stripped_features += 1;
            }
        } else {
            feature.set_property(self.settings.property.clone(), Value::from(paths.join(" ")));
        }
    }
}
