use crate::error::BucketError;
use crate::ledger::EntryId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Image categories captured for a tracked food entry.
///
/// The set is closed: service photographs the buffet tray, the served plate,
/// and the storage container, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    Buffet,
    Plate,
    Container,
}

impl ImageCategory {
    /// All categories in display order.
    pub const ALL: [ImageCategory; 3] = [
        ImageCategory::Buffet,
        ImageCategory::Plate,
        ImageCategory::Container,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Buffet => "buffet",
            ImageCategory::Plate => "plate",
            ImageCategory::Container => "container",
        }
    }
}

impl std::fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buffet" => Ok(ImageCategory::Buffet),
            "plate" => Ok(ImageCategory::Plate),
            "container" => Ok(ImageCategory::Container),
            other => Err(format!("unknown image category: {}", other)),
        }
    }
}

/// Opaque handle to a captured image, as returned by the camera surface.
///
/// The core never inspects or decodes the contents; it is stored and
/// displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three per-category image sequences for one tracked entry.
///
/// Each sequence is append-only and insertion order is significant: display
/// order equals capture order. The category set is closed, so this is a
/// fixed-field record rather than a keyed map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBucket {
    buffet: Vec<ArtifactRef>,
    plate: Vec<ArtifactRef>,
    container: Vec<ArtifactRef>,
}

impl ImageBucket {
    /// Images captured for one category, in capture order.
    pub fn images(&self, category: ImageCategory) -> &[ArtifactRef] {
        match category {
            ImageCategory::Buffet => &self.buffet,
            ImageCategory::Plate => &self.plate,
            ImageCategory::Container => &self.container,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffet.is_empty() && self.plate.is_empty() && self.container.is_empty()
    }

    /// Total number of images across all three categories.
    pub fn total_images(&self) -> usize {
        self.buffet.len() + self.plate.len() + self.container.len()
    }

    fn push(&mut self, category: ImageCategory, artifact: ArtifactRef) {
        match category {
            ImageCategory::Buffet => self.buffet.push(artifact),
            ImageCategory::Plate => self.plate.push(artifact),
            ImageCategory::Container => self.container.push(artifact),
        }
    }
}

/// Per-entry storage of captured image references.
///
/// Every entry added to the tracking ledger gets a bucket here before any
/// capture can target it. Writes are strict: appending to an id that was
/// never registered is a bug upstream and is refused rather than papered
/// over. Reads are tolerant: display code asking about a stale id gets an
/// empty bucket, never a crash.
pub struct ImageBucketStore {
    buckets: HashMap<EntryId, ImageBucket>,
    stats: BucketStoreStats,
}

/// Counters for bucket store activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketStoreStats {
    pub buckets_created: u64,
    pub images_appended: u64,
    pub appends_rejected: u64,
}

impl ImageBucketStore {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            stats: BucketStoreStats::default(),
        }
    }

    /// Create an empty bucket for the entry if one does not exist yet.
    ///
    /// Idempotent: calling this for an id that already has a bucket leaves
    /// the existing bucket (and any images in it) untouched.
    pub fn ensure_bucket(&mut self, entry_id: &EntryId) {
        if self.buckets.contains_key(entry_id) {
            trace!("Bucket for entry {} already exists", entry_id);
            return;
        }

        self.buckets.insert(entry_id.clone(), ImageBucket::default());
        self.stats.buckets_created += 1;
        debug!("Created empty image bucket for entry {}", entry_id);
    }

    /// Append a captured artifact to one category of an entry's bucket.
    ///
    /// Fails with `UnknownEntry` if the entry was never registered via
    /// `ensure_bucket`. That indicates a violated invariant in entry
    /// creation, so the write is refused instead of creating the bucket
    /// on the fly.
    pub fn append(
        &mut self,
        entry_id: &EntryId,
        category: ImageCategory,
        artifact: ArtifactRef,
    ) -> std::result::Result<(), BucketError> {
        let Some(bucket) = self.buckets.get_mut(entry_id) else {
            warn!(
                "Refusing append to unknown entry {} (category: {})",
                entry_id, category
            );
            self.stats.appends_rejected += 1;
            return Err(BucketError::UnknownEntry {
                entry_id: entry_id.to_string(),
            });
        };

        trace!(
            "Appending artifact {} to entry {} category {}",
            artifact,
            entry_id,
            category
        );
        bucket.push(category, artifact);
        self.stats.images_appended += 1;
        Ok(())
    }

    /// Snapshot of an entry's bucket.
    ///
    /// Returns an owned copy, so caller-side mutation never reaches internal
    /// state. Unknown ids yield an all-empty bucket: display code may hold
    /// stale ids and must not crash over them.
    pub fn get(&self, entry_id: &EntryId) -> ImageBucket {
        match self.buckets.get(entry_id) {
            Some(bucket) => bucket.clone(),
            None => {
                debug!("Bucket lookup for unknown entry {}, returning empty", entry_id);
                ImageBucket::default()
            }
        }
    }

    /// Whether a bucket has been registered for the entry.
    pub fn contains(&self, entry_id: &EntryId) -> bool {
        self.buckets.contains_key(entry_id)
    }

    /// Number of registered buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn stats(&self) -> &BucketStoreStats {
        &self.stats
    }
}

impl Default for ImageBucketStore {
    fn default() -> Self {
        Self::new()
    }
}
