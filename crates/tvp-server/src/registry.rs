//! Process-wide slug state.
//!
//! [`SlugRegistry`] maps slugs to upstream URLs and is the source of truth for
//! every redirect and relay decision. [`SegmentBaseCache`] remembers, per slug,
//! the upstream directory its HLS segments live in. Both own their lock; no
//! lock is ever held across an await point or while another is taken.

use std::collections::HashMap;

use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// SlugRegistry
// ---------------------------------------------------------------------------

/// Thread-safe slug to upstream URL mapping.
///
/// Entries are never removed; they live until the process exits.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    entries: RwLock<HashMap<String, String>>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `batch` into the registry.
    ///
    /// Slugs in the batch are added or overwritten; slugs absent from the
    /// batch are left untouched. URLs are not validated. Returns the number
    /// of entries merged.
    pub fn register_batch(&self, batch: HashMap<String, String>) -> usize {
        let count = batch.len();
        self.entries.write().extend(batch);
        count
    }

    /// Upstream URL registered for `slug`.
    pub fn lookup(&self, slug: &str) -> Option<String> {
        self.entries.read().get(slug).cloned()
    }

    /// All entries, sorted by slug.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .entries
            .read()
            .iter()
            .map(|(slug, url)| (slug.clone(), url.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// SegmentBaseCache
// ---------------------------------------------------------------------------

/// Thread-safe slug to segment base URL mapping.
///
/// Populated lazily whenever a slug's manifest is resolved; every stored
/// value ends with `/`.
#[derive(Debug, Default)]
pub struct SegmentBaseCache {
    bases: RwLock<HashMap<String, String>>,
}

impl SegmentBaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the segment base from `manifest_url` and store it for `slug`.
    ///
    /// Overwrites any previous base for the slug. Returns the stored base, or
    /// `None` (leaving the cache unchanged) if no base can be derived.
    pub fn resolve_and_cache_base(&self, slug: &str, manifest_url: &str) -> Option<String> {
        let base = tvp_hls::segment_base(manifest_url)?;
        self.upsert(slug, base.clone());
        tracing::debug!(slug = %slug, base = %base, "Cached segment base");
        Some(base)
    }

    /// Store `base` for `slug`, appending `/` if it is missing.
    pub fn upsert(&self, slug: &str, base: String) {
        let base = if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        };
        self.bases.write().insert(slug.to_string(), base);
    }

    /// Segment base cached for `slug`.
    pub fn lookup(&self, slug: &str) -> Option<String> {
        self.bases.read().get(slug).cloned()
    }

    pub fn len(&self) -> usize {
        self.bases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.read().is_empty()
    }
}
