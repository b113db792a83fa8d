//! Bounded cache of child arrays.
//!
//! [`ChildrenCache`] remembers the full, ordered child list of recently
//! visited parents so a proxy can answer `child_count` and `child` in O(1)
//! after the first miss. The number of cached *parents* is bounded, not the
//! total number of children; the least recently used parent is evicted
//! first. Lists whose length falls outside the configured thresholds are
//! computed every time and never stored.
//!
//! # Example
//! ```
//! use hugetree::model::{CacheConfig, ChildrenCache, ItemHandle, ModelId};
//!
//! let cache = ChildrenCache::new(CacheConfig::default());
//! let parent = ItemHandle::root(ModelId::next());
//!
//! let first = cache.get_or_compute(parent, |out| out.push(ItemHandle::invalid()));
//! let second = cache.get_or_compute(parent, |_| unreachable!());
//! assert_eq!(first, second);
//!
//! let stats = cache.stats();
//! assert_eq!(stats.hits, 1);
//! assert_eq!(stats.misses, 1);
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;

use hugetree_core::logging::targets;
use hugetree_core::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;

use super::handle::ItemHandle;

/// Default number of cached parents.
pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Default lower bound on the length of a cached child list. Leaves are
/// never stored, so they cannot evict the parents worth keeping.
pub const DEFAULT_MIN_CHILDREN: u32 = 1;

/// Default upper bound on the length of a cached child list.
pub const DEFAULT_MAX_CHILDREN: u32 = 1 << 20;

/// Sizing of a [`ChildrenCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
    /// Whether child lists are stored at all.
    pub enabled: bool,
    /// Maximum number of cached parents.
    pub max_entries: usize,
    /// Child lists shorter than this are not stored.
    pub min_children: u32,
    /// Child lists longer than this are not stored.
    pub max_children: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            min_children: DEFAULT_MIN_CHILDREN,
            max_children: DEFAULT_MAX_CHILDREN,
        }
    }
}

impl CacheConfig {
    /// A configuration that never stores anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Only store child lists with a length in `min..=max`.
    pub fn with_thresholds(mut self, min: u32, max: u32) -> Self {
        self.min_children = min;
        self.max_children = max;
        self
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_entries == 0 {
            return Err(Error::invalid_config(
                "max_entries",
                "must be greater than zero",
            ));
        }
        if self.min_children > self.max_children {
            return Err(Error::invalid_config(
                "min_children",
                format!(
                    "{} exceeds max_children ({})",
                    self.min_children, self.max_children
                ),
            ));
        }
        Ok(())
    }

    /// Whether a child list of `len` entries may be stored.
    pub fn admits(&self, len: usize) -> bool {
        self.enabled
            && len >= self.min_children as usize
            && len <= self.max_children as usize
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses whose result was not stored because of the length thresholds.
    pub bypassed: u64,
    /// Current number of cached parents.
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner {
    entries: Option<LruCache<ItemHandle, Arc<[ItemHandle]>>>,
    hits: u64,
    misses: u64,
    bypassed: u64,
}

/// LRU cache from a parent handle to its ordered children.
pub struct ChildrenCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl std::fmt::Debug for ChildrenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildrenCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for ChildrenCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ChildrenCache {
    /// Creates a cache, falling back to a disabled cache if `config` does
    /// not validate.
    pub fn new(config: CacheConfig) -> Self {
        match Self::try_new(config) {
            Ok(cache) => cache,
            Err(err) => {
                tracing::warn!(target: targets::CACHE, %err, "caching disabled");
                Self::build(CacheConfig::disabled())
            }
        }
    }

    /// Creates a cache, rejecting an invalid `config`.
    pub fn try_new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CacheConfig) -> Self {
        let entries = NonZeroUsize::new(config.max_entries)
            .filter(|_| config.enabled)
            .map(LruCache::new);
        Self {
            config,
            inner: Mutex::new(CacheInner {
                entries,
                hits: 0,
                misses: 0,
                bypassed: 0,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached children of `parent`, or computes them with
    /// `compute` and stores the result if its length is admitted.
    ///
    /// The lock is not held while `compute` runs.
    pub fn get_or_compute<F>(&self, parent: ItemHandle, compute: F) -> Arc<[ItemHandle]>
    where
        F: FnOnce(&mut Vec<ItemHandle>),
    {
        {
            let mut inner = self.inner.lock();
            if let Some(children) = inner.entries.as_mut().and_then(|e| e.get(&parent)) {
                let children = Arc::clone(children);
                inner.hits += 1;
                tracing::trace!(target: targets::CACHE, ?parent, "hit");
                return children;
            }
            inner.misses += 1;
        }

        let mut out = Vec::new();
        compute(&mut out);
        let children: Arc<[ItemHandle]> = out.into();

        let mut inner = self.inner.lock();
        if !self.config.admits(children.len()) {
            inner.bypassed += 1;
            tracing::trace!(target: targets::CACHE, ?parent, len = children.len(), "bypass");
            return children;
        }
        if let Some(entries) = inner.entries.as_mut() {
            if let Some((evicted, _)) = entries.push(parent, Arc::clone(&children))
                && evicted != parent
            {
                tracing::trace!(target: targets::CACHE, ?evicted, "evict");
            }
            tracing::trace!(target: targets::CACHE, ?parent, len = children.len(), "insert");
        }
        children
    }

    /// Returns `true` if the children of `parent` are cached.
    ///
    /// Does not update the LRU order.
    pub fn contains(&self, parent: ItemHandle) -> bool {
        self.inner
            .lock()
            .entries
            .as_ref()
            .is_some_and(|e| e.contains(&parent))
    }

    /// Drops every cached child list.
    pub fn clear(&self, reason: &'static str) {
        let mut inner = self.inner.lock();
        if let Some(entries) = inner.entries.as_mut() {
            let dropped = entries.len();
            entries.clear();
            tracing::debug!(target: targets::CACHE, reason, dropped, "cache invalidated");
        }
    }

    pub fn reset_stats(&self) {
        let mut inner = self.inner.lock();
        inner.hits = 0;
        inner.misses = 0;
        inner.bypassed = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            bypassed: inner.bypassed,
            entries: inner.entries.as_ref().map_or(0, |e| e.len()),
            capacity: inner.entries.as_ref().map_or(0, |e| e.cap().get()),
        }
    }
}
