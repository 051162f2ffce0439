//! LRU cache for single-view page rasters

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::raster::RasterPlan;
use crate::source::Bitmap;

pub const DEFAULT_CAPACITY: usize = 8;

/// Cache key for rasterized pages
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RasterKey {
    /// 1-based page number
    pub page: usize,
    /// Display width in hundredths of a layout pixel
    pub display_width_centi: u32,
    /// Backing scale as millionths for stable hashing
    pub scale_millionths: u32,
}

impl RasterKey {
    #[must_use]
    pub fn from_plan(page: usize, plan: &RasterPlan) -> Self {
        Self {
            page,
            display_width_centi: (plan.display_width * 100.0) as u32,
            scale_millionths: (plan.backing_scale * 1_000_000.0) as u32,
        }
    }
}

pub struct RasterCache {
    cache: LruCache<RasterKey, Arc<Bitmap>>,
}

impl RasterCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached raster, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &RasterKey) -> Option<Arc<Bitmap>> {
        self.cache.get(key).cloned()
    }

    pub fn insert(&mut self, key: RasterKey, bitmap: Bitmap) -> Arc<Bitmap> {
        let bitmap = Arc::new(bitmap);
        self.cache.put(key, Arc::clone(&bitmap));
        bitmap
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(page: usize, width: u32) -> RasterKey {
        RasterKey {
            page,
            display_width_centi: width * 100,
            scale_millionths: 1_000_000,
        }
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let mut cache = RasterCache::new(2);
        cache.insert(key(1, 100), Bitmap::blank(1, 1));
        cache.insert(key(2, 100), Bitmap::blank(1, 1));
        assert!(cache.get(&key(1, 100)).is_some());
        cache.insert(key(3, 100), Bitmap::blank(1, 1));

        assert!(cache.get(&key(2, 100)).is_none());
        assert!(cache.get(&key(1, 100)).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn width_is_part_of_the_key() {
        let mut cache = RasterCache::default();
        cache.insert(key(1, 100), Bitmap::blank(1, 1));
        assert!(cache.get(&key(1, 200)).is_none());
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut cache = RasterCache::new(0);
        cache.insert(key(1, 100), Bitmap::blank(1, 1));
        assert_eq!(cache.len(), 1);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
