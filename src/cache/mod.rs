use bevy::prelude::*;
use lru::LruCache;
use std::sync::{Arc, Mutex, MutexGuard};
use std::num::NonZeroUsize;
use crate::plot::{GridKey, HorizonGrid};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Resource, Default)]
pub struct PlotMetrics {
    pub grids_computed: u32,
    pub cache_hits: u32,
    pub last_compute_time_ms: u64,
}

/// Finished grids, shared as immutable snapshots.
#[derive(Resource, Clone)]
pub struct HorizonGridCache {
    cache: Arc<Mutex<LruCache<GridKey, Arc<HorizonGrid>>>>,
}

impl Default for HorizonGridCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HorizonGridCache {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    // A poisoned lock only means another thread panicked mid-insert; the
    // map itself is still usable.
    fn lock(&self) -> MutexGuard<'_, LruCache<GridKey, Arc<HorizonGrid>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &GridKey) -> Option<Arc<HorizonGrid>> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: GridKey, grid: Arc<HorizonGrid>) {
        self.lock().put(key, grid);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
