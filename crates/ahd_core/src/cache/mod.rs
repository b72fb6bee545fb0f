//! Memoization of the derived dashboard view.
//!
//! The view only changes when a new response is applied or the filters change, so the key
//! is a SHA-256 over (applied generation, filters). Repeated renders within one poll cycle
//! reuse the cached view.

use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use crate::dashboard::{DashboardState, DashboardView};
use crate::filter::FilterCriteria;

struct CachedView {
    key: String,
    view: DashboardView,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cached: bool,
}

#[derive(Default)]
pub struct ViewCache {
    entry: Mutex<Option<CachedView>>,
    counters: Mutex<(u64, u64)>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cache key for a view of `generation` under `filters`.
pub fn compute_view_key(generation: u64, filters: &FilterCriteria) -> String {
    let mut hasher = Sha256::new();
    hasher.update(generation.to_be_bytes());
    // Serializing a plain struct of options and strings cannot fail.
    let filters_json = serde_json::to_vec(filters).unwrap_or_default();
    hasher.update(&filters_json);
    hex::encode(hasher.finalize())
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<DashboardView> {
        let entry = lock(&self.entry);
        let hit = entry
            .as_ref()
            .filter(|c| c.key == key)
            .map(|c| c.view.clone());
        let mut counters = lock(&self.counters);
        if hit.is_some() {
            counters.0 += 1;
        } else {
            counters.1 += 1;
        }
        hit
    }

    pub fn set(&self, key: String, view: DashboardView) {
        *lock(&self.entry) = Some(CachedView { key, view });
    }

    pub fn invalidate(&self) {
        *lock(&self.entry) = None;
    }

    /// Cached `state.view()`, recomputed only when the generation or filters changed.
    pub fn view_for(&self, state: &DashboardState) -> DashboardView {
        let key = compute_view_key(state.applied_generation(), state.filters());
        if let Some(view) = self.get(&key) {
            return view;
        }
        let view = state.view();
        self.set(key, view.clone());
        view
    }

    pub fn stats(&self) -> CacheStats {
        let (hits, misses) = *lock(&self.counters);
        CacheStats {
            hits,
            misses,
            cached: lock(&self.entry).is_some(),
        }
    }
}
