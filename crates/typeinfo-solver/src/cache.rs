//! Process-wide descriptor cache.
//!
//! Maps a raw type's identity to its as-declared descriptor. An entry lives
//! exactly as long as the raw type's loader: it never keeps the loader
//! reachable, and it is never evicted while the loader is loaded. Each entry
//! stores a detached copy of the descriptor, which names raw types weakly,
//! plus a weak handle to the last descriptor it handed out. A lookup shares
//! that handle while any caller holds it and otherwise rebuilds the
//! descriptor from the detached copy, so the resolver runs once per raw type.
//! Entries of unloaded loaders are swept opportunistically on insert.
//!
//! The descriptors of the foundational well-known types are pinned with
//! strong references when the cache is created.
//!
//! ## Concurrency
//!
//! Two threads missing on the same key may both run the builder. Only one
//! result is stored; the other thread gets the stored one back.

use crate::descriptor::{DetachedDescriptor, TypeDescriptor, WeakTypeDescriptor};
use crate::query_trace;
use crate::resolver::{TypeHandle, resolve};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};
use typeinfo_common::limits::{CACHE_SWEEP_INTERVAL, TYPE_CACHE_INITIAL_CAPACITY};
use typeinfo_host::{RawType, RawTypeKey, WeakRawType, well_known};

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries of unloaded raw types removed by sweeps.
    pub reclaimed: u64,
}

struct CacheEntry {
    raw: WeakRawType,
    detached: DetachedDescriptor,
    shared: WeakTypeDescriptor,
}

impl CacheEntry {
    fn new(raw: &RawType, descriptor: &TypeDescriptor) -> Self {
        Self {
            raw: raw.downgrade(),
            detached: descriptor.detach(),
            shared: descriptor.downgrade(),
        }
    }

    /// The descriptor a caller still holds, without rebuilding.
    fn shared(&self) -> Option<TypeDescriptor> {
        if !self.raw.is_live() {
            return None;
        }
        self.shared.upgrade()
    }

    /// The stored descriptor, rebuilt from the detached copy when no caller
    /// holds it. `None` once the raw type is unloaded.
    fn restore(&mut self) -> Option<TypeDescriptor> {
        if let Some(descriptor) = self.shared() {
            return Some(descriptor);
        }
        let descriptor = self.detached.attach()?;
        self.shared = descriptor.downgrade();
        Some(descriptor)
    }

    fn is_live(&self) -> bool {
        self.raw.is_live()
    }
}

pub struct TypeCache {
    entries: DashMap<RawTypeKey, CacheEntry, FxBuildHasher>,
    /// Foundational descriptors, fixed at construction.
    pinned: FxHashMap<RawTypeKey, TypeDescriptor>,
    inserts: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    reclaimed: AtomicU64,
}

impl TypeCache {
    /// A new cache with the foundational descriptors pinned.
    pub fn new() -> Self {
        let pinned = well_known()
            .foundational()
            .into_iter()
            .map(|raw| (raw.key(), resolve(&TypeHandle::class(raw), None)))
            .collect();
        Self {
            entries: DashMap::with_capacity_and_hasher(
                TYPE_CACHE_INITIAL_CAPACITY,
                FxBuildHasher,
            ),
            pinned,
            inserts: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
        }
    }

    /// The process-wide cache.
    pub fn global() -> &'static TypeCache {
        static GLOBAL: OnceLock<TypeCache> = OnceLock::new();
        GLOBAL.get_or_init(TypeCache::new)
    }

    /// The as-declared descriptor of `raw`, resolved without context on first
    /// access.
    pub fn get(&self, raw: &RawType) -> TypeDescriptor {
        self.get_or_build(raw, |raw| resolve(&TypeHandle::class(raw), None))
    }

    /// The cached descriptor of `raw`, or the one `builder` produces.
    ///
    /// `builder` runs outside any lock and must describe `raw` itself.
    pub fn get_or_build(
        &self,
        raw: &RawType,
        builder: impl FnOnce(&RawType) -> TypeDescriptor,
    ) -> TypeDescriptor {
        let key = raw.key();
        let query_id = query_trace::enabled().then(query_trace::next_query_id);

        if let Some(descriptor) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(raw_type = %raw, "type cache hit");
            if let Some(query_id) = query_id {
                query_trace::cache_lookup(query_id, raw, true);
            }
            return descriptor;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(raw_type = %raw, "type cache miss");
        if let Some(query_id) = query_id {
            query_trace::cache_lookup(query_id, raw, false);
        }

        let mut built = builder(raw);
        if built.raw_type() != raw {
            debug!(
                raw_type = %raw,
                built = %built,
                "cache builder described another type; resolving as declared"
            );
            built = resolve(&TypeHandle::class(raw), None);
        }

        let stored = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => match occupied.get_mut().restore() {
                Some(existing) => existing,
                None => {
                    debug!(raw_type = %raw, "replacing stale type cache entry");
                    occupied.insert(CacheEntry::new(raw, &built));
                    built
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(raw, &built));
                built
            }
        };

        let inserts = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts % CACHE_SWEEP_INTERVAL == 0 {
            self.sweep();
        }
        stored
    }

    fn lookup(&self, key: &RawTypeKey) -> Option<TypeDescriptor> {
        if let Some(descriptor) = self.pinned.get(key) {
            return Some(descriptor.clone());
        }
        if let Some(descriptor) = self.entries.get(key).and_then(|entry| entry.shared()) {
            return Some(descriptor);
        }
        self.entries
            .get_mut(key)
            .and_then(|mut entry| entry.restore())
    }

    /// Remove the entries of unloaded raw types now. Returns the number
    /// removed.
    pub fn reclaim(&self) -> usize {
        self.sweep()
    }

    fn sweep(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live();
            if !live {
                removed += 1;
            }
            live
        });
        self.reclaimed.fetch_add(removed as u64, Ordering::Relaxed);
        debug!(removed, remaining = self.entries.len(), "type cache sweep");
        removed
    }

    /// Stored entries, pinned ones included. Stale entries count until swept.
    pub fn len(&self) -> usize {
        self.pinned.len() + self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `raw` has a stored descriptor. True from the first lookup
    /// until the raw type's loader is unloaded.
    pub fn contains(&self, raw: &RawType) -> bool {
        let key = raw.key();
        self.pinned.contains_key(&key)
            || self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.is_live())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
        }
    }
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/cache_tests.rs"]
mod tests;
