use parking_lot::RwLock;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    key::{Fqid, Id},
    store::Generation,
};

/// (source record, relation field, owner)
pub type CacheKey = (Fqid, String, Option<Id>);

/// Memoized relation results, each valid only for the store and sequence it was computed at.
///
/// Any commit bumps the store sequence, so a stale entry is simply recomputed on its next read.
/// One cache may serve several stores; an entry computed against another store is a miss.
#[derive(Debug, Default)]
pub struct RelationCache {
    entries: RwLock<BTreeMap<CacheKey, (Generation, Vec<Fqid>)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RelationCache {
    pub fn new() -> RelationCache {
        RelationCache::default()
    }

    pub fn get(&self, key: &CacheKey, generation: Generation) -> Option<Vec<Fqid>> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some((stamp, related)) if *stamp == generation => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(related.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, generation: Generation, related: Vec<Fqid>) {
        self.entries.write().insert(key, (generation, related));
    }

    /// Drop every entry the same store computed before `generation`. Entries of other stores
    /// are kept.
    pub fn prune(&self, generation: Generation) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, (stamp, _)| {
            stamp.store != generation.store || stamp.sequence >= generation.sequence
        });
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
