use crate::models::Shard;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Read cache for year shards, owned and evicted by its caller. There are
/// no background sweeps; the owner calls `evict_expired` on its own
/// schedule (the vault does so on each access).
#[derive(Debug)]
pub struct ShardCache {
    enabled: bool,
    ttl: Duration,
    entries: HashMap<i32, CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    shard: Shard,
    cached_at: DateTime<Utc>,
}

impl ShardCache {
    pub fn new(enabled: bool, ttl_seconds: i64) -> Self {
        Self {
            enabled,
            ttl: Duration::seconds(ttl_seconds.max(0)),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, year: i32) -> Option<Shard> {
        if !self.enabled {
            return None;
        }
        let entry = self.entries.get(&year)?;
        if Utc::now() - entry.cached_at > self.ttl {
            return None;
        }
        Some(entry.shard.clone())
    }

    pub fn put(&mut self, shard: Shard) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            shard.year,
            CacheEntry {
                shard,
                cached_at: Utc::now(),
            },
        );
    }

    /// Mutations invalidate the year they touched.
    pub fn invalidate(&mut self, year: i32) {
        self.entries.remove(&year);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owner-driven eviction pass.
    pub fn evict_expired(&mut self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.cached_at <= ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
