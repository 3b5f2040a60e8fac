use crate::error::CoreResult;
use crate::models::ShardIndex;
use crate::store::{DocumentKey, DocumentStore, ShardStore};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::warn;

/// How candidate years are enumerated for multi-shard reads.
///
/// The index is authoritative and is the default everywhere. The bounded
/// fallback exists only for deliberately degraded operation (a rebuilt or
/// distrusted index); records outside its window are invisible to it, which
/// is an accepted loss of that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Index,
    BoundedFallback { radius: u32 },
}

/// Maintains the auxiliary index document: the set of years with a
/// non-empty shard, plus a cached total record count refreshed only on
/// explicit recount.
pub struct IndexManager {
    store: Arc<dyn DocumentStore>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn read(&self) -> CoreResult<ShardIndex> {
        match self.store.read(DocumentKey::Index)? {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Ok(ShardIndex::default()),
        }
    }

    /// Idempotent; keeps the year list sorted descending.
    pub fn add_year(&self, year: i32) -> CoreResult<()> {
        self.mutate(|index| index.add_year(year))
    }

    /// Idempotent removal.
    pub fn remove_year(&self, year: i32) -> CoreResult<()> {
        self.mutate(|index| index.remove_year(year))
    }

    /// Recompute the cached total by reading every indexed shard. O(number
    /// of shards); callers invoke it after bulk mutations, never on a
    /// timer. Unreadable shards are skipped with a warning and excluded
    /// from the total.
    pub fn recount(&self, shards: &ShardStore) -> CoreResult<u64> {
        let index = self.read()?;
        let mut total: u64 = 0;

        for year in &index.years {
            match shards.read(*year) {
                Ok(shard) => total += shard.len() as u64,
                Err(e) => {
                    warn!("recount: skipping unreadable shard {}: {}", year, e);
                }
            }
        }

        self.mutate(|index| {
            index.total_media = Some(total);
            index.updated_at = Utc::now();
        })?;
        Ok(total)
    }

    /// Candidate years for a multi-shard read, most recent first.
    pub fn candidate_years(&self, mode: ScanMode) -> CoreResult<Vec<i32>> {
        match mode {
            ScanMode::Index => Ok(self.read()?.years),
            ScanMode::BoundedFallback { radius } => {
                warn!(
                    "year enumeration running in degraded bounded-scan mode (±{} years)",
                    radius
                );
                let current = Utc::now().year();
                let radius = radius as i32;
                Ok(((current - radius)..=(current + radius)).rev().collect())
            }
        }
    }

    fn mutate<F>(&self, mut f: F) -> CoreResult<()>
    where
        F: FnMut(&mut ShardIndex),
    {
        self.store.update(DocumentKey::Index, &mut |current| {
            let mut index: ShardIndex = match current {
                Some(body) => serde_json::from_str(body)?,
                None => ShardIndex::default(),
            };
            f(&mut index);
            Ok(Some(serde_json::to_string(&index)?))
        })?;
        Ok(())
    }
}
