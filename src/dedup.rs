use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::CoreResult;
use crate::models::MediaRecord;
use crate::store::{IndexManager, ScanMode, ShardStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    pub existing_id: String,
    pub existing_filename: String,
    pub existing_date: DateTime<Utc>,
}

impl DuplicateMatch {
    fn from_record(record: &MediaRecord) -> Self {
        Self {
            existing_id: record.id.clone(),
            existing_filename: record.filename.clone(),
            existing_date: record.taken_at,
        }
    }
}

/// Content-hash lookup across a bounded window of year shards. The window
/// is a caller-controlled trade-off between cost and completeness; the
/// exhaustive variant walks every indexed year instead.
pub struct DuplicateDetector<'a> {
    shards: &'a ShardStore,
    index: &'a IndexManager,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(shards: &'a ShardStore, index: &'a IndexManager) -> Self {
        Self { shards, index }
    }

    /// Scans `target_year - window ..= target_year + window`, only touching
    /// years the index lists. Returns the first match. A record that exists
    /// outside the window is not found; that is the documented limitation
    /// of the bounded mode.
    pub fn find_duplicate(
        &self,
        content_hash: &str,
        target_year: i32,
        window: u32,
    ) -> CoreResult<Option<DuplicateMatch>> {
        let indexed = self.index.read()?.years;
        let radius = window as i32;
        let years = ((target_year - radius)..=(target_year + radius))
            .rev()
            .filter(|y| indexed.contains(y));

        self.scan_years(content_hash, years)
    }

    /// Full-index scan: exhaustive, O(total records), for explicit
    /// deep checks.
    pub fn find_duplicate_exhaustive(
        &self,
        content_hash: &str,
    ) -> CoreResult<Option<DuplicateMatch>> {
        let years = self.index.candidate_years(ScanMode::Index)?;
        self.scan_years(content_hash, years.into_iter())
    }

    fn scan_years(
        &self,
        content_hash: &str,
        years: impl Iterator<Item = i32>,
    ) -> CoreResult<Option<DuplicateMatch>> {
        for year in years {
            let shard = match self.shards.read(year) {
                Ok(shard) => shard,
                Err(e) => {
                    warn!("duplicate scan: skipping unreadable shard {}: {}", year, e);
                    continue;
                }
            };
            if let Some(record) = shard
                .records
                .iter()
                .find(|r| r.metadata.content_hash.as_deref() == Some(content_hash))
            {
                return Ok(Some(DuplicateMatch::from_record(record)));
            }
        }
        Ok(None)
    }
}
