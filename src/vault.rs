use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::dedup::{DuplicateDetector, DuplicateMatch};
use crate::engine::{
    advanced_search, analytics, is_accessible, query_accessible, AdvancedSearchParams,
    AnalyticsReport, QueryFilters,
};
use crate::error::{CoreError, CoreResult};
use crate::models::{
    normalize_labels, DateInfo, MediaRecord, Shard, ShardIndex, UserPermissions, Visibility,
};
use crate::store::{
    create_pool, DocumentStore, IndexManager, RetryPolicy, ScanMode, ShardCache, ShardStore,
    SqliteDocumentStore, with_retry,
};

/// Partial edit of a media record. Absent fields are left untouched.
/// Changing `taken_at` across a year boundary migrates the record between
/// shards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPatch {
    pub filename: Option<String>,
    pub taken_at: Option<chrono::DateTime<chrono::Utc>>,
    pub date_info: Option<DateInfo>,
    pub tags: Option<Vec<String>>,
    pub subjects: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub allowed_users: Option<Vec<String>>,
    pub restricted_users: Option<Vec<String>>,
    pub thumbnail_path: Option<Option<String>>,
    pub camera: Option<String>,
}

/// Per-id result of a bulk mutation: how many records changed and which
/// ids were not found in any indexed shard.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub requested: usize,
    pub updated: usize,
    pub missing: Vec<String>,
}

/// The metadata core's front door: year-sharded persistence, index
/// maintenance, duplicate detection, and permission-aware queries behind
/// one handle. Callers are request handlers (upload finalize, edits, bulk
/// admin tools, gallery views).
pub struct MediaVault {
    shards: ShardStore,
    index: IndexManager,
    cache: Mutex<ShardCache>,
    retry: RetryPolicy,
    scan_mode: ScanMode,
    default_duplicate_window: u32,
}

impl MediaVault {
    /// Open (or create) the SQLite-backed vault at the configured path.
    pub fn open(config: &Config) -> CoreResult<Self> {
        let pool = create_pool(Path::new(&config.storage.database_path), config.storage.pool_size)?;
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(pool));
        Ok(Self::with_store(store, config))
    }

    /// Build over any document store implementation. Used by tests and by
    /// deployments with their own persistence substrate.
    pub fn with_store(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            shards: ShardStore::new(store.clone()),
            index: IndexManager::new(store),
            cache: Mutex::new(ShardCache::new(config.cache.enabled, config.cache.ttl_seconds)),
            retry: RetryPolicy::from(&config.retry),
            scan_mode: ScanMode::Index,
            default_duplicate_window: config.duplicates.window_years,
        }
    }

    /// Degraded-mode constructor: enumerate candidate years by bounded scan
    /// instead of trusting the index. For recovery tooling only.
    pub fn with_scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    // ---- shard-level entry points -------------------------------------

    pub fn get_shard(&self, year: i32) -> CoreResult<Shard> {
        {
            let mut cache = self.lock_cache();
            cache.evict_expired();
            if let Some(shard) = cache.get(year) {
                return Ok(shard);
            }
        }

        let shard = with_retry(self.retry, "read shard", || self.shards.read(year))?;
        self.lock_cache().put(shard.clone());
        Ok(shard)
    }

    /// Read-mutate-write on one year shard, keeping the index in step: the
    /// year is indexed while the shard is non-empty and dropped the moment
    /// it empties.
    pub fn update_shard<F>(&self, year: i32, mut mutator: F) -> CoreResult<Shard>
    where
        F: FnMut(Shard) -> CoreResult<Shard>,
    {
        let shard = with_retry(self.retry, "update shard", || {
            self.shards.update(year, &mut mutator)
        })?;
        self.lock_cache().invalidate(year);

        if shard.is_empty() {
            self.remove_year_from_index(year)?;
        } else {
            self.add_year_to_index(year)?;
        }
        Ok(shard)
    }

    pub fn add_year_to_index(&self, year: i32) -> CoreResult<()> {
        with_retry(self.retry, "add year to index", || self.index.add_year(year))
    }

    pub fn remove_year_from_index(&self, year: i32) -> CoreResult<()> {
        with_retry(self.retry, "remove year from index", || {
            self.index.remove_year(year)
        })
    }

    pub fn index_snapshot(&self) -> CoreResult<ShardIndex> {
        with_retry(self.retry, "read index", || self.index.read())
    }

    /// Recompute the cached total record count. O(number of shards);
    /// called after bulk mutations.
    pub fn recount(&self) -> CoreResult<u64> {
        with_retry(self.retry, "recount index", || {
            self.index.recount(&self.shards)
        })
    }

    // ---- record-level entry points ------------------------------------

    /// Persist a freshly confirmed upload. Tags and subjects are
    /// re-normalized so the lowercase invariant holds regardless of what
    /// the caller built.
    pub fn add_media(&self, mut record: MediaRecord) -> CoreResult<MediaRecord> {
        if record.filename.trim().is_empty() {
            return Err(CoreError::Validation("filename must not be empty".to_string()));
        }
        if record.uploaded_by.trim().is_empty() {
            return Err(CoreError::Validation("uploadedBy must not be empty".to_string()));
        }

        record.tags = normalize_labels(&record.tags);
        record.subjects = normalize_labels(&record.subjects);

        let year = record.shard_year();
        let stored = record.clone();
        self.update_shard(year, move |mut shard| {
            if shard.find(&stored.id).is_some() {
                return Err(CoreError::Validation(format!(
                    "record {} already exists in shard {}",
                    stored.id, year
                )));
            }
            shard.insert(stored.clone());
            Ok(shard)
        })?;

        info!("added media {} to shard {}", record.id, year);
        Ok(record)
    }

    /// Fetch one record with the access check applied. A missing id is
    /// NotFound; an existing but invisible record is AccessDenied. The two
    /// must stay distinct for callers that are not security-sensitive;
    /// security-sensitive callers collapse them before answering.
    pub fn get_media(&self, user: &UserPermissions, id: &str) -> CoreResult<MediaRecord> {
        let (_, record) = self.locate(id)?;
        if !is_accessible(user, &record) {
            return Err(CoreError::AccessDenied(format!("no access to record {}", id)));
        }
        Ok(record)
    }

    /// Apply a partial edit. A `taken_at` change across a year boundary is
    /// a migration: the record is inserted into the destination shard
    /// before being removed from the source, and the index is updated for
    /// both years.
    pub fn update_media(&self, id: &str, patch: &MediaPatch) -> CoreResult<MediaRecord> {
        let (current_year, mut record) = self.locate(id)?;
        apply_patch(&mut record, patch);
        let new_year = record.shard_year();

        if new_year == current_year {
            let updated = record.clone();
            self.update_shard(current_year, move |mut shard| {
                shard.remove(&updated.id);
                shard.insert(updated.clone());
                Ok(shard)
            })?;
            return Ok(record);
        }

        // Cross-year migration. Destination first: a failure between the
        // two steps leaves a transient duplicate rather than a lost record.
        let migrated = record.clone();
        self.update_shard(new_year, move |mut shard| {
            shard.remove(&migrated.id);
            shard.insert(migrated.clone());
            Ok(shard)
        })?;
        let removed_id = record.id.clone();
        self.update_shard(current_year, move |mut shard| {
            shard.remove(&removed_id);
            Ok(shard)
        })?;

        info!(
            "migrated media {} from shard {} to shard {}",
            record.id, current_year, new_year
        );
        Ok(record)
    }

    pub fn delete_media(&self, id: &str) -> CoreResult<()> {
        let (year, _) = self.locate(id)?;
        let removed_id = id.to_string();
        self.update_shard(year, move |mut shard| {
            shard.remove(&removed_id);
            Ok(shard)
        })?;
        info!("deleted media {} from shard {}", id, year);
        Ok(())
    }

    // ---- bulk operations ----------------------------------------------

    pub fn bulk_add_tags(&self, ids: &[String], tags: &[String]) -> CoreResult<BulkOutcome> {
        let tags = normalize_labels(tags);
        if tags.is_empty() {
            return Err(CoreError::Validation("no tags supplied".to_string()));
        }
        self.bulk_mutate(ids, |record| record.add_tags(&tags))
    }

    pub fn bulk_remove_tags(&self, ids: &[String], tags: &[String]) -> CoreResult<BulkOutcome> {
        let tags = normalize_labels(tags);
        if tags.is_empty() {
            return Err(CoreError::Validation("no tags supplied".to_string()));
        }
        self.bulk_mutate(ids, |record| record.remove_tags(&tags))
    }

    pub fn bulk_set_visibility(
        &self,
        ids: &[String],
        visibility: Visibility,
    ) -> CoreResult<BulkOutcome> {
        self.bulk_mutate(ids, |record| record.visibility = visibility)
    }

    pub fn bulk_delete(&self, ids: &[String]) -> CoreResult<BulkOutcome> {
        let mut outcome = BulkOutcome {
            requested: ids.len(),
            ..Default::default()
        };

        for id in ids {
            match self.delete_media(id) {
                Ok(()) => outcome.updated += 1,
                Err(CoreError::NotFound(_)) => outcome.missing.push(id.clone()),
                Err(e) => return Err(e),
            }
        }

        self.recount()?;
        Ok(outcome)
    }

    // ---- query entry points -------------------------------------------

    /// Permission-aware gallery query across all candidate years. Years
    /// whose shard cannot be read degrade the result (logged) instead of
    /// failing it.
    pub fn query(
        &self,
        user: &UserPermissions,
        filters: &QueryFilters,
    ) -> CoreResult<Vec<MediaRecord>> {
        filters.validate()?;
        let candidates = self.load_candidates(filters.date_start, filters.date_end)?;
        query_accessible(user, &candidates, filters)
    }

    pub fn advanced_search(
        &self,
        user: &UserPermissions,
        params: &AdvancedSearchParams,
    ) -> CoreResult<Vec<MediaRecord>> {
        params.validate()?;
        let candidates = self.load_candidates(params.date_start, params.date_end)?;
        advanced_search(user, &candidates, params)
    }

    pub fn analytics(&self, user: &UserPermissions) -> CoreResult<AnalyticsReport> {
        let candidates = self.load_candidates(None, None)?;
        Ok(analytics(user, &candidates))
    }

    /// Windowed duplicate check; `window` overrides the configured default
    /// radius.
    pub fn find_duplicate(
        &self,
        content_hash: &str,
        target_year: i32,
        window: Option<u32>,
    ) -> CoreResult<Option<DuplicateMatch>> {
        let detector = DuplicateDetector::new(&self.shards, &self.index);
        detector.find_duplicate(
            content_hash,
            target_year,
            window.unwrap_or(self.default_duplicate_window),
        )
    }

    /// Full-index duplicate check, at O(total records) cost.
    pub fn find_duplicate_exhaustive(
        &self,
        content_hash: &str,
    ) -> CoreResult<Option<DuplicateMatch>> {
        let detector = DuplicateDetector::new(&self.shards, &self.index);
        detector.find_duplicate_exhaustive(content_hash)
    }

    // ---- internals -----------------------------------------------------

    /// Find which shard holds `id`, consulting the index first.
    fn locate(&self, id: &str) -> CoreResult<(i32, MediaRecord)> {
        let years = self.index.candidate_years(self.scan_mode)?;
        for year in years {
            let shard = match self.get_shard(year) {
                Ok(shard) => shard,
                Err(e) => {
                    warn!("locate: skipping unreadable shard {}: {}", year, e);
                    continue;
                }
            };
            if let Some(record) = shard.find(id) {
                return Ok((year, record.clone()));
            }
        }
        Err(CoreError::NotFound(format!("record {} not found", id)))
    }

    /// Materialize all candidate records, newest years first. A supplied
    /// date range prunes the years visited.
    fn load_candidates(
        &self,
        date_start: Option<chrono::DateTime<chrono::Utc>>,
        date_end: Option<chrono::DateTime<chrono::Utc>>,
    ) -> CoreResult<Vec<MediaRecord>> {
        use chrono::Datelike;

        let years = self.index.candidate_years(self.scan_mode)?;
        let mut records = Vec::new();

        for year in years {
            if let Some(start) = date_start {
                if year < start.year() {
                    continue;
                }
            }
            if let Some(end) = date_end {
                if year > end.year() {
                    continue;
                }
            }
            match self.get_shard(year) {
                Ok(shard) => records.extend(shard.records),
                Err(e) => {
                    warn!("query: skipping unreadable shard {}: {}", year, e);
                }
            }
        }
        Ok(records)
    }

    fn bulk_mutate<F>(&self, ids: &[String], mut mutate: F) -> CoreResult<BulkOutcome>
    where
        F: FnMut(&mut MediaRecord),
    {
        let mut outcome = BulkOutcome {
            requested: ids.len(),
            ..Default::default()
        };

        for id in ids {
            match self.locate(id) {
                Ok((year, _)) => {
                    let target = id.clone();
                    self.update_shard(year, |mut shard| {
                        if let Some(record) = shard.find_mut(&target) {
                            mutate(record);
                        }
                        Ok(shard)
                    })?;
                    outcome.updated += 1;
                }
                Err(CoreError::NotFound(_)) => outcome.missing.push(id.clone()),
                Err(e) => return Err(e),
            }
        }

        self.recount()?;
        Ok(outcome)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ShardCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn apply_patch(record: &mut MediaRecord, patch: &MediaPatch) {
    if let Some(filename) = &patch.filename {
        record.filename = filename.clone();
    }
    if let Some(taken_at) = patch.taken_at {
        record.taken_at = taken_at;
    }
    if let Some(date_info) = patch.date_info {
        record.date_info = date_info;
    }
    if let Some(tags) = &patch.tags {
        record.set_tags(tags);
    }
    if let Some(subjects) = &patch.subjects {
        record.set_subjects(subjects);
    }
    if let Some(visibility) = patch.visibility {
        record.visibility = visibility;
    }
    if let Some(allowed) = &patch.allowed_users {
        record.allowed_users = allowed.clone();
    }
    if let Some(restricted) = &patch.restricted_users {
        record.restricted_users = restricted.clone();
    }
    if let Some(thumbnail) = &patch.thumbnail_path {
        record.thumbnail_path = thumbnail.clone();
    }
    if let Some(camera) = &patch.camera {
        record.metadata.camera = Some(camera.clone());
    }
}
