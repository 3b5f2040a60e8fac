use crate::engine::is_accessible;
use crate::error::{CoreError, CoreResult};
use crate::models::{normalize_labels, MediaRecord, UserPermissions, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filters applied on top of the accessibility check. All present filters
/// must pass. Evaluated as composed in-memory predicates; user-supplied
/// text never reaches a query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    /// AND semantics: every requested tag must be present.
    #[serde(default)]
    pub tags: Vec<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visibility: Vec<Visibility>,
    /// Case-insensitive substring over filename, original filename, tags,
    /// and camera.
    pub search: Option<String>,
}

impl QueryFilters {
    /// Rejected synchronously, before any storage is touched.
    pub fn validate(&self) -> CoreResult<()> {
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if start > end {
                return Err(CoreError::Validation(
                    "date range start is after end".to_string(),
                ));
            }
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation("empty tag in filter".to_string()));
        }
        if let Some(search) = &self.search {
            if search.trim().is_empty() {
                return Err(CoreError::Validation(
                    "search text must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Records visible to `user` that pass every supplied filter, sorted by
/// `taken_at` descending.
pub fn query_accessible(
    user: &UserPermissions,
    candidates: &[MediaRecord],
    filters: &QueryFilters,
) -> CoreResult<Vec<MediaRecord>> {
    filters.validate()?;

    let wanted_tags = normalize_labels(&filters.tags);
    let search = filters.search.as_ref().map(|s| s.trim().to_lowercase());

    let mut results: Vec<MediaRecord> = candidates
        .iter()
        .filter(|record| is_accessible(user, record))
        .filter(|record| matches_tags(record, &wanted_tags))
        .filter(|record| matches_date_range(record, filters.date_start, filters.date_end))
        .filter(|record| matches_visibility(record, &filters.visibility))
        .filter(|record| match &search {
            Some(needle) => matches_search(record, needle),
            None => true,
        })
        .cloned()
        .collect();

    results.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    Ok(results)
}

/// Every requested tag must be present on the record.
pub(crate) fn matches_tags(record: &MediaRecord, wanted: &[String]) -> bool {
    wanted.iter().all(|tag| record.tags.contains(tag))
}

/// Inclusive on both ends.
pub(crate) fn matches_date_range(
    record: &MediaRecord,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if let Some(start) = start {
        if record.taken_at < start {
            return false;
        }
    }
    if let Some(end) = end {
        if record.taken_at > end {
            return false;
        }
    }
    true
}

pub(crate) fn matches_visibility(record: &MediaRecord, wanted: &[Visibility]) -> bool {
    wanted.is_empty() || wanted.contains(&record.visibility)
}

/// `needle` is already lowercased by the caller.
pub(crate) fn matches_search(record: &MediaRecord, needle: &str) -> bool {
    if record.filename.to_lowercase().contains(needle)
        || record.original_filename.to_lowercase().contains(needle)
    {
        return true;
    }
    if record.tags.iter().any(|t| t.contains(needle)) {
        return true;
    }
    match &record.metadata.camera {
        Some(camera) => camera.to_lowercase().contains(needle),
        None => false,
    }
}
