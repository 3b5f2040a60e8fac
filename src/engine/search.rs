use crate::engine::{
    is_accessible, matches_date_range, matches_search, matches_tags, matches_visibility,
};
use crate::error::{CoreError, CoreResult};
use crate::models::{normalize_labels, MediaRecord, UserPermissions, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Advanced search parameters: everything `QueryFilters` offers plus a
/// camera-substring predicate and a GPS-presence predicate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchParams {
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visibility: Vec<Visibility>,
    pub camera: Option<String>,
    /// `Some(true)` keeps only records with both latitude and longitude;
    /// `Some(false)` keeps only records without a fix.
    pub has_gps: Option<bool>,
}

impl AdvancedSearchParams {
    pub fn validate(&self) -> CoreResult<()> {
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if start > end {
                return Err(CoreError::Validation(
                    "date range start is after end".to_string(),
                ));
            }
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation("empty tag in search".to_string()));
        }
        Ok(())
    }
}

/// Accessible-subset search with the advanced predicates, sorted by
/// `taken_at` descending.
pub fn advanced_search(
    user: &UserPermissions,
    candidates: &[MediaRecord],
    params: &AdvancedSearchParams,
) -> CoreResult<Vec<MediaRecord>> {
    params.validate()?;

    let wanted_tags = normalize_labels(&params.tags);
    let text = params.text.as_ref().map(|s| s.trim().to_lowercase());
    let camera = params.camera.as_ref().map(|s| s.trim().to_lowercase());

    let mut results: Vec<MediaRecord> = candidates
        .iter()
        .filter(|record| is_accessible(user, record))
        .filter(|record| matches_tags(record, &wanted_tags))
        .filter(|record| matches_date_range(record, params.date_start, params.date_end))
        .filter(|record| matches_visibility(record, &params.visibility))
        .filter(|record| match &text {
            Some(needle) => matches_search(record, needle),
            None => true,
        })
        .filter(|record| match &camera {
            Some(needle) => matches_camera(record, needle),
            None => true,
        })
        .filter(|record| match params.has_gps {
            Some(wanted) => record.has_gps() == wanted,
            None => true,
        })
        .cloned()
        .collect();

    results.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    Ok(results)
}

fn matches_camera(record: &MediaRecord, needle: &str) -> bool {
    match &record.metadata.camera {
        Some(camera) => camera.to_lowercase().contains(needle),
        None => false,
    }
}
