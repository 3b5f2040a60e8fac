use crate::constants::TOP_TAGS_LIMIT;
use crate::engine::is_accessible;
use crate::models::{MediaRecord, MediaType, UserPermissions, Visibility};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Aggregates over the subset of `candidates` the user may see. Computed
/// entirely in memory; the caller decides which shards feed it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total: u64,
    pub by_visibility: BTreeMap<Visibility, u64>,
    pub by_year: BTreeMap<i32, u64>,
    pub photos: u64,
    pub videos: u64,
    pub top_tags: Vec<TagCount>,
    /// Count of accessible records uploaded by the querying user.
    pub uploaded_by_user: u64,
}

pub fn analytics(user: &UserPermissions, candidates: &[MediaRecord]) -> AnalyticsReport {
    let mut by_visibility: BTreeMap<Visibility, u64> = BTreeMap::new();
    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    // first-seen order breaks frequency ties deterministically
    let mut tag_counts: IndexMap<String, u64> = IndexMap::new();
    let mut photos = 0u64;
    let mut videos = 0u64;
    let mut uploaded_by_user = 0u64;
    let mut total = 0u64;

    for record in candidates.iter().filter(|r| is_accessible(user, r)) {
        total += 1;
        *by_visibility.entry(record.visibility).or_insert(0) += 1;
        *by_year.entry(record.shard_year()).or_insert(0) += 1;
        match record.media_type {
            MediaType::Photo => photos += 1,
            MediaType::Video => videos += 1,
        }
        if record.uploaded_by == user.user_id {
            uploaded_by_user += 1;
        }
        for tag in &record.tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    let mut top_tags: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count));
    top_tags.truncate(TOP_TAGS_LIMIT);

    AnalyticsReport {
        total,
        by_visibility,
        by_year,
        photos,
        videos,
        top_tags,
        uploaded_by_user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::test_utils::{record_taken, user_with_role};

    #[test]
    fn test_counts_by_visibility_year_and_type() {
        let mut a = record_taken(2023, 5, 1);
        a.visibility = Visibility::Public;
        let mut b = record_taken(2024, 5, 1);
        b.visibility = Visibility::Family;
        let mut c = record_taken(2024, 6, 1);
        c.visibility = Visibility::Family;
        c.media_type = MediaType::Video;

        let user = user_with_role("u1", Role::Admin);
        let report = analytics(&user, &[a, b, c]);

        assert_eq!(report.total, 3);
        assert_eq!(report.by_visibility[&Visibility::Public], 1);
        assert_eq!(report.by_visibility[&Visibility::Family], 2);
        assert_eq!(report.by_year[&2023], 1);
        assert_eq!(report.by_year[&2024], 2);
        assert_eq!(report.photos, 2);
        assert_eq!(report.videos, 1);
    }

    #[test]
    fn test_inaccessible_records_excluded() {
        let mut hidden = record_taken(2024, 1, 1);
        hidden.visibility = Visibility::Private;
        let mut visible = record_taken(2024, 2, 1);
        visible.visibility = Visibility::Public;

        let user = user_with_role("u1", Role::Guest);
        let report = analytics(&user, &[hidden, visible]);
        assert_eq!(report.total, 1);
        assert!(report.by_visibility.get(&Visibility::Private).is_none());
    }

    #[test]
    fn test_top_tags_limited_and_ordered_by_frequency() {
        let mut records = Vec::new();
        for i in 0..12u32 {
            let mut record = record_taken(2024, 3, (i % 27) + 1);
            let mut tags = vec![format!("tag{}", i)];
            if i < 5 {
                tags.push("common".to_string());
            }
            record.set_tags(&tags);
            records.push(record);
        }

        let user = user_with_role("u1", Role::Admin);
        let report = analytics(&user, &records);

        assert_eq!(report.top_tags.len(), 10);
        assert_eq!(report.top_tags[0].tag, "common");
        assert_eq!(report.top_tags[0].count, 5);
    }

    #[test]
    fn test_uploaded_by_user_counts_only_own() {
        let mut own = record_taken(2024, 4, 1);
        own.uploaded_by = "me".to_string();
        own.visibility = Visibility::Public;
        let mut other = record_taken(2024, 5, 1);
        other.uploaded_by = "someone-else".to_string();
        other.visibility = Visibility::Public;

        let user = user_with_role("me", Role::Family);
        let report = analytics(&user, &[own, other]);
        assert_eq!(report.uploaded_by_user, 1);
    }
}
