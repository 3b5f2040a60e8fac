use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Family,
    ExtendedFamily,
    Private,
}

/// Where a record's capture timestamp came from, and how much we trust it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateSource {
    Exif,
    Filename,
    FileCreation,
    UploadTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInfo {
    pub source: DateSource,
    pub confidence: DateConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub size: Option<i64>,
    pub content_hash: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<f64>,
    pub camera: Option<String>,
    pub gps_location: Option<GpsLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub filename: String,
    pub original_filename: String,
    pub path: String,
    pub media_type: MediaType,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    /// Capture timestamp: the shard partition key.
    pub taken_at: DateTime<Utc>,
    pub date_info: DateInfo,
    #[serde(default)]
    pub metadata: MediaMetadata,
    /// Stored lowercase; comparisons are case-insensitive by construction.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_users: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restricted_users: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
}

impl MediaRecord {
    /// Build a record for a confirmed upload. Tags and subjects are
    /// normalized here so every stored record satisfies the lowercase
    /// invariant from the start.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filename: impl Into<String>,
        original_filename: impl Into<String>,
        path: impl Into<String>,
        media_type: MediaType,
        uploaded_by: impl Into<String>,
        taken_at: DateTime<Utc>,
        date_info: DateInfo,
        visibility: Visibility,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.into(),
            original_filename: original_filename.into(),
            path: path.into(),
            media_type,
            uploaded_by: uploaded_by.into(),
            uploaded_at: Utc::now(),
            taken_at,
            date_info,
            metadata: MediaMetadata::default(),
            tags: Vec::new(),
            subjects: Vec::new(),
            visibility,
            allowed_users: Vec::new(),
            restricted_users: Vec::new(),
            thumbnail_path: None,
        }
    }

    /// Calendar year of the capture timestamp; decides which shard owns the
    /// record.
    pub fn shard_year(&self) -> i32 {
        self.taken_at.year()
    }

    pub fn set_tags(&mut self, tags: &[String]) {
        self.tags = normalize_labels(tags);
    }

    pub fn add_tags(&mut self, tags: &[String]) {
        for tag in normalize_labels(tags) {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    pub fn remove_tags(&mut self, tags: &[String]) {
        let removing = normalize_labels(tags);
        self.tags.retain(|t| !removing.contains(t));
    }

    pub fn set_subjects(&mut self, subjects: &[String]) {
        self.subjects = normalize_labels(subjects);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.trim().to_lowercase();
        self.tags.iter().any(|t| *t == needle)
    }

    pub fn has_gps(&self) -> bool {
        self.metadata.gps_location.is_some()
    }
}

/// Lowercase, trim, drop empties, deduplicate preserving first occurrence.
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let normalized = label.trim().to_lowercase();
        if !normalized.is_empty() && !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    out
}
