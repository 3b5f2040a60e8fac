use crate::models::MediaRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All media records whose capture timestamp falls in one calendar year,
/// stored as a single document. Kept sorted by `taken_at` descending after
/// every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shard {
    pub year: i32,
    #[serde(default)]
    pub records: Vec<MediaRecord>,
}

impl Shard {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    }

    pub fn find(&self, id: &str) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut MediaRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Insert keeping the descending order invariant.
    pub fn insert(&mut self, record: MediaRecord) {
        let position = self
            .records
            .partition_point(|r| r.taken_at > record.taken_at);
        self.records.insert(position, record);
    }

    pub fn remove(&mut self, id: &str) -> Option<MediaRecord> {
        let position = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(position))
    }
}

/// Auxiliary document recording which years currently have a non-empty
/// shard. The total count is a cached hint, refreshed only on explicit
/// recount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardIndex {
    /// Sorted descending.
    pub years: Vec<i32>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_media: Option<u64>,
}

impl Default for ShardIndex {
    fn default() -> Self {
        Self {
            years: Vec::new(),
            updated_at: Utc::now(),
            total_media: None,
        }
    }
}

impl ShardIndex {
    pub fn contains(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    /// Idempotent insert keeping descending order.
    pub fn add_year(&mut self, year: i32) {
        if !self.years.contains(&year) {
            let position = self.years.partition_point(|y| *y > year);
            self.years.insert(position, year);
        }
        self.updated_at = Utc::now();
    }

    /// Idempotent removal.
    pub fn remove_year(&mut self, year: i32) {
        self.years.retain(|y| *y != year);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record_taken;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_insert_keeps_descending_order() {
        let mut shard = Shard::empty(2024);
        shard.insert(record_taken(2024, 3, 10));
        shard.insert(record_taken(2024, 7, 1));
        shard.insert(record_taken(2024, 1, 5));

        let months: Vec<u32> = shard.records.iter().map(|r| r.taken_at.month()).collect();
        assert_eq!(months, vec![7, 3, 1]);
    }

    #[test]
    fn test_sort_restores_invariant() {
        let mut shard = Shard::empty(2024);
        shard.records.push(record_taken(2024, 1, 1));
        shard.records.push(record_taken(2024, 6, 1));
        shard.sort();
        assert!(shard.records[0].taken_at > shard.records[1].taken_at);
    }

    #[test]
    fn test_remove_returns_record() {
        let mut shard = Shard::empty(2024);
        let record = record_taken(2024, 5, 5);
        let id = record.id.clone();
        shard.insert(record);

        let removed = shard.remove(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(shard.is_empty());
        assert!(shard.remove(&id).is_none());
    }

    #[test]
    fn test_index_add_idempotent_descending() {
        let mut index = ShardIndex::default();
        index.add_year(2022);
        index.add_year(2024);
        index.add_year(2023);
        index.add_year(2024);
        assert_eq!(index.years, vec![2024, 2023, 2022]);
    }

    #[test]
    fn test_index_remove_idempotent() {
        let mut index = ShardIndex::default();
        index.add_year(2024);
        index.remove_year(2024);
        index.remove_year(2024);
        assert!(index.years.is_empty());
    }

    #[test]
    fn test_index_updated_at_advances() {
        let mut index = ShardIndex {
            years: vec![],
            updated_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            total_media: None,
        };
        index.add_year(2024);
        assert!(index.updated_at.year() > 2020);
    }
}
