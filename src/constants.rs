use once_cell::sync::Lazy;
use std::path::PathBuf;

pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("KEEPSAKE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/data"))
});

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("config.yaml"));
pub static DATABASE_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("metadata.sqlite"));

/// Storage document key for the year index.
pub const INDEX_KEY: &str = "index";

/// Storage document key prefix for year shards ("shard:2024").
pub const SHARD_KEY_PREFIX: &str = "shard:";

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 50;

/// Years scanned on each side of the target when looking for duplicates.
pub const DEFAULT_DUPLICATE_WINDOW: u32 = 1;

pub const DEFAULT_CACHE_TTL_SECONDS: i64 = 60;

/// Number of tags reported by analytics, ordered by frequency.
pub const TOP_TAGS_LIMIT: usize = 10;
