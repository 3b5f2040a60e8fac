use crate::constants::{INDEX_KEY, SHARD_KEY_PREFIX};
use crate::error::CoreResult;
use std::fmt;

/// Key space of the persistence substrate: one document per year shard,
/// plus the index document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Shard(i32),
    Index,
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKey::Shard(year) => write!(f, "{}{}", SHARD_KEY_PREFIX, year),
            DocumentKey::Index => write!(f, "{}", INDEX_KEY),
        }
    }
}

/// Abstract key-document store. The real implementation may be a
/// filesystem, an embedded KV store, or a database; the core only relies on
/// this interface.
///
/// Implementations must be thread-safe; `update` must apply the mutator
/// atomically with respect to other `update` calls on the same key.
pub trait DocumentStore: Send + Sync {
    /// Missing documents read as `None`, not an error.
    fn read(&self, key: DocumentKey) -> CoreResult<Option<String>>;

    fn write(&self, key: DocumentKey, body: &str) -> CoreResult<()>;

    fn delete(&self, key: DocumentKey) -> CoreResult<()>;

    /// Read-mutate-write under a transaction. The mutator receives the
    /// current body (if any) and returns the replacement, or `None` to
    /// delete the document. Returns what the mutator produced.
    fn update(
        &self,
        key: DocumentKey,
        mutator: &mut dyn FnMut(Option<&str>) -> CoreResult<Option<String>>,
    ) -> CoreResult<Option<String>>;
}
