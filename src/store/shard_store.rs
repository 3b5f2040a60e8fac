use crate::error::CoreResult;
use crate::models::Shard;
use crate::store::{DocumentKey, DocumentStore};
use std::sync::Arc;

/// Year-keyed shard persistence over the abstract document store. Every
/// mutation re-sorts the shard by `taken_at` descending before persisting;
/// a shard mutated to empty has its document deleted.
pub struct ShardStore {
    store: Arc<dyn DocumentStore>,
}

impl ShardStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// A missing shard reads as an empty one; that is not an error.
    pub fn read(&self, year: i32) -> CoreResult<Shard> {
        match self.store.read(DocumentKey::Shard(year))? {
            Some(body) => {
                let shard: Shard = serde_json::from_str(&body)?;
                Ok(shard)
            }
            None => Ok(Shard::empty(year)),
        }
    }

    pub fn write(&self, year: i32, mut shard: Shard) -> CoreResult<()> {
        shard.sort();
        if shard.is_empty() {
            return self.store.delete(DocumentKey::Shard(year));
        }
        let body = serde_json::to_string(&shard)?;
        self.store.write(DocumentKey::Shard(year), &body)
    }

    /// Read-mutate-write in one substrate transaction. Returns the shard as
    /// persisted. The mutator may leave the shard empty; the document is
    /// then deleted rather than stored as an empty shell.
    pub fn update<F>(&self, year: i32, mut mutator: F) -> CoreResult<Shard>
    where
        F: FnMut(Shard) -> CoreResult<Shard>,
    {
        let mut result: Option<Shard> = None;
        self.store
            .update(DocumentKey::Shard(year), &mut |current| {
                let shard = match current {
                    Some(body) => serde_json::from_str(body)?,
                    None => Shard::empty(year),
                };
                let mut mutated = mutator(shard)?;
                mutated.sort();
                let body = if mutated.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&mutated)?)
                };
                result = Some(mutated);
                Ok(body)
            })?;

        result.ok_or_else(|| {
            crate::error::CoreError::Storage(format!("shard {} mutator did not run", year))
        })
    }
}
