use crate::error::{CoreError, CoreResult};
use crate::store::{get_connection, DbPool, DocumentKey, DocumentStore};
use rusqlite::{OptionalExtension, TransactionBehavior};

pub mod queries {
    pub const SELECT_BODY: &str = r#"
    SELECT body
      FROM documents
     WHERE key = ?
    "#;

    pub const UPSERT: &str = r#"
    INSERT INTO documents (key, body, updated_at)
    VALUES (?, ?, datetime('now'))
    ON CONFLICT (key) DO UPDATE
       SET body = excluded.body
         , updated_at = excluded.updated_at
    "#;

    pub const DELETE: &str = r#"
    DELETE FROM documents
     WHERE key = ?
    "#;
}

/// SQLite-backed document store. `update` takes an IMMEDIATE transaction so
/// concurrent read-modify-write cycles on the same key serialize instead of
/// losing a writer's change.
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn read(&self, key: DocumentKey) -> CoreResult<Option<String>> {
        let conn = get_connection(&self.pool)?;
        let body = conn
            .query_row(queries::SELECT_BODY, [key.to_string()], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(body)
    }

    fn write(&self, key: DocumentKey, body: &str) -> CoreResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(queries::UPSERT, rusqlite::params![key.to_string(), body])?;
        Ok(())
    }

    fn delete(&self, key: DocumentKey) -> CoreResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(queries::DELETE, [key.to_string()])?;
        Ok(())
    }

    fn update(
        &self,
        key: DocumentKey,
        mutator: &mut dyn FnMut(Option<&str>) -> CoreResult<Option<String>>,
    ) -> CoreResult<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(CoreError::Database)?;

        let key_text = key.to_string();
        let current: Option<String> = tx
            .query_row(queries::SELECT_BODY, [&key_text], |row| row.get(0))
            .optional()?;

        let next = mutator(current.as_deref())?;
        match &next {
            Some(body) => {
                tx.execute(queries::UPSERT, rusqlite::params![key_text, body])?;
            }
            None => {
                tx.execute(queries::DELETE, [&key_text])?;
            }
        }

        tx.commit()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_memory_pool;

    fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new(create_memory_pool().unwrap())
    }

    #[test]
    fn test_read_missing_is_none() {
        let store = store();
        assert!(store.read(DocumentKey::Shard(1999)).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let store = store();
        store.write(DocumentKey::Shard(2024), "{\"year\":2024}").unwrap();
        let body = store.read(DocumentKey::Shard(2024)).unwrap().unwrap();
        assert_eq!(body, "{\"year\":2024}");
    }

    #[test]
    fn test_write_overwrites() {
        let store = store();
        store.write(DocumentKey::Index, "v1").unwrap();
        store.write(DocumentKey::Index, "v2").unwrap();
        assert_eq!(store.read(DocumentKey::Index).unwrap().unwrap(), "v2");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = store();
        store.write(DocumentKey::Shard(2024), "x").unwrap();
        store.delete(DocumentKey::Shard(2024)).unwrap();
        store.delete(DocumentKey::Shard(2024)).unwrap();
        assert!(store.read(DocumentKey::Shard(2024)).unwrap().is_none());
    }

    #[test]
    fn test_update_sees_current_and_persists() {
        let store = store();
        store.write(DocumentKey::Shard(2024), "a").unwrap();

        let result = store
            .update(DocumentKey::Shard(2024), &mut |current| {
                Ok(Some(format!("{}b", current.unwrap_or(""))))
            })
            .unwrap();

        assert_eq!(result.as_deref(), Some("ab"));
        assert_eq!(store.read(DocumentKey::Shard(2024)).unwrap().unwrap(), "ab");
    }

    #[test]
    fn test_update_returning_none_deletes() {
        let store = store();
        store.write(DocumentKey::Shard(2024), "a").unwrap();
        store
            .update(DocumentKey::Shard(2024), &mut |_| Ok(None))
            .unwrap();
        assert!(store.read(DocumentKey::Shard(2024)).unwrap().is_none());
    }

    #[test]
    fn test_failing_mutator_rolls_back() {
        let store = store();
        store.write(DocumentKey::Shard(2024), "before").unwrap();

        let result = store.update(DocumentKey::Shard(2024), &mut |_| {
            Err(CoreError::Validation("refused".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(
            store.read(DocumentKey::Shard(2024)).unwrap().unwrap(),
            "before"
        );
    }
}
