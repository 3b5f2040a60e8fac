use crate::error::{CoreError, CoreResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = include_str!("../../schema.sql");

pub fn create_pool(database_path: &Path, pool_size: u32) -> CoreResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| CoreError::Storage(format!("Failed to create database pool: {}", e)))?;

    init_schema(&get_connection(&pool)?)?;
    Ok(pool)
}

/// Pool over a single shared in-memory database, used by tests and
/// ephemeral setups.
pub fn create_memory_pool() -> CoreResult<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| CoreError::Storage(format!("Failed to create database pool: {}", e)))?;

    init_schema(&get_connection(&pool)?)?;
    Ok(pool)
}

pub fn get_connection(pool: &DbPool) -> CoreResult<DbConn> {
    pool.get().map_err(CoreError::Pool)
}

pub fn init_schema(conn: &DbConn) -> CoreResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pool_has_schema() {
        let pool = create_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_file_pool_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.sqlite");
        let pool = create_pool(&path, 2).unwrap();
        drop(pool);
        assert!(path.exists());
    }
}
