#![cfg(test)]

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::models::{
    DateConfidence, DateInfo, DateSource, MediaRecord, MediaType, Role, UserPermissions,
    Visibility,
};
use crate::store::{create_memory_pool, DocumentKey, DocumentStore, SqliteDocumentStore};
use crate::vault::MediaVault;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Config tuned for tests: no backoff sleep between retries.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.retry.base_delay_ms = 0;
    config
}

/// Fixture: a family-visible photo captured at noon on the given date.
pub fn record_taken(year: i32, month: u32, day: u32) -> MediaRecord {
    let taken_at = Utc
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid fixture date");

    MediaRecord::new(
        format!("IMG_{}{:02}{:02}.jpg", year, month, day),
        format!("IMG_{}{:02}{:02}.jpg", year, month, day),
        format!("originals/{}/IMG_{}{:02}{:02}.jpg", year, year, month, day),
        MediaType::Photo,
        "uploader",
        taken_at,
        DateInfo {
            source: DateSource::Exif,
            confidence: DateConfidence::High,
        },
        Visibility::Family,
    )
}

pub fn user_with_role(user_id: &str, role: Role) -> UserPermissions {
    UserPermissions::for_role(user_id, role)
}

/// Vault over a fresh in-memory SQLite document store.
pub fn memory_vault() -> MediaVault {
    let pool = create_memory_pool().expect("in-memory pool");
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(pool));
    MediaVault::with_store(store, &test_config())
}

/// Document store that injects failures before delegating, for exercising
/// the retry wrapper and per-year degradation. Failures happen before any
/// write reaches the inner store, so a failed call never leaves a partial
/// write. Two modes: fail the next N calls regardless of key, or fail every
/// call touching one year's shard.
pub struct FailingStore {
    inner: SqliteDocumentStore,
    remaining_failures: AtomicU32,
    shard_outage: Mutex<Option<i32>>,
}

impl FailingStore {
    pub fn new(inner: SqliteDocumentStore) -> Self {
        Self {
            inner,
            remaining_failures: AtomicU32::new(0),
            shard_outage: Mutex::new(None),
        }
    }

    pub fn fail_next(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::SeqCst);
    }

    /// Make one year's shard document unreadable (and unwritable) until
    /// cleared with `None`. Other keys keep working.
    pub fn fail_shard(&self, year: Option<i32>) {
        *self.shard_outage.lock().unwrap() = year;
    }

    fn maybe_fail(&self, key: DocumentKey) -> CoreResult<()> {
        if let Some(down) = *self.shard_outage.lock().unwrap() {
            if key == DocumentKey::Shard(down) {
                return Err(CoreError::Io(std::io::Error::other("injected shard outage")));
            }
        }

        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures
                .store(remaining.saturating_sub(1), Ordering::SeqCst);
            return Err(CoreError::Io(std::io::Error::other("injected failure")));
        }
        Ok(())
    }
}

impl DocumentStore for FailingStore {
    fn read(&self, key: DocumentKey) -> CoreResult<Option<String>> {
        self.maybe_fail(key)?;
        self.inner.read(key)
    }

    fn write(&self, key: DocumentKey, body: &str) -> CoreResult<()> {
        self.maybe_fail(key)?;
        self.inner.write(key, body)
    }

    fn delete(&self, key: DocumentKey) -> CoreResult<()> {
        self.maybe_fail(key)?;
        self.inner.delete(key)
    }

    fn update(
        &self,
        key: DocumentKey,
        mutator: &mut dyn FnMut(Option<&str>) -> CoreResult<Option<String>>,
    ) -> CoreResult<Option<String>> {
        self.maybe_fail(key)?;
        self.inner.update(key, mutator)
    }
}

/// Vault whose substrate can be told to fail on demand.
pub fn vault_with_failing_store() -> (MediaVault, Arc<FailingStore>) {
    let pool = create_memory_pool().expect("in-memory pool");
    let failing = Arc::new(FailingStore::new(SqliteDocumentStore::new(pool)));
    let store: Arc<dyn DocumentStore> = failing.clone();
    (MediaVault::with_store(store, &test_config()), failing)
}
