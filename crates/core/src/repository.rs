//! Durable record repository: the collaborator that owns idempotency flags.
//!
//! The engine never caches flag writes; every call here is expected to be
//! visible to the next `get` immediately.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::booking::{BookingId, DurableRecord};
use crate::error::RepositoryError;

/// Storage for [`DurableRecord`]s keyed by [`BookingId`].
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn get(&self, id: &BookingId) -> Result<Option<DurableRecord>, RepositoryError>;

    /// Persist a new record. Fails with [`RepositoryError::AlreadyExists`]
    /// when a record with the same identity is already stored.
    async fn create(&self, record: DurableRecord) -> Result<(), RepositoryError>;

    async fn update_flag(
        &self,
        id: &BookingId,
        flag: &str,
        value: bool,
    ) -> Result<(), RepositoryError>;
}

type RecordMap = BTreeMap<BookingId, DurableRecord>;

fn insert_new(records: &mut RecordMap, record: DurableRecord) -> Result<(), RepositoryError> {
    if records.contains_key(&record.id) {
        return Err(RepositoryError::AlreadyExists(record.id.to_string()));
    }
    records.insert(record.id.clone(), record);
    Ok(())
}

fn write_flag(
    records: &mut RecordMap,
    id: &BookingId,
    flag: &str,
    value: bool,
) -> Result<(), RepositoryError> {
    let record = records
        .get_mut(id)
        .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
    if value {
        record.flags.mark(flag);
    } else if record.flags.is_set(flag) {
        return Err(RepositoryError::Storage(format!(
            "refusing to clear flag '{flag}' on {id}"
        )));
    }
    Ok(())
}

// ── In-memory ─────────────────────────────────────────────────

/// Process-local repository. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: RwLock<RecordMap>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = DurableRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Snapshot of all stored records, ordered by identity.
    pub fn snapshot(&self) -> Vec<DurableRecord> {
        self.records
            .read()
            .expect("records lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordRepository for MemoryRepository {
    async fn get(&self, id: &BookingId) -> Result<Option<DurableRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .expect("records lock poisoned")
            .get(id)
            .cloned())
    }

    async fn create(&self, record: DurableRecord) -> Result<(), RepositoryError> {
        insert_new(&mut self.records.write().expect("records lock poisoned"), record)
    }

    async fn update_flag(
        &self,
        id: &BookingId,
        flag: &str,
        value: bool,
    ) -> Result<(), RepositoryError> {
        write_flag(
            &mut self.records.write().expect("records lock poisoned"),
            id,
            flag,
            value,
        )
    }
}

// ── JSON state file ───────────────────────────────────────────

/// Repository backed by a single JSON state file.
///
/// Every mutation rewrites the file through a `.tmp` sibling and a rename, so
/// a crash mid-write leaves the previous state intact.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    records: RwLock<RecordMap>,
}

impl JsonFileRepository {
    /// Open the state file, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let list: Vec<DurableRecord> = serde_json::from_str(&raw)?;
            list.into_iter().map(|r| (r.id.clone(), r)).collect()
        } else {
            debug!(path = %path.display(), "state file missing, starting empty");
            RecordMap::new()
        };
        info!(path = %path.display(), records = records.len(), "opened record state file");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all stored records, ordered by identity.
    pub fn snapshot(&self) -> Vec<DurableRecord> {
        self.records
            .read()
            .expect("records lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn persist(&self, records: &RecordMap) -> Result<(), RepositoryError> {
        let list: Vec<&DurableRecord> = records.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("state.json");
        let tmp_path = self.path.with_file_name(format!(".{file_name}.tmp"));
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for JsonFileRepository {
    async fn get(&self, id: &BookingId) -> Result<Option<DurableRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .expect("records lock poisoned")
            .get(id)
            .cloned())
    }

    async fn create(&self, record: DurableRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().expect("records lock poisoned");
        let id = record.id.clone();
        insert_new(&mut records, record)?;
        if let Err(e) = self.persist(&records) {
            records.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    async fn update_flag(
        &self,
        id: &BookingId,
        flag: &str,
        value: bool,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().expect("records lock poisoned");
        let previous = records.get(id).map(|r| r.flags.clone());
        write_flag(&mut records, id, flag, value)?;
        if let Err(e) = self.persist(&records) {
            if let (Some(flags), Some(record)) = (previous, records.get_mut(id)) {
                record.flags = flags;
            }
            return Err(e);
        }
        Ok(())
    }
}
