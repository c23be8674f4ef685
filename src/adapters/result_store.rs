//! Persisted mock payloads, partitioned by mock identifier.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::{StoreBackend, StoreSettings};
use crate::domain::{normalize_path, MockError, MockResult, ResultStorePort, StoredRecord};

type Partition = IndexMap<String, StoredRecord>;

/// Volatile store: partitions live for the life of the process
#[derive(Default)]
pub struct InMemoryResultStore {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStorePort for InMemoryResultStore {
    async fn get(&self, mock_id: &str, path: &str) -> MockResult<Option<StoredRecord>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(mock_id)
            .and_then(|p| p.get(&normalize_path(path)))
            .cloned())
    }

    async fn put(&self, mock_id: &str, path: &str, record: StoredRecord) -> MockResult<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(mock_id.to_string())
            .or_default()
            .insert(normalize_path(path), record);
        Ok(())
    }

    async fn clear(&self, mock_id: &str) -> MockResult<usize> {
        let mut partitions = self.partitions.write().await;
        let removed = partitions.remove(mock_id).map(|p| p.len()).unwrap_or(0);
        debug!(mock_id, removed, "Cleared in-memory records");
        Ok(removed)
    }
}

/// One JSON file per mock identifier under `data_dir`
pub struct FileResultStore {
    data_dir: PathBuf,
    // serializes read-modify-write cycles on partition files
    write_lock: Mutex<()>,
}

impl FileResultStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn partition_file(&self, mock_id: &str) -> MockResult<PathBuf> {
        let valid = !mock_id.is_empty()
            && mock_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(MockError::Store(format!("invalid mock id: {:?}", mock_id)));
        }
        Ok(self.data_dir.join(format!("{}.json", mock_id)))
    }

    async fn read_partition(&self, file: &Path) -> MockResult<Partition> {
        match tokio::fs::read(file).await {
            Ok(bytes) if bytes.is_empty() => Ok(Partition::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| MockError::Store(format!("corrupt record file {}: {}", file.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Partition::new()),
            Err(e) => Err(MockError::Store(format!("read {}: {}", file.display(), e))),
        }
    }

    async fn write_partition(&self, file: &Path, partition: &Partition) -> MockResult<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| MockError::Store(format!("create {}: {}", self.data_dir.display(), e)))?;
        let bytes = serde_json::to_vec_pretty(partition)?;
        let tmp = file.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| MockError::Store(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, file)
            .await
            .map_err(|e| MockError::Store(format!("rename {}: {}", file.display(), e)))
    }
}

#[async_trait]
impl ResultStorePort for FileResultStore {
    async fn get(&self, mock_id: &str, path: &str) -> MockResult<Option<StoredRecord>> {
        let file = self.partition_file(mock_id)?;
        let _guard = self.write_lock.lock().await;
        let mut partition = self.read_partition(&file).await?;
        Ok(partition.swap_remove(&normalize_path(path)))
    }

    async fn put(&self, mock_id: &str, path: &str, record: StoredRecord) -> MockResult<()> {
        let file = self.partition_file(mock_id)?;
        let _guard = self.write_lock.lock().await;
        let mut partition = self.read_partition(&file).await?;
        partition.insert(normalize_path(path), record);
        self.write_partition(&file, &partition).await
    }

    async fn clear(&self, mock_id: &str) -> MockResult<usize> {
        let file = self.partition_file(mock_id)?;
        let _guard = self.write_lock.lock().await;
        let removed = self.read_partition(&file).await?.len();
        match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MockError::Store(format!("remove {}: {}", file.display(), e))),
        }
        debug!(mock_id, removed, "Cleared record file");
        Ok(removed)
    }
}

pub fn create_result_store(settings: &StoreSettings) -> Arc<dyn ResultStorePort> {
    match settings.backend {
        StoreBackend::Memory => {
            info!("Using in-memory result store");
            Arc::new(InMemoryResultStore::new())
        }
        StoreBackend::File => {
            info!("Using file result store at {}", settings.data_dir);
            Arc::new(FileResultStore::new(&settings.data_dir))
        }
    }
}
