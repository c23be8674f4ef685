use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use super::workspace_store::WorkspaceStore;
use crate::domain::{MockResult, ResultStorePort, Workspace};

/// Loads a schema file from disk into a fixed mock identifier
pub struct SchemaLoader {
    path: PathBuf,
    mock_id: String,
    workspaces: Arc<WorkspaceStore>,
    store: Arc<dyn ResultStorePort>,
}

impl SchemaLoader {
    pub fn new(
        path: impl Into<PathBuf>,
        mock_id: impl Into<String>,
        workspaces: Arc<WorkspaceStore>,
        store: Arc<dyn ResultStorePort>,
    ) -> Self {
        Self {
            path: path.into(),
            mock_id: mock_id.into(),
            workspaces,
            store,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mock_id(&self) -> &str {
        &self.mock_id
    }

    /// Parse the schema file and install it. Returns the endpoint count.
    pub async fn load(&self) -> MockResult<usize> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let workspace = Workspace::parse(&text)?;
        let endpoints = workspace.len();
        self.workspaces.replace(&self.mock_id, workspace).await?;
        info!(
            "Loaded {} endpoints from {} as {}",
            endpoints,
            self.path.display(),
            self.mock_id
        );
        Ok(endpoints)
    }

    /// Drop persisted payloads for the mock id, then load again.
    ///
    /// On failure the previous workspace stays installed.
    pub async fn reload(&self) -> MockResult<usize> {
        let removed = self.store.clear(&self.mock_id).await?;
        info!(mock_id = %self.mock_id, removed, "Schema changed, cleared persisted records");
        self.load().await.map_err(|e| {
            error!("Failed to reload {}: {}", self.path.display(), e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::result_store::InMemoryResultStore;
    use crate::domain::{MockError, QueryParams, StoredRecord, WorkspacePort};
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (SchemaLoader, Arc<WorkspaceStore>, Arc<InMemoryResultStore>) {
        let workspaces = Arc::new(WorkspaceStore::new());
        let store = Arc::new(InMemoryResultStore::new());
        let loader = SchemaLoader::new(
            dir.path().join("mock.yaml"),
            "admin",
            workspaces.clone(),
            store.clone(),
        );
        (loader, workspaces, store)
    }

    #[tokio::test]
    async fn test_load_and_reload() {
        let dir = TempDir::new().unwrap();
        let (loader, workspaces, store) = setup(&dir);
        std::fs::write(loader.path(), "/a:\n  db: true\n").unwrap();

        assert_eq!(loader.load().await.unwrap(), 1);
        assert!(workspaces.resolve_endpoint("admin", "/a", "GET").await.is_ok());

        store
            .put(
                "admin",
                "/a",
                StoredRecord {
                    path: "/a".into(),
                    query: QueryParams::new(),
                    mock_data: json!([1]),
                    method: "GET".into(),
                },
            )
            .await
            .unwrap();

        std::fs::write(loader.path(), "/a:\n  db: true\n/b:\n  count: 2\n").unwrap();
        assert_eq!(loader.reload().await.unwrap(), 2);
        assert!(store.get("admin", "/a").await.unwrap().is_none());
        assert!(workspaces.resolve_endpoint("admin", "/b", "GET").await.is_ok());
    }

    #[tokio::test]
    async fn test_bad_reload_keeps_previous_workspace() {
        let dir = TempDir::new().unwrap();
        let (loader, workspaces, _) = setup(&dir);
        std::fs::write(loader.path(), "/a:\n  count: 1\n").unwrap();
        loader.load().await.unwrap();

        std::fs::write(loader.path(), "/a: [broken").unwrap();
        assert!(matches!(loader.reload().await, Err(MockError::SchemaParse(_))));
        assert!(workspaces.resolve_endpoint("admin", "/a", "GET").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let (loader, _, _) = setup(&dir);
        assert!(matches!(loader.load().await, Err(MockError::Io(_))));
    }
}
