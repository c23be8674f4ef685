use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::{EndpointDescriptor, MockError, MockResult, Workspace, WorkspacePort};

/// Uploaded workspaces by mock identifier, optionally mirrored to a snapshot file
pub struct WorkspaceStore {
    workspaces: RwLock<HashMap<String, Arc<Workspace>>>,
    snapshot: Option<PathBuf>,
}

impl WorkspaceStore {
    pub fn new() -> Self {
        Self {
            workspaces: RwLock::new(HashMap::new()),
            snapshot: None,
        }
    }

    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            workspaces: RwLock::new(HashMap::new()),
            snapshot: Some(path.into()),
        }
    }

    /// Load every workspace from the snapshot file, if configured and present
    pub async fn load_snapshot(&self) -> MockResult<usize> {
        let Some(path) = &self.snapshot else {
            return Ok(0);
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let documents: Map<String, Value> = serde_json::from_slice(&bytes)?;

        let mut loaded = 0;
        let mut workspaces = self.workspaces.write().await;
        for (mock_id, document) in documents {
            match Workspace::from_document(document) {
                Ok(ws) => {
                    workspaces.insert(mock_id, Arc::new(ws));
                    loaded += 1;
                }
                Err(e) => warn!("Skipping snapshot entry {}: {}", mock_id, e),
            }
        }
        info!("Restored {} workspaces from {}", loaded, path.display());
        Ok(loaded)
    }

    /// Install `workspace` under `mock_id`, replacing any previous one wholesale
    pub async fn replace(&self, mock_id: &str, workspace: Workspace) -> MockResult<()> {
        let endpoints = workspace.len();
        let documents = {
            let mut workspaces = self.workspaces.write().await;
            workspaces.insert(mock_id.to_string(), Arc::new(workspace));
            self.snapshot.as_ref().map(|_| {
                workspaces
                    .iter()
                    .map(|(id, ws)| (id.clone(), ws.document().clone()))
                    .collect::<Map<String, Value>>()
            })
        };
        info!(mock_id, endpoints, "Workspace replaced");

        if let (Some(path), Some(documents)) = (&self.snapshot, documents) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let tmp = path.with_extension("tmp");
            tokio::fs::write(&tmp, serde_json::to_vec_pretty(&Value::Object(documents))?).await?;
            tokio::fs::rename(&tmp, path).await?;
        }
        Ok(())
    }

    pub async fn get(&self, mock_id: &str) -> Option<Arc<Workspace>> {
        self.workspaces.read().await.get(mock_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.workspaces.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workspaces.read().await.is_empty()
    }
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkspacePort for WorkspaceStore {
    async fn resolve_endpoint(
        &self,
        mock_id: &str,
        path: &str,
        method: &str,
    ) -> MockResult<Arc<EndpointDescriptor>> {
        let workspace = self
            .get(mock_id)
            .await
            .ok_or_else(|| MockError::MockNotFound(mock_id.to_string()))?;

        workspace
            .endpoint(path)
            .filter(|endpoint| endpoint.answers(method))
            .ok_or_else(|| MockError::EndpointNotFound {
                path: path.to_string(),
                method: method.to_string(),
            })
    }
}
