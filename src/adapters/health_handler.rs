use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::workspace_store::WorkspaceStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub workspaces: usize,
    pub store: String,
}

pub struct HealthHandler {
    workspaces: Arc<WorkspaceStore>,
    store_backend: String,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(workspaces: Arc<WorkspaceStore>, store_backend: impl Into<String>) -> Self {
        Self {
            workspaces,
            store_backend: store_backend.into(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                workspaces: self.workspaces.len().await,
                store: self.store_backend.clone(),
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Readiness check - ready once at least one workspace is loaded
    pub async fn ready(&self) -> impl IntoResponse {
        if self.workspaces.is_empty().await {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "message": "No workspace loaded"
                })),
            )
        } else {
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "message": "Server is ready to accept requests"
                })),
            )
        }
    }

    pub async fn live(&self) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "alive",
                "message": "Server is alive"
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Workspace;

    #[tokio::test]
    async fn test_health_endpoint() {
        let handler = HealthHandler::new(Arc::new(WorkspaceStore::new()), "memory");
        let response = handler.health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_requires_workspace() {
        let workspaces = Arc::new(WorkspaceStore::new());
        let handler = HealthHandler::new(workspaces.clone(), "memory");

        let response = handler.ready().await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        workspaces
            .replace("admin", Workspace::parse("/a:\n  count: 1\n").unwrap())
            .await
            .unwrap();
        let response = handler.ready().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_live_endpoint() {
        let handler = HealthHandler::new(Arc::new(WorkspaceStore::new()), "file");
        let response = handler.live().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
