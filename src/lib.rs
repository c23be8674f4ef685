//! # Mockoro - Schema-Driven Mock API Server
//!
//! Mockoro serves synthetic HTTP API responses generated from a declarative
//! schema. Clients upload a YAML/JSON document describing virtual endpoints;
//! requests against those endpoints are answered with generated data.
//!
//! ## Features
//!
//! - **Field generation**: strings, numbers, floats, dates, names, identifiers,
//!   network addresses, enums, nested objects and arrays
//! - **One-shot responses** with fixed or ranged delay and 1-indexed pagination
//! - **Streaming** over server-sent events (`step` / `end` / `error`)
//! - **Persisted results** with 0-indexed pagination, in memory or on disk
//! - **Live reload** of the startup schema file
//! - **Metrics & health**: Prometheus metrics and health endpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mockoro::config::Settings;
//! use mockoro::AppComponents;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let app = AppComponents::from_settings(&settings)?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app.router()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: descriptors, workspaces, errors and the store ports
//! - **Adapters**: generation, streaming, stores and HTTP handlers
//! - **Config**: settings, validation and schema file watching

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;

use crate::adapters::api_handler::{self, ApiState};
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::metrics_handler::{MetricsCollector, MetricsHandler};
use crate::adapters::mock_engine::MockEngine;
use crate::adapters::result_store::create_result_store;
use crate::adapters::schema_loader::SchemaLoader;
use crate::adapters::workspace_store::WorkspaceStore;
use crate::config::{Settings, StoreBackend};
use crate::domain::ResultStorePort;
use axum::{
    routing::{any, delete, get, post},
    Router,
};
use std::sync::Arc;

/// Everything the server is built from, wired according to settings
#[derive(Clone)]
pub struct AppComponents {
    pub workspaces: Arc<WorkspaceStore>,
    pub store: Arc<dyn ResultStorePort>,
    pub engine: Arc<MockEngine>,
    pub metrics: Arc<MetricsCollector>,
    pub loader: Arc<SchemaLoader>,
    pub store_backend: StoreBackend,
}

impl AppComponents {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let workspaces = Arc::new(match &settings.store.workspace_snapshot {
            Some(path) => WorkspaceStore::with_snapshot(path),
            None => WorkspaceStore::new(),
        });
        let store = create_result_store(&settings.store);
        let metrics = Arc::new(MetricsCollector::new()?);
        let engine = Arc::new(
            MockEngine::new(workspaces.clone(), store.clone()).with_metrics(metrics.clone()),
        );
        let loader = Arc::new(SchemaLoader::new(
            &settings.schema.path,
            &settings.schema.mock_id,
            workspaces.clone(),
            store.clone(),
        ));

        Ok(Self {
            workspaces,
            store,
            engine,
            metrics,
            loader,
            store_backend: settings.store.backend,
        })
    }

    pub fn router(&self) -> Router {
        let backend = match self.store_backend {
            StoreBackend::Memory => "memory",
            StoreBackend::File => "file",
        };
        create_app(
            ApiState {
                engine: self.engine.clone(),
                workspaces: self.workspaces.clone(),
                metrics: self.metrics.clone(),
            },
            Arc::new(HealthHandler::new(self.workspaces.clone(), backend)),
            Arc::new(MetricsHandler::new(self.metrics.clone())),
        )
    }
}

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `api_state` - Engine, workspaces and metrics shared by the API handlers
/// * `health_handler` - Health check handler
/// * `metrics_handler` - Metrics collection handler
pub fn create_app(
    api_state: ApiState,
    health_handler: Arc<HealthHandler>,
    metrics_handler: Arc<MetricsHandler>,
) -> Router {
    let ops_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }))
        .route("/metrics", get({
            let handler = metrics_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.metrics().await }
            }
        }));

    let mock_router = Router::new()
        .route("/upload", post(api_handler::upload_schema))
        .route("/mock/:mock_id", any(api_handler::dispatch_mock_root))
        .route("/mock/:mock_id/*path", any(api_handler::dispatch_mock))
        .route("/api/mocks/:mock_id", get(api_handler::get_workspace))
        .route("/api/mocks/:mock_id/records", delete(api_handler::clear_records))
        .with_state(api_state);

    ops_router.merge(mock_router).layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
