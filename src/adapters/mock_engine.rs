//! Request dispatch: endpoint lookup, then one of streaming, persisted
//! read-through, or one-shot generation.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::metrics_handler::MetricsCollector;
use super::scheduler::GenerationScheduler;
use super::stream_emitter::{MockEventStream, StreamEmitter};
use crate::domain::{
    normalize_path, paginate_stored, EndpointDescriptor, MockError, MockResult, QueryParams,
    ResultStorePort, StoredRecord, WorkspacePort,
};

pub enum MockResponse {
    Payload(Value),
    Stream(MockEventStream),
}

impl std::fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockResponse::Payload(v) => f.debug_tuple("Payload").field(v).finish(),
            MockResponse::Stream(_) => f.write_str("Stream"),
        }
    }
}

pub struct MockEngine {
    workspaces: Arc<dyn WorkspacePort>,
    store: Arc<dyn ResultStorePort>,
    scheduler: GenerationScheduler,
    emitter: StreamEmitter,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MockEngine {
    pub fn new(workspaces: Arc<dyn WorkspacePort>, store: Arc<dyn ResultStorePort>) -> Self {
        let scheduler = GenerationScheduler::new();
        let emitter = StreamEmitter::new(Arc::new(*scheduler.composer()));
        Self {
            workspaces,
            store,
            scheduler,
            emitter,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_emitter(mut self, emitter: StreamEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub async fn handle(
        &self,
        mock_id: &str,
        path: &str,
        method: &str,
        query: &QueryParams,
    ) -> MockResult<MockResponse> {
        let result = self.dispatch(mock_id, path, method, query).await;

        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(MockResponse::Stream(_)) => "stream",
                Ok(MockResponse::Payload(_)) => "ok",
                Err(MockError::MockNotFound(_) | MockError::EndpointNotFound { .. }) => "not_found",
                Err(_) => "error",
            };
            let method_label = method.to_ascii_uppercase();
            metrics
                .requests_total
                .with_label_values(&[method_label.as_str(), outcome])
                .inc();
        }
        if let Err(e) = &result {
            if e.status_code().is_server_error() {
                error!(mock_id, path, "Mock request failed: {}", e);
            } else {
                debug!(mock_id, path, "Mock request rejected: {}", e);
            }
        }
        result
    }

    async fn dispatch(
        &self,
        mock_id: &str,
        path: &str,
        method: &str,
        query: &QueryParams,
    ) -> MockResult<MockResponse> {
        let path = normalize_path(path);
        let endpoint = self
            .workspaces
            .resolve_endpoint(mock_id, &path, method)
            .await?;

        if endpoint.stream {
            info!(mock_id, path = %path, "Opening mock stream");
            return Ok(MockResponse::Stream(self.emitter.emit(endpoint)));
        }

        let started = Instant::now();
        let (mode, data) = if endpoint.db {
            let data = self
                .read_through(mock_id, &path, method, &endpoint, query)
                .await?;
            ("persisted", data)
        } else {
            ("oneshot", self.scheduler.generate(&endpoint, query).await?)
        };

        if let Some(metrics) = &self.metrics {
            metrics
                .generation_duration
                .with_label_values(&[mode])
                .observe(started.elapsed().as_secs_f64());
        }
        Ok(MockResponse::Payload(data))
    }

    /// Serve the persisted payload for `path`, generating and storing it first
    /// when there is none
    async fn read_through(
        &self,
        mock_id: &str,
        path: &str,
        method: &str,
        endpoint: &EndpointDescriptor,
        query: &QueryParams,
    ) -> MockResult<Value> {
        let existing = self.store.get(mock_id, path).await?;
        let missing = existing.map_or(true, |record| record.mock_data.is_null());

        let fresh = if missing {
            self.count_store(false);
            let data = self.scheduler.materialize(endpoint).await?;
            let record = StoredRecord {
                path: path.to_string(),
                query: query.clone(),
                mock_data: data.clone(),
                method: method.to_ascii_uppercase(),
            };
            self.store.put(mock_id, path, record).await?;
            debug!(mock_id, path, "Stored generated payload");
            Some(data)
        } else {
            self.count_store(true);
            None
        };

        match self.store.list(mock_id, path, query, endpoint).await? {
            Some(page) => Ok(page),
            // cleared between write and read: serve what was just generated
            None => fresh
                .map(|data| paginate_stored(&data, query, endpoint))
                .ok_or_else(|| MockError::Store(format!("record for {} disappeared", path))),
        }
    }

    fn count_store(&self, hit: bool) {
        if let Some(metrics) = &self.metrics {
            if hit {
                metrics.store_hits.inc();
            } else {
                metrics.store_misses.inc();
            }
        }
    }

    /// Drop every persisted payload of `mock_id`
    pub async fn clear(&self, mock_id: &str) -> MockResult<usize> {
        let removed = self.store.clear(mock_id).await?;
        info!(mock_id, removed, "Cleared persisted records");
        Ok(removed)
    }

    pub fn store(&self) -> &Arc<dyn ResultStorePort> {
        &self.store
    }
}
