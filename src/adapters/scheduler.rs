use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::template::TemplateComposer;
use crate::domain::{paginate_generated, EndpointDescriptor, MockResult, QueryParams};

/// Delays, composes and materializes one-shot payloads
#[derive(Debug, Clone, Default)]
pub struct GenerationScheduler {
    composer: TemplateComposer,
}

impl GenerationScheduler {
    pub fn new() -> Self {
        Self {
            composer: TemplateComposer::new(),
        }
    }

    pub fn composer(&self) -> &TemplateComposer {
        &self.composer
    }

    /// Wait the endpoint's delay, then generate its full payload.
    ///
    /// No pagination is applied; the persisted path stores this value whole.
    pub async fn materialize(&self, endpoint: &EndpointDescriptor) -> MockResult<Value> {
        let wait = endpoint.resolve_delay(&mut rand::thread_rng());
        if !wait.is_zero() {
            debug!(delay_ms = wait.as_millis() as u64, "Delaying generation");
            tokio::time::sleep(wait).await;
        }

        self.composer
            .try_generate(&endpoint.fields, endpoint.record_count())
    }

    /// One-shot payload: [`materialize`](Self::materialize), then wrap a
    /// sequence in a page envelope when the query carries both `currentPage`
    /// and `pageSize`.
    pub async fn generate(
        &self,
        endpoint: &EndpointDescriptor,
        query: &QueryParams,
    ) -> MockResult<Value> {
        let data = self.materialize(endpoint).await?;
        Ok(paginate_generated(data, query))
    }
}

/// Sleep for `wait` unless `cancel` fires first. Returns false when cancelled.
pub async fn suspend(wait: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if wait.is_zero() {
        return true;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Workspace;

    #[tokio::test]
    async fn test_generate_respects_count() {
        let ws = Workspace::parse(
            "/users:\n  count: 3\n  fields:\n    age: { type: number, min: 1, max: 5 }\n",
        )
        .unwrap();
        let endpoint = ws.endpoint("/users").unwrap();
        let scheduler = GenerationScheduler::new();

        let value = scheduler.generate(&endpoint, &QueryParams::new()).await.unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);
        for record in records {
            let age = record["age"].as_i64().unwrap();
            assert!((1..=5).contains(&age));
        }
    }

    #[tokio::test]
    async fn test_materialize_ignores_page_params() {
        let ws = Workspace::parse("/rows:\n  count: 7\n  fields:\n    ok: boolean\n").unwrap();
        let endpoint = ws.endpoint("/rows").unwrap();
        let scheduler = GenerationScheduler::new();

        let full = scheduler.materialize(&endpoint).await.unwrap();
        assert_eq!(full.as_array().unwrap().len(), 7);

        let query: QueryParams = [("currentPage", "1"), ("pageSize", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let paged = scheduler.generate(&endpoint, &query).await.unwrap();
        assert_eq!(paged["count"], serde_json::json!(7));
        assert_eq!(paged["list"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_waits_for_delay() {
        let ws = Workspace::parse("/slow:\n  delay: 40\n  fields:\n    ok: boolean\n").unwrap();
        let endpoint = ws.endpoint("/slow").unwrap();
        let scheduler = GenerationScheduler::new();

        let started = std::time::Instant::now();
        let value = scheduler.generate(&endpoint, &QueryParams::new()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(value["ok"].is_boolean());
    }

    #[tokio::test]
    async fn test_suspend_returns_false_on_cancel() {
        let cancel = CancellationToken::new();
        let waiter = {
            let cancel = cancel.clone();
            tokio::spawn(async move { suspend(Duration::from_secs(60), &cancel).await })
        };
        cancel.cancel();
        assert!(!waiter.await.unwrap());
    }
}
