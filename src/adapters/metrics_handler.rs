use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct MetricsCollector {
    registry: Registry,

    // Mock request metrics
    pub requests_total: CounterVec,
    pub generation_duration: HistogramVec,

    // Streaming
    pub stream_events: CounterVec,

    // Result store read-through
    pub store_hits: Counter,
    pub store_misses: Counter,

    pub uploads_total: CounterVec,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("mockoro_requests_total", "Total number of mock requests"),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let generation_duration = HistogramVec::new(
            HistogramOpts::new(
                "mockoro_generation_duration_seconds",
                "Time to produce a mock payload, including configured delay",
            ),
            &["mode"],
        )?;
        registry.register(Box::new(generation_duration.clone()))?;

        let stream_events = CounterVec::new(
            Opts::new("mockoro_stream_events_total", "Stream events delivered"),
            &["kind"],
        )?;
        registry.register(Box::new(stream_events.clone()))?;

        let store_hits = Counter::new("mockoro_store_hits_total", "Persisted payload hits")?;
        registry.register(Box::new(store_hits.clone()))?;

        let store_misses = Counter::new("mockoro_store_misses_total", "Persisted payload misses")?;
        registry.register(Box::new(store_misses.clone()))?;

        let uploads_total = CounterVec::new(
            Opts::new("mockoro_uploads_total", "Schema uploads by response status"),
            &["status"],
        )?;
        registry.register(Box::new(uploads_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            generation_duration,
            stream_events,
            store_hits,
            store_misses,
            uploads_total,
        })
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsHandler {
    collector: Arc<MetricsCollector>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}
