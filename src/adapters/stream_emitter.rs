//! Incremental delivery of generated records as `step` / `end` / `error` events.

use async_trait::async_trait;
use futures::Stream;
use serde_json::{json, Value};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::scheduler::suspend;
use super::template::TemplateComposer;
use crate::domain::{EndpointDescriptor, MockResult};

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Step(Value),
    End,
    Error(String),
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Step(_) => "step",
            StreamEvent::End => "end",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn data(&self) -> Value {
        match self {
            StreamEvent::Step(v) => v.clone(),
            StreamEvent::End => json!({ "message": "stream ended" }),
            StreamEvent::Error(message) => json!({ "error": message }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Step(_))
    }

    /// Wire form: `event: <name>\ndata: <json>\n\n`
    pub fn to_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.data())
    }
}

/// Where stream records come from
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn next_record(&self, endpoint: &EndpointDescriptor) -> MockResult<Value>;
}

#[async_trait]
impl RecordSource for TemplateComposer {
    async fn next_record(&self, endpoint: &EndpointDescriptor) -> MockResult<Value> {
        self.try_generate(&endpoint.fields, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Ended,
    Errored,
    Cancelled,
}

pub struct StreamEmitter {
    source: Arc<dyn RecordSource>,
}

impl StreamEmitter {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    pub fn emit(&self, endpoint: Arc<EndpointDescriptor>) -> MockEventStream {
        self.emit_with_cancel(endpoint, CancellationToken::new())
    }

    /// Start emitting on a background task. Cancelling `cancel`, or dropping
    /// the returned stream, stops the task at its next suspension point.
    pub fn emit_with_cancel(
        &self,
        endpoint: Arc<EndpointDescriptor>,
        cancel: CancellationToken,
    ) -> MockEventStream {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let source = self.source.clone();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let outcome = run(source, endpoint, tx, task_cancel).await;
            debug!(?outcome, "Mock stream finished");
        });

        MockEventStream {
            receiver: rx,
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
        }
    }
}

async fn run(
    source: Arc<dyn RecordSource>,
    endpoint: Arc<EndpointDescriptor>,
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) -> StreamOutcome {
    let count = endpoint.stream_count();
    info!(count, "Starting mock stream");
    let mut index = 0;

    while index < count {
        let record = match source.next_record(&endpoint).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Stream generation failed: {}", e);
                send(&tx, &cancel, StreamEvent::Error(e.to_string())).await;
                return StreamOutcome::Errored;
            }
        };
        if !send(&tx, &cancel, StreamEvent::Step(record)).await {
            return StreamOutcome::Cancelled;
        }
        index += 1;

        if index < count {
            let wait = endpoint.resolve_delay(&mut rand::thread_rng());
            if !suspend(wait, &cancel).await {
                return StreamOutcome::Cancelled;
            }
        }
    }

    if send(&tx, &cancel, StreamEvent::End).await {
        StreamOutcome::Ended
    } else {
        StreamOutcome::Cancelled
    }
}

/// Deliver one event unless the consumer is gone or the stream was cancelled
async fn send(
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

/// Consumer side of an emitting stream. Dropping it cancels the producer.
pub struct MockEventStream {
    receiver: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl MockEventStream {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for MockEventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}
