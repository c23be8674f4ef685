use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::adapters::mock_engine::{MockEngine, MockResponse};
use crate::adapters::result_store::InMemoryResultStore;
use crate::adapters::stream_emitter::{RecordSource, StreamEmitter, StreamEvent};
use crate::adapters::workspace_store::WorkspaceStore;
use crate::domain::{
    EndpointDescriptor, MockError, MockResult, QueryParams, ResultStorePort, StoredRecord,
    Workspace,
};

const SCHEMA: &str = r#"
/users:
  count: 3
  fields:
    id: uuid
    age: { type: number, min: 18, max: 60 }
    role: { type: string, enum: [admin, user] }
/table:
  db: true
  count: 25
  fields:
    n: { type: number, min: 0, max: 1000 }
/events:
  stream: true
  count: 3
  fields:
    seq: { type: number, min: 1, max: 9 }
/odd:
  stream: true
  count: 3
  fields:
    x: { type: float, min: "NaN", max: "inf" }
    y: { type: number, min: "abc", max: "inf" }
    z: { type: array, item: { type: hologram, long: -2 } }
/endless:
  stream: true
  count: 1000
  delay: 20
  fields:
    tick: boolean
"#;

async fn engine() -> (MockEngine, Arc<InMemoryResultStore>) {
    let workspaces = Arc::new(WorkspaceStore::new());
    workspaces
        .replace("ab12cd34", Workspace::parse(SCHEMA).unwrap())
        .await
        .unwrap();
    let store = Arc::new(InMemoryResultStore::new());
    (MockEngine::new(workspaces, store.clone()), store)
}

fn query(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn payload(response: MockResponse) -> Value {
    match response {
        MockResponse::Payload(v) => v,
        other => panic!("expected payload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_shot_generates_count_records() {
    let (engine, _) = engine().await;
    let value = payload(
        engine
            .handle("ab12cd34", "/users", "GET", &QueryParams::new())
            .await
            .unwrap(),
    );

    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 3);
    for record in records {
        let age = record["age"].as_i64().unwrap();
        assert!((18..=60).contains(&age));
        assert!(["admin", "user"].contains(&record["role"].as_str().unwrap()));
        assert_eq!(record["id"].as_str().unwrap().len(), 36);
    }
}

#[tokio::test]
async fn test_one_shot_generated_pagination() {
    let (engine, _) = engine().await;
    let value = payload(
        engine
            .handle("ab12cd34", "/users", "GET", &query(&[("currentPage", "1"), ("pageSize", "2")]))
            .await
            .unwrap(),
    );
    assert_eq!(value["count"], json!(3));
    assert_eq!(value["list"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_mock_and_endpoint() {
    let (engine, _) = engine().await;
    assert!(matches!(
        engine.handle("nope", "/users", "GET", &QueryParams::new()).await,
        Err(MockError::MockNotFound(_))
    ));
    assert!(matches!(
        engine.handle("ab12cd34", "/missing", "GET", &QueryParams::new()).await,
        Err(MockError::EndpointNotFound { .. })
    ));
    assert!(matches!(
        engine.handle("ab12cd34", "/users", "DELETE", &QueryParams::new()).await,
        Err(MockError::EndpointNotFound { .. })
    ));
}

#[tokio::test]
async fn test_persisted_read_through_is_idempotent() {
    let (engine, store) = engine().await;

    let first = payload(engine.handle("ab12cd34", "/table", "GET", &QueryParams::new()).await.unwrap());
    let second = payload(engine.handle("ab12cd34", "/table", "GET", &QueryParams::new()).await.unwrap());
    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 25);

    let stored = store.get("ab12cd34", "/table").await.unwrap().unwrap();
    assert_eq!(stored.mock_data, first);
    assert_eq!(stored.method, "GET");
}

#[tokio::test]
async fn test_persisted_pagination_pages() {
    let (engine, _) = engine().await;
    let page = |n: &'static str| query(&[("currentPage", n), ("numberPerPage", "10")]);

    let p1 = payload(engine.handle("ab12cd34", "/table", "GET", &page("1")).await.unwrap());
    let p2 = payload(engine.handle("ab12cd34", "/table", "GET", &page("2")).await.unwrap());
    let p5 = payload(engine.handle("ab12cd34", "/table", "GET", &page("5")).await.unwrap());
    let all = payload(engine.handle("ab12cd34", "/table", "GET", &QueryParams::new()).await.unwrap());

    assert_eq!(p1.as_array().unwrap().as_slice(), &all.as_array().unwrap()[10..20]);
    assert_eq!(p2.as_array().unwrap().as_slice(), &all.as_array().unwrap()[20..25]);
    assert_eq!(p5, json!([]));
}

#[tokio::test]
async fn test_first_persisted_hit_stores_full_payload() {
    let (engine, store) = engine().await;

    // one-shot page params on the first hit must not shape what is stored
    let first = payload(
        engine
            .handle("ab12cd34", "/table", "GET", &query(&[("currentPage", "1"), ("pageSize", "5")]))
            .await
            .unwrap(),
    );
    assert_eq!(first.as_array().unwrap().len(), 25);

    let stored = store.get("ab12cd34", "/table").await.unwrap().unwrap();
    let all = stored.mock_data.as_array().unwrap().clone();
    assert_eq!(all.len(), 25);

    let page = payload(
        engine
            .handle("ab12cd34", "/table", "GET", &query(&[("currentPage", "1"), ("numberPerPage", "10")]))
            .await
            .unwrap(),
    );
    assert_eq!(page.as_array().unwrap().as_slice(), &all[10..20]);
}

#[tokio::test]
async fn test_null_payload_is_regenerated() {
    let (engine, store) = engine().await;
    store
        .put(
            "ab12cd34",
            "/table",
            StoredRecord {
                path: "/table".to_string(),
                query: QueryParams::new(),
                mock_data: Value::Null,
                method: "GET".to_string(),
            },
        )
        .await
        .unwrap();

    let value = payload(engine.handle("ab12cd34", "/table", "GET", &QueryParams::new()).await.unwrap());
    assert_eq!(value.as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_clear_then_regenerate() {
    let (engine, store) = engine().await;
    let before = payload(engine.handle("ab12cd34", "/table", "GET", &QueryParams::new()).await.unwrap());

    assert_eq!(engine.clear("ab12cd34").await.unwrap(), 1);
    assert!(store.get("ab12cd34", "/table").await.unwrap().is_none());
    assert_eq!(engine.clear("ab12cd34").await.unwrap(), 0);

    let after = payload(engine.handle("ab12cd34", "/table", "GET", &QueryParams::new()).await.unwrap());
    assert_eq!(after.as_array().unwrap().len(), 25);
    assert_ne!(before, after);
}

#[tokio::test]
async fn test_stream_emits_steps_then_end() {
    let (engine, _) = engine().await;
    let stream = match engine.handle("ab12cd34", "/events", "GET", &QueryParams::new()).await.unwrap() {
        MockResponse::Stream(s) => s,
        other => panic!("expected stream, got {:?}", other),
    };

    let events: Vec<StreamEvent> = stream.collect().await;
    assert_eq!(events.len(), 4);
    for event in &events[..3] {
        assert_eq!(event.name(), "step");
        let seq = event.data()["seq"].as_i64().unwrap();
        assert!((1..=9).contains(&seq));
    }
    assert_eq!(events[3], StreamEvent::End);
    assert_eq!(
        events[3].to_frame(),
        "event: end\ndata: {\"message\":\"stream ended\"}\n\n"
    );
}

#[tokio::test]
async fn test_stream_stops_after_cancel() {
    let (engine, _) = engine().await;
    let mut stream = match engine.handle("ab12cd34", "/endless", "GET", &QueryParams::new()).await.unwrap() {
        MockResponse::Stream(s) => s,
        other => panic!("expected stream, got {:?}", other),
    };

    let first = stream.next().await.unwrap();
    assert_eq!(first.name(), "step");

    stream.cancel();
    assert!(stream.is_cancelled());
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_malformed_fields_still_end_stream_once() {
    let (engine, _) = engine().await;
    let stream = match engine.handle("ab12cd34", "/odd", "GET", &QueryParams::new()).await.unwrap() {
        MockResponse::Stream(s) => s,
        other => panic!("expected stream, got {:?}", other),
    };
    let events: Vec<StreamEvent> = stream.collect().await;

    assert_eq!(events.len(), 4);
    for event in &events[..3] {
        assert_eq!(event.name(), "step");
        let data = event.data();
        let x = data["x"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&x));
        assert!(data["y"].is_i64());
        assert_eq!(data["z"], json!([Value::Null]));
    }
    assert_eq!(events[3], StreamEvent::End);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn test_malformed_fields_one_shot_is_total() {
    let (engine, _) = engine().await;
    let workspaces = Arc::new(WorkspaceStore::new());
    workspaces
        .replace(
            "m1",
            Workspace::parse("/bad:\n  count: 2\n  fields:\n    f: { type: float, dmin: \"inf\", max: \"-NaN\" }\n")
                .unwrap(),
        )
        .await
        .unwrap();
    let engine = MockEngine::new(workspaces, engine.store().clone());

    let value = payload(engine.handle("m1", "/bad", "GET", &QueryParams::new()).await.unwrap());
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["f"].as_f64().is_some()));
}

struct FailingSource {
    succeed: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl RecordSource for FailingSource {
    async fn next_record(&self, _endpoint: &EndpointDescriptor) -> MockResult<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.succeed {
            Ok(json!({ "call": call }))
        } else {
            Err(MockError::Generation("template exploded".to_string()))
        }
    }
}

#[tokio::test]
async fn test_stream_generation_failure_emits_single_error() {
    let (engine, _) = engine().await;
    let engine = engine.with_emitter(StreamEmitter::new(Arc::new(FailingSource {
        succeed: 2,
        calls: AtomicUsize::new(0),
    })));

    let stream = match engine.handle("ab12cd34", "/events", "GET", &QueryParams::new()).await.unwrap() {
        MockResponse::Stream(s) => s,
        other => panic!("expected stream, got {:?}", other),
    };
    let events: Vec<StreamEvent> = stream.collect().await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], StreamEvent::Step(json!({ "call": 0 })));
    assert_eq!(events[1], StreamEvent::Step(json!({ "call": 1 })));
    assert_eq!(events[2].name(), "error");
    assert_eq!(
        events[2].data(),
        json!({ "error": "Generation failure: template exploded" })
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}
