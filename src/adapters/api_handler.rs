//! HTTP handlers: schema upload, mock dispatch, and workspace management.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::metrics_handler::MetricsCollector;
use crate::adapters::mock_engine::{MockEngine, MockResponse};
use crate::adapters::stream_emitter::MockEventStream;
use crate::adapters::workspace_store::WorkspaceStore;
use crate::domain::{MockError, QueryParams, Workspace};

const MOCK_ID_LENGTH: usize = 8;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<MockEngine>,
    pub workspaces: Arc<WorkspaceStore>,
    pub metrics: Arc<MetricsCollector>,
}

// ============================================================================
// Response Types
// ============================================================================

/// `{code, data?, message}` body used by every non-streaming response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub message: String,
}

impl ApiEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            data: Some(data),
            message: "success".to_string(),
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            data: None,
            message: message.into(),
        }
    }
}

impl From<MockError> for ApiEnvelope {
    fn from(err: MockError) -> Self {
        Self::error(err.status_code(), err.public_message())
    }
}

impl IntoResponse for ApiEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[derive(Serialize)]
pub struct EndpointSummary {
    pub path: String,
    pub method: String,
    pub stream: bool,
    pub db: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

// ============================================================================
// Upload
// ============================================================================

pub fn generate_mock_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(MOCK_ID_LENGTH);
    id
}

fn is_valid_mock_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `POST /upload` multipart form: optional `mockId`, required `file`
pub async fn upload_schema(State(state): State<ApiState>, multipart: Multipart) -> ApiEnvelope {
    let envelope = handle_upload(&state, multipart).await;
    let status = envelope.code.to_string();
    state
        .metrics
        .uploads_total
        .with_label_values(&[status.as_str()])
        .inc();
    envelope
}

async fn handle_upload(state: &ApiState, mut multipart: Multipart) -> ApiEnvelope {
    let mut mock_id: Option<String> = None;
    let mut file: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                return ApiEnvelope::error(StatusCode::BAD_REQUEST, format!("malformed form: {}", e));
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let text = match field.text().await {
            Ok(text) => text,
            Err(e) => {
                return ApiEnvelope::error(StatusCode::BAD_REQUEST, format!("unreadable field {}: {}", name, e))
            }
        };
        match name.as_str() {
            "mockId" => mock_id = Some(text.trim().to_string()).filter(|s| !s.is_empty()),
            "file" => file = Some(text),
            _ => {}
        }
    }

    let Some(file) = file else {
        return ApiEnvelope::error(StatusCode::BAD_REQUEST, "file is required");
    };
    let mock_id = mock_id.unwrap_or_else(generate_mock_id);
    if !is_valid_mock_id(&mock_id) {
        return ApiEnvelope::error(StatusCode::BAD_REQUEST, "invalid mockId");
    }

    let workspace = match Workspace::parse(&file) {
        Ok(ws) => ws,
        Err(e) => {
            warn!(mock_id = %mock_id, "Rejected schema upload: {}", e);
            return e.into();
        }
    };

    if let Err(e) = state.workspaces.replace(&mock_id, workspace).await {
        tracing::error!(mock_id = %mock_id, "Failed to store workspace: {}", e);
        return ApiEnvelope::error(StatusCode::INTERNAL_SERVER_ERROR, e.public_message());
    }
    // payloads persisted under the previous schema are stale
    if let Err(e) = state.engine.clear(&mock_id).await {
        tracing::error!(mock_id = %mock_id, "Failed to clear persisted records: {}", e);
        return ApiEnvelope::error(StatusCode::INTERNAL_SERVER_ERROR, e.public_message());
    }
    info!(mock_id = %mock_id, "Schema uploaded");
    ApiEnvelope::success(json!({ "mockId": mock_id }))
}

// ============================================================================
// Mock dispatch
// ============================================================================

/// `ANY /mock/:mockId/*path`
pub async fn dispatch_mock(
    State(state): State<ApiState>,
    Path((mock_id, path)): Path<(String, String)>,
    method: Method,
    Query(query): Query<QueryParams>,
) -> Response {
    serve(&state, &mock_id, &path, &method, &query).await
}

/// `ANY /mock/:mockId` addresses the root path `/`
pub async fn dispatch_mock_root(
    State(state): State<ApiState>,
    Path(mock_id): Path<String>,
    method: Method,
    Query(query): Query<QueryParams>,
) -> Response {
    serve(&state, &mock_id, "/", &method, &query).await
}

async fn serve(
    state: &ApiState,
    mock_id: &str,
    path: &str,
    method: &Method,
    query: &QueryParams,
) -> Response {
    match state.engine.handle(mock_id, path, method.as_str(), query).await {
        Ok(MockResponse::Payload(data)) => ApiEnvelope::success(data).into_response(),
        Ok(MockResponse::Stream(stream)) => sse_response(stream, state.metrics.clone()),
        Err(e) => ApiEnvelope::from(e).into_response(),
    }
}

fn sse_response(stream: MockEventStream, metrics: Arc<MetricsCollector>) -> Response {
    let events = stream.map(move |event| {
        metrics.stream_events.with_label_values(&[event.name()]).inc();
        Ok::<_, Infallible>(
            Event::default()
                .event(event.name())
                .data(event.data().to_string()),
        )
    });

    let mut response = Sse::new(events).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

// ============================================================================
// Workspace management
// ============================================================================

/// `GET /api/mocks/:mockId`
pub async fn get_workspace(
    State(state): State<ApiState>,
    Path(mock_id): Path<String>,
) -> ApiEnvelope {
    let Some(workspace) = state.workspaces.get(&mock_id).await else {
        return MockError::MockNotFound(mock_id).into();
    };
    let endpoints: Vec<EndpointSummary> = workspace
        .endpoints()
        .map(|(path, endpoint)| EndpointSummary {
            path: path.clone(),
            method: endpoint.method.to_ascii_uppercase(),
            stream: endpoint.stream,
            db: endpoint.db,
            count: endpoint.count,
        })
        .collect();
    ApiEnvelope::success(json!({ "mockId": mock_id, "endpoints": endpoints }))
}

/// `DELETE /api/mocks/:mockId/records`
pub async fn clear_records(
    State(state): State<ApiState>,
    Path(mock_id): Path<String>,
) -> ApiEnvelope {
    match state.engine.clear(&mock_id).await {
        Ok(removed) => ApiEnvelope::success(json!({ "mockId": mock_id, "removed": removed })),
        Err(e) => {
            tracing::error!(mock_id = %mock_id, "Failed to clear records: {}", e);
            e.into()
        }
    }
}
