//! Error types for mock resolution, generation and storage

use thiserror::Error;

/// Errors surfaced by the mock engine and its stores
#[derive(Debug, Error)]
pub enum MockError {
    /// No workspace was uploaded under this mock identifier
    #[error("mockId not found: {0}")]
    MockNotFound(String),

    /// The workspace has no endpoint for this path + method pair
    #[error("api not found: {method} {path}")]
    EndpointNotFound { path: String, method: String },

    /// Template resolution or encoding failed
    #[error("Generation failure: {0}")]
    Generation(String),

    /// Persisted record read/write failed
    #[error("Store error: {0}")]
    Store(String),

    /// Uploaded or on-disk schema document could not be parsed
    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MockResult<T> = Result<T, MockError>;

impl MockError {
    /// Convert to HTTP status code for API responses
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::MockNotFound(_) | Self::EndpointNotFound { .. } => StatusCode::NOT_FOUND,
            Self::SchemaParse(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to API clients.
    ///
    /// Internal failures are logged with detail but reported generically.
    pub fn public_message(&self) -> String {
        match self {
            Self::MockNotFound(_) => "mockId not found".to_string(),
            Self::EndpointNotFound { .. } => "api not found".to_string(),
            Self::SchemaParse(reason) => format!("schema parse error: {}", reason),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<serde_yaml::Error> for MockError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SchemaParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            MockError::MockNotFound("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MockError::EndpointNotFound {
                path: "/users".into(),
                method: "GET".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MockError::SchemaParse("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MockError::Store("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = MockError::Store("/var/lib/DB/admin.json: permission denied".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            MockError::MockNotFound("x".into()).public_message(),
            "mockId not found"
        );
    }
}
