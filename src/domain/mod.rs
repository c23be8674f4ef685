use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub mod endpoint;
pub mod error;
pub mod field;
pub mod pagination;

pub use endpoint::{
    normalize_path, DelaySpec, EndpointDescriptor, QueryParams, StoredRecord, Workspace,
};
pub use error::{MockError, MockResult};
pub use field::{ArrayShape, FieldDescriptor, FieldMap, IpVersion, Locale, StringFormat};
pub use pagination::{paginate_generated, paginate_stored};

/// Schema lookup consumed by the engine
#[async_trait]
pub trait WorkspacePort: Send + Sync {
    /// Find the endpoint answering `method` on `path` in the workspace `mock_id`
    async fn resolve_endpoint(
        &self,
        mock_id: &str,
        path: &str,
        method: &str,
    ) -> MockResult<Arc<EndpointDescriptor>>;
}

/// Persisted payloads, one isolated partition per mock identifier
#[async_trait]
pub trait ResultStorePort: Send + Sync {
    async fn get(&self, mock_id: &str, path: &str) -> MockResult<Option<StoredRecord>>;

    /// Last write wins; no merge
    async fn put(&self, mock_id: &str, path: &str, record: StoredRecord) -> MockResult<()>;

    /// Remove every record of `mock_id`, returning how many were removed
    async fn clear(&self, mock_id: &str) -> MockResult<usize>;

    /// Read the record for `path` with persisted-path pagination applied
    async fn list(
        &self,
        mock_id: &str,
        path: &str,
        query: &QueryParams,
        endpoint: &EndpointDescriptor,
    ) -> MockResult<Option<Value>> {
        let record = self.get(mock_id, path).await?;
        Ok(record.map(|r| paginate_stored(&r.mock_data, query, endpoint)))
    }
}
