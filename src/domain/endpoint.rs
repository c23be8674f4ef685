use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::error::{MockError, MockResult};
use super::field::{deserialize_fields, FieldMap};

/// Query parameters of the active request
pub type QueryParams = HashMap<String, String>;

pub const DEFAULT_PAGE_PARAM: &str = "currentPage";
pub const DEFAULT_SIZE_PARAM: &str = "numberPerPage";
pub const DEFAULT_STREAM_COUNT: usize = 5;

/// Wait applied before materializing a payload or between stream records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DelaySpec {
    /// Fixed number of milliseconds
    Fixed(u64),
    /// Uniform integer milliseconds in `[min, max]`, sampled per use
    Range { min: u64, max: u64 },
}

impl DelaySpec {
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> Duration {
        let millis = match *self {
            DelaySpec::Fixed(ms) => ms,
            DelaySpec::Range { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rng.gen_range(lo..=hi)
            }
        };
        Duration::from_millis(millis)
    }
}

/// Schema slice for one virtual API path
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointDescriptor {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, deserialize_with = "deserialize_fields")]
    pub fields: FieldMap,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<usize>,
    #[serde(default, alias = "interval", deserialize_with = "lenient_delay")]
    pub delay: Option<DelaySpec>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub db: bool,
    /// Query parameter holding the 0-indexed page for persisted reads
    #[serde(default = "default_page_param")]
    pub page: String,
    /// Query parameter holding the page size for persisted reads
    #[serde(default = "default_size_param")]
    pub size: String,
    /// Field of a persisted object payload that holds the paginatable list
    #[serde(default, rename = "rowData")]
    pub row_data: Option<String>,
    /// Field of a persisted object payload that holds the list total
    #[serde(default)]
    pub total: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_page_param() -> String {
    DEFAULT_PAGE_PARAM.to_string()
}

fn default_size_param() -> String {
    DEFAULT_SIZE_PARAM.to_string()
}

/// Finite number from a number or numeric string
fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Whole milliseconds; negative waits become 0 and fractions truncate
fn coerce_millis(value: &Value) -> Option<u64> {
    coerce_f64(value).map(|n| n.max(0.0).trunc() as u64)
}

/// Unusable or negative counts are treated as absent; fractions truncate
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&raw)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc() as usize))
}

/// Anything unusable is treated as no delay
fn lenient_delay<'de, D>(deserializer: D) -> Result<Option<DelaySpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match &raw {
        Value::Object(range) => match (
            range.get("min").and_then(coerce_millis),
            range.get("max").and_then(coerce_millis),
        ) {
            (Some(min), Some(max)) => Some(DelaySpec::Range { min, max }),
            (Some(ms), None) | (None, Some(ms)) => Some(DelaySpec::Fixed(ms)),
            (None, None) => None,
        },
        other => coerce_millis(other).map(DelaySpec::Fixed),
    })
}

impl EndpointDescriptor {
    /// Records to generate for a one-shot or persisted request; 0 counts as 1
    pub fn record_count(&self) -> usize {
        self.count.filter(|c| *c > 0).unwrap_or(1)
    }

    /// Records to emit on a stream
    pub fn stream_count(&self) -> usize {
        self.count.unwrap_or(DEFAULT_STREAM_COUNT)
    }

    pub fn resolve_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        self.delay
            .map(|d| d.resolve(rng))
            .unwrap_or(Duration::ZERO)
    }

    pub fn answers(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }

    /// Name of the count field refreshed when paginating a nested `rowData` list.
    ///
    /// Falls back to the stringified `count` for schemas written before `total` existed.
    pub fn total_field(&self) -> Option<String> {
        self.total
            .clone()
            .or_else(|| self.count.map(|c| c.to_string()))
    }
}

/// All endpoints uploaded under one mock identifier
#[derive(Debug, Clone)]
pub struct Workspace {
    endpoints: IndexMap<String, Arc<EndpointDescriptor>>,
    document: Value,
}

impl Workspace {
    /// Build from a parsed schema document (path -> endpoint descriptor)
    pub fn from_document(document: Value) -> MockResult<Self> {
        let raw: IndexMap<String, EndpointDescriptor> = serde_json::from_value(document.clone())
            .map_err(|e| MockError::SchemaParse(e.to_string()))?;
        let endpoints = raw
            .into_iter()
            .map(|(path, endpoint)| (normalize_path(&path), Arc::new(endpoint)))
            .collect();
        Ok(Self {
            endpoints,
            document,
        })
    }

    /// Parse YAML (or JSON, which YAML accepts) schema text
    pub fn parse(text: &str) -> MockResult<Self> {
        let document: Value = serde_yaml::from_str(text)?;
        if !document.is_object() {
            return Err(MockError::SchemaParse(
                "schema document must be a mapping of path to endpoint".to_string(),
            ));
        }
        Self::from_document(document)
    }

    pub fn endpoint(&self, path: &str) -> Option<Arc<EndpointDescriptor>> {
        self.endpoints.get(&normalize_path(path)).cloned()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = (&String, &Arc<EndpointDescriptor>)> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Source document, kept for snapshots
    pub fn document(&self) -> &Value {
        &self.document
    }
}

/// Materialized payload persisted for one (mock id, path) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub path: String,
    #[serde(default)]
    pub query: QueryParams,
    #[serde(rename = "mockData")]
    pub mock_data: Value,
    pub method: String,
}

/// Canonical request path: leading slash, no trailing slash (except root)
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    format!("/{}", trimmed)
}
