use thiserror::Error;

use crate::config::{SchemaSettings, ServerSettings, Settings, StoreBackend, StoreSettings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&settings.server, &mut errors);
        Self::validate_schema(&settings.schema, &mut errors);
        Self::validate_store(&settings.store, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings, errors: &mut Vec<ValidationError>) {
        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }
    }

    fn validate_schema(schema: &SchemaSettings, errors: &mut Vec<ValidationError>) {
        if schema.path.trim().is_empty() {
            errors.push(ValidationError::MissingField("schema.path".to_string()));
        }

        if schema.mock_id.is_empty() {
            errors.push(ValidationError::MissingField("schema.mock_id".to_string()));
        } else if !schema
            .mock_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(ValidationError::InvalidValue {
                field: "schema.mock_id".to_string(),
                reason: "Only letters, digits, '-' and '_' are allowed".to_string(),
            });
        }
    }

    fn validate_store(store: &StoreSettings, errors: &mut Vec<ValidationError>) {
        if store.backend == StoreBackend::File && store.data_dir.trim().is_empty() {
            errors.push(ValidationError::MissingField("store.data_dir".to_string()));
        }

        if let Some(snapshot) = &store.workspace_snapshot {
            if snapshot.trim().is_empty() {
                errors.push(ValidationError::InvalidValue {
                    field: "store.workspace_snapshot".to_string(),
                    reason: "Path must not be empty".to_string(),
                });
            }
        }
    }
}
