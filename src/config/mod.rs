use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod validator;
pub mod watcher;

use crate::cli::Cli;

pub const DEFAULT_SCHEMA_PATH: &str = "mock.yaml";
pub const DEFAULT_MOCK_ID: &str = "admin";
pub const DEFAULT_DATA_DIR: &str = "DB";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub schema: SchemaSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Schema file loaded at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaSettings {
    #[serde(default = "default_schema_path")]
    pub path: String,
    /// Mock identifier the file is served under
    #[serde(default = "default_mock_id")]
    pub mock_id: String,
    /// Reload (and drop persisted records) when the file changes
    #[serde(default = "default_watch")]
    pub watch: bool,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
            mock_id: default_mock_id(),
            watch: default_watch(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory holding one record file per mock id (file backend)
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// JSON file mirroring every uploaded workspace, restored at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_snapshot: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
            workspace_snapshot: None,
        }
    }
}

fn default_schema_path() -> String {
    DEFAULT_SCHEMA_PATH.to_string()
}

fn default_mock_id() -> String {
    DEFAULT_MOCK_ID.to_string()
}

fn default_watch() -> bool {
    true
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, then CLI / env overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    /// Load `<root>/mockoro.{toml,yaml,json}` if present, otherwise defaults
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let settings = Self::load(&Path::new(root).join("mockoro"))?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path.to_path_buf()).required(false))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(path) = &cli.schema {
            self.schema.path = path.clone();
        }
        if let Some(mock_id) = &cli.mock_id {
            self.schema.mock_id = mock_id.clone();
        }
        if cli.no_watch {
            self.schema.watch = false;
        }
        if let Some(backend) = cli.store {
            self.store.backend = backend;
        }
        if let Some(dir) = &cli.data_dir {
            self.store.data_dir = dir.clone();
        }
        if let Some(snapshot) = &cli.workspace_snapshot {
            self.store.workspace_snapshot = Some(snapshot.clone());
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }
}
