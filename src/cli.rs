use clap::Parser;
use std::path::PathBuf;

use crate::config::StoreBackend;

/// Schema-driven mock API server
#[derive(Parser, Debug, Clone)]
#[command(name = "mockoro", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "MOCKORO_CONFIG", default_value = "mockoro.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "MOCKORO_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "MOCKORO_PORT")]
    pub port: Option<u16>,

    /// Schema file loaded at startup
    #[arg(long, env = "MOCK_YAML_PATH")]
    pub schema: Option<String>,

    /// Mock identifier the schema file is served under
    #[arg(long, env = "MOCKORO_MOCK_ID")]
    pub mock_id: Option<String>,

    /// Do not reload the schema file when it changes
    #[arg(long)]
    pub no_watch: bool,

    /// Result store backend (memory or file)
    #[arg(long, env = "MOCKORO_STORE")]
    pub store: Option<StoreBackend>,

    /// Directory for the file result store
    #[arg(long, env = "MOCKORO_DATA_DIR")]
    pub data_dir: Option<String>,

    /// JSON file mirroring uploaded workspaces
    #[arg(long, env = "MOCKORO_WORKSPACE_SNAPSHOT")]
    pub workspace_snapshot: Option<String>,
}
