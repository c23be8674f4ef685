use clap::Parser;
use mockoro::cli::Cli;
use mockoro::config::{watcher::SchemaWatcher, Settings};
use mockoro::domain::MockError;
use mockoro::AppComponents;
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting Mockoro mock server on {}:{}", host, port);

    let app = AppComponents::from_settings(&settings)?;

    match app.workspaces.load_snapshot().await {
        Ok(0) => {}
        Ok(n) => info!("Restored {} workspaces", n),
        Err(e) => warn!("Failed to restore workspace snapshot: {}", e),
    }

    match app.loader.load().await {
        Ok(_) => {}
        Err(MockError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Schema file {} not found, starting without it", app.loader.path().display());
        }
        Err(e) => warn!("Failed to load schema file {}: {}", app.loader.path().display(), e),
    }

    // Keep the watcher alive for the life of the server
    let _watcher = if settings.schema.watch {
        let loader = app.loader.clone();
        let runtime = tokio::runtime::Handle::current();
        match SchemaWatcher::new(loader.path().to_path_buf(), move || {
            let loader = loader.clone();
            runtime.spawn(async move {
                if let Err(e) = loader.reload().await {
                    error!("Schema reload failed: {}", e);
                }
            });
        }) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Schema hot reload disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.router()).await?;

    Ok(())
}
