use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use node_engine::config::Cli;
use node_engine::event_bus::EventBus;
use node_engine::http::{self, AppState};
use node_engine::registry::ComponentRegistry;
use node_engine::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    if !cli.registry_root.is_dir() {
        eprintln!(
            "registry root {} does not exist or is not a directory",
            cli.registry_root.display()
        );
        std::process::exit(1);
    }

    let registry = Arc::new(
        ComponentRegistry::new(&cli.registry_root).context("failed to open component registry")?,
    );
    let event_bus = Arc::new(EventBus::new());
    let state = AppState::new(registry, event_bus);
    let router = http::router(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, registry_root = %cli.registry_root.display(), "starting node engine server");

    tokio::select! {
        result = axum::serve(listener, router.into_make_service()) => {
            result.context("server error")?;
        }
        _ = signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
    }

    Ok(())
}
