//! Run the HTTP service.

use anyhow::{Context as _, Result};
use gambit_observability::LogLevel;
use tokio::net::TcpListener;

use super::ServeArgs;
use crate::context::Context;
use gambit_server::{asset_cache_from_config, build_router, lead_store_from_config, AppState};

/// Run the serve command until ctrl-c.
pub async fn run(args: ServeArgs, mut ctx: Context, level: LogLevel) -> Result<()> {
    if let Some(root) = &args.root {
        ctx.set_root(root);
    }
    if let Some(host) = args.host {
        ctx.config.server.host = host;
    }
    if let Some(port) = args.port {
        ctx.config.server.port = port;
    }

    let config = &ctx.config;
    let addr = config.server.socket_addr()?;

    let leads = lead_store_from_config(config)
        .await
        .context("Failed to prepare lead storage")?;
    let on_file = leads
        .leads()
        .await
        .context("Failed to read lead collection")?
        .len();
    tracing::info!("{} leads on file", on_file);

    let assets = asset_cache_from_config(config);
    let state = AppState::new(leads, assets).with_logging(config.logging.format, level);

    let public_dir = config.storage.public_path();
    tracing::debug!(
        "root={} public={} leads={}",
        config.storage.root.display(),
        public_dir.display(),
        config.storage.leads_path().display()
    );

    let app = build_router(state, &public_dir);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Gambit backend listening on port {}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
