//! Render the checklist PDF ahead of the first download.

use anyhow::{Context as _, Result};

use super::RenderArgs;
use crate::context::Context;
use gambit_server::asset_cache_from_config;

/// Run the render command.
pub async fn run(args: RenderArgs, mut ctx: Context) -> Result<()> {
    if let Some(root) = &args.root {
        ctx.set_root(root);
    }

    let cache = asset_cache_from_config(&ctx.config);

    if args.force && cache.invalidate().await.context("Failed to discard cached checklist")? {
        tracing::info!("Discarded {}", cache.cache_path().display());
    }

    let pdf = cache
        .fetch_checklist()
        .await
        .context("PDF generation failed")?;

    tracing::info!(
        "Checklist {} ({}): {} bytes at {}",
        pdf.filename,
        pdf.status,
        pdf.bytes.len(),
        cache.cache_path().display()
    );
    Ok(())
}
