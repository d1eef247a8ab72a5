//! Rendering capability abstraction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use gambit_core::{PageFormat, RendererConfig};

use crate::{AssetError, RenderError};

/// Leading bytes of every PDF document.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Whether `bytes` looks like a PDF document.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// How a page is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOptions {
    /// Paper size.
    pub format: PageFormat,
    /// Print CSS backgrounds.
    pub print_background: bool,
    /// Time allowed for sub-resources to settle before printing.
    pub network_idle: Duration,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            print_background: true,
            network_idle: Duration::from_millis(500),
        }
    }
}

impl From<&RendererConfig> for PdfOptions {
    fn from(config: &RendererConfig) -> Self {
        Self {
            format: config.format,
            print_background: config.print_background,
            network_idle: Duration::from_millis(config.network_idle_ms),
        }
    }
}

/// A live, isolated rendering environment.
#[async_trait]
pub trait PdfRenderer: Send {
    /// Load `html` and print it to PDF bytes.
    async fn render_pdf(&mut self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError>;

    /// Tear the environment down.
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

/// Produces a fresh renderer per invocation.
#[async_trait]
pub trait RendererFactory: Send + Sync {
    /// Acquire a renderer.
    async fn launch(&self) -> Result<Box<dyn PdfRenderer>, RenderError>;
}

/// Acquire a renderer, render `template` with it, and release it.
///
/// The renderer is closed whether loading or rendering succeeded or not.
/// When both the work and the release fail, the work's error wins.
pub async fn render_scoped(
    factory: &dyn RendererFactory,
    template: &Path,
    options: &PdfOptions,
) -> Result<Vec<u8>, AssetError> {
    let mut renderer = factory.launch().await?;
    let result = render_template(renderer.as_mut(), template, options).await;
    let closed = renderer.close().await;

    match (result, closed) {
        (Ok(pdf), Ok(())) => Ok(pdf),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::warn!(error = %close_err, "renderer release failed after render error");
            Err(e)
        }
    }
}

async fn render_template(
    renderer: &mut dyn PdfRenderer,
    template: &Path,
    options: &PdfOptions,
) -> Result<Vec<u8>, AssetError> {
    let html = tokio::fs::read_to_string(template)
        .await
        .map_err(|source| AssetError::Template {
            path: template.to_path_buf(),
            source,
        })?;

    let pdf = renderer.render_pdf(&html, options).await?;
    if !is_pdf(&pdf) {
        return Err(RenderError::InvalidOutput(format!(
            "{} bytes without a %PDF header",
            pdf.len()
        ))
        .into());
    }

    Ok(pdf)
}
