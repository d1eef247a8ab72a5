//! CLI command implementations.

pub mod render;
pub mod serve;

use std::path::PathBuf;

use clap::Args;

/// Arguments for the serve command.
#[derive(Args, Default)]
pub struct ServeArgs {
    /// Interface to bind (default: from config).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default: from config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Storage root for leads, public files and templates.
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Discard the cached checklist and render it again.
    #[arg(short, long)]
    pub force: bool,

    /// Storage root for leads, public files and templates.
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}
