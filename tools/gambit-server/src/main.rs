//! Gambit - lead capture and checklist download service.
//!
//! Commands:
//! - `gambit serve` - Run the HTTP service (default)
//! - `gambit render` - Render the checklist PDF into the cache

mod commands;
mod context;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gambit_core::LogFormat;

use commands::{RenderArgs, ServeArgs};

/// Gambit - capture leads and serve the go-live checklist
#[derive(Parser)]
#[command(name = "gambit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Render the checklist PDF into the cache
    Render(RenderArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut ctx = match context::Context::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };

    if cli.verbose {
        ctx.config.logging.level = "debug".to_string();
    }
    if cli.json {
        ctx.config.logging.format = LogFormat::Json;
    }

    let level = match gambit_observability::init_tracing(&ctx.config.logging) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &ctx.config_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let result = match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => commands::serve::run(args, ctx, level).await,
        Commands::Render(args) => commands::render::run(args, ctx).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
