//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use gambit_core::GambitConfig;

/// Execution context for CLI commands.
pub struct Context {
    /// Service configuration, with `storage.root` made absolute.
    pub config: GambitConfig,
    /// Config file the settings came from, if any.
    pub config_path: Option<PathBuf>,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load from an explicit path, else discover from the working directory, else defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config_path, mut config) = match config_path {
            Some(path) => {
                let config = GambitConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?;
                (Some(path.to_path_buf()), config)
            }
            None => match GambitConfig::discover(&cwd) {
                Some((path, config)) => (Some(path), config),
                None => (None, GambitConfig::default()),
            },
        };

        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(|dir| cwd.join(dir))
            .unwrap_or_else(|| cwd.clone());
        config.storage.root = anchor(&base, &config.storage.root);

        Ok(Self {
            config,
            config_path,
            cwd,
        })
    }

    /// Override the storage root with a path relative to the working directory.
    pub fn set_root(&mut self, root: &Path) {
        self.config.storage.root = anchor(&self.cwd, root);
    }
}

/// Storage roots in a config file are relative to that file.
fn anchor(base: &Path, root: &Path) -> PathBuf {
    if root.is_absolute() {
        root.to_path_buf()
    } else {
        base.join(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_relative() {
        let root = anchor(Path::new("/srv/gambit"), Path::new("data"));
        assert_eq!(root, PathBuf::from("/srv/gambit/data"));
    }

    #[test]
    fn test_anchor_absolute() {
        let root = anchor(Path::new("/srv/gambit"), Path::new("/var/lib/gambit"));
        assert_eq!(root, PathBuf::from("/var/lib/gambit"));
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = std::env::temp_dir().join(format!("gambit-ctx-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gambit.toml");
        std::fs::write(&path, "[storage]\nroot = \"data\"\n\n[server]\nport = 8080\n").unwrap();

        let ctx = Context::load(Some(&path)).unwrap();
        assert_eq!(ctx.config.server.port, 8080);
        assert_eq!(ctx.config.storage.root, dir.join("data"));
        assert_eq!(ctx.config_path.as_deref(), Some(path.as_path()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let path = std::env::temp_dir().join(format!("gambit-missing-{}.toml", uuid::Uuid::new_v4()));
        assert!(Context::load(Some(&path)).is_err());
    }
}
