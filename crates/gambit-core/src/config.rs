//! Service configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// File names probed when no explicit config path is given.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["gambit.toml", ".gambit.toml", "gambit.json"];

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GambitConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Filesystem layout.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Lead capture settings.
    #[serde(default)]
    pub leads: LeadsConfig,

    /// PDF renderer settings.
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GambitConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if is_json(path) {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Find a config file in `start` or any of its ancestors.
    ///
    /// Files that exist but fail to parse are skipped.
    pub fn discover(start: &Path) -> Option<(PathBuf, Self)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    if let Ok(config) = Self::load(&candidate) {
                        return Some((candidate, config));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Parse host and port into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidAddress(raw))
    }
}

/// Filesystem layout. Relative paths resolve against `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for every relative path below.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Lead collection file.
    #[serde(default = "default_leads_file")]
    pub leads_file: PathBuf,

    /// Static asset root.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// File name of the cached checklist inside `public_dir`.
    #[serde(default = "default_checklist_file")]
    pub checklist_file: String,

    /// HTML template the checklist is rendered from.
    #[serde(default = "default_template")]
    pub template: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_leads_file() -> PathBuf {
    PathBuf::from("leads.json")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_checklist_file() -> String {
    "odoo-checklist.pdf".to_string()
}

fn default_template() -> PathBuf {
    PathBuf::from("templates").join("checklist.html")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            leads_file: default_leads_file(),
            public_dir: default_public_dir(),
            checklist_file: default_checklist_file(),
            template: default_template(),
        }
    }
}

impl StorageConfig {
    /// Resolve a path relative to the storage root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute-or-rooted path of the lead collection.
    pub fn leads_path(&self) -> PathBuf {
        self.resolve(&self.leads_file)
    }

    /// Static asset directory.
    pub fn public_path(&self) -> PathBuf {
        self.resolve(&self.public_dir)
    }

    /// Cached checklist location.
    pub fn checklist_path(&self) -> PathBuf {
        self.public_path().join(&self.checklist_file)
    }

    /// Checklist HTML template.
    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template)
    }
}

/// Lead capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadsConfig {
    /// Source tag recorded when a submission omits one.
    #[serde(default = "default_source")]
    pub default_source: String,
}

/// Source tag used when a submission carries none.
pub const DEFAULT_LEAD_SOURCE: &str = "popup";

fn default_source() -> String {
    DEFAULT_LEAD_SOURCE.to_string()
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            default_source: default_source(),
        }
    }
}

/// Paper size for rendered documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    /// ISO A4, 210 x 297 mm.
    #[default]
    A4,
    /// US Letter, 8.5 x 11 in.
    Letter,
}

impl PageFormat {
    /// CSS `@page size` keyword.
    pub fn css_size(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "letter",
        }
    }
}

/// PDF renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Explicit Chrome/Chromium binary. Falls back to `$CHROME_PATH`, then a `PATH` search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Paper size.
    #[serde(default)]
    pub format: PageFormat,

    /// Print CSS backgrounds.
    #[serde(default = "default_true")]
    pub print_background: bool,

    /// How long the page may keep loading sub-resources before printing.
    #[serde(default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Hard ceiling on a single render.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_network_idle_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            format: PageFormat::default(),
            print_background: true,
            network_idle_ms: default_network_idle_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for log aggregation).
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error.
    #[serde(default = "default_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}
