//! Headless Chrome/Chromium renderer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use gambit_core::RendererConfig;
use regex::Regex;
use tokio::process::Command;
use url::Url;

use crate::{PdfOptions, PdfRenderer, RenderError, RendererFactory};

/// Binary names probed on `PATH`, in order.
pub const CHROME_CANDIDATES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Environment variable that overrides `PATH` probing.
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

/// Launches one sandboxed headless browser profile per render.
#[derive(Debug, Clone)]
pub struct ChromeRendererFactory {
    binary: Option<PathBuf>,
    timeout: Duration,
    scratch_root: PathBuf,
}

impl ChromeRendererFactory {
    /// Factory that resolves the browser at launch time.
    pub fn new() -> Self {
        Self {
            binary: None,
            timeout: Duration::from_secs(60),
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Factory configured from `[renderer]`.
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            binary: config.chrome_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            ..Self::new()
        }
    }

    /// Use a specific browser binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Directory that holds per-render profiles.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Locate the browser: explicit path, then `$CHROME_PATH`, then `PATH`.
    pub fn resolve_binary(&self) -> Result<PathBuf, RenderError> {
        if let Some(binary) = &self.binary {
            return if binary.is_file() {
                Ok(binary.clone())
            } else {
                Err(RenderError::Launch(format!(
                    "configured browser not found: {}",
                    binary.display()
                )))
            };
        }

        if let Some(path) = std::env::var_os(CHROME_PATH_ENV).map(PathBuf::from) {
            if path.is_file() {
                return Ok(path);
            }
        }

        let search = std::env::var_os("PATH").unwrap_or_default();
        std::env::split_paths(&search)
            .flat_map(|dir| CHROME_CANDIDATES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                RenderError::Launch("no Chrome or Chromium binary found on PATH".to_string())
            })
    }
}

impl Default for ChromeRendererFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RendererFactory for ChromeRendererFactory {
    async fn launch(&self) -> Result<Box<dyn PdfRenderer>, RenderError> {
        let binary = self.resolve_binary()?;
        let scratch_root = std::path::absolute(&self.scratch_root)
            .map_err(|e| RenderError::Launch(format!("cannot resolve scratch root: {e}")))?;
        let session_dir =
            scratch_root.join(format!("gambit-render-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(session_dir.join("profile"))
            .await
            .map_err(|e| RenderError::Launch(format!("cannot create profile: {e}")))?;

        tracing::debug!(binary = %binary.display(), session = %session_dir.display(), "renderer launched");

        Ok(Box::new(ChromeRenderer {
            binary,
            session_dir,
            timeout: self.timeout,
            released: false,
        }))
    }
}

/// One isolated browser profile. Removed on `close` or drop.
#[derive(Debug)]
pub struct ChromeRenderer {
    binary: PathBuf,
    session_dir: PathBuf,
    timeout: Duration,
    released: bool,
}

impl ChromeRenderer {
    /// Scratch directory owned by this renderer.
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    fn args(&self, input: &Path, output: &Path, options: &PdfOptions) -> Result<Vec<OsString>, RenderError> {
        chrome_args(&self.session_dir.join("profile"), input, output, options)
    }
}

/// Command line for a single print-to-PDF run. `input` must be absolute.
pub fn chrome_args(
    profile: &Path,
    input: &Path,
    output: &Path,
    options: &PdfOptions,
) -> Result<Vec<OsString>, RenderError> {
    let url = Url::from_file_path(input).map_err(|()| {
        RenderError::Launch(format!("not an absolute input path: {}", input.display()))
    })?;
    let mut user_data_dir = OsString::from("--user-data-dir=");
    user_data_dir.push(profile);
    let mut print_to = OsString::from("--print-to-pdf=");
    print_to.push(output);

    Ok(vec![
        "--headless=new".into(),
        "--no-sandbox".into(),
        "--disable-setuid-sandbox".into(),
        "--disable-gpu".into(),
        "--hide-scrollbars".into(),
        "--no-first-run".into(),
        "--no-pdf-header-footer".into(),
        "--print-to-pdf-no-header".into(),
        "--run-all-compositor-stages-before-draw".into(),
        format!("--virtual-time-budget={}", options.network_idle.as_millis()).into(),
        user_data_dir,
        print_to,
        OsString::from(url.as_str()),
    ])
}

static HEAD_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid head regex"));

static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype[^>]*>").expect("valid doctype regex"));

/// Insert print rules that pin the paper size and background printing.
///
/// The rules go right after the opening `<head>` tag, else after the doctype
/// so the page stays in standards mode, else at the very start.
pub fn inject_print_styles(html: &str, options: &PdfOptions) -> String {
    let adjust = if options.print_background {
        "exact"
    } else {
        "economy"
    };
    let style = format!(
        "<style>@page {{ size: {}; }} html {{ -webkit-print-color-adjust: {adjust}; print-color-adjust: {adjust}; }}</style>",
        options.format.css_size()
    );

    let at = HEAD_TAG
        .find(html)
        .or_else(|| DOCTYPE.find(html))
        .map(|tag| tag.end())
        .unwrap_or(0);
    format!("{}{}{}", &html[..at], style, &html[at..])
}

#[async_trait]
impl PdfRenderer for ChromeRenderer {
    async fn render_pdf(&mut self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        let input = self.session_dir.join("input.html");
        let output = self.session_dir.join("output.pdf");
        tokio::fs::write(&input, inject_print_styles(html, options)).await?;

        let mut command = Command::new(&self.binary);
        command
            .args(self.args(&input, &output, options)?)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| RenderError::Launch(format!("{}: {e}", self.binary.display())))?;

        // Dropping the wait future on timeout kills the child.
        let finished = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))??;

        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&finished.stderr);
            let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            return Err(RenderError::Process(format!("{}: {}", finished.status, tail)));
        }

        match tokio::fs::read(&output).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RenderError::Process(
                "browser exited without writing a PDF".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let mut this = self;
        this.released = true;
        match tokio::fs::remove_dir_all(&this.session_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_dir_all(&self.session_dir);
        }
    }
}
