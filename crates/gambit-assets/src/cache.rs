//! Generate-once checklist cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{render_scoped, AssetError, PdfOptions, RendererFactory};

/// Download name of the checklist.
pub const CHECKLIST_FILENAME: &str = "odoo-checklist.pdf";

/// MIME type of the checklist.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Where a served artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Read from the cache file.
    Hit,
    /// Rendered by this call.
    Miss,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
        }
    }
}

/// The checklist bytes plus download metadata.
#[derive(Debug, Clone)]
pub struct ChecklistPdf {
    /// PDF document.
    pub bytes: Vec<u8>,
    /// Attachment file name, fixed regardless of where the cache lives.
    pub filename: &'static str,
    /// Cache outcome.
    pub status: CacheStatus,
}

impl ChecklistPdf {
    /// `Content-Disposition` value marking the PDF as a download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Renders the checklist on first request and serves the cached file after.
///
/// A cached file is never revalidated against the template. Rendering is
/// single-flight: concurrent misses wait on one generation and then read its
/// result from disk.
pub struct AssetCache {
    cache_path: PathBuf,
    template_path: PathBuf,
    options: PdfOptions,
    factory: Arc<dyn RendererFactory>,
    generation_lock: Mutex<()>,
}

impl AssetCache {
    /// Cache at `cache_path`, rendered from `template_path`.
    pub fn new(
        cache_path: impl Into<PathBuf>,
        template_path: impl Into<PathBuf>,
        factory: Arc<dyn RendererFactory>,
    ) -> Self {
        Self {
            cache_path: cache_path.into(),
            template_path: template_path.into(),
            options: PdfOptions::default(),
            factory,
            generation_lock: Mutex::new(()),
        }
    }

    /// Set the print options.
    pub fn with_options(mut self, options: PdfOptions) -> Self {
        self.options = options;
        self
    }

    /// Cached artifact location.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Return the cached checklist, rendering it first if absent.
    pub async fn fetch_checklist(&self) -> Result<ChecklistPdf, AssetError> {
        if let Some(bytes) = self.read_cached().await? {
            return Ok(self.checklist(bytes, CacheStatus::Hit));
        }

        let _guard = self.generation_lock.lock().await;

        // Another request may have finished generating while we waited.
        if let Some(bytes) = self.read_cached().await? {
            return Ok(self.checklist(bytes, CacheStatus::Hit));
        }

        let bytes = render_scoped(self.factory.as_ref(), &self.template_path, &self.options).await?;
        self.persist(&bytes).await?;
        tracing::debug!(path = %self.cache_path.display(), bytes = bytes.len(), "checklist cached");

        Ok(self.checklist(bytes, CacheStatus::Miss))
    }

    /// Delete the cached artifact. Returns whether one existed.
    pub async fn invalidate(&self) -> Result<bool, AssetError> {
        let _guard = self.generation_lock.lock().await;
        match tokio::fs::remove_file(&self.cache_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    fn checklist(&self, bytes: Vec<u8>, status: CacheStatus) -> ChecklistPdf {
        ChecklistPdf {
            bytes,
            filename: CHECKLIST_FILENAME,
            status,
        }
    }

    async fn read_cached(&self) -> Result<Option<Vec<u8>>, AssetError> {
        match tokio::fs::read(&self.cache_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    async fn persist(&self, bytes: &[u8]) -> Result<(), AssetError> {
        if let Some(parent) = self.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error(e))?;
        }

        let mut temp_name = self
            .cache_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        temp_name.push(".partial");
        let temp = self.cache_path.with_file_name(temp_name);

        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| self.storage_error(e))?;
        tokio::fs::rename(&temp, &self.cache_path)
            .await
            .map_err(|e| self.storage_error(e))
    }

    fn storage_error(&self, source: std::io::Error) -> AssetError {
        AssetError::Storage {
            path: self.cache_path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{PdfRenderer, RenderError};

    const FAKE_PDF: &[u8] = b"%PDF-1.4\nfake checklist\n%%EOF";

    #[derive(Default)]
    struct Stats {
        launches: AtomicUsize,
        renders: AtomicUsize,
        closes: AtomicUsize,
        last_html: std::sync::Mutex<Option<String>>,
    }

    #[derive(Clone)]
    enum Behavior {
        Render(Vec<u8>),
        FailRender,
        FailLaunch,
    }

    struct FakeFactory {
        stats: Arc<Stats>,
        behavior: Behavior,
        delay: Duration,
    }

    impl FakeFactory {
        fn new(behavior: Behavior) -> (Arc<Self>, Arc<Stats>) {
            let stats = Arc::new(Stats::default());
            let factory = Arc::new(Self {
                stats: Arc::clone(&stats),
                behavior,
                delay: Duration::ZERO,
            });
            (factory, stats)
        }

        fn slow(behavior: Behavior, delay: Duration) -> (Arc<Self>, Arc<Stats>) {
            let stats = Arc::new(Stats::default());
            let factory = Arc::new(Self {
                stats: Arc::clone(&stats),
                behavior,
                delay,
            });
            (factory, stats)
        }
    }

    struct FakeRenderer {
        stats: Arc<Stats>,
        behavior: Behavior,
        delay: Duration,
    }

    #[async_trait]
    impl RendererFactory for FakeFactory {
        async fn launch(&self) -> Result<Box<dyn PdfRenderer>, RenderError> {
            if matches!(self.behavior, Behavior::FailLaunch) {
                return Err(RenderError::Launch("no browser".to_string()));
            }
            self.stats.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeRenderer {
                stats: Arc::clone(&self.stats),
                behavior: self.behavior.clone(),
                delay: self.delay,
            }))
        }
    }

    #[async_trait]
    impl PdfRenderer for FakeRenderer {
        async fn render_pdf(&mut self, html: &str, _options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
            self.stats.renders.fetch_add(1, Ordering::SeqCst);
            *self.stats.last_html.lock().unwrap() = Some(html.to_string());
            tokio::time::sleep(self.delay).await;
            match &self.behavior {
                Behavior::Render(bytes) => Ok(bytes.clone()),
                _ => Err(RenderError::Timeout(Duration::from_secs(30))),
            }
        }

        async fn close(self: Box<Self>) -> Result<(), RenderError> {
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        dir: PathBuf,
        template: PathBuf,
        cache_path: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = std::env::temp_dir().join(format!("gambit-assets-{}", uuid::Uuid::new_v4()));
        let template = dir.join("templates").join("checklist.html");
        std::fs::create_dir_all(template.parent().unwrap()).unwrap();
        std::fs::write(&template, "<html><body>Go-live checklist</body></html>").unwrap();
        Fixture {
            cache_path: dir.join("public").join(CHECKLIST_FILENAME),
            template,
            dir,
        }
    }

    fn cache(fx: &Fixture, factory: Arc<FakeFactory>) -> AssetCache {
        AssetCache::new(&fx.cache_path, &fx.template, factory)
    }

    // === Miss / Hit Tests ===

    #[tokio::test]
    async fn test_first_fetch_renders_and_caches() {
        let fx = fixture();
        let (factory, stats) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));
        let cache = cache(&fx, factory);

        let pdf = cache.fetch_checklist().await.unwrap();

        assert_eq!(pdf.status, CacheStatus::Miss);
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert_eq!(pdf.filename, "odoo-checklist.pdf");
        assert_eq!(std::fs::read(&fx.cache_path).unwrap(), pdf.bytes);
        assert_eq!(stats.launches.load(Ordering::SeqCst), 1);
        assert_eq!(stats.closes.load(Ordering::SeqCst), 1);
        assert_eq!(
            stats.last_html.lock().unwrap().as_deref(),
            Some("<html><body>Go-live checklist</body></html>")
        );
    }

    #[tokio::test]
    async fn test_second_fetch_serves_cache_without_rendering() {
        let fx = fixture();
        let (factory, stats) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));
        let cache = cache(&fx, factory);

        cache.fetch_checklist().await.unwrap();
        let second = cache.fetch_checklist().await.unwrap();

        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(second.bytes, std::fs::read(&fx.cache_path).unwrap());
        assert_eq!(stats.launches.load(Ordering::SeqCst), 1);
        assert_eq!(stats.renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_never_revalidated() {
        let fx = fixture();
        std::fs::create_dir_all(fx.cache_path.parent().unwrap()).unwrap();
        std::fs::write(&fx.cache_path, b"%PDF-old").unwrap();
        std::fs::write(&fx.template, "<html>changed</html>").unwrap();
        let (factory, stats) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));

        let pdf = cache(&fx, factory).fetch_checklist().await.unwrap();

        assert_eq!(pdf.bytes, b"%PDF-old");
        assert_eq!(stats.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_content_disposition() {
        let fx = fixture();
        let (factory, _) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));

        let pdf = cache(&fx, factory).fetch_checklist().await.unwrap();

        assert_eq!(
            pdf.content_disposition(),
            "attachment; filename=\"odoo-checklist.pdf\""
        );
    }

    #[tokio::test]
    async fn test_download_name_ignores_cache_file_name() {
        let mut fx = fixture();
        fx.cache_path = fx.dir.join("public").join("checklist-v2.pdf");
        let (factory, _) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));
        let cache = cache(&fx, factory);

        let miss = cache.fetch_checklist().await.unwrap();
        let hit = cache.fetch_checklist().await.unwrap();

        assert!(fx.cache_path.is_file());
        for pdf in [miss, hit] {
            assert_eq!(pdf.filename, CHECKLIST_FILENAME);
            assert_eq!(
                pdf.content_disposition(),
                "attachment; filename=\"odoo-checklist.pdf\""
            );
        }
    }

    // === Failure Tests ===

    #[tokio::test]
    async fn test_render_failure_releases_renderer_and_writes_nothing() {
        let fx = fixture();
        let (factory, stats) = FakeFactory::new(Behavior::FailRender);

        let err = cache(&fx, factory).fetch_checklist().await.unwrap_err();

        assert!(err.is_generation_failure());
        assert!(matches!(err, AssetError::Generation(RenderError::Timeout(_))));
        assert_eq!(stats.closes.load(Ordering::SeqCst), 1);
        assert!(!fx.cache_path.exists());
        assert!(!fx.dir.join("public").join("odoo-checklist.pdf.partial").exists());
    }

    #[tokio::test]
    async fn test_launch_failure_is_generation_error() {
        let fx = fixture();
        let (factory, _) = FakeFactory::new(Behavior::FailLaunch);

        let err = cache(&fx, factory).fetch_checklist().await.unwrap_err();

        assert!(matches!(err, AssetError::Generation(RenderError::Launch(_))));
        assert!(!fx.cache_path.exists());
    }

    #[tokio::test]
    async fn test_missing_template_releases_renderer() {
        let fx = fixture();
        std::fs::remove_file(&fx.template).unwrap();
        let (factory, stats) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));

        let err = cache(&fx, factory).fetch_checklist().await.unwrap_err();

        assert!(matches!(err, AssetError::Template { .. }));
        assert!(err.is_generation_failure());
        assert_eq!(stats.launches.load(Ordering::SeqCst), 1);
        assert_eq!(stats.closes.load(Ordering::SeqCst), 1);
        assert_eq!(stats.renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_output_is_rejected() {
        let fx = fixture();
        let (factory, _) = FakeFactory::new(Behavior::Render(b"<html>oops</html>".to_vec()));

        let err = cache(&fx, factory).fetch_checklist().await.unwrap_err();

        assert!(matches!(
            err,
            AssetError::Generation(RenderError::InvalidOutput(_))
        ));
        assert!(!fx.cache_path.exists());
    }

    #[tokio::test]
    async fn test_retry_after_failure_regenerates() {
        let fx = fixture();
        let (failing, _) = FakeFactory::new(Behavior::FailRender);
        assert!(cache(&fx, failing).fetch_checklist().await.is_err());

        let (working, stats) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));
        let pdf = cache(&fx, working).fetch_checklist().await.unwrap();

        assert_eq!(pdf.status, CacheStatus::Miss);
        assert_eq!(stats.renders.load(Ordering::SeqCst), 1);
    }

    // === Concurrency Tests ===

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_render_once() {
        let fx = fixture();
        let (factory, stats) =
            FakeFactory::slow(Behavior::Render(FAKE_PDF.to_vec()), Duration::from_millis(50));
        let cache = Arc::new(cache(&fx, factory));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.fetch_checklist().await })
            })
            .collect();
        for handle in handles {
            let pdf = handle.await.unwrap().unwrap();
            assert_eq!(pdf.bytes, FAKE_PDF);
        }

        assert_eq!(stats.renders.load(Ordering::SeqCst), 1);
    }

    // === Invalidation Tests ===

    #[tokio::test]
    async fn test_invalidate_forces_regeneration() {
        let fx = fixture();
        let (factory, stats) = FakeFactory::new(Behavior::Render(FAKE_PDF.to_vec()));
        let cache = cache(&fx, factory);

        cache.fetch_checklist().await.unwrap();
        assert!(cache.invalidate().await.unwrap());
        assert!(!cache.invalidate().await.unwrap());
        let pdf = cache.fetch_checklist().await.unwrap();

        assert_eq!(pdf.status, CacheStatus::Miss);
        assert_eq!(stats.renders.load(Ordering::SeqCst), 2);
    }
}
