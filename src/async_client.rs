//! Async wrapper around [`ErasViewer`] for use in async runtimes (Tokio, etc.).
//!
//! Runs viewer operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], so catalog loading, deck writes and
//! image downloads never stall the event loop.
//!
//! # Example
//!
//! ```no_run
//! use eras_viewer::{AsyncErasViewer, FilterCriteria, GroupingOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let viewer = AsyncErasViewer::builder().build().await.unwrap();
//!
//!     let sections = viewer
//!         .layout(FilterCriteria::default(), GroupingOptions::default())
//!         .await
//!         .unwrap();
//!
//!     let copies = viewer.run(|v| v.add_to_deck(42)).await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{ErasError, Result};
use crate::grouping::{GroupingOptions, Section};
use crate::models::FilterCriteria;
use crate::ErasViewer;

// ---------------------------------------------------------------------------
// AsyncErasViewerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncErasViewer`] instance.
#[derive(Default)]
pub struct AsyncErasViewerBuilder {
    card_table: Option<PathBuf>,
    image_links: Option<PathBuf>,
    deck_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Option<Duration>,
}

impl AsyncErasViewerBuilder {
    pub fn card_table<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.card_table = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn image_links<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.image_links = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn deck_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.deck_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the viewer on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncErasViewer> {
        tokio::task::spawn_blocking(move || {
            let mut builder = ErasViewer::builder().offline(self.offline);
            if let Some(path) = self.card_table {
                builder = builder.card_table(path);
            }
            if let Some(path) = self.image_links {
                builder = builder.image_links(path);
            }
            if let Some(path) = self.deck_path {
                builder = builder.deck_path(path);
            }
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            let viewer = builder.build()?;
            Ok(AsyncErasViewer::new(viewer))
        })
        .await
        .map_err(|e| ErasError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncErasViewer
// ---------------------------------------------------------------------------

/// Async wrapper around [`ErasViewer`].
///
/// The viewer is shared behind a [`Mutex`]; operations are serialized, which
/// keeps the single-session deck semantics intact.
#[derive(Clone)]
pub struct AsyncErasViewer {
    inner: Arc<Mutex<ErasViewer>>,
}

impl AsyncErasViewer {
    pub fn builder() -> AsyncErasViewerBuilder {
        AsyncErasViewerBuilder::default()
    }

    /// Wrap an already built viewer.
    pub fn new(viewer: ErasViewer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(viewer)),
        }
    }

    /// Run a sync viewer operation on the blocking thread pool.
    ///
    /// The closure receives `&mut ErasViewer` and should return a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ErasViewer) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let viewer = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = viewer
                .lock()
                .map_err(|_| ErasError::InvalidArgument("viewer lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| ErasError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Filter and group the catalog.
    pub async fn layout(
        &self,
        criteria: FilterCriteria,
        options: GroupingOptions,
    ) -> Result<Vec<Section>> {
        self.run(move |v| Ok(v.layout(&criteria, &options))).await
    }

    /// Local file for a card's image, downloading it if needed.
    pub async fn fetch_image(&self, card_id: i64) -> Result<Option<PathBuf>> {
        self.run(move |v| v.image_for(card_id)).await
    }
}
