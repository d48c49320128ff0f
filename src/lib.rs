//! Eras card catalog viewer core.
//!
//! Loads the card sheet and its image-link index into memory via DuckDB,
//! filters the catalog, lays the result out as a sectioned grid, and keeps a
//! persistent deck with a per-card copy limit.
//!
//! # Quick start
//!
//! ```no_run
//! use eras_viewer::{ErasViewer, FilterCriteria, GroupingOptions, Selector};
//!
//! let mut viewer = ErasViewer::builder()
//!     .card_table("BDD.xlsx")
//!     .image_links("uploaded_image_links.xlsx")
//!     .build()
//!     .unwrap();
//!
//! let criteria = FilterCriteria {
//!     era: Selector::Exact(1),
//!     name: "dragon".into(),
//!     ..Default::default()
//! };
//! let sections = viewer.layout(&criteria, &GroupingOptions::default());
//!
//! viewer.add_to_deck(42).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod grouping;
pub mod models;
pub mod queries;
pub mod sql_builder;
pub mod storage;

#[cfg(feature = "async")]
pub use async_client::AsyncErasViewer;
pub use cache::ImageCache;
pub use catalog::Catalog;
pub use connection::Connection;
pub use error::{ErasError, Result};
pub use grouping::{CardEntry, CardFace, GroupingOptions, RenderError, RenderableCard, Section, SectionLabel};
pub use models::{CardRecord, Deck, DeckId, FilterCriteria, NumericField, RangeFilter, Selector, ViewParams};
pub use sql_builder::SqlBuilder;
pub use storage::{DeckStorage, DeckStore, JsonFileStorage, MemoryStorage};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

// ---------------------------------------------------------------------------
// ErasViewerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`ErasViewer`] instance.
///
/// Use [`ErasViewer::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](ErasViewerBuilder::build).
pub struct ErasViewerBuilder {
    card_table: PathBuf,
    image_links: Option<PathBuf>,
    deck_path: Option<PathBuf>,
    deck_storage: Option<Box<dyn DeckStorage>>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
}

impl Default for ErasViewerBuilder {
    fn default() -> Self {
        Self {
            card_table: PathBuf::from(config::CARD_TABLE_FILE),
            image_links: Some(PathBuf::from(config::IMAGE_LINKS_FILE)),
            deck_path: None,
            deck_storage: None,
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ErasViewerBuilder {
    /// Path of the card table (xlsx, CSV or newline-delimited JSON).
    ///
    /// Defaults to `BDD.xlsx` in the working directory.
    pub fn card_table<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.card_table = path.as_ref().to_path_buf();
        self
    }

    /// Path of the `(id, url)` image-link table.
    ///
    /// Defaults to `uploaded_image_links.xlsx`; a missing file means no images.
    pub fn image_links<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.image_links = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the catalog without an image-link table.
    pub fn without_image_links(mut self) -> Self {
        self.image_links = None;
        self
    }

    /// File the deck is persisted to.
    ///
    /// Defaults to `saved_deck.json` in the platform data directory
    /// (e.g. `~/.local/share/eras-viewer` on Linux).
    pub fn deck_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.deck_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Persist the deck somewhere other than a file. Overrides `deck_path`.
    pub fn deck_storage<S: DeckStorage + 'static>(mut self, storage: S) -> Self {
        self.deck_storage = Some(Box::new(storage));
        self
    }

    /// Set a custom image cache directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// When offline, images are only served from the cache.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// HTTP timeout for image downloads. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load the catalog and the saved deck.
    ///
    /// Fails if the card table cannot be loaded. A missing or corrupt saved
    /// deck starts an empty one.
    pub fn build(self) -> Result<ErasViewer> {
        let catalog = Catalog::load(&self.card_table, self.image_links.as_deref())?;

        let deck = match self.deck_storage {
            Some(storage) => DeckStore::open(storage),
            None => {
                let path = self
                    .deck_path
                    .unwrap_or_else(|| config::default_data_dir().join(config::DECK_SAVE_FILE));
                debug!(path = %path.display(), "Using deck file");
                DeckStore::open(JsonFileStorage::new(path))
            }
        };

        let images = ImageCache::new(self.cache_dir, self.offline, self.timeout)?;
        Ok(ErasViewer {
            catalog,
            deck,
            images,
        })
    }
}

// ---------------------------------------------------------------------------
// ErasViewer
// ---------------------------------------------------------------------------

/// One browsing session: the catalog, the deck and the image cache.
///
/// Created via [`ErasViewer::builder()`].
pub struct ErasViewer {
    catalog: Catalog,
    deck: DeckStore,
    images: ImageCache,
}

impl ErasViewer {
    /// Create a new builder for configuring the viewer.
    pub fn builder() -> ErasViewerBuilder {
        ErasViewerBuilder::default()
    }

    /// Access the filter interface.
    pub fn cards(&self) -> queries::CardQuery<'_> {
        queries::CardQuery::new(&self.catalog)
    }

    /// Access the deck summary interface.
    pub fn decks(&self) -> queries::DeckQuery<'_> {
        queries::DeckQuery::new(&self.catalog, self.deck.deck())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn deck(&self) -> &Deck {
        self.deck.deck()
    }

    /// Mutable deck access for clear, import and export.
    pub fn deck_store_mut(&mut self) -> &mut DeckStore {
        &mut self.deck
    }

    pub fn images(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// Add a copy of a catalog card. Unknown ids are a no-op returning 0.
    pub fn add_to_deck(&mut self, card_id: i64) -> Result<u32> {
        if self.catalog.by_id(card_id).is_none() {
            debug!(card_id, "Ignoring add of unknown card");
            return Ok(0);
        }
        self.deck.add(card_id)
    }

    /// Remove a copy of a catalog card. Unknown ids are a no-op returning 0.
    pub fn remove_from_deck(&mut self, card_id: i64) -> Result<u32> {
        if self.catalog.by_id(card_id).is_none() {
            debug!(card_id, "Ignoring remove of unknown card");
            return Ok(0);
        }
        self.deck.remove(card_id)
    }

    /// The filtered card sequence.
    pub fn visible(&self, criteria: &FilterCriteria) -> Vec<&CardRecord> {
        self.cards().apply(criteria, self.deck.deck())
    }

    /// The filtered sequence grouped into sections and rows.
    pub fn layout(&self, criteria: &FilterCriteria, options: &GroupingOptions) -> Vec<Section> {
        let visible = self.visible(criteria);
        grouping::group(&visible, self.deck.deck(), options)
    }

    /// Local file for a card's image, downloading it if needed.
    ///
    /// Returns `None` for cards without published artwork.
    pub fn image_for(&mut self, card_id: i64) -> Result<Option<PathBuf>> {
        let card = self
            .catalog
            .by_id(card_id)
            .ok_or_else(|| ErasError::NotFound(format!("card {}", card_id)))?;
        match grouping::resolve_image_url(card).map(str::to_string) {
            Some(url) => self.images.fetch(&url).map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for ErasViewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ErasViewer(cards={}, deck={}, cache_dir={}, offline={})",
            self.catalog.len(),
            self.deck.deck().total(),
            self.images.cache_dir.display(),
            self.images.offline
        )
    }
}
