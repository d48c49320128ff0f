//! Durable deck state.
//!
//! The deck is persisted as a JSON array where repetition encodes copy
//! count. Every mutation is written through synchronously before the
//! mutating call returns.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{ErasError, Result};
use crate::models::{Deck, DeckId};

// ---------------------------------------------------------------------------
// DeckStorage
// ---------------------------------------------------------------------------

/// Where the persisted deck text lives.
pub trait DeckStorage: Send {
    /// Read the stored text, `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored text.
    fn write(&self, contents: &str) -> Result<()>;
}

impl DeckStorage for Box<dyn DeckStorage> {
    fn read(&self) -> Result<Option<String>> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<()> {
        (**self).write(contents)
    }
}

/// A JSON file on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeckStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    /// Writes to a temp file in the same directory, then renames over the
    /// target.
    fn write(&self, contents: &str) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| ErasError::Io(e.error))?;
        Ok(())
    }
}

/// In-memory storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `contents`.
    pub fn with_contents(contents: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.to_string()))),
        }
    }

    /// Current stored text.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl DeckStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| ErasError::InvalidArgument("deck storage lock poisoned".into()))?;
        Ok(slot.clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| ErasError::InvalidArgument("deck storage lock poisoned".into()))?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DeckStore
// ---------------------------------------------------------------------------

/// A [`Deck`] bound to its storage.
pub struct DeckStore {
    deck: Deck,
    storage: Box<dyn DeckStorage>,
}

impl DeckStore {
    /// Load the deck from `storage`.
    ///
    /// Missing, unreadable or corrupt storage yields an empty deck.
    pub fn open<S: DeckStorage + 'static>(storage: S) -> Self {
        let deck = load_deck(&storage);
        Self {
            deck,
            storage: Box::new(storage),
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Add one copy of `id`, saturating at the copy limit.
    ///
    /// Returns the resulting count. Persists only when the deck changed.
    pub fn add(&mut self, id: impl Into<DeckId>) -> Result<u32> {
        let id = id.into();
        let mut next = self.deck.clone();
        if next.add(id.clone()) {
            self.commit(next)?;
        }
        Ok(self.deck.count(&id))
    }

    /// Remove one copy of `id`; a no-op when the deck has none.
    ///
    /// Returns the resulting count. Persists only when the deck changed.
    pub fn remove(&mut self, id: impl Into<DeckId>) -> Result<u32> {
        let id = id.into();
        let mut next = self.deck.clone();
        if next.remove(&id) {
            self.commit(next)?;
        }
        Ok(self.deck.count(&id))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.commit(Deck::new())
    }

    /// The deck as a flat list of ids.
    pub fn export(&self) -> Vec<DeckId> {
        self.deck.to_list()
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export())?)
    }

    /// Write the exported deck to a file.
    pub fn export_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        JsonFileStorage::new(path).write(&self.export_json()?)
    }

    /// Replace the deck wholesale with `ids` and persist.
    ///
    /// Counts above the copy limit are kept as given.
    pub fn import(&mut self, ids: Vec<DeckId>) -> Result<()> {
        let deck = Deck::from_list(ids);
        for (id, count) in deck.over_limit() {
            warn!(id = %id, count, "Imported deck exceeds the copy limit");
        }
        self.commit(deck)
    }

    /// Validate JSON text and replace the deck with it.
    ///
    /// On any validation error the current deck is left untouched.
    pub fn import_json(&mut self, contents: &str) -> Result<()> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|e| ErasError::InvalidDeck(format!("malformed JSON: {}", e)))?;
        let deck = Deck::from_json_value(&value)?;
        self.import(deck.to_list())
    }

    /// Import a deck file; see [`import_json`](Self::import_json).
    pub fn import_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let contents = fs::read_to_string(path)?;
        self.import_json(&contents)
    }

    /// Write the current deck to storage.
    pub fn persist(&self) -> Result<()> {
        self.write_deck(&self.deck)
    }

    /// Write `next`, then make it the current deck. A failed write leaves
    /// the current deck as it was.
    fn commit(&mut self, next: Deck) -> Result<()> {
        self.write_deck(&next)?;
        self.deck = next;
        Ok(())
    }

    fn write_deck(&self, deck: &Deck) -> Result<()> {
        self.storage.write(&serde_json::to_string(&deck.to_list())?)?;
        debug!(copies = deck.total(), "Deck persisted");
        Ok(())
    }

    /// Discard in-memory state and load again from storage.
    pub fn reload(&mut self) {
        self.deck = load_deck(self.storage.as_ref());
    }
}

fn load_deck(storage: &dyn DeckStorage) -> Deck {
    let contents = match storage.read() {
        Ok(Some(contents)) => contents,
        Ok(None) => return Deck::new(),
        Err(e) => {
            warn!(error = %e, "Cannot read saved deck; starting empty");
            return Deck::new();
        }
    };

    let parsed = serde_json::from_str::<Value>(&contents)
        .map_err(ErasError::from)
        .and_then(|value| Deck::from_json_value(&value));
    match parsed {
        Ok(deck) => deck,
        Err(e) => {
            warn!(error = %e, "Saved deck is corrupt; starting empty");
            Deck::new()
        }
    }
}
