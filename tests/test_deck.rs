//! Deck store tests: copy limit, persistence, import and export.

mod common;

use eras_viewer::config::DECK_COPY_LIMIT;
use eras_viewer::queries::DeckQuery;
use eras_viewer::{
    Deck, DeckId, DeckStorage, DeckStore, ErasError, JsonFileStorage, MemoryStorage,
};

fn stored_ids(storage: &MemoryStorage) -> Vec<DeckId> {
    serde_json::from_str(&storage.contents().unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Add and remove
// ---------------------------------------------------------------------------

#[test]
fn add_saturates_at_copy_limit() {
    let mut store = DeckStore::open(MemoryStorage::new());
    let mut last = 0;
    for _ in 0..5 {
        last = store.add(7i64).unwrap();
    }
    assert_eq!(last, DECK_COPY_LIMIT);
    assert_eq!(store.deck().count_card(7), 4);
    assert_eq!(store.export().len(), 4);
}

#[test]
fn remove_then_add_restores_count() {
    let mut store = DeckStore::open(MemoryStorage::new());
    store.add(3i64).unwrap();
    store.add(3i64).unwrap();

    assert_eq!(store.remove(3i64).unwrap(), 1);
    assert_eq!(store.add(3i64).unwrap(), 2);
}

#[test]
fn removing_last_copy_drops_the_entry() {
    let mut store = DeckStore::open(MemoryStorage::new());
    store.add(3i64).unwrap();

    assert_eq!(store.remove(3i64).unwrap(), 0);
    assert!(store.deck().is_empty());
    assert_eq!(store.deck().entries().count(), 0);
}

#[test]
fn remove_absent_is_a_noop() {
    let storage = MemoryStorage::new();
    let mut store = DeckStore::open(storage.clone());

    assert_eq!(store.remove(11i64).unwrap(), 0);
    // Nothing changed, so nothing was written
    assert_eq!(storage.contents(), None);
}

#[test]
fn labels_are_valid_deck_ids() {
    let mut store = DeckStore::open(MemoryStorage::new());
    store.add("a").unwrap();
    store.add(1i64).unwrap();

    assert_eq!(store.export(), vec![DeckId::Card(1), DeckId::from("a")]);
    assert_eq!(store.export_json().unwrap(), r#"[1,"a"]"#);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn every_mutation_is_persisted() {
    let storage = MemoryStorage::new();
    let mut store = DeckStore::open(storage.clone());

    store.add(2i64).unwrap();
    store.add(2i64).unwrap();
    assert_eq!(stored_ids(&storage), vec![DeckId::Card(2), DeckId::Card(2)]);

    store.remove(2i64).unwrap();
    assert_eq!(stored_ids(&storage), vec![DeckId::Card(2)]);

    store.clear().unwrap();
    assert!(stored_ids(&storage).is_empty());
}

#[test]
fn open_reads_saved_deck() {
    let storage = MemoryStorage::with_contents("[5, 5, 9]");
    let store = DeckStore::open(storage);

    assert_eq!(store.deck().count_card(5), 2);
    assert_eq!(store.deck().count_card(9), 1);
    assert_eq!(store.deck().total(), 3);
}

#[test]
fn corrupt_storage_opens_empty() {
    for contents in ["not json", "{\"a\": 1}", "[1, null]", ""] {
        let store = DeckStore::open(MemoryStorage::with_contents(contents));
        assert!(store.deck().is_empty(), "{contents:?}");
    }
}

#[test]
fn file_storage_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("saved_deck.json");

    let mut store = DeckStore::open(JsonFileStorage::new(&path));
    assert!(store.deck().is_empty());
    store.add(4i64).unwrap();
    store.add(4i64).unwrap();
    store.add(8i64).unwrap();

    let reopened = DeckStore::open(JsonFileStorage::new(&path));
    assert_eq!(reopened.deck(), store.deck());
}

#[test]
fn reload_discards_unsaved_state() {
    let storage = MemoryStorage::with_contents("[1]");
    let mut store = DeckStore::open(storage.clone());
    storage.write("[2, 2]").unwrap();

    store.reload();
    assert_eq!(store.deck().count_card(2), 2);
    assert_eq!(store.deck().count_card(1), 0);
}

// ---------------------------------------------------------------------------
// Import and export
// ---------------------------------------------------------------------------

#[test]
fn export_then_import_round_trips() {
    let mut store = DeckStore::open(MemoryStorage::new());
    store.add(1i64).unwrap();
    store.add(1i64).unwrap();
    store.add(6i64).unwrap();
    let exported = store.export_json().unwrap();

    let mut other = DeckStore::open(MemoryStorage::new());
    other.import_json(&exported).unwrap();
    assert_eq!(other.deck(), store.deck());
}

#[test]
fn import_rejects_non_integer_elements() {
    let storage = MemoryStorage::new();
    let mut store = DeckStore::open(storage.clone());
    store.add(1i64).unwrap();
    let before = store.deck().clone();

    let err = store.import_json(r#"["a", 3.5]"#).unwrap_err();
    assert!(matches!(err, ErasError::InvalidDeck(_)));
    assert_eq!(store.deck(), &before);
    assert_eq!(stored_ids(&storage), vec![DeckId::Card(1)]);
}

#[test]
fn import_rejects_non_array_and_malformed_json() {
    let mut store = DeckStore::open(MemoryStorage::new());

    for bad in [r#"{"ids": [1]}"#, "42", "[1, 2", "[true]"] {
        let err = store.import_json(bad).unwrap_err();
        assert!(matches!(err, ErasError::InvalidDeck(_)), "{bad}");
    }
    assert!(store.deck().is_empty());
}

#[test]
fn import_replaces_deck_and_persists() {
    let storage = MemoryStorage::new();
    let mut store = DeckStore::open(storage.clone());
    store.add(1i64).unwrap();

    store.import(vec![DeckId::Card(2), DeckId::Card(3)]).unwrap();
    assert_eq!(store.deck().count_card(1), 0);
    assert_eq!(stored_ids(&storage), vec![DeckId::Card(2), DeckId::Card(3)]);
}

#[test]
fn import_keeps_counts_above_limit() {
    let mut store = DeckStore::open(MemoryStorage::new());
    store.import_json("[9, 9, 9, 9, 9, 9]").unwrap();

    assert_eq!(store.deck().count_card(9), 6);
    assert_eq!(store.deck().over_limit(), vec![(&DeckId::Card(9), 6)]);

    // Add never grows an over-limit entry
    assert_eq!(store.add(9i64).unwrap(), 6);
    assert_eq!(store.remove(9i64).unwrap(), 5);
}

/// Reads a fixed saved deck and refuses every write.
struct ReadOnlyStorage(&'static str);

impl DeckStorage for ReadOnlyStorage {
    fn read(&self) -> eras_viewer::Result<Option<String>> {
        Ok(Some(self.0.to_string()))
    }

    fn write(&self, _contents: &str) -> eras_viewer::Result<()> {
        Err(ErasError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only deck file",
        )))
    }
}

#[test]
fn failed_write_leaves_deck_unchanged() {
    let mut store = DeckStore::open(ReadOnlyStorage("[1, 1]"));
    let before = store.deck().clone();
    assert_eq!(before.count_card(1), 2);

    let err = store.import_json("[2]").unwrap_err();
    assert!(matches!(err, ErasError::Io(_)));
    assert_eq!(store.deck(), &before);

    assert!(store.add(3i64).is_err());
    assert!(store.remove(1i64).is_err());
    assert!(store.clear().is_err());
    assert_eq!(store.deck(), &before);
}

#[test]
fn export_to_and_import_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck_export.json");

    let mut store = DeckStore::open(MemoryStorage::new());
    store.add(2i64).unwrap();
    store.add("promo").unwrap();
    store.export_to(&path).unwrap();

    let mut other = DeckStore::open(MemoryStorage::new());
    other.import_from(&path).unwrap();
    assert_eq!(other.export(), store.export());
}

// ---------------------------------------------------------------------------
// Deck model and summary
// ---------------------------------------------------------------------------

#[test]
fn from_list_counts_repetitions() {
    let deck = Deck::from_list(vec![DeckId::Card(1), DeckId::Card(1), DeckId::from("x")]);
    assert_eq!(deck.count_card(1), 2);
    assert_eq!(deck.count(&DeckId::from("x")), 1);
    assert_eq!(deck.to_list().len(), 3);
}

#[test]
fn summary_resolves_catalog_names() {
    let (catalog, _fx) = common::setup_sample_catalog();
    let deck = Deck::from_list(vec![
        DeckId::Card(1),
        DeckId::Card(1),
        DeckId::Card(6),
        DeckId::Card(42),
        DeckId::from("promo"),
    ]);

    let query = DeckQuery::new(&catalog, &deck);
    let lines: Vec<String> = query.summary().iter().map(ToString::to_string).collect();
    assert_eq!(lines, vec!["×2 Guardián del Bosque", "×1 Campeón de Hierro"]);
    assert_eq!(query.total(), 5);
    assert_eq!(query.unresolved(), vec![&DeckId::Card(42), &DeckId::from("promo")]);
}
