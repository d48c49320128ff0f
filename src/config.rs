use std::collections::HashMap;
use std::path::PathBuf;

/// Maximum number of copies of one card a deck may hold through `add`.
pub const DECK_COPY_LIMIT: u32 = 4;

/// Name of the sentinel record standing in for a blank slot.
pub const EMPTY_SLOT_NAME: &str = "Nac";

/// Card back shown for empty-slot records.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://res.cloudinary.com/dtwiayh6c/image/upload/v1750276123/cartas/BACKCARD/BACKCARD.png";

pub const DEFAULT_PAGE_WIDTH: u32 = 1000;

pub const DEFAULT_ZOOM: u32 = 150;
pub const MIN_ZOOM: u32 = 50;
pub const MAX_ZOOM: u32 = 550;
pub const ZOOM_STEP: u32 = 50;

pub const CARD_TABLE_FILE: &str = "BDD.xlsx";
pub const IMAGE_LINKS_FILE: &str = "uploaded_image_links.xlsx";
pub const DECK_SAVE_FILE: &str = "saved_deck.json";

/// Source header (lowercased, trimmed) to normalized column name.
///
/// The card sheet is maintained in Spanish; English headers are accepted too.
pub fn column_aliases() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("id", "id"),
        ("card_id", "id"),
        ("nombre", "name"),
        ("name", "name"),
        ("era", "era"),
        ("subera", "subera"),
        ("numero", "number"),
        ("número", "number"),
        ("number", "number"),
        ("clase", "class"),
        ("class", "class"),
        ("tipos", "type"),
        ("type", "type"),
        ("types", "type"),
        ("categoria", "category"),
        ("categoría", "category"),
        ("category", "category"),
        ("nivel", "level"),
        ("lvl", "level"),
        ("level", "level"),
        ("fuerza", "strength"),
        ("strength", "strength"),
        ("coste", "cost"),
        ("cost", "cost"),
        ("coste especial", "special_cost"),
        ("special cost", "special_cost"),
        ("special_cost", "special_cost"),
        ("url", "url"),
    ])
}

/// Columns a card table must provide after normalization.
pub const REQUIRED_CARD_COLUMNS: [&str; 3] = ["id", "name", "era"];

/// Class letter to display name.
pub fn class_names() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("B", "Bosquemago"),
        ("D", "Disrupción"),
        ("G", "Guerrero"),
        ("P", "Pesadilla"),
    ])
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("eras-viewer")
    } else {
        PathBuf::from(".eras-viewer")
    }
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("eras-viewer").join("image_cache")
    } else {
        PathBuf::from(".eras-viewer-cache")
    }
}
