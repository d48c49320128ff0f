use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DECK_COPY_LIMIT;
use crate::error::{ErasError, Result};

// ---------------------------------------------------------------------------
// DeckId
// ---------------------------------------------------------------------------

/// A deck entry key: a card id, or a free-text label kept as-is.
///
/// Serializes as a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeckId {
    Card(i64),
    Label(String),
}

impl DeckId {
    pub fn card_id(&self) -> Option<i64> {
        match self {
            DeckId::Card(id) => Some(*id),
            DeckId::Label(_) => None,
        }
    }
}

impl From<i64> for DeckId {
    fn from(id: i64) -> Self {
        DeckId::Card(id)
    }
}

impl From<&str> for DeckId {
    fn from(label: &str) -> Self {
        DeckId::Label(label.to_string())
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckId::Card(id) => write!(f, "{}", id),
            DeckId::Label(label) => f.write_str(label),
        }
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// Copy counts per id. Entries never hold a zero count.
///
/// `add` saturates at [`DECK_COPY_LIMIT`]; only [`Deck::from_list`] can
/// produce counts above it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    counts: BTreeMap<DeckId, u32>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a deck from a flat list where repetition encodes copy count.
    pub fn from_list<I: IntoIterator<Item = DeckId>>(ids: I) -> Self {
        let mut counts: BTreeMap<DeckId, u32> = BTreeMap::new();
        for id in ids {
            *counts.entry(id).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Validate a parsed JSON document and rebuild the deck from it.
    ///
    /// The document must be an array whose elements are integers or strings.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            ErasError::InvalidDeck(format!("expected a JSON array, got {}", json_kind(value)))
        })?;

        let mut ids = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let id = match item {
                Value::Number(n) => n.as_i64().map(DeckId::Card),
                Value::String(s) => Some(DeckId::Label(s.clone())),
                _ => None,
            };
            match id {
                Some(id) => ids.push(id),
                None => {
                    return Err(ErasError::InvalidDeck(format!(
                        "element {} is not an integer or string: {}",
                        i, item
                    )))
                }
            }
        }
        Ok(Self::from_list(ids))
    }

    /// Flatten into a list with each id repeated per its count.
    pub fn to_list(&self) -> Vec<DeckId> {
        self.counts
            .iter()
            .flat_map(|(id, &n)| std::iter::repeat(id.clone()).take(n as usize))
            .collect()
    }

    pub fn count(&self, id: &DeckId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Copies of a catalog card.
    pub fn count_card(&self, card_id: i64) -> u32 {
        self.count(&DeckId::Card(card_id))
    }

    pub fn contains_card(&self, card_id: i64) -> bool {
        self.count_card(card_id) > 0
    }

    /// Add one copy unless the id is already at the copy limit.
    ///
    /// Returns `true` when the deck changed.
    pub fn add(&mut self, id: DeckId) -> bool {
        let count = self.counts.entry(id).or_insert(0);
        if *count < DECK_COPY_LIMIT {
            *count += 1;
            true
        } else {
            false
        }
    }

    /// Remove one copy. Returns `true` when the deck changed.
    pub fn remove(&mut self, id: &DeckId) -> bool {
        match self.counts.get_mut(id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(id);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of copies.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Distinct ids with their counts, in id order.
    pub fn entries(&self) -> impl Iterator<Item = (&DeckId, u32)> {
        self.counts.iter().map(|(id, &n)| (id, n))
    }

    /// Ids holding more than [`DECK_COPY_LIMIT`] copies.
    pub fn over_limit(&self) -> Vec<(&DeckId, u32)> {
        self.entries().filter(|(_, n)| *n > DECK_COPY_LIMIT).collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
