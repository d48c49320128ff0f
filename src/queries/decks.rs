//! Deck summaries resolved against the catalog.

use std::fmt;

use crate::catalog::Catalog;
use crate::models::{Deck, DeckId};

// ---------------------------------------------------------------------------
// DeckLine
// ---------------------------------------------------------------------------

/// One distinct card of a deck with its copy count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckLine {
    pub id: i64,
    pub name: String,
    pub count: u32,
}

impl fmt::Display for DeckLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "×{} {}", self.count, self.name)
    }
}

// ---------------------------------------------------------------------------
// DeckQuery
// ---------------------------------------------------------------------------

/// Read-only view of a deck against the catalog.
pub struct DeckQuery<'a> {
    catalog: &'a Catalog,
    deck: &'a Deck,
}

impl<'a> DeckQuery<'a> {
    pub fn new(catalog: &'a Catalog, deck: &'a Deck) -> Self {
        Self { catalog, deck }
    }

    /// Lines for every deck id that names a catalog card, in id order.
    ///
    /// Labels and unknown ids are skipped.
    pub fn summary(&self) -> Vec<DeckLine> {
        self.deck
            .entries()
            .filter_map(|(id, count)| {
                let card = self.catalog.by_id(id.card_id()?)?;
                Some(DeckLine {
                    id: card.id,
                    name: card.name.clone(),
                    count,
                })
            })
            .collect()
    }

    /// Total copies, including ids the catalog does not know.
    pub fn total(&self) -> u32 {
        self.deck.total()
    }

    /// Deck ids that do not resolve to a catalog card.
    pub fn unresolved(&self) -> Vec<&'a DeckId> {
        self.deck
            .entries()
            .filter(|(id, _)| id.card_id().and_then(|c| self.catalog.by_id(c)).is_none())
            .map(|(id, _)| id)
            .collect()
    }
}
