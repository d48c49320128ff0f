//! The filter engine: catalog plus criteria to the visible card sequence.

use crate::catalog::Catalog;
use crate::models::{CardRecord, Deck, FilterCriteria, NumericField, Selector};

// ---------------------------------------------------------------------------
// CardQuery
// ---------------------------------------------------------------------------

/// Filter interface over a [`Catalog`].
pub struct CardQuery<'a> {
    catalog: &'a Catalog,
}

impl<'a> CardQuery<'a> {
    /// Create a new `CardQuery` bound to the given catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Apply every active predicate of `criteria`, keeping catalog order.
    ///
    /// Predicates are ANDed:
    /// - era, then subera when the era is exact
    /// - required class and type tokens (all must be present)
    /// - numeric ranges, with absent values passing only untouched ranges
    /// - case-insensitive name substring
    /// - deck membership, when `deck_only` is set
    /// - empty-slot records, unless `include_empty_slots` is set
    pub fn apply(&self, criteria: &FilterCriteria, deck: &Deck) -> Vec<&'a CardRecord> {
        let ranges = self.active_ranges(criteria);
        let needle = criteria.name.to_lowercase();

        self.catalog
            .all_records()
            .iter()
            .filter(|card| matches_era(card, criteria))
            .filter(|card| card.class.contains_all(&criteria.required_classes))
            .filter(|card| card.types.contains_all(&criteria.required_types))
            .filter(|card| matches_ranges(card, &ranges))
            .filter(|card| needle.is_empty() || card.name.to_lowercase().contains(&needle))
            .filter(|card| !criteria.deck_only || deck.contains_card(card.id))
            .filter(|card| criteria.include_empty_slots || !card.is_empty_slot())
            .collect()
    }

    /// Number of real cards in a sequence, not counting empty slots.
    pub fn count_cards(cards: &[&CardRecord]) -> usize {
        cards.iter().filter(|c| !c.is_empty_slot()).count()
    }

    /// Ranges that differ from the catalog's global range for their field.
    ///
    /// A range on a field no record has a value for is dropped.
    fn active_ranges(&self, criteria: &FilterCriteria) -> Vec<(NumericField, i64, i64)> {
        NumericField::ALL
            .iter()
            .filter_map(|&field| {
                let range = criteria.range(field)?;
                let global = self.catalog.global_range(field)?;
                if range == global {
                    None
                } else {
                    Some((field, range.min, range.max))
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn matches_era(card: &CardRecord, criteria: &FilterCriteria) -> bool {
    match criteria.era {
        Selector::Any => true,
        Selector::Exact(era) => card.era == era && criteria.subera.matches(&card.subera),
    }
}

/// An active range excludes records without a value for its field.
fn matches_ranges(card: &CardRecord, ranges: &[(NumericField, i64, i64)]) -> bool {
    ranges.iter().all(|&(field, min, max)| {
        card.value(field)
            .map_or(false, |v| min <= v && v <= max)
    })
}
