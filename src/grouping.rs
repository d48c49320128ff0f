//! Display grouping: section boundaries and row packing for the card grid.
//!
//! Each record is rendered independently; a record that cannot be rendered
//! becomes an `Err` entry in its slot and never aborts the rest of the grid.

use std::fmt;

use tracing::warn;

use crate::config;
use crate::models::{class_display_name, CardRecord, Deck};

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// What a grid cell shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardFace {
    /// Published artwork, or the card back for empty slots.
    Image { url: String },
    /// No artwork yet; labelled with the card code.
    Missing { code: String },
}

/// A grid cell ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableCard {
    pub id: i64,
    pub name: String,
    pub face: CardFace,
    /// Copies of this card in the deck.
    pub copies: u32,
    /// Whether one more copy may be added.
    pub can_add: bool,
}

/// A record that could not be turned into a grid cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("card {id} ({name}) has no number")]
    MissingNumber { id: i64, name: String },
}

impl RenderError {
    pub fn card_id(&self) -> i64 {
        match self {
            RenderError::MissingNumber { id, .. } => *id,
        }
    }

    pub fn card_name(&self) -> &str {
        match self {
            RenderError::MissingNumber { name, .. } => name,
        }
    }
}

/// One grid slot.
pub type CardEntry = std::result::Result<RenderableCard, RenderError>;

/// Printed card code, e.g. `E1-B07` or `E2.1-B-D12`. Classless cards
/// print the code alone (`E1-07`).
pub fn card_code(card: &CardRecord) -> std::result::Result<String, RenderError> {
    let class = card.class.raw().unwrap_or_default();
    let number = card.number.ok_or_else(|| RenderError::MissingNumber {
        id: card.id,
        name: card.name.clone(),
    })?;

    if card.subera > 0 {
        Ok(format!("E{}.{}-{}{:02}", card.era, card.subera, class, number))
    } else {
        Ok(format!("E{}-{}{:02}", card.era, class, number))
    }
}

/// URL to display for a record: the card back for empty slots, else its
/// published image.
pub fn resolve_image_url(card: &CardRecord) -> Option<&str> {
    if card.is_empty_slot() {
        Some(config::PLACEHOLDER_IMAGE_URL)
    } else {
        card.image_url.as_deref()
    }
}

pub fn render_card(card: &CardRecord, deck: &Deck) -> CardEntry {
    let face = match resolve_image_url(card) {
        Some(url) => CardFace::Image {
            url: url.to_string(),
        },
        None => CardFace::Missing {
            code: card_code(card)?,
        },
    };
    let copies = deck.count_card(card.id);

    Ok(RenderableCard {
        id: card.id,
        name: card.name.clone(),
        face,
        copies,
        can_add: copies < config::DECK_COPY_LIMIT,
    })
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Header text of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLabel {
    pub era: i64,
    pub subera: i64,
    /// Set only when the class changed from the previous section.
    pub class: Option<String>,
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Era {}", self.era)?;
        if self.subera > 0 {
            write!(f, ".{}", self.subera)?;
        }
        if let Some(class) = &self.class {
            write!(f, " - {}", class_display_name(class))?;
        }
        Ok(())
    }
}

/// A run of records sharing era, subera and first class token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// `None` when section titles are disabled.
    pub label: Option<SectionLabel>,
    pub rows: Vec<Vec<CardEntry>>,
}

impl Section {
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CardEntry> {
        self.rows.iter().flatten()
    }
}

/// Grid geometry and header toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOptions {
    pub section_titles: bool,
    pub page_width: u32,
    /// Card width in pixels (the zoom level).
    pub item_width: u32,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            section_titles: true,
            page_width: config::DEFAULT_PAGE_WIDTH,
            item_width: config::DEFAULT_ZOOM,
        }
    }
}

impl GroupingOptions {
    /// Cards per row, at least one.
    pub fn row_capacity(&self) -> usize {
        (self.page_width / self.item_width.max(1)).max(1) as usize
    }
}

/// Split the filtered sequence into sections and pack each into rows.
///
/// A new section starts whenever era, subera or first class token differs
/// from the previous record; row packing restarts at each section.
pub fn group(cards: &[&CardRecord], deck: &Deck, options: &GroupingOptions) -> Vec<Section> {
    let capacity = options.row_capacity();
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<(i64, i64, Option<&str>)> = None;
    let mut last_class: Option<&str> = None;

    for card in cards {
        let key = (card.era, card.subera, card.class.first());

        let starts_section = sections.is_empty() || (options.section_titles && current != Some(key));
        if starts_section {
            let label = options.section_titles.then(|| SectionLabel {
                era: card.era,
                subera: card.subera,
                class: if key.2 != last_class {
                    key.2.map(str::to_string)
                } else {
                    None
                },
            });
            sections.push(Section {
                label,
                rows: Vec::new(),
            });
            current = Some(key);
            last_class = key.2;
        }

        let entry = render_card(card, deck);
        if let Err(e) = &entry {
            warn!(card = e.card_id(), error = %e, "Cannot render card");
        }

        if let Some(section) = sections.last_mut() {
            match section.rows.last_mut() {
                Some(row) if row.len() < capacity => row.push(entry),
                _ => section.rows.push(vec![entry]),
            }
        }
    }

    sections
}
