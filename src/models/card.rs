use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A hyphen-joined field (`"B-D"`) split into its tokens.
///
/// Keeps the raw text for display and the first token for grouping.
/// Duplicate tokens are dropped; an absent or blank field has no tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub struct Tokens {
    raw: Option<String>,
    tokens: Vec<String>,
}

impl Tokens {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        let mut tokens: Vec<String> = Vec::new();
        for token in trimmed.split('-').map(str::trim).filter(|t| !t.is_empty()) {
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        Self {
            raw: Some(trimmed.to_string()),
            tokens,
        }
    }

    /// The field as it appeared in the source table.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn is_absent(&self) -> bool {
        self.tokens.is_empty()
    }

    /// First token in source order.
    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// True when every required token is present. An empty requirement
    /// always holds, even for an absent field.
    pub fn contains_all(&self, required: &BTreeSet<String>) -> bool {
        required.iter().all(|r| self.contains(r))
    }
}

impl From<Option<String>> for Tokens {
    fn from(raw: Option<String>) -> Self {
        raw.map(|r| Tokens::parse(&r)).unwrap_or_default()
    }
}

impl From<Tokens> for Option<String> {
    fn from(tokens: Tokens) -> Self {
        tokens.raw
    }
}

// ---------------------------------------------------------------------------
// CardRecord
// ---------------------------------------------------------------------------

/// One row of the card catalog, joined with its image link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: i64,
    pub name: String,
    pub era: i64,
    #[serde(default)]
    pub subera: i64,
    pub number: Option<i64>,
    #[serde(default)]
    pub class: Tokens,
    #[serde(rename = "type", default)]
    pub types: Tokens,
    pub category: Option<String>,
    pub level: Option<i64>,
    pub strength: Option<i64>,
    pub cost: Option<i64>,
    pub special_cost: Option<i64>,
    pub image_url: Option<String>,
}

impl CardRecord {
    /// Minimal record; remaining fields are absent.
    pub fn new(id: i64, name: impl Into<String>, era: i64, subera: i64) -> Self {
        Self {
            id,
            name: name.into(),
            era,
            subera,
            number: None,
            class: Tokens::default(),
            types: Tokens::default(),
            category: None,
            level: None,
            strength: None,
            cost: None,
            special_cost: None,
            image_url: None,
        }
    }

    /// Whether this record is the blank-slot sentinel.
    pub fn is_empty_slot(&self) -> bool {
        self.name == config::EMPTY_SLOT_NAME
    }

    pub fn value(&self, field: NumericField) -> Option<i64> {
        match field {
            NumericField::Level => self.level,
            NumericField::Strength => self.strength,
            NumericField::Cost => self.cost,
            NumericField::SpecialCost => self.special_cost,
        }
    }

    /// Read-only detail view used by the "card details" panel.
    pub fn details(&self) -> CardDetails<'_> {
        CardDetails { card: self }
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// The optional integer attributes that carry range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericField {
    Level,
    Strength,
    Cost,
    SpecialCost,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [
        NumericField::Level,
        NumericField::Strength,
        NumericField::Cost,
        NumericField::SpecialCost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NumericField::Level => "level",
            NumericField::Strength => "strength",
            NumericField::Cost => "cost",
            NumericField::SpecialCost => "special_cost",
        }
    }
}

/// Catalog fields that can populate filter option lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Era,
    Subera,
    Class,
    Type,
    Category,
    Numeric(NumericField),
}

/// A distinct value of a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Class names
// ---------------------------------------------------------------------------

/// Display name for a class letter; unknown letters display as themselves.
pub fn class_display_name(token: &str) -> String {
    config::class_names()
        .get(token)
        .map(|n| n.to_string())
        .unwrap_or_else(|| token.to_string())
}

/// Class letter for a display name, or the input when it is not a known name.
pub fn class_token(display_name: &str) -> String {
    config::class_names()
        .into_iter()
        .find(|(_, name)| *name == display_name)
        .map(|(token, _)| token.to_string())
        .unwrap_or_else(|| display_name.to_string())
}

// ---------------------------------------------------------------------------
// CardDetails
// ---------------------------------------------------------------------------

/// Formats every attribute of a card, using `-` for absent values.
pub struct CardDetails<'a> {
    card: &'a CardRecord,
}

impl CardDetails<'_> {
    /// `(label, value)` pairs in display order.
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        let card = self.card;
        let opt = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

        let class = if card.class.is_absent() {
            "-".to_string()
        } else {
            card.class
                .iter()
                .map(class_display_name)
                .collect::<Vec<_>>()
                .join(" - ")
        };
        let types = if card.types.is_absent() {
            "-".to_string()
        } else {
            format!("[{}]", card.types.iter().collect::<Vec<_>>().join(" | "))
        };

        vec![
            ("Name", card.name.clone()),
            ("Era", card.era.to_string()),
            ("Subera", card.subera.to_string()),
            ("Class", class),
            ("Type", types),
            ("Category", card.category.clone().unwrap_or_else(|| "-".to_string())),
            ("Level", opt(card.level)),
            ("Strength", opt(card.strength)),
            ("Cost", opt(card.cost)),
            ("Special Cost", opt(card.special_cost)),
        ]
    }
}

impl fmt::Display for CardDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.lines() {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}
