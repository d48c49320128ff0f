use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

use super::card::NumericField;
use crate::config;

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// "Any" or an exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector<T> {
    #[default]
    Any,
    Exact(T),
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exact(expected) => expected == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Any => f.write_str("Any"),
            Selector::Exact(v) => write!(f, "{}", v),
        }
    }
}

impl<T: FromStr> Selector<T> {
    /// Parse a parameter value; `"any"`, blank and unparseable values are `Any`.
    pub fn parse_lenient(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            return Selector::Any;
        }
        trimmed.parse().map(Selector::Exact).unwrap_or(Selector::Any)
    }
}

// ---------------------------------------------------------------------------
// RangeFilter
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter {
    pub min: i64,
    pub max: i64,
}

impl RangeFilter {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

// ---------------------------------------------------------------------------
// FilterCriteria
// ---------------------------------------------------------------------------

/// User-selected filters for one evaluation.
///
/// `Default` leaves every predicate inactive, except that empty-slot
/// records are hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub era: Selector<i64>,
    /// Only consulted when `era` is exact.
    pub subera: Selector<i64>,
    pub required_classes: BTreeSet<String>,
    pub required_types: BTreeSet<String>,
    /// Ranges the user has set. A missing entry, or one equal to the
    /// catalog's global range, is inactive.
    pub ranges: BTreeMap<NumericField, RangeFilter>,
    /// Case-insensitive substring; empty is inactive.
    pub name: String,
    pub deck_only: bool,
    pub include_empty_slots: bool,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_range(&mut self, field: NumericField, min: i64, max: i64) -> &mut Self {
        self.ranges.insert(field, RangeFilter::new(min, max));
        self
    }

    pub fn range(&self, field: NumericField) -> Option<RangeFilter> {
        self.ranges.get(&field).copied()
    }

    /// Encode the shareable part of the criteria as flat string parameters.
    ///
    /// Keys: `search`, `era`, `subera`, `classes`, `types`. Lists are
    /// comma-joined; range, deck and empty-slot settings are not shared.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(",");
        BTreeMap::from([
            ("search".to_string(), self.name.clone()),
            ("era".to_string(), self.era.to_string()),
            ("subera".to_string(), self.subera.to_string()),
            ("classes".to_string(), join(&self.required_classes)),
            ("types".to_string(), join(&self.required_types)),
        ])
    }

    /// Decode criteria from flat string parameters. Missing keys leave the
    /// corresponding predicate inactive.
    pub fn from_params(params: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).map(String::as_str).unwrap_or("");
        Self {
            era: Selector::parse_lenient(get("era")),
            subera: Selector::parse_lenient(get("subera")),
            required_classes: split_list(get("classes")),
            required_types: split_list(get("types")),
            name: get("search").to_string(),
            ..Self::default()
        }
    }
}

fn split_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// ViewParams
// ---------------------------------------------------------------------------

/// Everything needed to reconstruct a view from a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    pub criteria: FilterCriteria,
    /// Card width in pixels.
    pub zoom: u32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            zoom: config::DEFAULT_ZOOM,
        }
    }
}

impl ViewParams {
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = self.criteria.to_params();
        params.insert("zoom".to_string(), self.zoom.to_string());
        params
    }

    pub fn from_params(params: &BTreeMap<String, String>) -> Self {
        let zoom = params
            .get("zoom")
            .and_then(|z| z.trim().parse::<u32>().ok())
            .map(clamp_zoom)
            .unwrap_or(config::DEFAULT_ZOOM);
        Self {
            criteria: FilterCriteria::from_params(params),
            zoom,
        }
    }

    /// `application/x-www-form-urlencoded` query string, keys sorted.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_params())
            .finish()
    }

    /// Parse a query string; a leading `?` is ignored and later duplicate
    /// keys override earlier ones.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params: BTreeMap<String, String> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self::from_params(&params)
    }
}

/// Clamp to the zoom slider bounds and snap down to its step.
pub fn clamp_zoom(zoom: u32) -> u32 {
    let clamped = zoom.clamp(config::MIN_ZOOM, config::MAX_ZOOM);
    clamped - (clamped - config::MIN_ZOOM) % config::ZOOM_STEP
}
