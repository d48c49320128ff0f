//! The card catalog: the card table left-joined with the image-link index.
//!
//! Built once through DuckDB and then held in memory, immutable. Column
//! coercion (integers, blank strings) happens in SQL; multi-valued fields
//! are split into [`Tokens`](crate::models::Tokens) while deserializing.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use tracing::{info, warn};

use crate::config;
use crate::connection::Connection;
use crate::error::{ErasError, Result};
use crate::models::{CardRecord, Field, FieldValue, NumericField, RangeFilter};
use crate::sql_builder::{int_expr, quote_ident, text_expr, SqlBuilder};

/// Table name of the card sheet inside the connection.
pub const CARDS_TABLE: &str = "cards";
/// Table name of the `(id, url)` index.
pub const LINKS_TABLE: &str = "image_links";

const INT_COLUMNS: [&str; 5] = ["number", "level", "strength", "cost", "special_cost"];
const TEXT_COLUMNS: [&str; 3] = ["class", "type", "category"];

/// Immutable collection of card records in source row order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CardRecord>,
    index: HashMap<i64, usize>,
    ranges: BTreeMap<NumericField, RangeFilter>,
}

impl Catalog {
    /// Load the card table and, if present, the image-link table.
    ///
    /// A missing image-link file leaves every `image_url` absent. Any
    /// failure reading the card table is a [`ErasError::Load`].
    pub fn load(card_table: &Path, image_links: Option<&Path>) -> Result<Self> {
        let conn = Connection::new()?;
        conn.register_table(CARDS_TABLE, card_table).map_err(|e| {
            ErasError::Load(format!(
                "cannot read card table {}: {}",
                card_table.display(),
                e
            ))
        })?;

        let with_links = match image_links {
            Some(path) if path.exists() => {
                conn.register_table(LINKS_TABLE, path).map_err(|e| {
                    ErasError::Load(format!(
                        "cannot read image-link table {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                true
            }
            Some(path) => {
                warn!(path = %path.display(), "Image-link table not found; no card images");
                false
            }
            None => false,
        };

        Self::from_connection(&conn, with_links)
    }

    /// Build from tables already registered on `conn`.
    ///
    /// Expects [`CARDS_TABLE`], and [`LINKS_TABLE`] when `with_links` is set.
    pub fn from_connection(conn: &Connection, with_links: bool) -> Result<Self> {
        let (sql, params) = catalog_query(conn, with_links)?;
        for column in ["id", "era"] {
            if let Some(line) = first_untyped_row(conn, column)? {
                return Err(ErasError::Load(format!(
                    "row {} has no integer {}",
                    line, column
                )));
            }
        }

        let records: Vec<CardRecord> = conn.execute_into(&sql, &params).map_err(|e| match e {
            ErasError::Json(e) => ErasError::Load(format!("malformed card row: {}", e)),
            other => other,
        })?;

        let catalog = Self::from_records(records)?;
        info!(cards = catalog.len(), with_links, "Catalog loaded");
        Ok(catalog)
    }

    /// Build directly from records. Fails on a duplicate id.
    pub fn from_records(records: Vec<CardRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if index.insert(record.id, pos).is_some() {
                return Err(ErasError::Load(format!("duplicate card id {}", record.id)));
            }
        }

        let mut ranges = BTreeMap::new();
        for field in NumericField::ALL {
            let mut values = records.iter().filter_map(|r| r.value(field));
            if let Some(first) = values.next() {
                let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
                ranges.insert(field, RangeFilter::new(min, max));
            }
        }

        Ok(Self {
            records,
            index,
            ranges,
        })
    }

    pub fn all_records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_id(&self, id: i64) -> Option<&CardRecord> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    /// Min and max over the records that have a value for `field`.
    ///
    /// `None` when no record has one.
    pub fn global_range(&self, field: NumericField) -> Option<RangeFilter> {
        self.ranges.get(&field).copied()
    }

    /// Sorted distinct values of a field. Class and type fields contribute
    /// their individual tokens; absent values are skipped.
    pub fn distinct_values(&self, field: Field) -> Vec<FieldValue> {
        let mut values: BTreeSet<FieldValue> = BTreeSet::new();
        for record in &self.records {
            match field {
                Field::Era => {
                    values.insert(FieldValue::Int(record.era));
                }
                Field::Subera => {
                    values.insert(FieldValue::Int(record.subera));
                }
                Field::Class => {
                    values.extend(record.class.iter().map(|t| FieldValue::Text(t.to_string())));
                }
                Field::Type => {
                    values.extend(record.types.iter().map(|t| FieldValue::Text(t.to_string())));
                }
                Field::Category => {
                    if let Some(category) = &record.category {
                        values.insert(FieldValue::Text(category.clone()));
                    }
                }
                Field::Numeric(numeric) => {
                    if let Some(v) = record.value(numeric) {
                        values.insert(FieldValue::Int(v));
                    }
                }
            }
        }
        values.into_iter().collect()
    }
}

/// 1-based line of the first card row whose `column` is not an integer.
fn first_untyped_row(conn: &Connection, column: &str) -> Result<Option<i64>> {
    let (sql, params) = SqlBuilder::new(CARDS_TABLE)
        .select_as("min(rowid) + 1", "line")
        .where_clause(&format!("{} IS NULL", int_expr(&quote_ident(column))), &[])
        .build();
    Ok(conn
        .execute_scalar(&sql, &params)?
        .and_then(|line| line.as_i64()))
}

/// Build the select over the card table with the link index left-joined.
fn catalog_query(conn: &Connection, with_links: bool) -> Result<(String, Vec<String>)> {
    let columns: HashSet<String> = conn.columns(CARDS_TABLE)?.into_iter().collect();
    for required in config::REQUIRED_CARD_COLUMNS {
        if !columns.contains(required) {
            return Err(ErasError::Load(format!(
                "card table is missing required column '{}'",
                required
            )));
        }
    }

    let col = |name: &str| format!("c.{}", quote_ident(name));
    let card_id = int_expr(&col("id"));

    let mut qb = SqlBuilder::new(&format!("{} c", CARDS_TABLE));
    qb.select_as(&card_id, "id")
        .select_as(&format!("COALESCE(CAST({} AS VARCHAR), '')", col("name")), "name")
        .select_as(&int_expr(&col("era")), "era");

    if columns.contains("subera") {
        qb.select_as(&format!("COALESCE({}, 0)", int_expr(&col("subera"))), "subera");
    } else {
        qb.select_as("0", "subera");
    }

    for name in INT_COLUMNS {
        if columns.contains(name) {
            qb.select_as(&int_expr(&col(name)), name);
        } else {
            qb.select_as("CAST(NULL AS BIGINT)", name);
        }
    }

    for name in TEXT_COLUMNS {
        if columns.contains(name) {
            qb.select_as(&text_expr(&col(name)), name);
        } else {
            qb.select_as("CAST(NULL AS VARCHAR)", name);
        }
    }

    if with_links {
        let link_columns: HashSet<String> = conn.columns(LINKS_TABLE)?.into_iter().collect();
        if !link_columns.contains("id") || !link_columns.contains("url") {
            return Err(ErasError::Load(
                "image-link table needs 'id' and 'url' columns".to_string(),
            ));
        }

        // First non-blank url per id, in source order
        let link_id = int_expr(&quote_ident("id"));
        let url = text_expr(&quote_ident("url"));
        let links = SqlBuilder::new(LINKS_TABLE)
            .select_as(&link_id, "link_id")
            .select_as(&format!("first({} ORDER BY rowid)", url), "url")
            .where_clause(&format!("{} IS NOT NULL", url), &[])
            .group_by(&[link_id.as_str()])
            .build_subquery();

        qb.left_join(&links, "l", &format!("l.link_id = {}", card_id))
            .select_as("l.url", "image_url");
    } else {
        qb.select_as("CAST(NULL AS VARCHAR)", "image_url");
    }

    qb.order_by(&["c.rowid ASC"]);
    Ok(qb.build())
}
