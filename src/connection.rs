//! DuckDB connection wrapper that ingests the card sheets as tables.
//!
//! Uses schema introspection to normalize the source headers:
//! - header names are trimmed, lowercased and mapped through the alias table
//! - unknown headers are kept, with spaces replaced by underscores
//!
//! Source row order is kept; tables expose it through DuckDB's `rowid`.

use crate::config;
use crate::error::{ErasError, Result};
use crate::sql_builder::quote_ident;
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Wraps an in-memory DuckDB database holding the catalog source tables.
pub struct Connection {
    conn: DuckDbConnection,
}

impl Connection {
    /// Open an empty in-memory database.
    pub fn new() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Load an Excel, CSV or newline-delimited JSON file into a table.
    ///
    /// The reader is chosen by extension: `.xlsx` reads the first sheet
    /// through DuckDB's `excel` extension, `.json`, `.ndjson` and `.jsonl`
    /// are JSON, anything else is CSV. Column headers are normalized through
    /// [`config::column_aliases`]. Replaces any table of the same name.
    pub fn register_table(&self, table_name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ErasError::NotFound(format!(
                "Table source {} does not exist",
                path.display()
            )));
        }

        // Use forward slashes for DuckDB compatibility
        let path_str = path.to_string_lossy().replace('\\', "/");
        let source = source_reader(&path_str);
        if is_xlsx(&path_str) {
            self.load_excel()?;
        }
        let select_list = self.build_normalized_select(&source)?;

        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TABLE {} AS SELECT {} FROM {}",
            quote_ident(table_name),
            select_list,
            source
        ))?;
        debug!(table = table_name, path = %path_str, "Registered table");

        Ok(())
    }

    /// Return the column names of a registered table, in table order.
    pub fn columns(&self, table_name: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT column_name FROM (DESCRIBE {})",
            quote_ident(table_name)
        ))?;

        let mut rows = stmt.query([])?;
        let mut cols = Vec::new();
        while let Some(row) = rows.next()? {
            let col_name: String = row.get(0)?;
            cols.push(col_name);
        }
        Ok(cols)
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let mut rows_result = stmt.query(bind(params).as_slice())?;

        // Column metadata is only available after the query has run
        let (column_names, column_count) = {
            let executed = rows_result.as_ref().ok_or_else(|| {
                ErasError::InvalidArgument(format!("statement returned no result set: {}", sql))
            })?;
            let names: Vec<String> = executed
                .column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect();
            (names, executed.column_count())
        };

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_count);
            for (i, col_name) in column_names.iter().enumerate() {
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter().collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind(params).as_slice())?;

        if let Some(row) = rows.next()? {
            let value = convert_value_ref(row.get_ref(0)?);
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Make `read_xlsx` available. `INSTALL` is a no-op once the extension
    /// is in the local extension directory.
    fn load_excel(&self) -> Result<()> {
        self.conn
            .execute_batch("INSTALL excel; LOAD excel;")
            .map_err(|e| ErasError::Load(format!("cannot load the DuckDB excel extension: {}", e)))
    }

    /// Build a select list renaming each source column to its normalized name.
    ///
    /// Only reads the schema (DESCRIBE). When two headers normalize to the
    /// same name the first one wins.
    fn build_normalized_select(&self, source: &str) -> Result<String> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT column_name FROM (DESCRIBE SELECT * FROM {})",
            source
        ))?;

        let mut rows = stmt.query([])?;
        let aliases = config::column_aliases();
        let mut seen: HashSet<String> = HashSet::new();
        let mut exprs: Vec<String> = Vec::new();

        while let Some(row) = rows.next()? {
            let original: String = row.get(0)?;
            let normalized = normalize_column(&original, &aliases);
            if !seen.insert(normalized.clone()) {
                warn!(column = %original, normalized = %normalized, "Duplicate column ignored");
                continue;
            }
            exprs.push(format!("{} AS {}", quote_ident(&original), quote_ident(&normalized)));
        }

        if exprs.is_empty() {
            return Err(ErasError::Load(format!("{} has no columns", source)));
        }
        Ok(exprs.join(", "))
    }
}

/// Positional `?` parameters as DuckDB bind values.
fn bind(params: &[String]) -> Vec<&dyn duckdb::ToSql> {
    params.iter().map(|p| p as &dyn duckdb::ToSql).collect()
}

fn is_xlsx(path_str: &str) -> bool {
    path_str.to_lowercase().ends_with(".xlsx")
}

/// Pick the DuckDB table function for a source file.
fn source_reader(path_str: &str) -> String {
    let lower = path_str.to_lowercase();
    let escaped = path_str.replace('\'', "''");
    if is_xlsx(&lower) {
        // Cells that do not fit the inferred column type load as NULL
        format!("read_xlsx('{}', header=true, ignore_errors=true)", escaped)
    } else if lower.ends_with(".json") || lower.ends_with(".ndjson") || lower.ends_with(".jsonl") {
        format!("read_json_auto('{}', format='newline_delimited')", escaped)
    } else {
        format!("read_csv_auto('{}', header=true)", escaped)
    }
}

fn normalize_column(original: &str, aliases: &HashMap<&'static str, &'static str>) -> String {
    let key = original.trim().to_lowercase();
    match aliases.get(key.as_str()) {
        Some(name) => name.to_string(),
        None => key.replace(' ', "_"),
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => serde_json::Value::Null,
    }
}
