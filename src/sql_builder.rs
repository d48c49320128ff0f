//! Query assembly for the catalog join.
//!
//! Values go through DuckDB's parameter binding (`?` placeholders); only
//! column expressions built inside this crate are interpolated. Builder
//! methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use eras_viewer::sql_builder::{int_expr, SqlBuilder};
//!
//! let (sql, params) = SqlBuilder::new("cards c")
//!     .select_as(&int_expr("c.era"), "era")
//!     .where_clause("c.name = ?", &["Nac"])
//!     .order_by(&["c.rowid ASC"])
//!     .build();
//! assert!(sql.starts_with("SELECT TRY_CAST(c.era AS BIGINT) AS \"era\""));
//! assert_eq!(params, vec!["Nac"]);
//! ```

/// Builds one SELECT statement, one clause per line.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    source: String,
    columns: Vec<String>,
    joins: Vec<String>,
    filters: Vec<String>,
    params: Vec<String>,
    grouping: Vec<String>,
    ordering: Vec<String>,
}

impl SqlBuilder {
    /// Start a query over a table, an aliased table (`"cards c"`) or a
    /// parenthesized subquery. Selects `*` until a column is added.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            columns: Vec::new(),
            joins: Vec::new(),
            filters: Vec::new(),
            params: Vec::new(),
            grouping: Vec::new(),
            ordering: Vec::new(),
        }
    }

    /// Append `expr AS "alias"`.
    pub fn select_as(&mut self, expr: &str, alias: &str) -> &mut Self {
        self.columns.push(format!("{} AS {}", expr, quote_ident(alias)));
        self
    }

    /// LEFT JOIN a table or subquery under `alias`.
    pub fn left_join(&mut self, source: &str, alias: &str, on: &str) -> &mut Self {
        self.joins
            .push(format!("LEFT JOIN {} {} ON {}", source, alias, on));
        self
    }

    /// Add a WHERE condition; conditions are ANDed and `params` bind its
    /// `?` placeholders in order.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.filters.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    pub fn group_by(&mut self, exprs: &[&str]) -> &mut Self {
        self.grouping.extend(exprs.iter().map(|e| e.to_string()));
        self
    }

    /// Add ORDER BY clauses (e.g. `"c.rowid ASC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.ordering.extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// The SQL text and its bound parameters.
    pub fn build(&self) -> (String, Vec<String>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut lines = vec![format!("SELECT {}", columns), format!("FROM {}", self.source)];
        lines.extend(self.joins.iter().cloned());
        if !self.filters.is_empty() {
            lines.push(format!("WHERE {}", self.filters.join(" AND ")));
        }
        if !self.grouping.is_empty() {
            lines.push(format!("GROUP BY {}", self.grouping.join(", ")));
        }
        if !self.ordering.is_empty() {
            lines.push(format!("ORDER BY {}", self.ordering.join(", ")));
        }

        (lines.join("\n"), self.params.clone())
    }

    /// The query wrapped in parentheses for use as a join source.
    ///
    /// Bound parameters are not carried over.
    pub fn build_subquery(&self) -> String {
        format!("({})", self.build().0)
    }
}

/// `TRY_CAST(expr AS BIGINT)`: cells that are not integers become NULL.
pub fn int_expr(expr: &str) -> String {
    format!("TRY_CAST({} AS BIGINT)", expr)
}

/// Trimmed text where blank cells become NULL.
pub fn text_expr(expr: &str) -> String {
    format!("NULLIF(TRIM(CAST({} AS VARCHAR)), '')", expr)
}

/// Quote an identifier for DuckDB.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
