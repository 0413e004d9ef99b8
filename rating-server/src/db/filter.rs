//! Listing filters and sort resolution
//!
//! Filter values are always bound as parameters. Sort columns come from a
//! fixed allow-list per listing, so request input never reaches the SQL text.

use serde::Deserialize;
use sqlx::Sqlite;
use sqlx::query::QueryAs;

/// Query-string parameters accepted by the listing endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Sortable columns of the admin user listing (first entry is the default)
pub const USER_SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "u.name"),
    ("email", "u.email"),
    ("address", "u.address"),
    ("role", "u.role"),
    ("rating", "rating"),
];

/// Sortable columns of the admin store listing
pub const STORE_SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "s.name"),
    ("email", "s.email"),
    ("address", "s.address"),
    ("rating", "rating"),
];

/// Sortable columns of the caller-relative store listing
pub const RATER_STORE_SORT_COLUMNS: &[(&str, &str)] = &[("name", "s.name"), ("address", "s.address")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than a case-insensitive `desc` sorts ascending
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolved `ORDER BY` target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub order: SortOrder,
}

impl Sort {
    /// Pick the column for `sort_by` from `allowed`, falling back to the first entry.
    pub fn resolve(
        allowed: &'static [(&'static str, &'static str)],
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Self {
        let column = sort_by
            .and_then(|key| allowed.iter().find(|(name, _)| *name == key))
            .or_else(|| allowed.first())
            .map(|(_, column)| *column)
            .unwrap_or("id");
        Self {
            column,
            order: SortOrder::parse(sort_order),
        }
    }

    /// `ORDER BY` clause with `tiebreak` appended for a stable order
    pub fn order_by(&self, tiebreak: &str) -> String {
        format!(
            " ORDER BY {} {}, {} ASC",
            self.column,
            self.order.as_sql(),
            tiebreak
        )
    }
}

/// Accumulates WHERE conditions with their bound values
#[derive(Debug, Default)]
pub struct FilterBuilder {
    conditions: Vec<String>,
    bindings: Vec<String>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substring match; blank values add nothing
    pub fn like(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.conditions.push(format!("{} LIKE ?", column));
            self.bindings.push(format!("%{}%", v));
        }
        self
    }

    /// Exact match
    pub fn exact(&mut self, column: &str, value: &str) -> &mut Self {
        self.conditions.push(format!("{} = ?", column));
        self.bindings.push(value.to_owned());
        self
    }

    /// WHERE clause (empty if no conditions)
    pub fn build_where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Bind the accumulated values in condition order
    pub fn apply_bindings<'q, O>(
        &self,
        mut query: QueryAs<'q, Sqlite, O, <Sqlite as sqlx::Database>::Arguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, <Sqlite as sqlx::Database>::Arguments<'q>> {
        for value in &self.bindings {
            query = query.bind(value.clone());
        }
        query
    }
}
