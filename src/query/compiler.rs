//! Query compiler: filter sets → parameterized SQL predicates.
//!
//! The generated WHERE clause must select exactly the records that
//! [`FilterSet::matches`] accepts, evaluated over [`RESULTS_FROM`].

use super::filter_set::{FilterSet, PredictionQuery};
use rusqlite::types::{ToSql, ToSqlOutput};
use std::fmt;

/// The result/athlete/host join every result query runs against.
///
/// Hosts are keyed by (year, season): Summer and Winter Games shared a year
/// until 1992.
pub const RESULTS_FROM: &str = "FROM medals m
     JOIN athletes a ON m.athlete_id = a.id
     LEFT JOIN hosts h ON h.year = m.year AND h.season = m.season";

/// Columns mapped by the store's `MedalResult` row reader, in order.
pub const RESULT_COLUMNS: &str = "m.id, m.athlete_id, a.name, a.sex, a.age, a.nationality, h.country,
     m.year, m.season, COALESCE(m.city, h.city), m.sport, m.event, m.medal";

/// Canonical result order; SQLite sorts `NULL` first in ascending order.
pub const RESULTS_ORDER: &str = "ORDER BY m.year DESC, m.sport ASC, a.name ASC, m.id ASC";

pub const PREDICTIONS_FROM: &str = "FROM medal_predictions mp";

/// Newest first with undated rows last, then country.
pub const PREDICTIONS_ORDER: &str =
    "ORDER BY mp.created_at IS NULL, mp.created_at DESC, mp.country_name ASC";

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::Int(value) => value.to_sql(),
            SqlParam::Text(value) => value.to_sql(),
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Int(value) => write!(f, "{}", value),
            SqlParam::Text(value) => write!(f, "'{}'", value),
        }
    }
}

/// A WHERE clause with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub where_clause: String,
    pub params: Vec<SqlParam>,
}

impl CompiledFilter {
    fn new() -> Self {
        Self {
            where_clause: "1 = 1".to_string(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, clause: &str) {
        self.where_clause.push_str(" AND ");
        self.where_clause.push_str(clause);
    }

    /// Push `column IN (?, ?, ...)` and bind every value.
    fn push_in<I, S>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.push(&in_clause(column, values.len()));
        self.params.extend(values.into_iter().map(SqlParam::Text));
    }

    /// Parameters followed by extra trailing values (e.g. LIMIT and OFFSET).
    pub fn params_with<'a>(&'a self, extra: &'a [SqlParam]) -> Vec<&'a dyn ToSql> {
        self.params
            .iter()
            .chain(extra.iter())
            .map(|param| param as &dyn ToSql)
            .collect()
    }
}

fn in_clause(column: &str, count: usize) -> String {
    let placeholders = vec!["?"; count].join(", ");
    format!("{} IN ({})", column, placeholders)
}

/// Compile a result filter set against [`RESULTS_FROM`].
pub fn compile(filters: &FilterSet) -> CompiledFilter {
    let mut compiled = CompiledFilter::new();

    if let Some(year) = filters.year_equals {
        compiled.push("m.year = ?");
        compiled.params.push(SqlParam::Int(year.into()));
    } else {
        if let Some(min) = filters.year_min {
            compiled.push("m.year >= ?");
            compiled.params.push(SqlParam::Int(min.into()));
        }
        if let Some(max) = filters.year_max {
            compiled.push("m.year <= ?");
            compiled.params.push(SqlParam::Int(max.into()));
        }
    }

    if !filters.seasons.is_empty() {
        compiled.push_in("m.season", filters.seasons.iter().map(|s| s.as_str()));
    }

    // Nationality and host country both stand for "country".
    if !filters.countries.is_empty() {
        let count = filters.countries.len();
        compiled.push(&format!(
            "({} OR {})",
            in_clause("a.nationality", count),
            in_clause("h.country", count)
        ));
        for _ in 0..2 {
            compiled
                .params
                .extend(filters.countries.iter().cloned().map(SqlParam::Text));
        }
    }

    if !filters.medal_types.is_empty() {
        compiled.push_in("m.medal", filters.medal_types.iter().map(|m| m.as_str()));
    }

    if !filters.sports.is_empty() {
        compiled.push_in("m.sport", filters.sports.iter().cloned());
    }

    if let Some(gender) = filters.gender {
        compiled.push("a.sex = ?");
        compiled.params.push(SqlParam::Text(gender.as_str().to_string()));
    }

    // `lower()` folds ASCII only, like the in-memory search. `instr` avoids
    // LIKE wildcards in the user's term.
    if let Some(term) = &filters.search {
        compiled.push(
            "(instr(lower(a.name), ?) > 0
              OR instr(lower(m.sport), ?) > 0
              OR instr(lower(COALESCE(a.nationality, h.country)), ?) > 0
              OR instr(lower(COALESCE(m.city, h.city)), ?) > 0)",
        );
        for _ in 0..4 {
            compiled.params.push(SqlParam::Text(term.clone()));
        }
    }

    compiled
}

/// Compile a prediction query against [`PREDICTIONS_FROM`].
pub fn compile_predictions(query: &PredictionQuery) -> CompiledFilter {
    let mut compiled = CompiledFilter::new();

    if !query.countries.is_empty() {
        compiled.push_in("mp.country_name", query.countries.iter().cloned());
    }
    for (column, value) in [
        ("mp.slug_game", &query.slug_game),
        ("mp.target", &query.target),
        ("mp.model_name", &query.model),
    ] {
        if let Some(value) = value {
            compiled.push(&format!("{} = ?", column));
            compiled.params.push(SqlParam::Text(value.clone()));
        }
    }

    // Slugs without a trailing four-digit year are never excluded.
    for (bound, op) in [(query.year_min, ">="), (query.year_max, "<=")] {
        if let Some(year) = bound {
            compiled.push(&format!(
                "(substr(mp.slug_game, -4) NOT GLOB '[0-9][0-9][0-9][0-9]'
                  OR CAST(substr(mp.slug_game, -4) AS INTEGER) {} ?)",
                op
            ));
            compiled.params.push(SqlParam::Int(year.into()));
        }
    }

    compiled
}
