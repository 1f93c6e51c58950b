//! Normalized request intent shared by the fixture and store paths.

use crate::types::{Gender, Medal, Season};
use serde::Serialize;
use std::collections::BTreeSet;

/// Typed filter set for medal results.
///
/// Every collection field is a deduplicated set, and an empty set means
/// "unrestricted". `search` is stored trimmed and ASCII-lowercased.
///
/// ```rust
/// use olympics_api::{FilterSet, Medal};
///
/// let filters = FilterSet::default()
///     .with_countries(["USA", "FRA", "USA"])
///     .with_medals([Medal::Gold]);
/// assert_eq!(filters.countries.len(), 2);
/// assert!(!filters.is_unrestricted());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub year_equals: Option<i32>,
    pub seasons: BTreeSet<Season>,
    pub countries: BTreeSet<String>,
    pub medal_types: BTreeSet<Medal>,
    pub sports: BTreeSet<String>,
    pub gender: Option<Gender>,
    pub search: Option<String>,
}

impl FilterSet {
    pub fn with_year_equals(mut self, year: i32) -> Self {
        self.year_equals = Some(year);
        self
    }

    pub fn with_year_range(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.year_min = min;
        self.year_max = max;
        self
    }

    pub fn with_seasons(mut self, seasons: impl IntoIterator<Item = Season>) -> Self {
        self.seasons.extend(seasons);
        self
    }

    pub fn with_countries<S: Into<String>>(mut self, countries: impl IntoIterator<Item = S>) -> Self {
        self.countries.extend(non_blank(countries));
        self
    }

    pub fn with_medals(mut self, medals: impl IntoIterator<Item = Medal>) -> Self {
        self.medal_types.extend(medals);
        self
    }

    pub fn with_sports<S: Into<String>>(mut self, sports: impl IntoIterator<Item = S>) -> Self {
        self.sports.extend(non_blank(sports));
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search = normalize_search(term);
        self
    }

    /// True when no clause restricts the record set.
    pub fn is_unrestricted(&self) -> bool {
        self.year_min.is_none()
            && self.year_max.is_none()
            && self.year_equals.is_none()
            && self.seasons.is_empty()
            && self.countries.is_empty()
            && self.medal_types.is_empty()
            && self.sports.is_empty()
            && self.gender.is_none()
            && self.search.is_none()
    }
}

pub(crate) fn normalize_search(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

fn non_blank<S: Into<String>>(values: impl IntoIterator<Item = S>) -> impl Iterator<Item = String> {
    values
        .into_iter()
        .map(|value| value.into().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Filters for `/api/predicted_medals`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PredictionQuery {
    pub countries: BTreeSet<String>,
    pub slug_game: Option<String>,
    pub target: Option<String>,
    pub model: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub include_actual: bool,
}
