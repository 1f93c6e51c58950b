//! In-memory evaluation of filter sets against records (the fixture path).
//!
//! Every clause here has a twin in [`super::compiler`]; the two must select
//! exactly the same records for any filter set.

use super::filter_set::{FilterSet, PredictionQuery};
use crate::storage::models::{MedalResult, PredictionRecord};
use crate::types::edition::slug_year;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

impl FilterSet {
    /// Decide whether a record satisfies every clause of the filter set.
    ///
    /// Clauses are AND-combined and an empty clause always passes. Absent
    /// record fields fail the clause that inspects them.
    pub fn matches(&self, record: &MedalResult) -> bool {
        if let Some(year) = self.year_equals {
            if record.year != year {
                return false;
            }
        } else {
            if self.year_min.is_some_and(|min| record.year < min) {
                return false;
            }
            if self.year_max.is_some_and(|max| record.year > max) {
                return false;
            }
        }

        if !self.seasons.is_empty() && !record.season.is_some_and(|s| self.seasons.contains(&s)) {
            return false;
        }

        if !self.countries.is_empty() {
            let in_set = |value: &Option<String>| {
                value
                    .as_deref()
                    .is_some_and(|country| self.countries.contains(country))
            };
            if !in_set(&record.nationality) && !in_set(&record.country) {
                return false;
            }
        }

        if !self.medal_types.is_empty()
            && !record.medal.is_some_and(|m| self.medal_types.contains(&m))
        {
            return false;
        }

        if !self.sports.is_empty()
            && !record
                .sport
                .as_deref()
                .is_some_and(|sport| self.sports.contains(sport))
        {
            return false;
        }

        if let Some(gender) = self.gender {
            if record.gender != Some(gender) {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let haystacks = [
                record.name.as_deref(),
                record.sport.as_deref(),
                record.effective_country(),
                record.city.as_deref(),
            ];
            let found = haystacks
                .into_iter()
                .flatten()
                .any(|value| value.to_ascii_lowercase().contains(term.as_str()));
            if !found {
                return false;
            }
        }

        true
    }
}

/// Select the matching records, in canonical result order.
pub fn filter_records<'a>(records: &'a [MedalResult], filters: &FilterSet) -> Vec<&'a MedalResult> {
    let mut matched: Vec<&MedalResult> = records
        .par_iter()
        .filter(|record| filters.matches(record))
        .collect();
    matched.sort_by(|a, b| compare_results(a, b));
    matched
}

/// Canonical result order: year descending, then sport, athlete name and id
/// ascending. Absent values sort first, as the store does for `NULL`.
pub fn compare_results(a: &MedalResult, b: &MedalResult) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| a.sport.cmp(&b.sport))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

impl PredictionQuery {
    pub fn matches(&self, record: &PredictionRecord) -> bool {
        if !self.countries.is_empty() && !self.countries.contains(&record.country) {
            return false;
        }
        if self
            .slug_game
            .as_ref()
            .is_some_and(|slug| slug != &record.slug_game)
        {
            return false;
        }
        if self.target.as_ref().is_some_and(|t| t != &record.target) {
            return false;
        }
        if self.model.as_ref().is_some_and(|m| m != &record.model_name) {
            return false;
        }

        // A slug without a trailing year is never excluded by a year bound.
        if let Some(year) = slug_year(&record.slug_game) {
            if self.year_min.is_some_and(|min| year < min) {
                return false;
            }
            if self.year_max.is_some_and(|max| year > max) {
                return false;
            }
        }

        true
    }
}

/// Filter, enrich and order predictions held in memory.
///
/// When actual data is requested every returned record carries
/// `actual_medals`, explicitly `null` when no summary matches.
pub fn select_predictions(
    records: &[PredictionRecord],
    query: &PredictionQuery,
    actuals: &HashMap<(String, String), f64>,
) -> Vec<PredictionRecord> {
    let mut selected: Vec<PredictionRecord> = records
        .iter()
        .filter(|record| query.matches(record))
        .map(|record| {
            let mut record = record.clone();
            record.actual_medals = if query.include_actual {
                let known = record.actual_medals.flatten();
                let joined = actuals
                    .get(&(record.country.clone(), record.slug_game.clone()))
                    .copied();
                Some(known.or(joined))
            } else {
                None
            };
            record
        })
        .collect();

    selected.sort_by(compare_predictions);
    selected
}

/// Newest first (undated last), then country ascending.
pub fn compare_predictions(a: &PredictionRecord, b: &PredictionRecord) -> Ordering {
    let time_a = a.created_at.as_deref().and_then(parse_timestamp);
    let time_b = b.created_at.as_deref().and_then(parse_timestamp);
    time_b
        .cmp(&time_a)
        .then_with(|| a.country.cmp(&b.country))
}

/// Parse the timestamp shapes the ML pipeline emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
