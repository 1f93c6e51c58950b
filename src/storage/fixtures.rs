//! Static JSON snapshots served from memory (demo mode)
//!
//! Files are read once at startup. Each may hold a bare JSON array, an
//! object with a `data` array, or a JSON string wrapping either; rows that
//! do not deserialize are skipped with a warning.

use super::{models::*, Lookup, OlympicsSource, PredictionSource};
use crate::error::Result;
use crate::query::aggregate::{self, SportBucket};
use crate::query::assemble::FilterOptions;
use crate::query::predicate::{filter_records, select_predictions};
use crate::query::{AggregationKey, Aggregations, BaseStats, FilterSet, PredictionQuery, Window};
use crate::types::{AthleteId, Season};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, warn};

pub const RESULTS_FILE: &str = "results.json";
pub const ATHLETES_FILE: &str = "athletes.json";
pub const HOSTS_FILE: &str = "hosts.json";
pub const PREDICTIONS_FILE: &str = "medal_predictions_demo.json";
pub const SUMMARY_FILE: &str = "country_year_summary.json";

/// In-memory twin of the SQLite store
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    results: Vec<MedalResult>,
    athletes: Vec<Athlete>,
    hosts: Vec<Host>,
    predictions: Vec<PredictionRecord>,
    summaries: Vec<CountrySummary>,
    actuals: HashMap<(String, String), f64>,
}

impl FixtureStore {
    /// Load every fixture file from `dir`.
    ///
    /// Results, athletes and hosts are required; predictions and country
    /// summaries are optional.
    pub fn load(dir: &Path) -> Result<Self> {
        let results = read_rows(&dir.join(RESULTS_FILE), true)?;
        let athletes = read_rows(&dir.join(ATHLETES_FILE), true)?;
        let hosts = read_rows(&dir.join(HOSTS_FILE), true)?;
        let predictions = read_rows(&dir.join(PREDICTIONS_FILE), false)?;
        let summaries = read_rows(&dir.join(SUMMARY_FILE), false)?;

        let store = Self::from_parts(results, athletes, hosts, predictions, summaries);
        info!(
            results = store.results.len(),
            athletes = store.athletes.len(),
            hosts = store.hosts.len(),
            predictions = store.predictions.len(),
            dir = %dir.display(),
            "Loaded fixtures"
        );
        Ok(store)
    }

    /// Build a store from already-parsed rows so that each result reads the
    /// same data the SQLite join would: athlete fields come from the athletes
    /// list and season, city and host country from the hosts list.
    ///
    /// A result whose athlete is not listed contributes an athlete row built
    /// from its own fields, so an import of this store loses no results.
    pub fn from_parts(
        results: Vec<MedalResult>,
        athletes: Vec<Athlete>,
        mut hosts: Vec<Host>,
        predictions: Vec<PredictionRecord>,
        summaries: Vec<CountrySummary>,
    ) -> Self {
        // A repeated athlete id keeps its last row, as the store's upsert does.
        let mut roster: HashMap<AthleteId, Athlete> =
            athletes.into_iter().map(|athlete| (athlete.id, athlete)).collect();
        for record in &results {
            roster
                .entry(record.athlete_id)
                .or_insert_with(|| athlete_of(record));
        }

        let results = results
            .into_iter()
            .map(|record| resolve_edition(record, &hosts))
            .map(|record| attach_athlete(record, &roster))
            .collect();

        let mut athletes: Vec<Athlete> = roster.into_values().collect();

        athletes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        hosts.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.season.cmp(&b.season)));

        let actuals = summaries
            .iter()
            .filter_map(|summary| {
                summary.medals_total.map(|total| {
                    (
                        (summary.country_name.clone(), summary.slug_game.clone()),
                        total,
                    )
                })
            })
            .collect();

        Self {
            results,
            athletes,
            hosts,
            predictions,
            summaries,
            actuals,
        }
    }

    pub fn results(&self) -> &[MedalResult] {
        &self.results
    }

    pub fn athlete_rows(&self) -> &[Athlete] {
        &self.athletes
    }

    pub fn host_rows(&self) -> &[Host] {
        &self.hosts
    }

    pub fn predictions(&self) -> &[PredictionRecord] {
        &self.predictions
    }

    pub fn summaries(&self) -> &[CountrySummary] {
        &self.summaries
    }

    fn all_results(&self) -> Vec<&MedalResult> {
        self.results.iter().collect()
    }
}

/// Athlete row carried by a result that names an unlisted athlete.
fn athlete_of(record: &MedalResult) -> Athlete {
    Athlete {
        id: record.athlete_id,
        name: record.name.clone(),
        gender: record.gender,
        age: record.age,
        nationality: record.nationality.clone(),
    }
}

/// Replace the per-row athlete fields with the athlete's own.
fn attach_athlete(mut record: MedalResult, roster: &HashMap<AthleteId, Athlete>) -> MedalResult {
    if let Some(athlete) = roster.get(&record.athlete_id) {
        record.name = athlete.name.clone();
        record.gender = athlete.gender;
        record.age = athlete.age;
        record.nationality = athlete.nationality.clone();
    }
    record
}

/// Fill season and city from the matching host edition and take the host
/// country from it unconditionally; a snapshot's own `country` column holds
/// the athlete's country and is discarded.
///
/// A record without a season takes the host only when its year had a single
/// edition.
fn resolve_edition(mut record: MedalResult, hosts: &[Host]) -> MedalResult {
    let host = match record.season {
        Some(season) => hosts
            .iter()
            .find(|host| host.year == record.year && host.season == Some(season)),
        None => {
            let mut same_year = hosts.iter().filter(|host| host.year == record.year);
            match (same_year.next(), same_year.next()) {
                (Some(only), None) => Some(only),
                _ => None,
            }
        }
    };

    record.country = host.and_then(|host| host.country.clone());
    if let Some(host) = host {
        if record.season.is_none() {
            record.season = host.season;
        }
        if record.city.is_none() {
            record.city = host.city.clone();
        }
    }
    record
}

/// Read one fixture file into typed rows.
fn read_rows<T: DeserializeOwned>(path: &Path, required: bool) -> Result<Vec<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Optional fixture file not found");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };

    let items = parse_rows(&raw).unwrap_or_else(|| {
        warn!(path = %path.display(), "Fixture file does not contain a JSON array");
        Vec::new()
    });

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(row) => rows.push(row),
            Err(err) => warn!(path = %path.display(), index, error = %err, "Skipping fixture row"),
        }
    }
    Ok(rows)
}

/// Unwrap the accepted fixture shapes to the list of row values.
///
/// Returns `None` when the content is not one of the accepted shapes.
pub(crate) fn parse_rows(raw: &str) -> Option<Vec<Value>> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Some(Vec::new());
    }

    let mut value: Value = serde_json::from_str(trimmed).ok()?;
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner).ok()?;
    }

    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

impl OlympicsSource for FixtureStore {
    fn count_results(&self, filters: &FilterSet) -> Result<u64> {
        Ok(self.results.iter().filter(|r| filters.matches(r)).count() as u64)
    }

    fn fetch_results(&self, filters: &FilterSet, window: Window) -> Result<Vec<MedalResult>> {
        let matched = filter_records(&self.results, filters);
        Ok(window.apply(&matched).iter().map(|r| (*r).clone()).collect())
    }

    fn base_stats(&self, filters: &FilterSet) -> Result<BaseStats> {
        Ok(aggregate::base_stats(&filter_records(&self.results, filters)))
    }

    fn aggregate(
        &self,
        filters: &FilterSet,
        keys: &BTreeSet<AggregationKey>,
    ) -> Result<Aggregations> {
        Ok(aggregate::aggregate(&filter_records(&self.results, filters), keys))
    }

    fn athletes(&self, window: Window) -> Result<Vec<Athlete>> {
        Ok(window.apply(&self.athletes).to_vec())
    }

    fn hosts(&self) -> Result<Vec<Host>> {
        Ok(self.hosts.clone())
    }

    fn medal_summary(&self) -> Result<Vec<MedalSummaryRow>> {
        Ok(aggregate::medal_summary(&self.all_results()))
    }

    fn sports(&self) -> Result<Vec<String>> {
        let sports: BTreeSet<&str> = self
            .results
            .iter()
            .filter_map(|r| r.sport.as_deref())
            .collect();
        Ok(sports.into_iter().map(str::to_string).collect())
    }

    fn years(&self) -> Result<Vec<i32>> {
        let years: BTreeSet<i32> = self.results.iter().map(|r| r.year).collect();
        Ok(years.into_iter().rev().collect())
    }

    fn countries(&self) -> Result<Vec<String>> {
        let countries: BTreeSet<&str> = self
            .athletes
            .iter()
            .filter_map(|a| a.nationality.as_deref())
            .collect();
        Ok(countries.into_iter().map(str::to_string).collect())
    }

    fn top_sports(&self, limit: usize) -> Result<Vec<SportBucket>> {
        Ok(aggregate::by_sport(&self.all_results(), Some(limit)))
    }

    fn filter_options(&self) -> Result<FilterOptions> {
        let seasons: Vec<Season> = self.hosts.iter().filter_map(|h| h.season).collect();
        Ok(FilterOptions::new(
            self.results.iter().map(|r| r.year).collect(),
            seasons,
            self.countries()?,
            self.sports()?,
        ))
    }
}

impl PredictionSource for FixtureStore {
    fn count_predictions(&self, query: &PredictionQuery) -> Result<Lookup<u64>> {
        let total = self.predictions.iter().filter(|p| query.matches(p)).count();
        Ok(Lookup::Found(total as u64))
    }

    fn fetch_predictions(
        &self,
        query: &PredictionQuery,
        window: Window,
    ) -> Result<Lookup<Vec<PredictionRecord>>> {
        let selected = select_predictions(&self.predictions, query, &self.actuals);
        Ok(Lookup::Found(window.apply(&selected).to_vec()))
    }
}
