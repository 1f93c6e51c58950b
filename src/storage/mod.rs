//! Storage layer for the Olympics data API
//!
//! Two interchangeable back ends serve the same logical relations:
//! - `schema` / `queries`: the SQLite store (`OlympicsDatabase`)
//! - `fixtures`: JSON snapshots held in memory (`FixtureStore`)
//!
//! plus `csv_fallback`, the file-based prediction source used when the
//! store has no predictions table, and `cache`, the LRU of result counts.

pub mod cache;
pub mod csv_fallback;
pub mod fixtures;
pub mod models;
pub mod queries;
pub mod schema;

#[cfg(test)]
mod tests;

pub use csv_fallback::CsvPredictionSource;
pub use fixtures::FixtureStore;
pub use models::*;
pub use schema::OlympicsDatabase;

use crate::error::{OlympicsError, Result};
use crate::query::aggregate::SportBucket;
use crate::query::assemble::FilterOptions;
use crate::query::{AggregationKey, Aggregations, BaseStats, FilterSet, PredictionQuery, Window};
use std::collections::BTreeSet;

/// Outcome of a query against a relation that an upstream pipeline may not
/// have produced yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    TableMissing { table: String },
}

impl<T> Lookup<T> {
    /// Lift `TableMissing` out of the error channel; other errors stay errors.
    pub fn from_result(result: Result<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Lookup::Found(value)),
            Err(OlympicsError::TableMissing { table }) => Ok(Lookup::TableMissing { table }),
            Err(err) => Err(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::TableMissing { table } => Lookup::TableMissing { table },
        }
    }
}

/// Read access to medal results, athletes and hosts.
///
/// Ordering contracts: results in canonical order, athletes by name, hosts
/// by year descending then season, years descending, sports and countries
/// ascending.
pub trait OlympicsSource: Send + Sync {
    fn count_results(&self, filters: &FilterSet) -> Result<u64>;

    fn fetch_results(&self, filters: &FilterSet, window: Window) -> Result<Vec<MedalResult>>;

    fn base_stats(&self, filters: &FilterSet) -> Result<BaseStats>;

    fn aggregate(
        &self,
        filters: &FilterSet,
        keys: &BTreeSet<AggregationKey>,
    ) -> Result<Aggregations>;

    fn athletes(&self, window: Window) -> Result<Vec<Athlete>>;

    fn hosts(&self) -> Result<Vec<Host>>;

    fn medal_summary(&self) -> Result<Vec<MedalSummaryRow>>;

    fn sports(&self) -> Result<Vec<String>>;

    fn years(&self) -> Result<Vec<i32>>;

    fn countries(&self) -> Result<Vec<String>>;

    fn top_sports(&self, limit: usize) -> Result<Vec<SportBucket>>;

    fn filter_options(&self) -> Result<FilterOptions>;
}

/// Read access to model predictions, newest first.
pub trait PredictionSource: Send + Sync {
    fn count_predictions(&self, query: &PredictionQuery) -> Result<Lookup<u64>>;

    fn fetch_predictions(
        &self,
        query: &PredictionQuery,
        window: Window,
    ) -> Result<Lookup<Vec<PredictionRecord>>>;
}
