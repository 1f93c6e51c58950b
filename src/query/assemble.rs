//! Response envelopes for the paginated and aggregated endpoints.

use super::aggregate::{Aggregations, BaseStats};
use super::pagination::PaginationResult;
use crate::storage::models::{MedalResult, PredictionRecord};
use crate::types::{Medal, Season};
use serde::Serialize;

/// `GET /api/results`: rows plus flat pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsPage {
    pub results: Vec<MedalResult>,
    #[serde(flatten)]
    pub pagination: PaginationResult,
}

/// `GET /api/predicted_medals`: same shape on the store and fallback paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionsPage {
    pub predictions: Vec<PredictionRecord>,
    #[serde(flatten)]
    pub pagination: PaginationResult,
}

/// `POST /api/data/filtered`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredResponse {
    pub stats: BaseStats,
    pub results: Vec<MedalResult>,
    pub aggregations: Aggregations,
    pub pagination: PaginationResult,
}

/// `GET /api/filters`: every value a filter UI can offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub years: Vec<i32>,
    pub seasons: Vec<Season>,
    pub countries: Vec<String>,
    pub sports: Vec<String>,
    pub medal_types: Vec<Medal>,
}

impl FilterOptions {
    /// Assemble options; years ascending, the rest sorted and deduplicated.
    pub fn new(
        mut years: Vec<i32>,
        mut seasons: Vec<Season>,
        mut countries: Vec<String>,
        mut sports: Vec<String>,
    ) -> Self {
        years.sort_unstable();
        years.dedup();
        seasons.sort_unstable();
        seasons.dedup();
        countries.sort();
        countries.dedup();
        sports.sort();
        sports.dedup();

        Self {
            years,
            seasons,
            countries,
            sports,
            medal_types: Medal::ALL.to_vec(),
        }
    }
}
