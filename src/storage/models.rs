//! Data models for the storage layer

use crate::types::{deserialize_lenient, AthleteId, Gender, Medal, ResultId, Season};
use serde::{Deserialize, Serialize};

/// One athlete-event observation, as served by `/api/results`.
///
/// `nationality` is the athlete's country and `country` the host country of
/// the edition; both stand for "country" when filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedalResult {
    pub id: ResultId,
    pub athlete_id: AthleteId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub year: i32,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub season: Option<Season>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub medal: Option<Medal>,
}

impl MedalResult {
    /// Country used for grouping and search: nationality, else host country.
    pub fn effective_country(&self) -> Option<&str> {
        self.nationality.as_deref().or(self.country.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub nationality: Option<String>,
}

/// Host city and country of one edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub year: i32,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub season: Option<Season>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Model-emitted forecast for one country at one edition.
///
/// `actual_medals` is `None` when actual data was not requested (the field is
/// omitted on the wire) and `Some(None)` when it was requested but no
/// historical summary exists (serialised as `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub country: String,
    pub slug_game: String,
    pub model_name: String,
    pub target: String,
    pub predicted_value: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_medals: Option<Option<f64>>,
}

/// Historical medal total for a country at one edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub country_name: String,
    pub slug_game: String,
    #[serde(default)]
    pub medals_total: Option<f64>,
}

/// Medal count per edition city, as served by `/api/medals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalSummaryRow {
    pub year: i32,
    pub city: Option<String>,
    pub medal: Medal,
    pub count: u64,
}
