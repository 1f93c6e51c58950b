//! Grouped summaries over a filtered record set.
//!
//! Each aggregation scans the whole filtered set on its own. A record whose
//! grouping value is absent is left out of that aggregation only.

use crate::error::{OlympicsError, Result};
use crate::storage::models::{MedalResult, MedalSummaryRow};
use crate::types::Medal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

pub const TOP_COUNTRIES: usize = 20;
pub const TOP_SPORTS: usize = 15;
pub const TOP_SPORTS_ENDPOINT: usize = 10;

/// Requestable aggregation keys for `POST /api/data/filtered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationKey {
    ByCountry,
    ByYear,
    ByMedal,
    BySport,
}

impl AggregationKey {
    pub const ALL: [AggregationKey; 4] = [
        AggregationKey::ByCountry,
        AggregationKey::ByYear,
        AggregationKey::ByMedal,
        AggregationKey::BySport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKey::ByCountry => "byCountry",
            AggregationKey::ByYear => "byYear",
            AggregationKey::ByMedal => "byMedal",
            AggregationKey::BySport => "bySport",
        }
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKey {
    type Err = OlympicsError;

    fn from_str(s: &str) -> Result<Self> {
        AggregationKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| {
                OlympicsError::invalid_parameter(
                    "aggregations",
                    format!("unknown aggregation \"{s}\""),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryBucket {
    pub country: String,
    pub total: u64,
    pub gold: u64,
    pub silver: u64,
    pub bronze: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearBucket {
    pub year: i32,
    pub medals: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedalBucket {
    pub medal: Medal,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SportBucket {
    pub sport: String,
    pub participants: u64,
}

/// Requested aggregations; keys that were not requested are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_country: Option<Vec<CountryBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_year: Option<Vec<YearBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_medal: Option<Vec<MedalBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_sport: Option<Vec<SportBucket>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedalDistribution {
    #[serde(rename = "Gold")]
    pub gold: u64,
    #[serde(rename = "Silver")]
    pub silver: u64,
    #[serde(rename = "Bronze")]
    pub bronze: u64,
}

impl MedalDistribution {
    fn record(&mut self, medal: Medal) {
        match medal {
            Medal::Gold => self.gold += 1,
            Medal::Silver => self.silver += 1,
            Medal::Bronze => self.bronze += 1,
        }
    }
}

/// Headline counts over a filtered set. Every field is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    pub total_athletes: u64,
    pub total_medals: u64,
    pub total_countries: u64,
    pub total_sports: u64,
    pub medal_distribution: MedalDistribution,
}

pub fn base_stats(records: &[&MedalResult]) -> BaseStats {
    let mut athletes = HashSet::new();
    let mut countries = HashSet::new();
    let mut sports = HashSet::new();
    let mut distribution = MedalDistribution::default();

    for record in records {
        athletes.insert(record.athlete_id);
        if let Some(country) = record.effective_country() {
            countries.insert(country);
        }
        if let Some(sport) = record.sport.as_deref() {
            sports.insert(sport);
        }
        if let Some(medal) = record.medal {
            distribution.record(medal);
        }
    }

    BaseStats {
        total_athletes: athletes.len() as u64,
        total_medals: records.len() as u64,
        total_countries: countries.len() as u64,
        total_sports: sports.len() as u64,
        medal_distribution: distribution,
    }
}

/// Compute each requested aggregation independently.
pub fn aggregate(records: &[&MedalResult], keys: &BTreeSet<AggregationKey>) -> Aggregations {
    let mut aggregations = Aggregations::default();
    for key in keys {
        match key {
            AggregationKey::ByCountry => {
                aggregations.by_country = Some(by_country(records, Some(TOP_COUNTRIES)))
            }
            AggregationKey::ByYear => aggregations.by_year = Some(by_year(records)),
            AggregationKey::ByMedal => aggregations.by_medal = Some(by_medal(records)),
            AggregationKey::BySport => {
                aggregations.by_sport = Some(by_sport(records, Some(TOP_SPORTS)))
            }
        }
    }
    aggregations
}

/// Medal tallies per country, largest first, ties by country name.
pub fn by_country(records: &[&MedalResult], top: Option<usize>) -> Vec<CountryBucket> {
    let mut groups: BTreeMap<&str, CountryBucket> = BTreeMap::new();
    for record in records {
        let Some(country) = record.effective_country() else {
            continue;
        };
        let bucket = groups.entry(country).or_insert_with(|| CountryBucket {
            country: country.to_string(),
            total: 0,
            gold: 0,
            silver: 0,
            bronze: 0,
        });
        bucket.total += 1;
        match record.medal {
            Some(Medal::Gold) => bucket.gold += 1,
            Some(Medal::Silver) => bucket.silver += 1,
            Some(Medal::Bronze) => bucket.bronze += 1,
            None => {}
        }
    }

    let mut buckets: Vec<CountryBucket> = groups.into_values().collect();
    buckets.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.country.cmp(&b.country)));
    truncate(buckets, top)
}

pub fn by_year(records: &[&MedalResult]) -> Vec<YearBucket> {
    let mut groups: BTreeMap<i32, u64> = BTreeMap::new();
    for record in records {
        *groups.entry(record.year).or_default() += 1;
    }
    groups
        .into_iter()
        .map(|(year, medals)| YearBucket { year, medals })
        .collect()
}

/// Medal counts in alphabetical order of the wire name.
pub fn by_medal(records: &[&MedalResult]) -> Vec<MedalBucket> {
    let mut groups: BTreeMap<&'static str, MedalBucket> = BTreeMap::new();
    for record in records {
        if let Some(medal) = record.medal {
            groups
                .entry(medal.as_str())
                .or_insert(MedalBucket { medal, count: 0 })
                .count += 1;
        }
    }
    groups.into_values().collect()
}

pub fn by_sport(records: &[&MedalResult], top: Option<usize>) -> Vec<SportBucket> {
    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        if let Some(sport) = record.sport.as_deref() {
            *groups.entry(sport).or_default() += 1;
        }
    }

    let mut buckets: Vec<SportBucket> = groups
        .into_iter()
        .map(|(sport, participants)| SportBucket {
            sport: sport.to_string(),
            participants,
        })
        .collect();
    buckets.sort_by(|a, b| {
        b.participants
            .cmp(&a.participants)
            .then_with(|| a.sport.cmp(&b.sport))
    });
    truncate(buckets, top)
}

/// Medal rows per (year, city, medal): newest year first, then city, then
/// podium order.
pub fn medal_summary(records: &[&MedalResult]) -> Vec<MedalSummaryRow> {
    let mut groups: BTreeMap<(i32, Option<&str>, Medal), u64> = BTreeMap::new();
    for record in records {
        if let Some(medal) = record.medal {
            *groups
                .entry((record.year, record.city.as_deref(), medal))
                .or_default() += 1;
        }
    }

    let mut rows: Vec<MedalSummaryRow> = groups
        .into_iter()
        .map(|((year, city, medal), count)| MedalSummaryRow {
            year,
            city: city.map(str::to_string),
            medal,
            count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| a.city.cmp(&b.city))
            .then_with(|| a.medal.cmp(&b.medal))
    });
    rows
}

fn truncate<T>(mut buckets: Vec<T>, top: Option<usize>) -> Vec<T> {
    if let Some(top) = top {
        buckets.truncate(top);
    }
    buckets
}

#[cfg(test)]
mod tests;
