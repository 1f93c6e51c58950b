//! Unit tests for aggregations and base stats

use super::*;
use crate::query::test_support::{record, RecordExt};

fn sample() -> Vec<MedalResult> {
    vec![
        record(1, 2016).nationality("USA").medal(Medal::Gold).sport("Swimming"),
        record(2, 2016).nationality("USA").medal(Medal::Silver).sport("Swimming"),
        record(3, 2016).nationality("FRA").medal(Medal::Gold).sport("Judo"),
        record(4, 2012).host("UK", "London").medal(Medal::Bronze).sport("Rowing"),
        record(5, 2012).nationality("FRA"),
    ]
}

fn refs(records: &[MedalResult]) -> Vec<&MedalResult> {
    records.iter().collect()
}

#[test]
fn test_aggregation_key_parse() {
    assert_eq!("byYear".parse::<AggregationKey>().unwrap(), AggregationKey::ByYear);
    assert!("by_year".parse::<AggregationKey>().is_err());
    assert_eq!(serde_json::to_string(&AggregationKey::BySport).unwrap(), r#""bySport""#);
}

#[test]
fn test_base_stats() {
    let records = sample();
    let stats = base_stats(&refs(&records));
    assert_eq!(stats.total_athletes, 5);
    assert_eq!(stats.total_medals, 5);
    assert_eq!(stats.total_countries, 3);
    assert_eq!(stats.total_sports, 4);
    assert_eq!(
        stats.medal_distribution,
        MedalDistribution { gold: 2, silver: 1, bronze: 1 }
    );

    let value = serde_json::to_value(stats).unwrap();
    assert_eq!(value["medalDistribution"]["Gold"], 2);
    assert_eq!(value["totalAthletes"], 5);
}

#[test]
fn test_base_stats_empty_keeps_every_field() {
    let value = serde_json::to_value(base_stats(&[])).unwrap();
    for field in ["totalAthletes", "totalMedals", "totalCountries", "totalSports"] {
        assert_eq!(value[field], 0);
    }
    assert_eq!(value["medalDistribution"]["Bronze"], 0);
}

#[test]
fn test_by_country_uses_host_fallback_and_breaks_ties_by_name() {
    let records = sample();
    let buckets = by_country(&refs(&records), None);
    let order: Vec<&str> = buckets.iter().map(|b| b.country.as_str()).collect();
    assert_eq!(order, vec!["FRA", "USA", "UK"]);
    assert_eq!(buckets[1].gold, 1);
    assert_eq!(buckets[1].silver, 1);
    assert_eq!(buckets[2].bronze, 1);
}

#[test]
fn test_by_country_truncates() {
    let records: Vec<MedalResult> = (0..30)
        .map(|i| record(i, 2000).nationality(&format!("C{:02}", i)))
        .collect();
    assert_eq!(by_country(&refs(&records), Some(TOP_COUNTRIES)).len(), 20);
}

#[test]
fn test_by_year_ascending() {
    let records = sample();
    let buckets = by_year(&refs(&records));
    assert_eq!(
        buckets,
        vec![
            YearBucket { year: 2012, medals: 2 },
            YearBucket { year: 2016, medals: 3 },
        ]
    );
}

#[test]
fn test_by_medal_alphabetical_and_skips_absent() {
    let records = sample();
    let buckets = by_medal(&refs(&records));
    let order: Vec<Medal> = buckets.iter().map(|b| b.medal).collect();
    assert_eq!(order, vec![Medal::Bronze, Medal::Gold, Medal::Silver]);
    assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 4);
}

#[test]
fn test_by_sport_descending() {
    let records = sample();
    let buckets = by_sport(&refs(&records), Some(2));
    assert_eq!(
        buckets,
        vec![
            SportBucket { sport: "Swimming".into(), participants: 2 },
            SportBucket { sport: "Athletics".into(), participants: 1 },
        ]
    );
}

#[test]
fn test_aggregate_only_requested_keys() {
    let records = sample();
    let keys: BTreeSet<AggregationKey> = [AggregationKey::ByYear].into_iter().collect();
    let aggregations = aggregate(&refs(&records), &keys);
    assert!(aggregations.by_year.is_some());
    assert!(aggregations.by_country.is_none());

    let value = serde_json::to_value(&aggregations).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 1);
    assert!(value.get("byYear").is_some());
}

#[test]
fn test_medal_summary_order() {
    let records = vec![
        record(1, 2012).host("UK", "London").medal(Medal::Bronze),
        record(2, 2012).host("UK", "London").medal(Medal::Gold),
        record(3, 2012).host("UK", "London").medal(Medal::Gold),
        record(4, 2016).host("Brazil", "Rio").medal(Medal::Silver),
        record(5, 2016).host("Brazil", "Rio"),
    ];
    let rows = medal_summary(&refs(&records));
    let shape: Vec<(i32, Medal, u64)> = rows.iter().map(|r| (r.year, r.medal, r.count)).collect();
    assert_eq!(
        shape,
        vec![
            (2016, Medal::Silver, 1),
            (2012, Medal::Gold, 2),
            (2012, Medal::Bronze, 1),
        ]
    );
}
