//! Unit tests for storage functionality

use super::*;
use crate::query::test_support::{record, RecordExt};
use crate::query::{paginate, AggregationKey, PaginationRequest};
use crate::types::{AthleteId, Gender, Medal, Season};

fn athlete(id: u64, name: &str, nationality: &str) -> Athlete {
    Athlete {
        id: AthleteId::new(id),
        name: Some(name.to_string()),
        gender: Some(Gender::Female),
        age: Some(24),
        nationality: Some(nationality.to_string()),
    }
}

fn host(year: i32, season: Season, city: &str, country: &str) -> Host {
    Host {
        year,
        season: Some(season),
        city: Some(city.to_string()),
        country: Some(country.to_string()),
    }
}

fn prediction(country: &str, slug: &str, created_at: Option<&str>) -> PredictionRecord {
    PredictionRecord {
        country: country.to_string(),
        slug_game: slug.to_string(),
        model_name: "rf".to_string(),
        target: "medals_total".to_string(),
        predicted_value: 10.0,
        created_at: created_at.map(str::to_string),
        actual_medals: None,
    }
}

fn sample_results() -> Vec<MedalResult> {
    vec![
        record(1, 2016)
            .name("Ana")
            .nationality("BRA")
            .host("Brazil", "Rio")
            .medal(Medal::Gold)
            .sport("Swimming"),
        record(2, 2016)
            .name("Ben")
            .nationality("USA")
            .host("Brazil", "Rio")
            .medal(Medal::Silver),
        record(3, 2012)
            .name("Cleo")
            .nationality("USA")
            .host("UK", "London")
            .medal(Medal::Gold),
    ]
}

fn create_test_db() -> OlympicsDatabase {
    let db = OlympicsDatabase::open_in_memory().unwrap();
    let results = sample_results();
    let athletes = vec![
        athlete(1, "Ana", "BRA"),
        athlete(2, "Ben", "USA"),
        athlete(3, "Cleo", "USA"),
    ];
    let hosts = vec![
        host(2016, Season::Summer, "Rio", "Brazil"),
        host(2012, Season::Summer, "London", "UK"),
    ];
    db.import(&athletes, &hosts, &results, &[], &[]).unwrap();
    db
}

#[test]
fn test_database_creation() {
    let db = OlympicsDatabase::open_in_memory().unwrap();
    db.probe().unwrap();
    assert_eq!(db.count_results(&FilterSet::default()).unwrap(), 0);
}

#[test]
fn test_open_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("olympics.db");

    let db = OlympicsDatabase::open(&path).unwrap();
    db.probe().unwrap();
    assert!(path.exists());
}

#[test]
fn test_open_existing_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(OlympicsDatabase::open_existing(&dir.path().join("absent.db")).is_err());
}

#[test]
fn test_probe_reports_missing_core_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.db");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (x INTEGER)")
        .unwrap();

    let db = OlympicsDatabase::open_existing(&path).unwrap();
    assert!(matches!(db.probe(), Err(crate::error::OlympicsError::StoreUnavailable(_))));
}

#[test]
fn test_import_and_fetch_results() {
    let db = create_test_db();
    let filters = FilterSet::default();

    assert_eq!(db.count_results(&filters).unwrap(), 3);
    let rows = db.fetch_results(&filters, Window { offset: 0, limit: 10 }).unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.id.as_u64()).collect();
    assert_eq!(ids, vec![2, 1, 3]);

    assert_eq!(rows[1].city.as_deref(), Some("Rio"));
    assert_eq!(rows[1].country.as_deref(), Some("Brazil"));
    assert_eq!(rows[1].medal, Some(Medal::Gold));
}

#[test]
fn test_import_is_idempotent() {
    let db = create_test_db();
    let results = sample_results();
    db.import(&[], &[], &results, &[], &[]).unwrap();

    assert_eq!(db.count_results(&FilterSet::default()).unwrap(), 3);
}

#[test]
fn test_country_filter_matches_host_country() {
    let db = create_test_db();

    let by_host = FilterSet::default().with_countries(["UK"]);
    assert_eq!(db.count_results(&by_host).unwrap(), 1);

    let by_nationality = FilterSet::default().with_countries(["USA"]);
    assert_eq!(db.count_results(&by_nationality).unwrap(), 2);
}

#[test]
fn test_count_cache_is_cleared_on_write() {
    let db = create_test_db();
    let filters = FilterSet::default().with_year_equals(2012);
    assert_eq!(db.count_results(&filters).unwrap(), 1);
    assert_eq!(db.counts.stats().0, 1);

    db.upsert_athlete(&athlete(4, "Dara", "GBR")).unwrap();
    db.count_results(&filters).unwrap();
    db.upsert_result(&record(4, 2012).nationality("GBR")).unwrap();
    assert_eq!(db.counts.stats().0, 0);
    assert_eq!(db.count_results(&filters).unwrap(), 2);
}

#[test]
fn test_pagination_window_against_store() {
    let db = create_test_db();
    let filters = FilterSet::default();
    let total = db.count_results(&filters).unwrap();

    let page = paginate(total, &PaginationRequest::page(2, 5));
    assert_eq!(page.page, 2);
    assert_eq!(page.effective_offset, 1);

    let rows = db.fetch_results(&filters, page.window()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.as_u64(), 1);
}

#[test]
fn test_aggregations_from_store() {
    let db = create_test_db();
    let keys: std::collections::BTreeSet<AggregationKey> = AggregationKey::ALL.into_iter().collect();
    let aggregations = db.aggregate(&FilterSet::default(), &keys).unwrap();

    let countries = aggregations.by_country.unwrap();
    assert_eq!(countries[0].country, "USA");
    assert_eq!(countries[0].total, 2);
    assert_eq!(countries[0].gold, 1);

    let years: Vec<i32> = aggregations.by_year.unwrap().iter().map(|b| b.year).collect();
    assert_eq!(years, vec![2012, 2016]);

    let sports = aggregations.by_sport.unwrap();
    assert_eq!(sports[0].sport, "Athletics");
    assert_eq!(sports[0].participants, 2);

    let stats = db.base_stats(&FilterSet::default()).unwrap();
    assert_eq!(stats.total_medals, 3);
    assert_eq!(stats.total_countries, 2);
    assert_eq!(stats.medal_distribution.gold, 2);
}

#[test]
fn test_lookup_lists() {
    let db = create_test_db();

    assert_eq!(db.years().unwrap(), vec![2016, 2012]);
    assert_eq!(db.sports().unwrap(), vec!["Athletics", "Swimming"]);
    assert_eq!(db.countries().unwrap(), vec!["BRA", "USA"]);

    let hosts = db.hosts().unwrap();
    assert_eq!(hosts[0].year, 2016);

    let athletes = db.athletes(Window { offset: 1, limit: 1 }).unwrap();
    assert_eq!(athletes[0].name.as_deref(), Some("Ben"));

    let options = db.filter_options().unwrap();
    assert_eq!(options.years, vec![2012, 2016]);
    assert_eq!(options.seasons, vec![Season::Summer]);
    assert_eq!(options.medal_types.len(), 3);
}

#[test]
fn test_medal_summary_ordering() {
    let db = create_test_db();
    let summary = db.medal_summary().unwrap();

    assert_eq!(summary.len(), 3);
    assert_eq!((summary[0].year, summary[0].medal), (2016, Medal::Gold));
    assert_eq!((summary[1].year, summary[1].medal), (2016, Medal::Silver));
    assert_eq!(summary[2].city.as_deref(), Some("London"));
}

#[test]
fn test_predictions_table_missing_is_tagged() {
    let db = create_test_db();
    let query = PredictionQuery::default();

    assert_eq!(
        db.count_predictions(&query).unwrap(),
        Lookup::TableMissing {
            table: "medal_predictions".to_string()
        }
    );
    assert!(matches!(
        db.fetch_predictions(&query, Window { offset: 0, limit: 10 }).unwrap(),
        Lookup::TableMissing { .. }
    ));
}

#[test]
fn test_predictions_with_actuals() {
    let db = OlympicsDatabase::open_in_memory().unwrap();
    let predictions = vec![
        prediction("USA", "paris-2024", Some("2024-05-01 10:00:00")),
        prediction("FRA", "paris-2024", Some("2024-05-02 10:00:00")),
        prediction("GER", "paris-2024", None),
    ];
    let summaries = vec![CountrySummary {
        country_name: "USA".to_string(),
        slug_game: "paris-2024".to_string(),
        medals_total: Some(126.0),
    }];
    let imported = db.import(&[], &[], &[], &predictions, &summaries).unwrap();
    assert_eq!(imported.predictions, 3);

    let query = PredictionQuery {
        include_actual: true,
        ..Default::default()
    };
    assert_eq!(db.count_predictions(&query).unwrap(), Lookup::Found(3));

    let Lookup::Found(rows) = db
        .fetch_predictions(&query, Window { offset: 0, limit: 10 })
        .unwrap()
    else {
        panic!("Expected predictions table");
    };
    let countries: Vec<&str> = rows.iter().map(|p| p.country.as_str()).collect();
    assert_eq!(countries, vec!["FRA", "USA", "GER"]);
    assert_eq!(rows[1].actual_medals, Some(Some(126.0)));
    assert_eq!(rows[0].actual_medals, Some(None));
}

#[test]
fn test_fixture_store_resolves_editions() {
    let mut seasonless = record(1, 2016).nationality("BRA");
    seasonless.season = None;
    let store = FixtureStore::from_parts(
        vec![seasonless],
        vec![athlete(1, "Ana", "BRA")],
        vec![host(2016, Season::Summer, "Rio", "Brazil")],
        Vec::new(),
        Vec::new(),
    );

    let resolved = &store.results()[0];
    assert_eq!(resolved.season, Some(Season::Summer));
    assert_eq!(resolved.city.as_deref(), Some("Rio"));
    assert_eq!(resolved.country.as_deref(), Some("Brazil"));
}

/// A results row as the demo snapshot writes it: the `country` column repeats
/// the athlete's country and the per-row athlete fields are stale.
fn snapshot_row() -> MedalResult {
    let mut row = record(1, 2016)
        .name("A. Dupont")
        .nationality("USA")
        .gender(Gender::Male)
        .medal(Medal::Gold);
    row.country = Some("USA".to_string());
    row
}

#[test]
fn test_fixture_store_takes_host_country_and_athlete_fields() {
    let store = FixtureStore::from_parts(
        vec![snapshot_row()],
        vec![athlete(1, "Amelie Dupont", "FRA")],
        vec![host(2016, Season::Summer, "Rio", "Brazil")],
        Vec::new(),
        Vec::new(),
    );

    let resolved = &store.results()[0];
    assert_eq!(resolved.country.as_deref(), Some("Brazil"));
    assert_eq!(resolved.nationality.as_deref(), Some("FRA"));
    assert_eq!(resolved.name.as_deref(), Some("Amelie Dupont"));
    assert_eq!(resolved.gender, Some(Gender::Female));
}

#[test]
fn test_fixture_and_store_agree_on_snapshot_rows() {
    let fixtures = FixtureStore::from_parts(
        vec![snapshot_row()],
        vec![athlete(1, "Amelie Dupont", "FRA")],
        vec![host(2016, Season::Summer, "Rio", "Brazil")],
        Vec::new(),
        Vec::new(),
    );
    let db = OlympicsDatabase::open_in_memory().unwrap();
    db.import(
        fixtures.athlete_rows(),
        fixtures.host_rows(),
        &[snapshot_row()],
        &[],
        &[],
    )
    .unwrap();

    for (countries, expected) in [(["USA"], 0), (["Brazil"], 1), (["FRA"], 1)] {
        let filters = FilterSet::default().with_countries(countries);
        assert_eq!(fixtures.count_results(&filters).unwrap(), expected, "{:?}", countries);
        assert_eq!(db.count_results(&filters).unwrap(), expected, "{:?}", countries);
    }

    let women = FilterSet::default().with_gender(Gender::Female);
    assert_eq!(fixtures.count_results(&women).unwrap(), 1);
    assert_eq!(db.count_results(&women).unwrap(), 1);

    let all = Window { offset: 0, limit: 10 };
    assert_eq!(
        fixtures.fetch_results(&FilterSet::default(), all).unwrap(),
        db.fetch_results(&FilterSet::default(), all).unwrap()
    );
}

#[test]
fn test_fixture_store_adds_unlisted_athletes() {
    let fixtures = FixtureStore::from_parts(
        vec![record(1, 2016).nationality("BRA"), record(2, 2016).nationality("USA")],
        vec![athlete(1, "Ana", "BRA"), athlete(1, "Ana Souza", "BRA")],
        vec![host(2016, Season::Summer, "Rio", "Brazil")],
        Vec::new(),
        Vec::new(),
    );
    let names: Vec<Option<&str>> = fixtures
        .athlete_rows()
        .iter()
        .map(|a| a.name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("Ana Souza"), Some("Athlete 2")]);

    let db = OlympicsDatabase::open_in_memory().unwrap();
    db.import(
        fixtures.athlete_rows(),
        fixtures.host_rows(),
        fixtures.results(),
        &[],
        &[],
    )
    .unwrap();
    assert_eq!(db.count_results(&FilterSet::default()).unwrap(), 2);
    assert_eq!(fixtures.countries().unwrap(), db.countries().unwrap());
}

#[test]
fn test_fixture_store_skips_ambiguous_year() {
    let mut seasonless = record(1, 2016);
    seasonless.season = None;
    let store = FixtureStore::from_parts(
        vec![seasonless],
        Vec::new(),
        vec![
            host(2016, Season::Summer, "Rio", "Brazil"),
            host(2016, Season::Winter, "Nowhere", "Narnia"),
        ],
        Vec::new(),
        Vec::new(),
    );

    assert_eq!(store.results()[0].season, None);
    assert_eq!(store.results()[0].city, None);
}

#[test]
fn test_fixture_store_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(fixtures::RESULTS_FILE),
        r#"{"data": [{"id": 1, "athlete_id": 1, "year": 2016, "medal": "gold"}, {"id": "bad"}]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join(fixtures::ATHLETES_FILE),
        r#"[{"id": 1, "name": "Ana", "nationality": "BRA"}]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join(fixtures::HOSTS_FILE),
        "\u{feff}[{\"year\": 2016, \"season\": \"Summer\", \"city\": \"Rio\"}]",
    )
    .unwrap();

    let store = FixtureStore::load(dir.path()).unwrap();
    assert_eq!(store.results().len(), 1);
    assert_eq!(store.results()[0].medal, Some(Medal::Gold));
    assert_eq!(store.results()[0].city.as_deref(), Some("Rio"));
    assert!(store.predictions().is_empty());
}

#[test]
fn test_fixture_store_missing_required_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(FixtureStore::load(dir.path()).is_err());
}

#[test]
fn test_parse_rows_shapes() {
    assert_eq!(fixtures::parse_rows("[1, 2]").map(|rows| rows.len()), Some(2));
    assert_eq!(fixtures::parse_rows(r#"{"data": [1]}"#).map(|rows| rows.len()), Some(1));
    assert_eq!(fixtures::parse_rows(r#""[1, 2, 3]""#).map(|rows| rows.len()), Some(3));
    assert_eq!(fixtures::parse_rows("  ").map(|rows| rows.len()), Some(0));
    assert!(fixtures::parse_rows(r#"{"rows": []}"#).is_none());
    assert!(fixtures::parse_rows("not json").is_none());
}

#[test]
fn test_lookup_from_result() {
    let missing: crate::error::Result<u64> = Err(crate::error::OlympicsError::TableMissing {
        table: "medal_predictions".to_string(),
    });
    assert!(matches!(Lookup::from_result(missing), Ok(Lookup::TableMissing { .. })));

    let failed: crate::error::Result<u64> = Err(crate::error::OlympicsError::Internal {
        message: "boom".to_string(),
    });
    assert!(Lookup::from_result(failed).is_err());

    assert_eq!(Lookup::from_result(Ok(3)).unwrap().map(|n| n * 2), Lookup::Found(6));
}
