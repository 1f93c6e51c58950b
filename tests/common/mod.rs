//! Shared data for the integration tests: one logical data set materialised
//! both as a fixture store and as an in-memory SQLite store.

#![allow(dead_code)]

use olympics_api::storage::{Athlete, FixtureStore, Host, MedalResult, OlympicsDatabase};
use olympics_api::{AthleteId, Gender, Medal, ResultId, Season};

pub const YEARS: [i32; 5] = [2012, 2014, 2016, 2018, 2020];
pub const COUNTRIES: [&str; 7] = ["USA", "FRA", "BRA", "GBR", "Brazil", "Russia", "Japan"];
pub const SPORTS: [&str; 4] = ["Athletics", "Swimming", "Biathlon", "Judo"];
pub const SEARCH_TERMS: [&str; 7] = ["an", "ATH", "rio", "usa", "zz", "Ray", "sochi"];

pub fn hosts() -> Vec<Host> {
    let host = |year, season, city: &str, country: &str| Host {
        year,
        season: Some(season),
        city: Some(city.to_string()),
        country: Some(country.to_string()),
    };
    vec![
        host(2012, Season::Summer, "London", "GBR"),
        host(2014, Season::Winter, "Sochi", "Russia"),
        host(2016, Season::Summer, "Rio", "Brazil"),
        host(2018, Season::Winter, "PyeongChang", "Korea"),
        host(2020, Season::Summer, "Tokyo", "Japan"),
    ]
}

/// Records shaped like the demo snapshot: every record names a hosted edition
/// and leaves the city to be resolved from it, while its `country` column
/// repeats the row's own nationality rather than the host country.
pub fn results() -> Vec<MedalResult> {
    let editions = hosts();
    let nationalities = [Some("USA"), Some("FRA"), Some("BRA"), None, Some("GBR"), Some("usa")];
    let sports = [Some("Athletics"), Some("Swimming"), Some("Biathlon"), None, Some("Judo")];
    let medals = [Some(Medal::Gold), Some(Medal::Silver), Some(Medal::Bronze), None];
    let names = ["Ana Silva", "Ben Ong", "cleo ray", "DANA", "Zed Ryan", "Ivan Petrov", "Kim"];

    (1..=60u64)
        .map(|id| {
            let i = id as usize;
            let edition = &editions[i % editions.len()];
            MedalResult {
                id: ResultId::new(id),
                athlete_id: AthleteId::new(id),
                name: Some(names[i % names.len()].to_string()),
                gender: Some(if i % 3 == 0 { Gender::Female } else { Gender::Male }),
                age: Some(18 + (i % 20) as u32),
                nationality: nationalities[i % nationalities.len()].map(str::to_string),
                country: nationalities[i % nationalities.len()].map(str::to_string),
                year: edition.year,
                season: edition.season,
                city: None,
                sport: sports[i % sports.len()].map(str::to_string),
                event: Some(format!("Event {}", i % 4)),
                medal: medals[i % medals.len()],
            }
        })
        .collect()
}

/// One athlete row per result. Some rows disagree with the result's own
/// athlete fields, which both stores must resolve in the athlete's favour.
pub fn athletes(results: &[MedalResult]) -> Vec<Athlete> {
    results
        .iter()
        .map(|r| {
            let id = r.athlete_id.as_u64();
            let mut athlete = Athlete {
                id: r.athlete_id,
                name: r.name.clone(),
                gender: r.gender,
                age: r.age,
                nationality: r.nationality.clone(),
            };
            if id % 5 == 0 {
                athlete.name = Some(format!("Renamed {}", id));
            }
            if id % 4 == 0 {
                athlete.nationality = Some("Japan".to_string());
            }
            if id % 7 == 0 {
                athlete.gender = match r.gender {
                    Some(Gender::Male) => Some(Gender::Female),
                    _ => Some(Gender::Male),
                };
                athlete.age = None;
            }
            athlete
        })
        .collect()
}

pub fn fixture_store() -> FixtureStore {
    let results = results();
    let athletes = athletes(&results);
    FixtureStore::from_parts(results, athletes, hosts(), Vec::new(), Vec::new())
}

pub fn sqlite_store() -> OlympicsDatabase {
    let results = results();
    let db = OlympicsDatabase::open_in_memory().expect("in-memory database");
    db.import(&athletes(&results), &hosts(), &results, &[], &[])
        .expect("import");
    db
}
