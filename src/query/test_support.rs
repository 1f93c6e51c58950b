//! Record builders shared by the query unit tests.

use crate::storage::models::MedalResult;
use crate::types::{AthleteId, Gender, Medal, ResultId, Season};

pub(crate) fn record(id: u64, year: i32) -> MedalResult {
    MedalResult {
        id: ResultId::new(id),
        athlete_id: AthleteId::new(id),
        name: Some(format!("Athlete {}", id)),
        gender: Some(Gender::Male),
        age: Some(25),
        nationality: None,
        country: None,
        year,
        season: Some(Season::Summer),
        city: None,
        sport: Some("Athletics".to_string()),
        event: None,
        medal: None,
    }
}

pub(crate) trait RecordExt {
    fn nationality(self, value: &str) -> Self;
    fn host(self, country: &str, city: &str) -> Self;
    fn medal(self, medal: Medal) -> Self;
    fn sport(self, value: &str) -> Self;
    fn name(self, value: &str) -> Self;
    fn gender(self, value: Gender) -> Self;
    fn season(self, value: Season) -> Self;
}

impl RecordExt for MedalResult {
    fn nationality(mut self, value: &str) -> Self {
        self.nationality = Some(value.to_string());
        self
    }

    fn host(mut self, country: &str, city: &str) -> Self {
        self.country = Some(country.to_string());
        self.city = Some(city.to_string());
        self
    }

    fn medal(mut self, medal: Medal) -> Self {
        self.medal = Some(medal);
        self
    }

    fn sport(mut self, value: &str) -> Self {
        self.sport = Some(value.to_string());
        self
    }

    fn name(mut self, value: &str) -> Self {
        self.name = Some(value.to_string());
        self
    }

    fn gender(mut self, value: Gender) -> Self {
        self.gender = Some(value);
        self
    }

    fn season(mut self, value: Season) -> Self {
        self.season = Some(value);
        self
    }
}
