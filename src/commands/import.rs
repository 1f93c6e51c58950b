//! `import`: copy the fixture snapshots into the SQLite store.

use crate::storage::{queries::ImportSummary, FixtureStore, OlympicsDatabase};
use anyhow::Context;
use std::path::Path;
use tracing::info;

pub fn handle_import(database: &Path, fixtures_dir: &Path) -> anyhow::Result<ImportSummary> {
    let fixtures = FixtureStore::load(fixtures_dir)
        .with_context(|| format!("loading fixtures from {}", fixtures_dir.display()))?;
    let db = OlympicsDatabase::open(database)
        .with_context(|| format!("opening database {}", database.display()))?;

    let summary = db.import(
        fixtures.athlete_rows(),
        fixtures.host_rows(),
        fixtures.results(),
        fixtures.predictions(),
        fixtures.summaries(),
    )?;

    info!(
        athletes = summary.athletes,
        hosts = summary.hosts,
        results = summary.results,
        predictions = summary.predictions,
        summaries = summary.summaries,
        database = %database.display(),
        "Import complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterSet;
    use crate::storage::OlympicsSource;
    use std::fs;

    #[test]
    fn test_import_round_trip_counts() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("fixtures");
        fs::create_dir_all(&fixtures).unwrap();
        fs::write(
            fixtures.join("results.json"),
            r#"[{"id": 1, "athlete_id": 7, "year": 2016, "sport": "Judo", "medal": "BRONZE"}]"#,
        )
        .unwrap();
        fs::write(fixtures.join("athletes.json"), r#"[{"id": 7, "name": "Rafaela"}]"#).unwrap();
        fs::write(
            fixtures.join("hosts.json"),
            r#"[{"year": 2016, "season": "Summer", "city": "Rio", "country": "Brazil"}]"#,
        )
        .unwrap();

        let database = dir.path().join("db").join("olympics.db");
        let summary = handle_import(&database, &fixtures).unwrap();
        assert_eq!(summary.results, 1);
        assert_eq!(summary.predictions, 0);

        let db = OlympicsDatabase::open_existing(&database).unwrap();
        assert_eq!(db.count_results(&FilterSet::default()).unwrap(), 1);
        assert_eq!(db.sports().unwrap(), vec!["Judo"]);
    }
}
