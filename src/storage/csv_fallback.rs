//! File-based prediction source used when the store has no predictions table
//!
//! The CSV files are written by the ML pipeline and re-read on every request,
//! so fresh model output is picked up without a restart.

use super::{models::PredictionRecord, Lookup, PredictionSource};
use crate::error::Result;
use crate::query::predicate::select_predictions;
use crate::query::{PredictionQuery, Window};
use csv::StringRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_MODEL_NAME: &str = "csv_regression_model";
pub const DEFAULT_TARGET: &str = "medals_total";

const COUNTRY_COLUMNS: [&str; 2] = ["country_name", "country"];
const VALUE_COLUMNS: [&str; 4] = [
    "predicted_value",
    "predicted_medals",
    "predicted_medals_total",
    "prediction",
];

#[derive(Debug, Clone)]
pub struct CsvPredictionSource {
    predictions_csv: PathBuf,
    summary_csv: PathBuf,
}

impl CsvPredictionSource {
    pub fn new(predictions_csv: impl Into<PathBuf>, summary_csv: impl Into<PathBuf>) -> Self {
        Self {
            predictions_csv: predictions_csv.into(),
            summary_csv: summary_csv.into(),
        }
    }

    /// Read every prediction row. A missing file yields no rows.
    ///
    /// `model_hint` names rows that carry no model column.
    pub fn load_predictions(&self, model_hint: Option<&str>) -> Result<Vec<PredictionRecord>> {
        let Some(mut reader) = open_reader(&self.predictions_csv)? else {
            warn!(path = %self.predictions_csv.display(), "No prediction CSV for fallback");
            return Ok(Vec::new());
        };

        let headers = reader.headers()?.clone();
        let columns = Columns::new(&headers);
        let mut predictions = Vec::new();
        for record in reader.records() {
            let record = record?;
            match columns.prediction(&record, model_hint) {
                Some(prediction) => predictions.push(prediction),
                None => debug!(?record, "Skipping prediction row without country or slug"),
            }
        }
        Ok(predictions)
    }

    /// Historical medal totals keyed by (country, slug_game).
    pub fn load_actuals(&self) -> Result<HashMap<(String, String), f64>> {
        let Some(mut reader) = open_reader(&self.summary_csv)? else {
            return Ok(HashMap::new());
        };

        let headers = reader.headers()?.clone();
        let columns = Columns::new(&headers);
        let mut actuals = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let country = columns.first(&record, &COUNTRY_COLUMNS);
            let slug = columns.get(&record, "slug_game");
            let total = columns
                .get(&record, "medals_total")
                .and_then(|value| value.parse::<f64>().ok());
            if let (Some(country), Some(slug), Some(total)) = (country, slug, total) {
                actuals.insert((country.to_string(), slug.to_string()), total);
            }
        }
        Ok(actuals)
    }

    fn select(&self, query: &PredictionQuery) -> Result<Vec<PredictionRecord>> {
        let predictions = self.load_predictions(query.model.as_deref())?;
        let actuals = if query.include_actual {
            self.load_actuals()?
        } else {
            HashMap::new()
        };
        Ok(select_predictions(&predictions, query, &actuals))
    }
}

impl PredictionSource for CsvPredictionSource {
    fn count_predictions(&self, query: &PredictionQuery) -> Result<Lookup<u64>> {
        Ok(Lookup::Found(self.select(query)?.len() as u64))
    }

    fn fetch_predictions(
        &self,
        query: &PredictionQuery,
        window: Window,
    ) -> Result<Lookup<Vec<PredictionRecord>>> {
        let selected = self.select(query)?;
        Ok(Lookup::Found(window.apply(&selected).to_vec()))
    }
}

fn open_reader(path: &Path) -> Result<Option<csv::Reader<std::fs::File>>> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    Ok(Some(reader))
}

/// Header name → column index.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        Self { index }
    }

    /// Non-empty value of a named column.
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.index
            .get(name)
            .and_then(|&i| record.get(i))
            .filter(|value| !value.is_empty())
    }

    /// First non-empty value among alias columns.
    fn first<'r>(&self, record: &'r StringRecord, names: &[&str]) -> Option<&'r str> {
        names.iter().find_map(|name| self.get(record, name))
    }

    fn prediction(&self, record: &StringRecord, model_hint: Option<&str>) -> Option<PredictionRecord> {
        let country = self.first(record, &COUNTRY_COLUMNS)?;
        let slug_game = self.get(record, "slug_game")?;
        let predicted_value = self
            .first(record, &VALUE_COLUMNS)
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(0.0);

        Some(PredictionRecord {
            country: country.to_string(),
            slug_game: slug_game.to_string(),
            model_name: self
                .get(record, "model_name")
                .or(model_hint)
                .unwrap_or(DEFAULT_MODEL_NAME)
                .to_string(),
            target: self
                .get(record, "target")
                .unwrap_or(DEFAULT_TARGET)
                .to_string(),
            predicted_value,
            created_at: self.get(record, "created_at").map(str::to_string),
            actual_medals: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_files_yield_empty_results() {
        let dir = tempdir().unwrap();
        let source = CsvPredictionSource::new(dir.path().join("none.csv"), dir.path().join("none2.csv"));

        let query = PredictionQuery {
            include_actual: true,
            ..Default::default()
        };
        assert_eq!(source.count_predictions(&query).unwrap(), Lookup::Found(0));
        assert!(source.load_actuals().unwrap().is_empty());
    }

    #[test]
    fn test_column_aliases_and_defaults() {
        let dir = tempdir().unwrap();
        let predictions = write(
            dir.path(),
            "medal_predictions.csv",
            "country,slug_game,predicted_medals\nUSA,paris-2024,113.5\nFRA,paris-2024,\n,paris-2024,3\n",
        );
        let source = CsvPredictionSource::new(predictions, dir.path().join("summary.csv"));

        let rows = source.load_predictions(None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country, "USA");
        assert_eq!(rows[0].predicted_value, 113.5);
        assert_eq!(rows[0].model_name, DEFAULT_MODEL_NAME);
        assert_eq!(rows[0].target, DEFAULT_TARGET);
        assert_eq!(rows[1].predicted_value, 0.0);

        let hinted = source.load_predictions(Some("xgb")).unwrap();
        assert_eq!(hinted[0].model_name, "xgb");
    }

    #[test]
    fn test_actual_enrichment() {
        let dir = tempdir().unwrap();
        let predictions = write(
            dir.path(),
            "medal_predictions.csv",
            "country_name,slug_game,model_name,target,predicted_value,created_at\n\
             USA,paris-2024,rf,medals_total,110,2024-05-01\n\
             FRA,paris-2024,rf,medals_total,50,2024-05-02\n",
        );
        let summary = write(
            dir.path(),
            "country_year_summary.csv",
            "country_name,slug_game,medals_total\nUSA,paris-2024,126\n",
        );
        let source = CsvPredictionSource::new(predictions, summary);

        let query = PredictionQuery {
            include_actual: true,
            ..Default::default()
        };
        let Lookup::Found(rows) = source
            .fetch_predictions(&query, Window { offset: 0, limit: 10 })
            .unwrap()
        else {
            panic!("Expected rows from CSV source");
        };

        assert_eq!(rows[0].country, "FRA");
        assert_eq!(rows[0].actual_medals, Some(None));
        assert_eq!(rows[1].actual_medals, Some(Some(126.0)));
    }
}
