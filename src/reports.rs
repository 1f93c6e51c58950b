//! ML report listings: figures, score tables and model metadata
//!
//! Files are written by the training pipeline into the reports directory and
//! listed on each request; nothing is cached.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const FIGURES_SUBDIR: &str = "figures";
pub const METADATA_FILE: &str = "models_metadata.json";
/// URL prefix the reports directory is served under.
pub const STATIC_PREFIX: &str = "/reports";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureAsset {
    pub filename: String,
    pub label: String,
    pub url: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// One score CSV, rows keyed by header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFile {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
    pub headers: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Entry of `models_metadata.json`. Every field is optional on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelMetadata {
    model_name: Option<String>,
    task: Option<String>,
    metrics: Option<Value>,
    best_params: Option<Value>,
    description: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReport {
    pub model_name: String,
    pub task: String,
    pub metrics: Value,
    pub best_params: Value,
    pub description: String,
    pub image: Option<String>,
    pub scores: Vec<ScoreFile>,
}

/// `GET /api/models`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: Vec<ModelReport>,
    pub count: usize,
    pub available_scores: Vec<ScoreFile>,
}

/// Reports directory plus the places model metadata may live.
#[derive(Debug, Clone)]
pub struct ReportsDir {
    root: PathBuf,
    metadata_candidates: Vec<PathBuf>,
}

impl ReportsDir {
    /// `fixtures_dir` is the second place `models_metadata.json` is looked for.
    pub fn new(root: impl Into<PathBuf>, fixtures_dir: &Path) -> Self {
        let root = root.into();
        let metadata_candidates = vec![root.join(METADATA_FILE), fixtures_dir.join(METADATA_FILE)];
        Self {
            root,
            metadata_candidates,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// PNG figures, most recently modified first.
    pub fn figures(&self) -> Result<Vec<FigureAsset>> {
        let dir = self.root.join(FIGURES_SUBDIR);
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Figures directory not found");
            return Ok(Vec::new());
        }

        let mut figures = Vec::new();
        for (filename, metadata) in list_files(&dir, |name| name.ends_with(".png"))? {
            let label = strip_suffix_ignore_case(&filename, ".png").replace(['-', '_'], " ");
            figures.push(FigureAsset {
                url: static_url(&format!("{}/{}", FIGURES_SUBDIR, filename)),
                label,
                filename,
                size: metadata.len(),
                modified_at: modified(&metadata),
            });
        }
        figures.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(figures)
    }

    /// Score and metric CSVs, most recently modified first.
    pub fn scores(&self) -> Result<Vec<ScoreFile>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let is_score = |name: &str| {
            name.ends_with(".csv") && (name.contains("score") || name.contains("metric"))
        };

        let mut scores = Vec::new();
        for (filename, metadata) in list_files(&self.root, is_score)? {
            let (headers, rows) = read_table(&self.root.join(&filename))?;
            scores.push(ScoreFile {
                url: static_url(&filename),
                filename,
                size: metadata.len(),
                modified_at: modified(&metadata),
                headers,
                rows,
            });
        }
        scores.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(scores)
    }

    /// Model metadata joined to the score files that mention the model name
    /// or its task.
    pub fn models(&self) -> Result<ModelsResponse> {
        let scores = self.scores()?;
        let models: Vec<ModelReport> = self
            .load_metadata()
            .into_iter()
            .map(|model| {
                let name = model.model_name.clone().unwrap_or_default().to_lowercase();
                let task = model.task.clone().unwrap_or_default().to_lowercase();
                let related = scores
                    .iter()
                    .filter(|score| {
                        let filename = score.filename.to_lowercase();
                        (!name.is_empty() && filename.contains(&name))
                            || (!task.is_empty() && filename.contains(&task))
                    })
                    .cloned()
                    .collect();

                ModelReport {
                    model_name: model.model_name.unwrap_or_else(|| "ML model".to_string()),
                    task: model.task.unwrap_or_else(|| "n/a".to_string()),
                    metrics: model.metrics.unwrap_or_else(empty_object),
                    best_params: model.best_params.unwrap_or_else(empty_object),
                    description: model.description.unwrap_or_default(),
                    image: model.image,
                    scores: related,
                }
            })
            .collect();

        Ok(ModelsResponse {
            count: models.len(),
            models,
            available_scores: scores,
        })
    }

    /// First candidate file holding a JSON array wins; non-object entries
    /// are dropped.
    fn load_metadata(&self) -> Vec<ModelMetadata> {
        for path in &self.metadata_candidates {
            let Ok(raw) = fs::read_to_string(path) else {
                continue;
            };
            match serde_json::from_str::<Value>(raw.trim_start_matches('\u{feff}')) {
                Ok(Value::Array(items)) => {
                    return items
                        .into_iter()
                        .filter(Value::is_object)
                        .filter_map(|item| serde_json::from_value(item).ok())
                        .collect();
                }
                Ok(_) => warn!(path = %path.display(), "Model metadata is not a JSON array"),
                Err(err) => warn!(path = %path.display(), error = %err, "Invalid model metadata"),
            }
        }
        Vec::new()
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn static_url(relative: &str) -> String {
    format!("{}/{}", STATIC_PREFIX, relative)
}

fn modified(metadata: &fs::Metadata) -> Option<DateTime<Utc>> {
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> &'a str {
    let split = name.len().saturating_sub(suffix.len());
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(tail)) if tail.eq_ignore_ascii_case(suffix) => stem,
        _ => name,
    }
}

/// Regular files in `dir` whose lower-cased name passes `keep`.
fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<(String, fs::Metadata)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let Ok(filename) = entry.file_name().into_string() else {
            continue;
        };
        if keep(&filename.to_lowercase()) {
            files.push((filename, metadata));
        }
    }
    Ok(files)
}

fn read_table(path: &Path) -> Result<(Vec<String>, Vec<Map<String, Value>>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
            .collect();
        rows.push(row);
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn reports_with_files() -> (tempfile::TempDir, ReportsDir) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("reports");
        fs::create_dir_all(root.join(FIGURES_SUBDIR)).unwrap();
        fs::write(root.join(FIGURES_SUBDIR).join("feature_importance-rf.PNG"), b"png").unwrap();
        fs::write(root.join(FIGURES_SUBDIR).join("notes.txt"), b"skip").unwrap();
        fs::write(
            root.join("medal_regression_scores.csv"),
            "model,rmse\nrf,3.2\nxgb,2.9\n",
        )
        .unwrap();
        fs::write(root.join("predictions.csv"), "country\nUSA\n").unwrap();

        let reports = ReportsDir::new(&root, &dir.path().join("fixtures"));
        (dir, reports)
    }

    #[test]
    fn test_figures_listing() {
        let (_dir, reports) = reports_with_files();
        let figures = reports.figures().unwrap();

        assert_eq!(figures.len(), 1);
        assert_eq!(figures[0].label, "feature importance rf");
        assert_eq!(figures[0].url, "/reports/figures/feature_importance-rf.PNG");
        assert_eq!(figures[0].size, 3);
    }

    #[test]
    fn test_scores_listing() {
        let (_dir, reports) = reports_with_files();
        let scores = reports.scores().unwrap();

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].headers, vec!["model", "rmse"]);
        assert_eq!(scores[0].rows.len(), 2);
        assert_eq!(scores[0].rows[1]["rmse"], Value::String("2.9".to_string()));
    }

    #[test]
    fn test_models_join_scores() {
        let (dir, reports) = reports_with_files();
        fs::write(
            reports.root().join(METADATA_FILE),
            r#"[{"modelName": "xgb", "task": "regression"}, {"description": "anon"}, 5]"#,
        )
        .unwrap();

        let response = reports.models().unwrap();
        assert_eq!(response.count, 2);
        assert_eq!(response.models[0].scores.len(), 1);
        assert_eq!(response.models[1].model_name, "ML model");
        assert_eq!(response.models[1].task, "n/a");
        assert!(response.models[1].scores.is_empty());
        assert_eq!(response.available_scores.len(), 1);
        drop(dir);
    }

    #[test]
    fn test_missing_directories() {
        let dir = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path().join("absent"), dir.path());

        assert!(reports.figures().unwrap().is_empty());
        assert!(reports.scores().unwrap().is_empty());
        assert_eq!(reports.models().unwrap().count, 0);
    }
}
