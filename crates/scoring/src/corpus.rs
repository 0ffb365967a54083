//! Corpus loading
//!
//! Walks `{results_root}/{model_dir}/**.json` and flattens every stored
//! evaluation into one in-memory dataset.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use smells::{LabeledSmell, CATEGORY_SEPARATOR, UNCATEGORIZED};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{Result, ScoringError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    pub model: String,
    pub category: String,
    pub file: String,
    pub rule_id: String,
    pub actual: bool,
    pub detected: bool,
    pub justification: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filter<F>(&self, mut pred: F) -> Dataset
    where
        F: FnMut(&DatasetRow) -> bool,
    {
        Dataset {
            rows: self.rows.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }

    /// Distinct models in first-seen order.
    pub fn models(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.model.as_str()))
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.category.as_str()))
    }

    /// Distinct rule ids, sorted.
    pub fn rule_ids(&self) -> Vec<String> {
        let mut ids = distinct(self.rows.iter().map(|r| r.rule_id.as_str()));
        ids.sort();
        ids
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// A rater as named in reports, and the folder its results live in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSource {
    pub name: String,
    pub dir: String,
}

impl ModelSource {
    /// "Gemini 3 Pro" is stored under `Gemini/`.
    pub fn from_display_name(name: &str) -> Self {
        let dir = name.split_whitespace().next().unwrap_or(name);
        Self {
            name: name.to_string(),
            dir: dir.to_string(),
        }
    }
}

/// Loaded dataset plus bookkeeping about what went into it.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    pub dataset: Dataset,
    /// blake3 over (relative path, bytes) of every parsed file, hex encoded.
    pub digest: String,
    pub files: usize,
    pub skipped: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct StoredFile {
    file_name: Option<String>,
    #[serde(default)]
    smell_analysis: Vec<LabeledSmell>,
}

pub struct CorpusLoader {
    root: PathBuf,
}

impl CorpusLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Unreadable or malformed files are logged and skipped.
    pub fn load(&self, models: &[ModelSource]) -> Corpus {
        let mut corpus = Corpus::default();
        let mut rows = Vec::new();
        let mut hasher = blake3::Hasher::new();

        for model in models {
            let model_root = self.root.join(&model.dir);
            if !model_root.is_dir() {
                warn!(model = %model.name, path = %model_root.display(), "results path not found");
                continue;
            }

            for entry in WalkDir::new(&model_root).sort_by_file_name() {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "json") {
                    continue;
                }

                let bytes = match read_stored(path) {
                    Ok((bytes, stored)) => {
                        let category = category_for(&model_root, path);
                        let file = stored.file_name.unwrap_or_else(|| file_stem(path));
                        debug!(path = %path.display(), category = %category, "loaded");
                        rows.extend(stored.smell_analysis.into_iter().map(|s| DatasetRow {
                            model: model.name.clone(),
                            category: category.clone(),
                            file: file.clone(),
                            rule_id: s.rule_id,
                            actual: s.actual,
                            detected: s.detected,
                            justification: s.justification,
                        }));
                        bytes
                    }
                    Err(e) => {
                        warn!(error = %e, "error reading stored evaluation, skipped");
                        corpus.skipped.push(path.to_path_buf());
                        continue;
                    }
                };

                hasher.update(relative_key(&self.root, path).as_bytes());
                hasher.update(b"\n");
                hasher.update(&bytes);
                hasher.update(b"\n");
                corpus.files += 1;
            }
        }

        corpus.dataset = Dataset::from_rows(rows);
        corpus.digest = hex::encode(hasher.finalize().as_bytes());
        corpus
    }
}

fn read_stored(path: &Path) -> Result<(Vec<u8>, StoredFile)> {
    let bytes = fs::read(path).map_err(|source| ScoringError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = std::str::from_utf8(&bytes).map_err(|e| ScoringError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    // files re-saved by some editors carry a BOM
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let stored = serde_json::from_str(text).map_err(|e| ScoringError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok((bytes, stored))
}

/// `Synthetic -> Single` for `{model_root}/Synthetic/Single/x.json`.
pub fn category_for(model_root: &Path, file: &Path) -> String {
    let segments: Vec<String> = file
        .parent()
        .and_then(|dir| dir.strip_prefix(model_root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    if segments.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        segments.join(CATEGORY_SEPARATOR)
    }
}

fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_path() {
        let root = Path::new("/r/ModelX");
        assert_eq!(
            category_for(root, Path::new("/r/ModelX/Synthetic/Single/case1.json")),
            "Synthetic -> Single"
        );
        assert_eq!(category_for(root, Path::new("/r/ModelX/case2.json")), "Uncategorized");
    }

    #[test]
    fn test_model_dir_is_first_word() {
        let m = ModelSource::from_display_name("Claude Opus 4.5");
        assert_eq!(m.dir, "Claude");
        assert_eq!(m.name, "Claude Opus 4.5");
        assert_eq!(ModelSource::from_display_name("ChatGPT").dir, "ChatGPT");
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        let ds = Dataset::from_rows(
            ["B", "A", "B", "C"]
                .iter()
                .map(|m| DatasetRow {
                    model: m.to_string(),
                    category: "c".into(),
                    file: "f".into(),
                    rule_id: format!("R{m}"),
                    actual: true,
                    detected: true,
                    justification: "j".into(),
                })
                .collect(),
        );
        assert_eq!(ds.models(), vec!["B", "A", "C"]);
        assert_eq!(ds.rule_ids(), vec!["RA", "RB", "RC"]);
    }
}
