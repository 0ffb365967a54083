//! Aggregated reports built on top of [`calculate_metrics`].
//!
//! Everything here is derived and recomputed on demand; the tables are shaped
//! for a renderer (bar charts, confusion heatmaps, rule x model heatmaps,
//! precision/recall scatter).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    calculate_metrics, group_confusion, Corpus, Dataset, GroupKey, MetricsRow, ModelSource,
    Result, ScoringError,
};

/// A named set of categories reported together, e.g. "Synthetic" covering
/// every `Synthetic -> ...` folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub name: String,
    pub categories: Vec<String>,
}

/// What to report on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPlan {
    /// Display names; the results folder is the first word.
    pub models: Vec<String>,
    #[serde(default)]
    pub aggregates: Vec<Aggregate>,
    #[serde(default)]
    pub category_order: Vec<String>,
}

impl ReportPlan {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ScoringError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| ScoringError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn sources(&self) -> Vec<ModelSource> {
        self.models
            .iter()
            .map(|m| ModelSource::from_display_name(m))
            .collect()
    }
}

/// Model-grouped metrics for one named slice of the dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub metrics: Vec<MetricsRow>,
}

/// Rule x model table; a `None` cell means the model has no rows for that rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RuleModelTable {
    pub models: Vec<String>,
    pub rows: Vec<RuleRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleRow {
    pub rule_id: String,
    pub values: Vec<Option<f64>>,
}

impl RuleModelTable {
    pub fn cell(&self, rule_id: &str, model: &str) -> Option<f64> {
        let col = self.models.iter().position(|m| m == model)?;
        self.rows
            .iter()
            .find(|r| r.rule_id == rule_id)
            .and_then(|r| r.values[col])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HallucinationCount {
    pub model: String,
    pub false_positives: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrategyPoint {
    /// Aggregate name, or `None` for the whole dataset.
    pub scope: Option<String>,
    pub model: String,
    pub precision: f64,
    pub recall: f64,
}

fn in_categories(ds: &Dataset, categories: &[String]) -> Dataset {
    let wanted: HashSet<&str> = categories.iter().map(String::as_str).collect();
    ds.filter(|r| wanted.contains(r.category.as_str()))
}

/// Model-grouped metrics per named aggregate. Aggregates matching no rows
/// are skipped.
pub fn named_aggregates(ds: &Dataset, aggregates: &[Aggregate]) -> Vec<GroupReport> {
    let mut out = Vec::new();
    for agg in aggregates {
        let subset = in_categories(ds, &agg.categories);
        if subset.is_empty() {
            warn!(aggregate = %agg.name, "no data found for aggregate, check category names");
            continue;
        }
        out.push(GroupReport {
            name: agg.name.clone(),
            metrics: calculate_metrics(subset.rows(), Some(GroupKey::Model)),
        });
    }
    out
}

/// Model-grouped metrics per category, in the caller's order.
pub fn per_category(ds: &Dataset, order: &[String]) -> Vec<GroupReport> {
    let available: HashSet<String> = ds.categories().into_iter().collect();
    let mut out = Vec::new();
    for cat in order {
        if !available.contains(cat) {
            warn!(category = %cat, "skipping category, not found in loaded data");
            continue;
        }
        let subset = ds.filter(|r| &r.category == cat);
        out.push(GroupReport {
            name: cat.clone(),
            metrics: calculate_metrics(subset.rows(), Some(GroupKey::Model)),
        });
    }
    out
}

/// Per-model recall for every rule that is actually present somewhere.
pub fn hardest_rules(ds: &Dataset) -> RuleModelTable {
    let models = ds.models();
    let mut rows = Vec::new();

    for rule in ds.rule_ids() {
        let subset = ds.filter(|r| r.rule_id == rule);
        if !subset.rows().iter().any(|r| r.actual) {
            continue;
        }
        let per_model = calculate_metrics(subset.rows(), Some(GroupKey::Model));
        let values = models
            .iter()
            .map(|m| {
                per_model
                    .iter()
                    .find(|row| row.group.as_deref() == Some(m.as_str()))
                    .map(|row| row.recall)
            })
            .collect();
        rows.push(RuleRow { rule_id: rule, values });
    }

    RuleModelTable { models, rows }
}

/// False positives (actual=false, detected=true) per model. Every listed
/// model appears, with 0 when it has none.
pub fn hallucinations(ds: &Dataset, models: &[String]) -> Vec<HallucinationCount> {
    models
        .iter()
        .map(|m| HallucinationCount {
            model: m.clone(),
            false_positives: ds
                .rows()
                .iter()
                .filter(|r| &r.model == m && !r.actual && r.detected)
                .count() as u64,
        })
        .collect()
}

/// Mean of `detected` over negative rows, per (rule, model).
pub fn false_positive_rates(ds: &Dataset) -> RuleModelTable {
    let negatives = ds.filter(|r| !r.actual);
    if negatives.is_empty() {
        warn!("no negative samples found, cannot compute false positive rate");
        return RuleModelTable::default();
    }

    let models = negatives.models();
    let rows = negatives
        .rule_ids()
        .into_iter()
        .map(|rule| {
            let per_model = group_confusion(
                negatives.rows().iter().filter(|r| r.rule_id == rule),
                GroupKey::Model,
            );
            let values = models
                .iter()
                .map(|m| {
                    per_model
                        .iter()
                        .find(|(model, _)| model == m)
                        .map(|(_, c)| c.fp as f64 / c.total() as f64)
                })
                .collect();
            RuleRow { rule_id: rule, values }
        })
        .collect();

    RuleModelTable { models, rows }
}

/// Precision/recall per model, overall or per aggregate.
pub fn strategy_summary(ds: &Dataset, aggregates: Option<&[Aggregate]>) -> Vec<StrategyPoint> {
    let points = |scope: Option<&str>, subset: &Dataset| -> Vec<StrategyPoint> {
        calculate_metrics(subset.rows(), Some(GroupKey::Model))
            .into_iter()
            .map(|m| StrategyPoint {
                scope: scope.map(str::to_string),
                model: m.group.unwrap_or_default(),
                precision: m.precision,
                recall: m.recall,
            })
            .collect()
    };

    match aggregates {
        None => points(None, ds),
        Some(aggs) => aggs
            .iter()
            .flat_map(|agg| {
                let subset = in_categories(ds, &agg.categories);
                if subset.is_empty() {
                    warn!(aggregate = %agg.name, "no data found for aggregate, check category names");
                }
                points(Some(agg.name.as_str()), &subset)
            })
            .collect(),
    }
}

/// Everything a renderer needs for one corpus, in one serializable value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub corpus_digest: String,
    pub files: usize,
    pub skipped: Vec<PathBuf>,
    pub rows: usize,
    pub overall: Vec<MetricsRow>,
    pub aggregates: Vec<GroupReport>,
    pub categories: Vec<GroupReport>,
    pub hardest_rules: RuleModelTable,
    pub hallucinations: Vec<HallucinationCount>,
    pub false_positive_rates: RuleModelTable,
    pub strategy: Vec<StrategyPoint>,
    pub strategy_by_aggregate: Vec<StrategyPoint>,
}

pub fn build_report(corpus: &Corpus, plan: &ReportPlan) -> Report {
    let ds = &corpus.dataset;
    Report {
        corpus_digest: corpus.digest.clone(),
        files: corpus.files,
        skipped: corpus.skipped.clone(),
        rows: ds.len(),
        overall: calculate_metrics(ds.rows(), Some(GroupKey::Model)),
        aggregates: named_aggregates(ds, &plan.aggregates),
        categories: per_category(ds, &plan.category_order),
        hardest_rules: hardest_rules(ds),
        hallucinations: hallucinations(ds, &plan.models),
        false_positive_rates: false_positive_rates(ds),
        strategy: strategy_summary(ds, None),
        strategy_by_aggregate: strategy_summary(ds, Some(&plan.aggregates)),
    }
}
