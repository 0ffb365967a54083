use std::path::PathBuf;

use anyhow::{Context, Result};
use scoring::{build_report, CorpusLoader, Report, ReportPlan};
use smells::{GroundTruthDir, ResultStore, SubmissionPipeline};
use tracing::info;

use crate::config::{ReportConfig, SaveConfig};

/// Validate, label and store the configured submission. Returns the written path.
pub fn run_save(cfg: &SaveConfig) -> Result<PathBuf> {
    let raw = std::fs::read_to_string(&cfg.input_path)
        .with_context(|| format!("Could not read input file {}", cfg.input_path.display()))?;

    let ground_truth = GroundTruthDir::new(&cfg.ground_truth_root, cfg.category.to_path());
    let mut pipeline = SubmissionPipeline::new(
        cfg.checklist.clone(),
        ground_truth,
        ResultStore::new(cfg.output_root()),
        cfg.category.clone(),
        cfg.llm_model.clone(),
    );
    if let Some(prefix) = &cfg.file_prefix {
        pipeline = pipeline.with_file_prefix(prefix.clone());
    }

    info!(
        model = %cfg.llm_model,
        category = %cfg.category,
        checklist = cfg.checklist.len(),
        "starting validation"
    );
    let path = pipeline.run(&raw)?;
    Ok(path)
}

pub fn run_report(cfg: &ReportConfig) -> Result<Report> {
    let plan = ReportPlan::from_path(&cfg.plan_path)?;
    let corpus = CorpusLoader::new(&cfg.results_root).load(&plan.sources());
    info!(
        files = corpus.files,
        skipped = corpus.skipped.len(),
        rows = corpus.dataset.len(),
        digest = %corpus.digest,
        "corpus loaded"
    );
    Ok(build_report(&corpus, &plan))
}
