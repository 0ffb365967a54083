use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    label_claims, parse_submission, validate_submission, CategoryPath, Checklist,
    EvaluationFile, GroundTruthStore, Result, ResultStore, SmellError,
};

/// Validate, label and persist one rater submission.
pub struct SubmissionPipeline<G: GroundTruthStore> {
    checklist: Checklist,
    ground_truth: G,
    store: ResultStore,
    category: CategoryPath,
    llm_model: String,
    file_prefix: Option<String>,
}

impl<G: GroundTruthStore> SubmissionPipeline<G> {
    pub fn new(
        checklist: Checklist,
        ground_truth: G,
        store: ResultStore,
        category: CategoryPath,
        llm_model: impl Into<String>,
    ) -> Self {
        Self {
            checklist,
            ground_truth,
            store,
            category,
            llm_model: llm_model.into(),
            file_prefix: None,
        }
    }

    /// Require submitted file names to carry `prefix`; it is stripped before use.
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    /// Everything except the write. Nothing is persisted.
    pub fn evaluate(&self, raw: &str, at: DateTime<Utc>) -> Result<EvaluationFile> {
        let payload = parse_submission(raw)?;
        let submission = validate_submission(&payload, &self.checklist)?;
        let file_name = self.resolve_file_name(&submission.file_name)?;

        let target = self.store.preflight(&self.category, &file_name)?;
        info!(file = %file_name, target = %target.display(), "submission valid");

        let ground_truth = self.ground_truth.document(&file_name)?;
        let smells = label_claims(submission.claims, &ground_truth);

        Ok(EvaluationFile::new(file_name, self.llm_model.clone(), smells, at))
    }

    pub fn run(&self, raw: &str) -> Result<PathBuf> {
        let file = self.evaluate(raw, Utc::now())?;
        self.store.persist(&self.category, &file)
    }

    fn resolve_file_name(&self, submitted: &str) -> Result<String> {
        let Some(prefix) = &self.file_prefix else {
            return Ok(submitted.to_string());
        };
        match submitted.strip_prefix(prefix.as_str()) {
            Some(rest) if !rest.is_empty() => Ok(rest.to_string()),
            _ => Err(SmellError::Schema(format!(
                "file_name '{submitted}' does not start with required prefix '{prefix}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryGroundTruth;
    use tempfile::TempDir;

    const RAW: &str = r#"{
        "file_name": "chatGPT_case1",
        "smell_analysis": [
            { "rule_id": "G5.1", "detected": false, "justification": "No empty diagrams." },
            { "rule_id": "G5.2", "detected": true, "justification": "Package P is isolated." },
            { "rule_id": "G8.1", "detected": true, "justification": "Mixed naming." }
        ]
    }"#;

    fn pipeline(dir: &TempDir) -> SubmissionPipeline<InMemoryGroundTruth> {
        let mut gt = InMemoryGroundTruth::new();
        gt.insert("case1", "Found rule G8.1 violated");
        SubmissionPipeline::new(
            Checklist::new(["G5.1", "G5.2", "G8.1"]).unwrap(),
            gt,
            ResultStore::new(dir.path()),
            CategoryPath::root(),
            "GPT-5.1",
        )
    }

    #[test]
    fn test_prefix_is_required_and_stripped() {
        let dir = TempDir::new().unwrap();
        let p = pipeline(&dir).with_file_prefix("chatGPT_");
        let file = p.evaluate(RAW, Utc::now()).unwrap();
        assert_eq!(file.file_name, "case1");
        assert_eq!(file.llm_model, "GPT-5.1");

        let labels: Vec<bool> = file.smell_analysis.iter().map(|s| s.actual).collect();
        assert_eq!(labels, vec![false, false, true]);

        let p = pipeline(&dir).with_file_prefix("claude_");
        assert!(matches!(p.evaluate(RAW, Utc::now()), Err(SmellError::Schema(_))));
    }

    #[test]
    fn test_missing_ground_truth_aborts() {
        let dir = TempDir::new().unwrap();
        let p = pipeline(&dir);
        let err = p.run(RAW).unwrap_err();
        assert!(matches!(err, SmellError::NotFound(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
