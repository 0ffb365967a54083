use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use smells::{CategoryPath, Checklist};

/// Settings for one `save` run, read once from the environment.
#[derive(Clone, Debug)]
pub struct SaveConfig {
    pub input_path: PathBuf,
    pub checklist: Checklist,
    pub results_root: PathBuf,
    pub model_dir: String,
    pub llm_model: String,
    pub category: CategoryPath,
    pub ground_truth_root: PathBuf,
    pub file_prefix: Option<String>,
}

impl SaveConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let input_path = PathBuf::from(var("EVAL_INPUT_PATH").unwrap_or_else(|| "result.json".to_string()));
        let checklist = Checklist::parse(&get(&var, "EVAL_CHECKLIST")?)
            .context("EVAL_CHECKLIST is not a valid checklist")?;
        let results_root = PathBuf::from(var("EVAL_RESULTS_ROOT").unwrap_or_else(|| "Results".to_string()));
        let model_dir = get(&var, "EVAL_MODEL_DIR")?;
        let llm_model = get(&var, "EVAL_MODEL_NAME")?;
        let category = CategoryPath::parse(&get(&var, "EVAL_CATEGORY")?)
            .context("EVAL_CATEGORY is not a valid folder path")?;
        let ground_truth_root = PathBuf::from(var("EVAL_GROUND_TRUTH_ROOT").unwrap_or_else(|| "Data".to_string()));
        let file_prefix = var("EVAL_FILE_PREFIX").filter(|p| !p.is_empty());

        // Tiny sanity checks (fail fast, fail loud)
        if model_dir.contains(['/', '\\']) || model_dir == ".." {
            bail!("EVAL_MODEL_DIR must be a single folder name");
        }
        if llm_model.trim().is_empty() {
            bail!("EVAL_MODEL_NAME must not be blank");
        }

        Ok(Self {
            input_path,
            checklist,
            results_root,
            model_dir,
            llm_model,
            category,
            ground_truth_root,
            file_prefix,
        })
    }

    /// `{results_root}/{model_dir}`
    pub fn output_root(&self) -> PathBuf {
        self.results_root.join(&self.model_dir)
    }
}

/// Settings for a `report` run.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub results_root: PathBuf,
    pub plan_path: PathBuf,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            results_root: PathBuf::from(var("EVAL_RESULTS_ROOT").unwrap_or_else(|| "Results".to_string())),
            plan_path: PathBuf::from(get(&var, "EVAL_REPORT_PLAN")?),
        })
    }
}

fn get(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    var(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Missing required env var: {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 4] = [
        ("EVAL_CHECKLIST", "G5.1,G5.2,G8.1"),
        ("EVAL_MODEL_DIR", "Gemini"),
        ("EVAL_MODEL_NAME", "gemini3.0"),
        ("EVAL_CATEGORY", "Synthetic/Single"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = SaveConfig::from_lookup(lookup(&BASE)).unwrap();
        assert_eq!(cfg.input_path, PathBuf::from("result.json"));
        assert_eq!(cfg.output_root(), PathBuf::from("Results").join("Gemini"));
        assert_eq!(cfg.ground_truth_root, PathBuf::from("Data"));
        assert_eq!(cfg.checklist.len(), 3);
        assert_eq!(cfg.category.label(), "Synthetic -> Single");
        assert!(cfg.file_prefix.is_none());
    }

    #[test]
    fn test_missing_key_is_named() {
        let err = SaveConfig::from_lookup(lookup(&BASE[..3])).unwrap_err();
        assert!(err.to_string().contains("EVAL_CATEGORY"));
    }

    #[test]
    fn test_model_dir_must_be_one_folder() {
        let mut pairs = BASE.to_vec();
        pairs[1] = ("EVAL_MODEL_DIR", "../Gemini");
        assert!(SaveConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_report_needs_plan() {
        assert!(ReportConfig::from_lookup(lookup(&[])).is_err());
        let cfg = ReportConfig::from_lookup(lookup(&[("EVAL_REPORT_PLAN", "plan.json")])).unwrap();
        assert_eq!(cfg.results_root, PathBuf::from("Results"));
    }
}
