//! Ground-truth lookup and labeling

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{LabeledSmell, Result, SmellClaim, SmellError};

/// Source of reference text, one document per target file name.
pub trait GroundTruthStore {
    fn document(&self, file_name: &str) -> Result<String>;
}

/// Ground truth kept as `{root}/{group}/{file_name}.txt`.
#[derive(Clone, Debug)]
pub struct GroundTruthDir {
    dir: PathBuf,
}

impl GroundTruthDir {
    pub fn new(root: impl AsRef<Path>, group: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(group),
        }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{file_name}.txt"))
    }
}

impl GroundTruthStore for GroundTruthDir {
    fn document(&self, file_name: &str) -> Result<String> {
        let path = self.path_for(file_name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SmellError::NotFound(
                format!("ground truth file not found: {}", path.display()),
            )),
            Err(source) => Err(SmellError::Io { path, source }),
        }
    }
}

/// In-memory ground truth (for testing and demos)
#[derive(Clone, Debug, Default)]
pub struct InMemoryGroundTruth {
    docs: HashMap<String, String>,
}

impl InMemoryGroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_name: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(file_name.into(), text.into());
    }
}

impl GroundTruthStore for InMemoryGroundTruth {
    fn document(&self, file_name: &str) -> Result<String> {
        self.docs
            .get(file_name)
            .cloned()
            .ok_or_else(|| SmellError::NotFound(format!("ground truth for '{file_name}'")))
    }
}

/// Label each claim by a case-sensitive substring test on the reference text.
///
/// Known limitation: a rule id that is a substring of another (`G1.1` inside
/// `G1.10`) is labeled present whenever the longer one is.
pub fn label_claims(claims: Vec<SmellClaim>, ground_truth: &str) -> Vec<LabeledSmell> {
    claims
        .into_iter()
        .map(|claim| {
            let actual = ground_truth.contains(claim.rule_id.as_str());
            LabeledSmell::from_claim(claim, actual)
        })
        .collect()
}
