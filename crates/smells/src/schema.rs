use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, SmellError};

/// Separator used when a category path is shown as a single label.
pub const CATEGORY_SEPARATOR: &str = " -> ";

/// Category of files stored directly under a model root.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One rater claim, before labeling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmellClaim {
    pub rule_id: String,
    pub detected: bool,
    pub justification: String,
}

/// A claim labeled against ground truth.
///
/// Field order is part of the persisted schema: `actual` always follows
/// `rule_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSmell {
    pub rule_id: String,
    pub actual: bool,
    pub detected: bool,
    pub justification: String,
}

impl LabeledSmell {
    pub fn from_claim(claim: SmellClaim, actual: bool) -> Self {
        Self {
            rule_id: claim.rule_id,
            actual,
            detected: claim.detected,
            justification: claim.justification,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFile {
    pub file_name: String,
    #[serde(with = "utc_seconds")]
    pub timestamp: DateTime<Utc>,
    pub llm_model: String,
    pub smell_analysis: Vec<LabeledSmell>,
}

impl EvaluationFile {
    pub fn new(
        file_name: impl Into<String>,
        llm_model: impl Into<String>,
        smell_analysis: Vec<LabeledSmell>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            timestamp,
            llm_model: llm_model.into(),
            smell_analysis,
        }
    }
}

/// The fixed set of rule ids a submission must cover exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checklist {
    ids: Vec<String>,
}

impl Checklist {
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(SmellError::Schema("checklist is empty".into()));
        }

        let mut seen = HashSet::new();
        for id in &ids {
            if id.trim().is_empty() {
                return Err(SmellError::Schema("checklist contains an empty rule_id".into()));
            }
            if !seen.insert(id.as_str()) {
                return Err(SmellError::Schema(format!(
                    "checklist lists rule_id '{id}' more than once"
                )));
            }
        }

        Ok(Self { ids })
    }

    /// Parse a comma separated list, e.g. `"G5.1, G5.2,G8.1"`.
    pub fn parse(list: &str) -> Result<Self> {
        Self::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.ids.iter().any(|id| id == rule_id)
    }
}

/// Folder segments between a model root and a stored file.
///
/// An empty path is the model root itself ("Uncategorized").
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CategoryPath {
    segments: Vec<String>,
}

impl CategoryPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for seg in &segments {
            if seg.is_empty() || seg == "." || seg == ".." || seg.contains(['/', '\\']) {
                return Err(SmellError::Schema(format!("invalid category segment '{seg}'")));
            }
        }
        Ok(Self { segments })
    }

    /// Parse a `/` separated path such as `"Synthetic/Single"`.
    pub fn parse(path: &str) -> Result<Self> {
        Self::new(path.split('/').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn to_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    pub fn label(&self) -> String {
        if self.segments.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            self.segments.join(CATEGORY_SEPARATOR)
        }
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ` timestamps.
pub mod utc_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
