use std::collections::HashMap;

use serde::Serialize;

use crate::DatasetRow;

/// Column a dataset can be grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Model,
    Category,
    File,
    Rule,
}

impl GroupKey {
    pub fn value(self, row: &DatasetRow) -> &str {
        match self {
            GroupKey::Model => &row.model,
            GroupKey::Category => &row.category,
            GroupKey::File => &row.file,
            GroupKey::Rule => &row.rule_id,
        }
    }
}

/// Confusion counts with `true` as the positive class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Confusion {
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
}

impl Confusion {
    pub fn record(&mut self, actual: bool, detected: bool) {
        match (actual, detected) {
            (true, true) => self.tp += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
            (false, false) => self.tn += 1,
        }
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a DatasetRow>) -> Self {
        let mut c = Self::default();
        for r in rows {
            c.record(r.actual, r.detected);
        }
        c
    }

    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.fn_ + self.tn
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

// zero_division = 0
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsRow {
    /// `None` when the subset was not grouped.
    pub group: Option<String>,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub sample_size: usize,
    pub confusion: Confusion,
}

impl MetricsRow {
    pub fn from_confusion(group: Option<String>, confusion: Confusion) -> Self {
        Self {
            group,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            sample_size: confusion.total() as usize,
            confusion,
        }
    }
}

/// Confusion counts per distinct key value, in first-seen order.
pub fn group_confusion<'a>(
    rows: impl IntoIterator<Item = &'a DatasetRow>,
    key: GroupKey,
) -> Vec<(String, Confusion)> {
    let mut order: Vec<(String, Confusion)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let value = key.value(row);
        let slot = match index.get(value) {
            Some(&i) => i,
            None => {
                index.insert(value.to_string(), order.len());
                order.push((value.to_string(), Confusion::default()));
                order.len() - 1
            }
        };
        order[slot].1.record(row.actual, row.detected);
    }
    order
}

/// Accuracy, precision, recall and F1 for the whole subset or per group.
///
/// An empty subset produces an empty table.
pub fn calculate_metrics<'a>(
    rows: impl IntoIterator<Item = &'a DatasetRow>,
    key: Option<GroupKey>,
) -> Vec<MetricsRow> {
    match key {
        Some(key) => group_confusion(rows, key)
            .into_iter()
            .map(|(group, c)| MetricsRow::from_confusion(Some(group), c))
            .collect(),
        None => {
            let c = Confusion::from_rows(rows);
            if c.total() == 0 {
                Vec::new()
            } else {
                vec![MetricsRow::from_confusion(None, c)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(model: &str, actual: bool, detected: bool) -> DatasetRow {
        DatasetRow {
            model: model.into(),
            category: "Synthetic -> Single".into(),
            file: "case1".into(),
            rule_id: "G5.1".into(),
            actual,
            detected,
            justification: "j".into(),
        }
    }

    #[test]
    fn test_half_recall() {
        let rows = vec![row("ModelX", true, true), row("ModelX", true, false)];
        let m = calculate_metrics(&rows, Some(GroupKey::Model));
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].group.as_deref(), Some("ModelX"));
        assert_eq!(m[0].accuracy, 0.5);
        assert_eq!(m[0].precision, 1.0);
        assert_eq!(m[0].recall, 0.5);
        assert!((m[0].f1 - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m[0].sample_size, 2);
    }

    #[test]
    fn test_no_positives_is_zero_not_nan() {
        let rows = vec![row("ModelY", false, false), row("ModelY", false, false)];
        let m = calculate_metrics(&rows, None);
        assert_eq!(m[0].precision, 0.0);
        assert_eq!(m[0].recall, 0.0);
        assert_eq!(m[0].f1, 0.0);
        assert_eq!(m[0].accuracy, 1.0);
        assert!(m[0].group.is_none());
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let rows = vec![
            row("Gemini", true, true),
            row("ChatGPT", false, true),
            row("Gemini", false, false),
            row("Claude", true, false),
        ];
        let m = calculate_metrics(&rows, Some(GroupKey::Model));
        let groups: Vec<_> = m.iter().map(|r| r.group.clone().unwrap()).collect();
        assert_eq!(groups, vec!["Gemini", "ChatGPT", "Claude"]);
        assert_eq!(m[0].confusion, Confusion { tp: 1, fp: 0, fn_: 0, tn: 1 });
        assert_eq!(m[1].confusion.fp, 1);
    }

    #[test]
    fn test_grouping_does_not_change_values() {
        let rows = vec![
            row("A", true, true),
            row("B", false, true),
            row("A", true, false),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let a = calculate_metrics(&rows, Some(GroupKey::Model));
        let b = calculate_metrics(&reversed, Some(GroupKey::Model));
        let find = |t: &[MetricsRow], g: &str| t.iter().find(|r| r.group.as_deref() == Some(g)).cloned();
        assert_eq!(find(&a, "A"), find(&b, "A"));
        assert_eq!(find(&a, "B"), find(&b, "B"));
    }

    #[test]
    fn test_empty_subset() {
        let rows: Vec<DatasetRow> = Vec::new();
        assert!(calculate_metrics(&rows, None).is_empty());
        assert!(calculate_metrics(&rows, Some(GroupKey::Rule)).is_empty());
    }
}
