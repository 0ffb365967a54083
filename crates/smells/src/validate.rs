use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::{Checklist, Result, SmellClaim, SmellError};

/// Name of the claim list in a submission.
pub const CLAIM_LIST_FIELD: &str = "smell_analysis";

const CLAIM_ARITY: usize = 3;

/// A submission that passed every structural and coverage check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub file_name: String,
    pub claims: Vec<SmellClaim>,
}

pub fn parse_submission(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| SmellError::Schema(format!("invalid JSON format: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SmellError::Schema("input JSON is not an object".into())),
    }
}

/// Run all checks against one submission. The first violation aborts.
pub fn validate_submission(payload: &Map<String, Value>, checklist: &Checklist) -> Result<Submission> {
    let file_name = match payload.get("file_name") {
        None => {
            return Err(SmellError::Schema(
                "input JSON is missing the required key 'file_name'".into(),
            ))
        }
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(_) => {
            return Err(SmellError::Schema(
                "the value for 'file_name' is empty or not a string".into(),
            ))
        }
    };

    let items = locate_claim_list(payload)?;

    if items.len() != checklist.len() {
        return Err(SmellError::Coverage(format!(
            "smell count mismatch: expected {}, found {}",
            checklist.len(),
            items.len()
        )));
    }

    let mut claims = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        claims.push(check_claim(index, item)?);
    }

    check_coverage(&claims, checklist)?;

    Ok(Submission { file_name, claims })
}

fn locate_claim_list(payload: &Map<String, Value>) -> Result<&Vec<Value>> {
    if let Some(value) = payload.get(CLAIM_LIST_FIELD) {
        return value.as_array().ok_or_else(|| {
            SmellError::Schema(format!("'{CLAIM_LIST_FIELD}' is not an array"))
        });
    }

    // Compatibility shim: older payloads named the list differently, so the
    // first array-valued property is taken as the claim list.
    payload
        .iter()
        .find_map(|(key, value)| value.as_array().map(|arr| (key, arr)))
        .map(|(key, arr)| {
            debug!(key = %key, "claim list found under legacy key");
            arr
        })
        .ok_or_else(|| SmellError::Schema("no array found in the input JSON".into()))
}

fn check_claim(index: usize, item: &Value) -> Result<SmellClaim> {
    let obj = item.as_object().ok_or_else(|| {
        SmellError::Schema(format!("item at index {index} is not an object"))
    })?;

    if obj.len() != CLAIM_ARITY {
        return Err(SmellError::Schema(format!(
            "item at index {index} does not have exactly {CLAIM_ARITY} keys (found {})",
            obj.len()
        )));
    }

    for (key, value) in obj {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty {
            return Err(SmellError::Schema(format!(
                "found empty value for key '{key}' at index {index}"
            )));
        }
    }

    // arity is checked above, so position 1 exists
    if let Some((key, value)) = obj.iter().nth(1) {
        if !value.is_boolean() {
            return Err(SmellError::Schema(format!(
                "the second value (key: '{key}') at index {index} is not a boolean"
            )));
        }
    }

    let rule_id = field(obj, "rule_id", 0)
        .and_then(Value::as_str)
        .ok_or_else(|| SmellError::Schema(format!("rule_id at index {index} is not a string")))?;
    let detected = field(obj, "detected", 1)
        .and_then(Value::as_bool)
        .ok_or_else(|| SmellError::Schema(format!("detected at index {index} is not a boolean")))?;
    let justification = field(obj, "justification", 2)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            SmellError::Schema(format!("justification at index {index} is not a string"))
        })?;

    Ok(SmellClaim {
        rule_id: rule_id.to_string(),
        detected,
        justification: justification.to_string(),
    })
}

/// Named lookup with a positional fallback for payloads using other key names.
fn field<'a>(obj: &'a Map<String, Value>, name: &str, position: usize) -> Option<&'a Value> {
    obj.get(name).or_else(|| obj.values().nth(position))
}

/// Every checklist id must be present. With equal counts this also rules out
/// duplicates and ids outside the checklist.
fn check_coverage(claims: &[SmellClaim], checklist: &Checklist) -> Result<()> {
    let mut found = HashSet::new();
    let mut duplicate = None;
    for claim in claims {
        if !found.insert(claim.rule_id.as_str()) && duplicate.is_none() {
            duplicate = Some(claim.rule_id.as_str());
        }
    }

    for id in checklist.ids() {
        if !found.contains(id.as_str()) {
            let hint = duplicate
                .map(|d| format!(" (rule_id '{d}' appears more than once)"))
                .unwrap_or_default();
            return Err(SmellError::Coverage(format!(
                "required rule_id '{id}' not found in the input data{hint}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checklist() -> Checklist {
        Checklist::new(["G5.1", "G5.2", "G8.1"]).unwrap()
    }

    fn payload(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn claim(id: &str, detected: bool) -> Value {
        json!({ "rule_id": id, "detected": detected, "justification": "because" })
    }

    #[test]
    fn test_accepts_any_order() {
        let p = payload(json!({
            "file_name": "case1",
            "smell_analysis": [claim("G8.1", true), claim("G5.1", false), claim("G5.2", false)]
        }));
        let sub = validate_submission(&p, &checklist()).unwrap();
        assert_eq!(sub.file_name, "case1");
        assert_eq!(sub.claims.len(), 3);
        assert_eq!(sub.claims[0].rule_id, "G8.1");
        assert!(sub.claims[0].detected);
    }

    #[test]
    fn test_missing_file_name() {
        let p = payload(json!({ "smell_analysis": [] }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(err.to_string().contains("file_name"));
    }

    #[test]
    fn test_empty_file_name() {
        let p = payload(json!({ "file_name": "", "smell_analysis": [] }));
        assert!(matches!(validate_submission(&p, &checklist()), Err(SmellError::Schema(_))));
    }

    #[test]
    fn test_no_array() {
        let p = payload(json!({ "file_name": "x", "note": "none" }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(err.to_string().contains("no array found"));
    }

    #[test]
    fn test_legacy_list_key() {
        let p = payload(json!({
            "file_name": "x",
            "results": [claim("G5.1", false), claim("G5.2", false), claim("G8.1", true)]
        }));
        assert!(validate_submission(&p, &checklist()).is_ok());
    }

    #[test]
    fn test_count_mismatch() {
        let p = payload(json!({
            "file_name": "x",
            "smell_analysis": [claim("G5.1", false), claim("G5.2", false)]
        }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(matches!(err, SmellError::Coverage(_)));
        assert!(err.to_string().contains("expected 3, found 2"));
    }

    #[test]
    fn test_duplicate_hides_missing_id() {
        let p = payload(json!({
            "file_name": "x",
            "smell_analysis": [claim("G5.1", false), claim("G5.1", true), claim("G8.1", true)]
        }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(matches!(err, SmellError::Coverage(_)));
        let msg = err.to_string();
        assert!(msg.contains("'G5.2'"));
        assert!(msg.contains("'G5.1' appears more than once"));
    }

    #[test]
    fn test_wrong_arity_names_index() {
        let p = payload(json!({
            "file_name": "x",
            "smell_analysis": [
                claim("G5.1", false),
                { "rule_id": "G5.2", "detected": false },
                claim("G8.1", true)
            ]
        }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_empty_value() {
        let p = payload(json!({
            "file_name": "x",
            "smell_analysis": [
                claim("G5.1", false),
                claim("G5.2", false),
                { "rule_id": "G8.1", "detected": true, "justification": "" }
            ]
        }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(err.to_string().contains("key 'justification' at index 2"));
    }

    #[test]
    fn test_second_value_must_be_bool() {
        let p = payload(json!({
            "file_name": "x",
            "smell_analysis": [
                { "rule_id": "G5.1", "detected": "yes", "justification": "j" },
                claim("G5.2", false),
                claim("G8.1", true)
            ]
        }));
        let err = validate_submission(&p, &checklist()).unwrap_err();
        assert!(err.to_string().contains("key: 'detected'"));
    }

    #[test]
    fn test_positional_fallback() {
        let p = payload(json!({
            "file_name": "x",
            "smell_analysis": [
                { "id": "G5.1", "found": false, "why": "a" },
                { "id": "G5.2", "found": true, "why": "b" },
                { "id": "G8.1", "found": false, "why": "c" }
            ]
        }));
        let sub = validate_submission(&p, &checklist()).unwrap();
        assert_eq!(sub.claims[1].rule_id, "G5.2");
        assert!(sub.claims[1].detected);
        assert_eq!(sub.claims[2].justification, "c");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(parse_submission("[1,2]"), Err(SmellError::Schema(_))));
        assert!(matches!(parse_submission("{nope"), Err(SmellError::Schema(_))));
    }
}
