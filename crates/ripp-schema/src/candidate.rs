//! Candidate invariant checks
//!
//! Runs over raw backend output before it is trusted as a typed
//! [`ripp_core::Candidate`]: known section, confidence bounds, non-empty
//! evidence, the two constant fields, and the section's structural schema.

use crate::finding::Finding;
use crate::validator::SchemaValidator;
use ripp_core::SectionName;
use serde_json::Value;

/// Message for a confidence outside `[0, 1]`
pub const CONFIDENCE_RANGE_MESSAGE: &str = "confidence out of range [0,1]";

/// Check one raw candidate; `path` is its location in the response
#[must_use]
pub fn check_candidate(validator: &SchemaValidator, path: &str, raw: &Value) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some(object) = raw.as_object() else {
        findings.push(Finding::error(path, "candidate-shape", "candidate must be an object"));
        return findings;
    };

    let section = match object.get("section").and_then(Value::as_str) {
        Some(name) => match name.parse::<SectionName>() {
            Ok(section) => Some(section),
            Err(_) => {
                findings.push(Finding::error(
                    format!("{path}/section"),
                    "unknown-section",
                    format!("unknown section `{name}`"),
                ));
                None
            }
        },
        None => {
            findings.push(Finding::error(
                format!("{path}/section"),
                "candidate-shape",
                "section name is required",
            ));
            None
        }
    };

    match object.get("source") {
        None => {}
        Some(Value::String(s)) if s == "inferred" => {}
        Some(other) => findings.push(Finding::error(
            format!("{path}/source"),
            "forced-field",
            format!("source must be \"inferred\", got {other}"),
        )),
    }

    match object.get("requires_human_confirmation") {
        None | Some(Value::Bool(true)) => {}
        Some(other) => findings.push(Finding::error(
            format!("{path}/requires_human_confirmation"),
            "forced-field",
            format!("requires_human_confirmation must be true, got {other}"),
        )),
    }

    match object.get("confidence").and_then(Value::as_f64) {
        Some(c) if (0.0..=1.0).contains(&c) => {}
        Some(c) => findings.push(Finding::error(
            format!("{path}/confidence"),
            "confidence-range",
            format!("{CONFIDENCE_RANGE_MESSAGE}: {c}"),
        )),
        None => findings.push(Finding::error(
            format!("{path}/confidence"),
            "confidence-range",
            format!("{CONFIDENCE_RANGE_MESSAGE}: missing or not a number"),
        )),
    }

    findings.extend(check_evidence(path, object.get("evidence")));

    match (section, object.get("content")) {
        (_, None | Some(Value::Null)) => findings.push(Finding::error(
            format!("{path}/content"),
            "candidate-shape",
            "content is required",
        )),
        (Some(section), Some(content)) => {
            findings.extend(validator.validate_section(section, content).into_iter().map(
                |f| Finding {
                    path: format!("{path}/content{}", strip_section(&f.path, section)),
                    ..f
                },
            ));
        }
        (None, Some(_)) => {}
    }

    findings
}

fn strip_section(pointer: &str, section: SectionName) -> String {
    pointer
        .strip_prefix('/')
        .and_then(|p| p.strip_prefix(section.as_str()))
        .unwrap_or(pointer)
        .to_string()
}

fn check_evidence(path: &str, evidence: Option<&Value>) -> Vec<Finding> {
    let items = match evidence.and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items,
        _ => {
            return vec![Finding::error(
                format!("{path}/evidence"),
                "missing-evidence",
                "at least one evidence reference is required",
            )]
        }
    };

    let mut findings = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let file_ok = item
            .get("file")
            .and_then(Value::as_str)
            .is_some_and(|f| !f.trim().is_empty());
        let line_ok = item
            .get("line")
            .and_then(Value::as_u64)
            .is_some_and(|l| l >= 1 && u32::try_from(l).is_ok());
        if !file_ok || !line_ok {
            findings.push(Finding::error(
                format!("{path}/evidence/{i}"),
                "bad-evidence",
                "evidence reference needs a file path and a 1-based line",
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> Value {
        json!({
            "section": "purpose",
            "source": "inferred",
            "confidence": 0.8,
            "evidence": [{"file": "src/auth.js", "line": 12}],
            "requires_human_confirmation": true,
            "content": {
                "problem": "Users cannot sign in with email",
                "solution": "Password login backed by bcrypt hashes",
                "value": "Accounts become personal and secure"
            }
        })
    }

    #[test]
    fn well_formed_candidate_passes() {
        let v = SchemaValidator::new().unwrap();
        assert!(check_candidate(&v, "/candidates/0", &candidate()).is_empty());
    }

    #[test]
    fn confidence_above_one_is_reported() {
        let v = SchemaValidator::new().unwrap();
        let mut c = candidate();
        c["confidence"] = json!(1.4);
        let findings = check_candidate(&v, "/candidates/0", &c);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("confidence out of range [0,1]"));
        assert_eq!(findings[0].path, "/candidates/0/confidence");
    }

    #[test]
    fn empty_evidence_is_reported() {
        let v = SchemaValidator::new().unwrap();
        let mut c = candidate();
        c["evidence"] = json!([]);
        assert!(check_candidate(&v, "/c", &c).iter().any(|f| f.code == "missing-evidence"));

        c["evidence"] = json!([{"file": "a.js", "line": 0}]);
        assert!(check_candidate(&v, "/c", &c).iter().any(|f| f.code == "bad-evidence"));
    }

    #[test]
    fn cleared_confirmation_flag_is_reported() {
        let v = SchemaValidator::new().unwrap();
        let mut c = candidate();
        c["requires_human_confirmation"] = json!(false);
        c["source"] = json!("confirmed");
        let codes: Vec<_> = check_candidate(&v, "/c", &c).into_iter().map(|f| f.code).collect();
        assert_eq!(codes, vec!["forced-field", "forced-field"]);
    }

    #[test]
    fn content_errors_point_into_content() {
        let v = SchemaValidator::new().unwrap();
        let mut c = candidate();
        c["content"] = json!({"problem": "p"});
        let findings = check_candidate(&v, "/candidates/2", &c);
        assert!(!findings.is_empty());
        assert!(findings.iter().all(|f| f.path.starts_with("/candidates/2/content")));
    }

    #[test]
    fn unknown_section_is_reported() {
        let v = SchemaValidator::new().unwrap();
        let mut c = candidate();
        c["section"] = json!("roadmap");
        assert!(check_candidate(&v, "/c", &c).iter().any(|f| f.code == "unknown-section"));
    }
}
