//! Response parsing and validation
//!
//! A response is accepted only when:
//! - every candidate passes the structural and invariant checks;
//! - every evidence reference names an indexed file and an existing line;
//! - no section is proposed twice;
//! - every content payload clears the quality threshold;
//! - every section the target level requires has a candidate at or above
//!   the confidence floor.
//!
//! Candidates under the floor are dropped only after all of the above.

use ripp_core::{Candidate, EvidencePack, Level, SectionName};
use ripp_schema::{check_candidate, check_quality, Finding, SchemaValidator};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Failed checks of one response
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Everything wrong with the response
    pub findings: Vec<Finding>,
}

impl Rejection {
    fn single(path: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            findings: vec![Finding::error(path, code, message)],
        }
    }

    /// Feedback text for the next attempt, one finding per line
    #[must_use]
    pub fn feedback(&self) -> String {
        self.findings
            .iter()
            .map(|f| format!("- {}: {} ({})", f.path, f.message, f.code))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What a response is checked against
#[derive(Debug, Clone)]
pub struct ResponseRules<'a> {
    /// Level whose required sections must be covered
    pub level: Level,
    /// Quality floor per content payload
    pub min_quality: f64,
    /// Confidence floor; weaker candidates are dropped
    pub min_confidence: f64,
    files: BTreeMap<&'a str, u32>,
}

impl<'a> ResponseRules<'a> {
    /// Rules over the files indexed in `pack`
    #[must_use]
    pub fn new(pack: &'a EvidencePack, level: Level, min_quality: f64, min_confidence: f64) -> Self {
        Self {
            level,
            min_quality,
            min_confidence,
            files: pack.files.iter().map(|f| (f.path.as_str(), f.lines)).collect(),
        }
    }

    fn check_evidence(&self, path: &str, candidate: &Candidate) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (j, reference) in candidate.evidence.iter().enumerate() {
            let at = format!("{path}/evidence/{j}");
            match self.files.get(reference.file.as_str()) {
                None => findings.push(Finding::error(
                    at,
                    "unknown-evidence",
                    format!("`{}` is not in the evidence pack", reference.file),
                )),
                Some(&lines) if reference.line > lines.max(1) => findings.push(Finding::error(
                    at,
                    "unknown-evidence",
                    format!(
                        "`{}` has {lines} lines; line {} does not exist",
                        reference.file, reference.line
                    ),
                )),
                Some(_) => {}
            }
        }
        findings
    }
}

/// Candidates that survived every check
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    /// Candidates at or above the confidence floor
    pub candidates: Vec<Candidate>,
    /// Valid candidates dropped for low confidence
    pub below_confidence: usize,
}

/// Strip a surrounding Markdown code fence, if any
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse and check a raw backend response
///
/// # Errors
/// Returns every finding when the response cannot be trusted
pub fn parse(
    validator: &SchemaValidator,
    text: &str,
    rules: &ResponseRules<'_>,
) -> Result<Accepted, Rejection> {
    let document: Value = serde_json::from_str(unfence(text)).map_err(|e| {
        Rejection::single("/", "invalid-json", format!("response is not valid JSON: {e}"))
    })?;

    let items = match &document {
        Value::Object(map) => match map.get("candidates") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Rejection::single(
                    "/candidates",
                    "candidate-shape",
                    "response must contain a `candidates` array",
                ))
            }
        },
        Value::Array(items) => items,
        _ => {
            return Err(Rejection::single(
                "/",
                "candidate-shape",
                "response must be a JSON object",
            ))
        }
    };

    let mut findings = Vec::new();
    let mut candidates = Vec::with_capacity(items.len());
    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, raw) in items.iter().enumerate() {
        let path = format!("/candidates/{i}");
        if let Some(section) = raw.get("section").and_then(Value::as_str) {
            if let Some(first) = first_seen.get(section) {
                findings.push(Finding::error(
                    format!("{path}/section"),
                    "duplicate-candidate",
                    format!(
                        "`{section}` is already proposed by /candidates/{first}; return one candidate per section"
                    ),
                ));
                continue;
            }
            first_seen.insert(section, i);
        }

        let errors = check_candidate(validator, &path, raw);
        if !errors.is_empty() {
            findings.extend(errors);
            continue;
        }
        let candidate = match typed(raw) {
            Ok(candidate) => candidate,
            Err(e) => {
                findings.push(Finding::error(path, "candidate-shape", e.to_string()));
                continue;
            }
        };
        let unknown = rules.check_evidence(&path, &candidate);
        if !unknown.is_empty() {
            findings.extend(unknown);
            continue;
        }
        if let Some(low) = check_quality(
            &format!("{path}/content"),
            candidate.section,
            &candidate.content,
            rules.min_quality,
        ) {
            findings.push(low);
            continue;
        }
        candidates.push(candidate);
    }

    let total = candidates.len();
    let (confident, weak): (Vec<Candidate>, Vec<Candidate>) = candidates
        .into_iter()
        .partition(|c| c.confidence.value() >= rules.min_confidence);
    let covered: BTreeSet<SectionName> = confident.iter().map(|c| c.section).collect();
    let level = rules.level;
    for section in level.required_sections() {
        if covered.contains(&section) {
            continue;
        }
        if let Some(candidate) = weak.iter().find(|c| c.section == section) {
            findings.push(Finding::error(
                format!("/candidates/{}", first_seen.get(section.as_str()).copied().unwrap_or(0)),
                "low-confidence",
                format!(
                    "the `{section}` candidate has confidence {} below the floor {}; level {level} requires it, so ground it in stronger evidence",
                    candidate.confidence.value(),
                    rules.min_confidence
                ),
            ));
        } else if !first_seen.contains_key(section.as_str()) {
            findings.push(Finding::error(
                "/candidates",
                "missing-candidate",
                format!("level {level} requires a candidate for `{section}`"),
            ));
        }
    }

    if findings.is_empty() {
        Ok(Accepted {
            below_confidence: total - confident.len(),
            candidates: confident,
        })
    } else {
        Err(Rejection { findings })
    }
}

/// Typed candidate with the constant fields forced
fn typed(raw: &Value) -> Result<Candidate, serde_json::Error> {
    let mut value = raw.clone();
    if let Some(object) = value.as_object_mut() {
        object.insert("source".into(), Value::String("inferred".into()));
        object.insert("requires_human_confirmation".into(), Value::Bool(true));
    }
    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use ripp_core::{ContentHash, EvidenceStats, FileCategory, FileEntry, SignalGroups, EVIDENCE_PACK_VERSION};
    use serde_json::json;

    fn pack() -> EvidencePack {
        EvidencePack {
            version: EVIDENCE_PACK_VERSION.into(),
            created: DateTime::<Utc>::default(),
            pack_hash: ContentHash::compute(b"pack"),
            stats: EvidenceStats::default(),
            files: vec![FileEntry {
                path: "src/auth.js".into(),
                hash: ContentHash::compute(b"auth"),
                size: 120,
                lines: 6,
                category: FileCategory::Auth,
            }],
            signals: SignalGroups::default(),
            skipped: vec![],
        }
    }

    fn purpose() -> Value {
        json!({
            "section": "purpose",
            "confidence": 0.9,
            "evidence": [{"file": "src/auth.js", "line": 3}],
            "content": {
                "problem": "Users cannot sign in to see their saved lists",
                "solution": "Email and password login with hashed credentials",
                "value": "Saved lists follow the user across devices"
            }
        })
    }

    fn check(candidates: &[Value], level: Level) -> Result<Accepted, Rejection> {
        let validator = SchemaValidator::new().unwrap();
        let pack = pack();
        let rules = ResponseRules::new(&pack, level, 0.6, 0.5);
        parse(&validator, &json!({ "candidates": candidates }).to_string(), &rules)
    }

    fn codes(rejection: &Rejection) -> Vec<&str> {
        rejection.findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn fenced_json_is_accepted() {
        assert_eq!(unfence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(unfence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn forced_fields_are_filled_in() {
        let c = typed(&purpose()).unwrap();
        assert_eq!(c.section, SectionName::Purpose);
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["source"], "inferred");
        assert_eq!(value["requires_human_confirmation"], true);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut c = purpose();
        c["confidence"] = json!(1.4);
        let rejection = check(&[c], Level::One).unwrap_err();
        assert!(rejection.feedback().contains("confidence out of range [0,1]"));
    }

    #[test]
    fn trivial_content_fails_quality() {
        let mut c = purpose();
        c["content"] = json!({"problem": "TODO", "solution": "TBD", "value": "n/a"});
        let rejection = check(&[c], Level::One).unwrap_err();
        assert!(codes(&rejection).contains(&"low-quality"));
    }

    #[test]
    fn missing_sections_are_named() {
        let rejection = check(&[purpose()], Level::One).unwrap_err();
        let missing: Vec<_> = rejection
            .findings
            .iter()
            .filter(|f| f.code == "missing-candidate")
            .map(|f| f.message.clone())
            .collect();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().any(|m| m.contains("ux_flow")));
    }

    #[test]
    fn unindexed_file_is_unknown_evidence() {
        let mut c = purpose();
        c["evidence"] = json!([{"file": "does/not/exist.py", "line": 9}]);
        let rejection = check(&[c], Level::One).unwrap_err();
        let finding = rejection
            .findings
            .iter()
            .find(|f| f.code == "unknown-evidence")
            .unwrap();
        assert_eq!(finding.path, "/candidates/0/evidence/0");
        assert!(finding.message.contains("does/not/exist.py"));
    }

    #[test]
    fn line_past_end_is_unknown_evidence() {
        let mut c = purpose();
        c["evidence"] = json!([{"file": "src/auth.js", "line": 9999}]);
        let rejection = check(&[c], Level::One).unwrap_err();
        assert!(rejection.feedback().contains("line 9999 does not exist"));
    }

    #[test]
    fn second_candidate_for_a_section_is_a_duplicate() {
        let rejection = check(&[purpose(), purpose()], Level::One).unwrap_err();
        let finding = rejection
            .findings
            .iter()
            .find(|f| f.code == "duplicate-candidate")
            .unwrap();
        assert_eq!(finding.path, "/candidates/1/section");
        assert!(finding.message.contains("/candidates/0"));
    }

    #[test]
    fn weak_required_section_is_low_confidence() {
        let mut c = purpose();
        c["confidence"] = json!(0.1);
        let rejection = check(&[c], Level::One).unwrap_err();
        let codes = codes(&rejection);
        assert!(codes.contains(&"low-confidence"));
        // purpose was attempted, so it is not also reported missing
        assert_eq!(codes.iter().filter(|c| **c == "missing-candidate").count(), 2);
    }

    #[test]
    fn non_json_is_rejected() {
        let validator = SchemaValidator::new().unwrap();
        let pack = pack();
        let rules = ResponseRules::new(&pack, Level::One, 0.6, 0.5);
        let rejection = parse(&validator, "Sure! Here you go", &rules).unwrap_err();
        assert_eq!(rejection.findings[0].code, "invalid-json");
    }
}
