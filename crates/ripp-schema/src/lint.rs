//! Best-practice lint rules
//!
//! Independent of schema validity: a structurally broken document still gets
//! linted as far as its shape allows. Findings are warnings unless the engine
//! runs in strict mode. The input is only ever borrowed.

use crate::finding::{Finding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(TODO|TBD|FIXME|XXX)\b|lorem ipsum|\bplaceholder\b|<[a-z][a-z _-]*>")
        .expect("valid placeholder regex")
});

static VAGUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(works correctly|works as expected|as expected|should work|works fine|functions properly|behaves correctly|is handled correctly)\b",
    )
    .expect("valid vague-language regex")
});

static ENDPOINT_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:GET|POST|PUT|PATCH|DELETE)\s+(/[A-Za-z0-9_\-/{}:.]*)")
        .expect("valid endpoint regex")
});

/// Lint findings plus the mode they were produced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintReport {
    /// Findings in rule order
    pub findings: Vec<Finding>,
    /// Whether warnings fail the verdict
    pub strict: bool,
}

impl LintReport {
    /// Pass verdict
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }
}

/// Best-practice linter
#[derive(Debug, Clone, Copy, Default)]
pub struct LintEngine {
    strict: bool,
}

impl LintEngine {
    /// Advisory mode
    #[must_use]
    pub const fn new() -> Self {
        Self { strict: false }
    }

    /// Treat warnings as failures
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Lint a document
    #[must_use]
    pub fn lint(&self, document: &Value) -> LintReport {
        let mut findings = Vec::new();
        placeholder_text(document, "", &mut findings);
        unresolved_references(document, &mut findings);
        vague_verification(document, &mut findings);
        missing_recommended(document, &mut findings);
        missing_description(document, &mut findings);

        if self.strict {
            for finding in &mut findings {
                finding.severity = Severity::Error;
            }
        }
        tracing::debug!(findings = findings.len(), strict = self.strict, "linted document");
        LintReport {
            findings,
            strict: self.strict,
        }
    }
}

fn array<'a>(document: &'a Value, key: &str) -> &'a [Value] {
    document
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

fn placeholder_text(value: &Value, path: &str, out: &mut Vec<Finding>) {
    match value {
        Value::String(s) => {
            if let Some(m) = PLACEHOLDER.find(s) {
                out.push(Finding::warning(
                    path,
                    "placeholder-text",
                    format!("placeholder text {:?}", m.as_str()),
                ));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                placeholder_text(item, &format!("{path}/{i}"), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                // Field types legitimately use angle brackets
                if key == "type" || key == "provenance" {
                    continue;
                }
                placeholder_text(item, &format!("{path}/{key}"), out);
            }
        }
        _ => {}
    }
}

fn entity_names(document: &Value) -> BTreeSet<String> {
    let Some(contracts) = document.get("data_contracts") else {
        return BTreeSet::new();
    };
    ["inputs", "outputs"]
        .into_iter()
        .flat_map(|k| array(contracts, k))
        .filter_map(|e| e.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn unresolved_references(document: &Value, out: &mut Vec<Finding>) {
    let entities = entity_names(document);
    let contracts = array(document, "api_contracts");

    for (i, contract) in contracts.iter().enumerate() {
        for part in ["request", "response"] {
            let schema_ref = contract
                .get(part)
                .and_then(|p| p.get("schema"))
                .and_then(Value::as_str);
            if let Some(name) = schema_ref {
                if !entities.contains(name) {
                    out.push(Finding::warning(
                        format!("/api_contracts/{i}/{part}/schema"),
                        "unresolved-reference",
                        format!("schema `{name}` is not defined in data_contracts"),
                    ));
                }
            }
        }
    }

    if contracts.is_empty() {
        return;
    }
    let endpoints: BTreeSet<&str> = contracts
        .iter()
        .filter_map(|c| c.get("endpoint").and_then(Value::as_str))
        .collect();

    for section in ["failure_modes", "acceptance_tests"] {
        for (i, item) in array(document, section).iter().enumerate() {
            let Some(fields) = item.as_object() else { continue };
            for (key, text) in fields {
                let Some(text) = text.as_str() else { continue };
                for caps in ENDPOINT_MENTION.captures_iter(text) {
                    let endpoint = &caps[1];
                    if !endpoints.contains(endpoint) {
                        out.push(Finding::warning(
                            format!("/{section}/{i}/{key}"),
                            "unresolved-reference",
                            format!("endpoint `{endpoint}` is not defined in api_contracts"),
                        ));
                    }
                }
            }
        }
    }
}

fn vague_verification(document: &Value, out: &mut Vec<Finding>) {
    for (i, test) in array(document, "acceptance_tests").iter().enumerate() {
        for key in ["then", "verification"] {
            let Some(text) = test.get(key).and_then(Value::as_str) else { continue };
            if let Some(m) = VAGUE.find(text) {
                out.push(Finding::warning(
                    format!("/acceptance_tests/{i}/{key}"),
                    "vague-verification",
                    format!("{:?} is not verifiable; state the observable outcome", m.as_str()),
                ));
            }
        }
    }
}

fn missing_recommended(document: &Value, out: &mut Vec<Finding>) {
    if let Some(purpose) = document.get("purpose").filter(|p| p.is_object()) {
        if purpose.get("out_of_scope").is_none() {
            out.push(Finding::warning(
                "/purpose/out_of_scope",
                "missing-recommended",
                "state what is out of scope",
            ));
        }
    }
    for (i, mode) in array(document, "failure_modes").iter().enumerate() {
        if mode.get("user_message").is_none() {
            out.push(Finding::warning(
                format!("/failure_modes/{i}/user_message"),
                "missing-recommended",
                "describe what the user sees",
            ));
        }
    }
    for (i, test) in array(document, "acceptance_tests").iter().enumerate() {
        if test.get("verification").is_none() {
            out.push(Finding::warning(
                format!("/acceptance_tests/{i}/verification"),
                "missing-recommended",
                "name how the outcome is verified",
            ));
        }
    }
    for (i, contract) in array(document, "api_contracts").iter().enumerate() {
        let writes = contract
            .get("method")
            .and_then(Value::as_str)
            .is_some_and(|m| matches!(m, "POST" | "PUT" | "PATCH"));
        if writes && contract.get("request").is_none() {
            out.push(Finding::warning(
                format!("/api_contracts/{i}/request"),
                "missing-recommended",
                "write endpoints should document their request body",
            ));
        }
    }
}

fn missing_description(document: &Value, out: &mut Vec<Finding>) {
    let Some(contracts) = document.get("data_contracts") else { return };
    for group in ["inputs", "outputs"] {
        for (i, entity) in array(contracts, group).iter().enumerate() {
            for (j, field) in array(entity, "fields").iter().enumerate() {
                let described = field
                    .get("description")
                    .and_then(Value::as_str)
                    .is_some_and(|d| !d.trim().is_empty());
                if !described {
                    let name = field.get("name").and_then(Value::as_str).unwrap_or("?");
                    out.push(Finding::warning(
                        format!("/data_contracts/{group}/{i}/fields/{j}/description"),
                        "missing-description",
                        format!("field `{name}` has no description"),
                    ));
                }
            }
        }
    }
}
