//! Prompt construction
//!
//! The prompt carries a bounded summary of the evidence pack and the exact
//! structural schema of every section the target level requires. Corrective
//! feedback from a failed attempt is appended verbatim.

use once_cell::sync::Lazy;
use ripp_core::{EvidencePack, Level, SectionName};
use ripp_schema::PACKET_SCHEMA;
use serde_json::Value;
use std::fmt::Write as _;

/// Signals listed per group before truncation
pub const MAX_SIGNALS_PER_GROUP: usize = 40;

/// Standing instructions sent with every request
pub const SYSTEM_PROMPT: &str = "You infer product intent from repository evidence. \
Answer with one JSON object and nothing else. Every candidate must cite at least one \
evidence reference (file and 1-based line) taken from the evidence listed. Never invent \
files, endpoints or entities that the evidence does not show. Report confidence in [0, 1].";

const RESPONSE_SHAPE: &str = r#"{
  "candidates": [
    {
      "section": "<section name>",
      "confidence": 0.0,
      "evidence": [{"file": "<path>", "line": 1, "snippet": "<optional>"}],
      "content": { }
    }
  ]
}"#;

/// Definitions referenced from section schemas
const SHARED_DEFINITIONS: &[&str] = &["text", "entity"];

static SCHEMA_DEFINITIONS: Lazy<Option<Value>> = Lazy::new(|| {
    serde_json::from_str::<Value>(PACKET_SCHEMA)
        .ok()
        .and_then(|mut schema| schema.get_mut("definitions").map(Value::take))
});

/// Structural schema for one section, as embedded in the packet schema
#[must_use]
pub fn section_schema(section: SectionName) -> Option<Value> {
    SCHEMA_DEFINITIONS
        .as_ref()
        .and_then(|defs| defs.get(section.as_str()))
        .cloned()
}

/// Base prompt for `pack` at `level`
#[must_use]
pub fn build(pack: &EvidencePack, level: Level) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Evidence summary\n");
    let _ = writeln!(
        out,
        "Indexed {} files ({} bytes), {:.2}% of tracked files. Pack {}.\n",
        pack.stats.file_count,
        pack.stats.total_size,
        pack.stats.coverage_percent,
        pack.pack_hash.short()
    );

    let signals = &pack.signals;
    section_list(
        &mut out,
        "Dependencies",
        signals.dependencies.iter().map(|d| {
            let version = d.version.as_deref().unwrap_or("*");
            format!("{}:1 {} {} {} ({:?})", d.file, d.ecosystem, d.name, version, d.scope)
        }),
    );
    section_list(
        &mut out,
        "Routes",
        signals.routes.iter().map(|r| {
            let method = r.method.as_deref().unwrap_or("ANY");
            format!("{}:{} {} {} [{}]", r.file, r.line, method, r.path, r.framework)
        }),
    );
    section_list(
        &mut out,
        "Data schemas",
        signals
            .schemas
            .iter()
            .map(|s| format!("{}:{} {} {} | {}", s.file, s.line, s.kind, s.name, s.snippet)),
    );
    section_list(
        &mut out,
        "Authentication",
        signals
            .auth
            .iter()
            .map(|a| format!("{}:{} {} | {}", a.file, a.line, a.mechanism, a.snippet)),
    );
    section_list(
        &mut out,
        "CI",
        signals.ci.iter().map(|c| {
            format!(
                "{}:1 triggers [{}] jobs [{}]",
                c.file,
                c.triggers.join(", "),
                c.jobs.join(", ")
            )
        }),
    );

    let _ = writeln!(out, "# Required sections (level {level})\n");
    let _ = writeln!(
        out,
        "Produce exactly one candidate for each section below. `content` must match the schema.\n"
    );
    for section in level.required_sections() {
        let schema = section_schema(section)
            .and_then(|s| serde_json::to_string_pretty(&s).ok())
            .unwrap_or_else(|| "{}".to_string());
        let _ = writeln!(out, "## {section} ({})\n\n```json\n{schema}\n```\n", section.title());
    }
    if let Some(defs) = SCHEMA_DEFINITIONS.as_ref() {
        let shared: serde_json::Map<String, Value> = SHARED_DEFINITIONS
            .iter()
            .filter_map(|name| defs.get(*name).map(|d| ((*name).to_string(), d.clone())))
            .collect();
        if let Ok(text) = serde_json::to_string_pretty(&shared) {
            let _ = writeln!(out, "## Shared definitions (`#/definitions/...`)\n\n```json\n{text}\n```\n");
        }
    }

    let _ = writeln!(out, "# Response format\n\n```json\n{RESPONSE_SHAPE}\n```");
    out
}

fn section_list(out: &mut String, heading: &str, lines: impl ExactSizeIterator<Item = String>) {
    let total = lines.len();
    if total == 0 {
        return;
    }
    let _ = writeln!(out, "## {heading} ({total})\n");
    for line in lines.take(MAX_SIGNALS_PER_GROUP) {
        let _ = writeln!(out, "- {line}");
    }
    if total > MAX_SIGNALS_PER_GROUP {
        let _ = writeln!(out, "- ... {} more omitted", total - MAX_SIGNALS_PER_GROUP);
    }
    out.push('\n');
}

/// `base` with corrective feedback from the previous attempt
#[must_use]
pub fn with_feedback(base: &str, feedback: Option<&str>) -> String {
    match feedback {
        None => base.to_string(),
        Some(feedback) => format!(
            "{base}\n# Corrections\n\nYour previous answer was rejected. Fix every problem below \
             and answer again with the complete JSON object.\n\n{feedback}\n"
        ),
    }
}
