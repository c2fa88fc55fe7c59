//! Content quality heuristic
//!
//! A weighted proxy over presence and non-triviality of each section's key
//! fields, in `[0, 1]`. Prose fields need at least [`MIN_PROSE_LEN`]
//! characters for full credit; placeholder words score nothing. The weights
//! are tunable policy, not a correctness model.

use crate::finding::Finding;
use ripp_core::SectionName;
use serde_json::Value;

/// Characters a prose field needs for full credit
pub const MIN_PROSE_LEN: usize = 10;

/// Default pass threshold
pub const DEFAULT_MIN_QUALITY: f64 = 0.6;

const TRIVIAL: &[&str] = &["todo", "tbd", "n/a", "na", "none", "placeholder", "...", "-", "?"];

#[derive(Clone, Copy)]
enum Kind {
    /// Descriptive text
    Prose,
    /// Any non-empty value
    Present,
}

use Kind::{Present, Prose};

fn weights(section: SectionName) -> &'static [(&'static str, f64, Kind)] {
    match section {
        SectionName::Purpose => &[
            ("problem", 0.35, Prose),
            ("solution", 0.35, Prose),
            ("value", 0.3, Prose),
        ],
        SectionName::UxFlow => &[("actor", 0.3, Present), ("action", 0.5, Prose), ("result", 0.2, Present)],
        SectionName::DataContracts => &[
            ("name", 0.3, Present),
            ("fields", 0.5, Present),
            ("description", 0.2, Prose),
        ],
        SectionName::ApiContracts => &[
            ("endpoint", 0.3, Present),
            ("purpose", 0.3, Prose),
            ("response", 0.4, Present),
        ],
        SectionName::Permissions => &[("action", 0.5, Present), ("required_roles", 0.5, Present)],
        SectionName::FailureModes => &[
            ("scenario", 0.35, Prose),
            ("impact", 0.3, Prose),
            ("handling", 0.35, Prose),
        ],
        SectionName::AuditEvents => &[
            ("event", 0.4, Present),
            ("includes", 0.4, Present),
            ("purpose", 0.2, Prose),
        ],
        SectionName::Nfrs => &[],
        SectionName::AcceptanceTests => &[
            ("title", 0.1, Present),
            ("given", 0.3, Prose),
            ("when", 0.3, Prose),
            ("then", 0.3, Prose),
        ],
    }
}

fn is_trivial(text: &str) -> bool {
    let t = text.trim().to_ascii_lowercase();
    t.is_empty() || TRIVIAL.contains(&t.as_str())
}

fn field_score(value: Option<&Value>, kind: Kind) -> f64 {
    match (value, kind) {
        (None | Some(Value::Null), _) => 0.0,
        (Some(Value::String(s)), _) if is_trivial(s) => 0.0,
        (Some(Value::String(s)), Prose) if s.trim().chars().count() < MIN_PROSE_LEN => 0.5,
        (Some(Value::Array(a)), _) if a.is_empty() => 0.0,
        (Some(Value::Object(o)), _) if o.is_empty() => 0.0,
        _ => 1.0,
    }
}

fn item_score(item: &Value, table: &[(&str, f64, Kind)]) -> f64 {
    table
        .iter()
        .map(|(field, weight, kind)| weight * field_score(item.get(field), *kind))
        .sum()
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = scores.fold((0.0, 0u32), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / f64::from(n)
    }
}

/// Score a section payload
#[must_use]
pub fn quality_score(section: SectionName, content: &Value) -> f64 {
    let table = weights(section);
    let score = match section {
        SectionName::Purpose => item_score(content, table),
        SectionName::DataContracts => mean(
            ["inputs", "outputs"]
                .into_iter()
                .filter_map(|k| content.get(k).and_then(Value::as_array))
                .flatten()
                .map(|entity| item_score(entity, table)),
        ),
        SectionName::Nfrs => {
            let filled = content
                .as_object()
                .map_or(0, |o| o.values().filter(|v| field_score(Some(v), Present) > 0.0).count());
            match filled {
                0 => 0.0,
                1 => 0.7,
                _ => 1.0,
            }
        }
        _ => content
            .as_array()
            .map_or(0.0, |items| mean(items.iter().map(|i| item_score(i, table)))),
    };
    score.clamp(0.0, 1.0)
}

/// Finding when a payload scores under `threshold`
#[must_use]
pub fn check_quality(
    path: &str,
    section: SectionName,
    content: &Value,
    threshold: f64,
) -> Option<Finding> {
    let score = quality_score(section, content);
    (score < threshold).then(|| {
        Finding::error(
            path,
            "low-quality",
            format!(
                "quality score {score:.2} below threshold {threshold:.2} for `{section}`; \
                 fill required fields with concrete, evidence-backed text"
            ),
        )
    })
}
