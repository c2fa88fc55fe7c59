//! Human-readable packet summary

use ripp_core::{Packet, SectionName};
use serde_json::Value;
use std::fmt::Write as _;

/// Render a Markdown overview of `packet`
#[must_use]
pub fn render(packet: &Packet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", packet.title);
    let _ = writeln!(out, "| field | value |\n|---|---|");
    let _ = writeln!(out, "| packet | `{}` |", packet.packet_id);
    let _ = writeln!(out, "| level | {} |", packet.level);
    let _ = writeln!(out, "| status | {:?} |", packet.status);
    let _ = writeln!(out, "| created | {} |", packet.created);
    let _ = writeln!(out, "| updated | {} |", packet.updated);
    if let Some(provenance) = &packet.provenance {
        let _ = writeln!(out, "| input | `{}` |", provenance.input_hash.short());
    }

    for section in packet.present_sections() {
        let Some(content) = packet.section(section) else {
            continue;
        };
        let _ = writeln!(out, "\n## {}\n", section.title());
        for line in outline(section, content) {
            let _ = writeln!(out, "- {line}");
        }
    }
    out
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn items(content: &Value) -> impl Iterator<Item = &Value> {
    content.as_array().into_iter().flatten()
}

fn outline(section: SectionName, content: &Value) -> Vec<String> {
    match section {
        SectionName::Purpose => ["problem", "solution", "value"]
            .into_iter()
            .filter(|k| !text(content, k).is_empty())
            .map(|k| format!("**{k}**: {}", text(content, k)))
            .collect(),
        SectionName::UxFlow => items(content)
            .map(|s| {
                let step = s.get("step").map(ToString::to_string).unwrap_or_default();
                format!("{step}. {}: {}", text(s, "actor"), text(s, "action"))
            })
            .collect(),
        SectionName::DataContracts => ["inputs", "outputs"]
            .into_iter()
            .flat_map(|group| {
                items(content.get(group).unwrap_or(&Value::Null))
                    .map(move |e| format!("{group}: `{}`", text(e, "name")))
            })
            .collect(),
        SectionName::ApiContracts => items(content)
            .map(|a| format!("`{} {}`: {}", text(a, "method"), text(a, "endpoint"), text(a, "purpose")))
            .collect(),
        SectionName::Permissions => items(content)
            .map(|p| {
                let roles: Vec<&str> = items(p.get("required_roles").unwrap_or(&Value::Null))
                    .filter_map(Value::as_str)
                    .collect();
                format!("{} ({})", text(p, "action"), roles.join(", "))
            })
            .collect(),
        SectionName::FailureModes => items(content)
            .map(|f| format!("{} → {}", text(f, "scenario"), text(f, "handling")))
            .collect(),
        SectionName::AuditEvents => items(content)
            .map(|e| format!("`{}` [{}]", text(e, "event"), text(e, "severity")))
            .collect(),
        SectionName::Nfrs => content
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default(),
        SectionName::AcceptanceTests => items(content)
            .map(|t| text(t, "title").to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ripp_core::{Level, Status, RIPP_VERSION};
    use ripp_test_utils::section_content;
    use std::collections::BTreeMap;

    #[test]
    fn summary_outlines_every_section() {
        let sections: BTreeMap<String, Value> = Level::Three
            .required_sections()
            .into_iter()
            .map(|s| (s.as_str().to_string(), section_content(s)))
            .collect();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let packet = Packet {
            ripp_version: RIPP_VERSION.into(),
            packet_id: "user-login".into(),
            title: "User login".into(),
            created: date,
            updated: date,
            status: Status::Draft,
            level: Level::Three,
            sections,
            provenance: None,
        };
        let text = render(&packet);
        assert!(text.starts_with("# User login\n"));
        assert!(text.contains("| level | 3 |"));
        assert!(text.contains("`POST /login`: Authenticate a shopper"));
        assert!(text.contains("read saved lists (shopper)"));
        assert!(text.contains("inputs: `Credentials`"));
        assert!(text.contains("- Valid login"));
        assert_eq!(text.matches("\n## ").count(), 9);
    }
}
