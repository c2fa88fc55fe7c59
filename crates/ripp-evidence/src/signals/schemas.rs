//! Data-schema and ORM idioms

use super::{line_number, Idiom};
use crate::redact::Redactor;
use once_cell::sync::Lazy;
use regex::Regex;
use ripp_core::SchemaSignal;

static IDIOMS: Lazy<Vec<Idiom>> = Lazy::new(|| {
    vec![
        Idiom::new("prisma", r"^\s*model\s+(?P<name>\w+)\s*\{"),
        Idiom::new(
            "sql",
            r#"(?i)\bcreate\s+table\s+(?:if\s+not\s+exists\s+)?[`"\[]?(?P<name>[\w.]+)"#,
        ),
        Idiom::new(
            "mongoose",
            r#"(?:(?P<name>\w+)\s*=\s*new\s+(?:mongoose\.)?Schema\(|mongoose\.model\(\s*['"](?P<model>\w+)['"])"#,
        ),
        Idiom::new("django", r"^\s*class\s+(?P<name>\w+)\(\s*models\.Model\s*\)"),
        Idiom::new(
            "sqlalchemy",
            r"^\s*class\s+(?P<name>\w+)\((?:[\w.]+\s*,\s*)*(?:db\.Model|Base|DeclarativeBase)\)",
        ),
    ]
});

static TYPEORM_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@Entity\(").expect("valid entity regex"));
static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?class\s+(?P<name>\w+)").expect("valid class regex")
});

/// Lines after an `@Entity` decorator searched for the class
const ENTITY_LOOKAHEAD: usize = 3;

pub(crate) fn extract(file: &str, text: &str, redactor: &Redactor) -> Vec<SchemaSignal> {
    let is_prisma = file.ends_with(".prisma");
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if TYPEORM_ENTITY.is_match(line) {
            let class = lines
                .iter()
                .skip(i + 1)
                .take(ENTITY_LOOKAHEAD)
                .find_map(|l| CLASS_DECL.captures(l));
            if let Some(caps) = class {
                out.push(signal(file, i, line, &caps["name"], "typeorm", redactor));
            }
            continue;
        }

        let found = IDIOMS
            .iter()
            .filter(|idiom| is_prisma || idiom.name != "prisma")
            .find_map(|idiom| idiom.pattern.captures(line).map(|c| (idiom, c)));
        if let Some((idiom, caps)) = found {
            let name = caps
                .name("name")
                .or_else(|| caps.name("model"))
                .map_or("", |m| m.as_str());
            out.push(signal(file, i, line, name, idiom.name, redactor));
        }
    }
    out
}

fn signal(
    file: &str,
    index: usize,
    line: &str,
    name: &str,
    kind: &str,
    redactor: &Redactor,
) -> SchemaSignal {
    let snippet = redactor.snippet(line);
    SchemaSignal {
        file: file.to_string(),
        line: line_number(index),
        name: name.to_string(),
        kind: kind.to_string(),
        snippet: snippet.text,
        redacted: snippet.redacted,
    }
}
