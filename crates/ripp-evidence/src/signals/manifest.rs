//! Dependency manifests
//!
//! A manifest that fails to parse yields no signals; the file itself is still
//! indexed.

use crate::redact::Redactor;
use once_cell::sync::Lazy;
use regex::Regex;
use ripp_core::{DependencyScope, DependencySignal};

type Raw = (String, Option<String>, DependencyScope);

/// Manifest file name, ecosystem and parser
const MANIFESTS: &[(&str, &str, fn(&str) -> Vec<Raw>)] = &[
    ("package.json", "npm", npm),
    ("Cargo.toml", "cargo", cargo),
    ("requirements.txt", "pypi", pip),
    ("pyproject.toml", "pypi", pyproject),
    ("go.mod", "go", go),
    ("composer.json", "packagist", composer),
    ("Gemfile", "rubygems", gemfile),
];

pub(crate) fn is_manifest(file_name: &str) -> bool {
    MANIFESTS.iter().any(|(name, _, _)| *name == file_name)
}

pub(crate) fn extract(file: &str, file_name: &str, text: &str, redactor: &Redactor) -> Vec<DependencySignal> {
    let Some((_, ecosystem, parse)) = MANIFESTS.iter().find(|(name, _, _)| *name == file_name) else {
        return Vec::new();
    };
    parse(text)
        .into_iter()
        .map(|(name, version, scope)| {
            let version = version.map(|v| redactor.redact(&v));
            DependencySignal {
                file: file.to_string(),
                ecosystem: (*ecosystem).to_string(),
                name,
                redacted: version.as_ref().is_some_and(|v| v.redacted),
                version: version.map(|v| v.text),
                scope,
            }
        })
        .collect()
}

fn npm(text: &str) -> Vec<Raw> {
    json_tables(
        text,
        &[
            ("dependencies", DependencyScope::Runtime),
            ("devDependencies", DependencyScope::Dev),
        ],
    )
}

fn composer(text: &str) -> Vec<Raw> {
    json_tables(
        text,
        &[
            ("require", DependencyScope::Runtime),
            ("require-dev", DependencyScope::Dev),
        ],
    )
    .into_iter()
    .filter(|(name, _, _)| name != "php" && !name.starts_with("ext-"))
    .collect()
}

fn json_tables(text: &str, tables: &[(&str, DependencyScope)]) -> Vec<Raw> {
    let Ok(doc) = serde_json::from_str::<serde_json::Value>(text) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (key, scope) in tables {
        if let Some(deps) = doc.get(key).and_then(serde_json::Value::as_object) {
            for (name, version) in deps {
                out.push((name.clone(), version.as_str().map(str::to_string), *scope));
            }
        }
    }
    out
}

fn cargo(text: &str) -> Vec<Raw> {
    let Ok(doc) = toml::from_str::<toml::Value>(text) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (key, scope) in [
        ("dependencies", DependencyScope::Runtime),
        ("dev-dependencies", DependencyScope::Dev),
        ("build-dependencies", DependencyScope::Dev),
    ] {
        if let Some(deps) = doc.get(key).and_then(toml::Value::as_table) {
            out.extend(toml_table(deps, scope));
        }
    }
    out
}

/// Name/version pairs of a TOML dependency table
fn toml_table(deps: &toml::Table, scope: DependencyScope) -> Vec<Raw> {
    deps.iter()
        .map(|(name, spec)| {
            let version = match spec {
                toml::Value::String(v) => Some(v.clone()),
                toml::Value::Table(t) => t.get("version").and_then(toml::Value::as_str).map(str::to_string),
                _ => None,
            };
            (name.clone(), version, scope)
        })
        .collect()
}

/// PEP 621 `[project]` lists, plus Poetry dependency tables
fn pyproject(text: &str) -> Vec<Raw> {
    let Ok(doc) = toml::from_str::<toml::Value>(text) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if let Some(project) = doc.get("project") {
        let runtime = project.get("dependencies").and_then(toml::Value::as_array);
        out.extend(requirement_list(runtime, DependencyScope::Runtime));
        if let Some(extras) = project.get("optional-dependencies").and_then(toml::Value::as_table) {
            for list in extras.values() {
                out.extend(requirement_list(list.as_array(), DependencyScope::Dev));
            }
        }
    }
    if let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")) {
        if let Some(deps) = poetry.get("dependencies").and_then(toml::Value::as_table) {
            out.extend(
                toml_table(deps, DependencyScope::Runtime)
                    .into_iter()
                    .filter(|(name, _, _)| name != "python"),
            );
        }
        if let Some(deps) = poetry.get("dev-dependencies").and_then(toml::Value::as_table) {
            out.extend(toml_table(deps, DependencyScope::Dev));
        }
        if let Some(groups) = poetry.get("group").and_then(toml::Value::as_table) {
            for group in groups.values() {
                if let Some(deps) = group.get("dependencies").and_then(toml::Value::as_table) {
                    out.extend(toml_table(deps, DependencyScope::Dev));
                }
            }
        }
    }
    out
}

fn requirement_list(list: Option<&Vec<toml::Value>>, scope: DependencyScope) -> Vec<Raw> {
    list.into_iter()
        .flatten()
        .filter_map(toml::Value::as_str)
        .filter_map(|line| requirement(line, scope))
        .collect()
}

fn pip(text: &str) -> Vec<Raw> {
    text.lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty() && !l.starts_with('-'))
        .filter_map(|line| requirement(line, DependencyScope::Runtime))
        .collect()
}

/// One PEP 508 requirement: name, then whatever constrains it
fn requirement(line: &str, scope: DependencyScope) -> Option<Raw> {
    let line = line.trim();
    let split = line
        .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | ';' | '[' | ' ' | '@' | '('))
        .unwrap_or(line.len());
    let name = line[..split].trim();
    if name.is_empty() {
        return None;
    }
    let rest = line[split..].trim();
    let version = (!rest.is_empty()).then(|| rest.to_string());
    Some((name.to_string(), version, scope))
}

static GEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).expect("valid gem regex")
});

static GEM_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*group\s+(.+?)\s+do\b").expect("valid gem group regex"));

/// `gem` lines; anything inside a group other than production is dev-only
fn gemfile(text: &str) -> Vec<Raw> {
    let mut out = Vec::new();
    let mut group_depth = 0usize;
    let mut dev_depth = 0usize;
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(caps) = GEM_GROUP.captures(line) {
            group_depth += 1;
            if dev_depth == 0 && !caps[1].contains(":production") {
                dev_depth = group_depth;
            }
            continue;
        }
        if trimmed == "end" && group_depth > 0 {
            if dev_depth == group_depth {
                dev_depth = 0;
            }
            group_depth -= 1;
            continue;
        }
        if let Some(caps) = GEM.captures(line) {
            let scope = if dev_depth > 0 {
                DependencyScope::Dev
            } else {
                DependencyScope::Runtime
            };
            out.push((caps[1].to_string(), caps.get(2).map(|m| m.as_str().to_string()), scope));
        }
    }
    out
}

fn go(text: &str) -> Vec<Raw> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in text.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        let spec = if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            line
        } else if line == "require (" {
            in_block = true;
            continue;
        } else if let Some(rest) = line.strip_prefix("require ") {
            rest.trim()
        } else {
            continue;
        };
        let mut parts = spec.split_whitespace();
        if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
            out.push((module.to_string(), Some(version.to_string()), DependencyScope::Runtime));
        }
    }
    out
}
