//! Signal extraction
//!
//! Each submodule recognises one family of structural idioms and returns
//! redacted signals. Extraction is line-oriented except for manifests and CI
//! definitions, which are parsed as documents.

pub(crate) mod auth;
pub(crate) mod ci;
pub(crate) mod manifest;
pub(crate) mod routes;
pub(crate) mod schemas;

use crate::redact::Redactor;
use regex::Regex;
use ripp_core::{FileCategory, SignalGroups};

/// A named pattern
pub(crate) struct Idiom {
    pub(crate) name: &'static str,
    pub(crate) pattern: Regex,
}

impl Idiom {
    pub(crate) fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid idiom regex"),
        }
    }
}

/// 1-based line number from a 0-based index
pub(crate) fn line_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "js", "jsx", "ts", "tsx", "mjs", "cjs", "py", "go", "java", "kt", "rb", "php", "cs",
    "c", "h", "cpp", "hpp", "swift", "scala", "sql", "prisma", "graphql", "vue", "svelte",
];
const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "toml", "json", "ini", "cfg", "conf", "env", "properties"];
const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt", "adoc"];

/// Signals of one file and its category
pub(crate) fn extract_file(path: &str, text: &str, redactor: &Redactor) -> (FileCategory, SignalGroups) {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let mut groups = SignalGroups::default();

    if manifest::is_manifest(file_name) {
        groups.dependencies = manifest::extract(path, file_name, text, redactor);
        return (FileCategory::Manifest, groups);
    }
    if ci::is_ci(path) {
        groups.ci.extend(ci::extract(path, text, redactor));
        return (FileCategory::Ci, groups);
    }

    let ext = extension(file_name);
    if !SOURCE_EXTENSIONS.contains(&ext.as_str()) {
        return (extension_category(&ext), groups);
    }

    groups.routes = routes::extract(path, text, redactor);
    groups.schemas = schemas::extract(path, text, redactor);
    groups.auth = auth::extract(path, text, redactor);

    let category = if !groups.routes.is_empty() {
        FileCategory::Route
    } else if !groups.schemas.is_empty() {
        FileCategory::Schema
    } else if !groups.auth.is_empty() {
        FileCategory::Auth
    } else {
        FileCategory::Source
    };
    (category, groups)
}

fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        // Dotfiles such as `.env`
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Category from extension alone; used for binary and non-source files
pub(crate) fn category_for_path(path: &str) -> FileCategory {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if manifest::is_manifest(file_name) {
        FileCategory::Manifest
    } else if ci::is_ci(path) {
        FileCategory::Ci
    } else {
        let ext = extension(file_name);
        if SOURCE_EXTENSIONS.contains(&ext.as_str()) {
            FileCategory::Source
        } else {
            extension_category(&ext)
        }
    }
}

fn extension_category(ext: &str) -> FileCategory {
    if CONFIG_EXTENSIONS.contains(&ext) {
        FileCategory::Config
    } else if DOC_EXTENSIONS.contains(&ext) {
        FileCategory::Doc
    } else {
        FileCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(path: &str, text: &str) -> FileCategory {
        extract_file(path, text, &Redactor::default()).0
    }

    #[test]
    fn categories_follow_signals() {
        assert_eq!(category("package.json", "{}"), FileCategory::Manifest);
        assert_eq!(category(".github/workflows/ci.yml", "on: push"), FileCategory::Ci);
        assert_eq!(category("src/app.js", "app.get('/x', h)"), FileCategory::Route);
        assert_eq!(category("db/init.sql", "CREATE TABLE users ("), FileCategory::Schema);
        assert_eq!(category("src/auth.py", "@login_required"), FileCategory::Auth);
        assert_eq!(category("src/util.rs", "fn main() {}"), FileCategory::Source);
        assert_eq!(category("README.md", "app.get('/x', h)"), FileCategory::Doc);
        assert_eq!(category(".env", "A=b"), FileCategory::Config);
        assert_eq!(category("logo.png", ""), FileCategory::Other);
    }

    #[test]
    fn docs_are_not_scanned_for_code_idioms() {
        let (_, groups) = extract_file("README.md", "app.get('/x', h)", &Redactor::default());
        assert_eq!(groups.total(), 0);
    }
}
