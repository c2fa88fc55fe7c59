//! Evidence extraction
//!
//! Walks a tree, filters by glob and size, hashes and classifies each file,
//! extracts redacted signals and assembles an [`EvidencePack`]. Settings are
//! validated before the first filesystem access.

use crate::coverage;
use crate::error::EvidenceError;
use crate::redact::Redactor;
use crate::signals;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ripp_core::{
    Clock, ConfigError, ContentHash, EvidenceConfig, EvidencePack, EvidenceStats, FileEntry,
    SignalGroups, SkippedFile, SystemClock, EVIDENCE_PACK_VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".ripp"];

/// Bytes inspected for a NUL when detecting binary files
const BINARY_SNIFF_LEN: usize = 8000;

/// Compiled extraction settings
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    include: Option<GlobSet>,
    exclude: GlobSet,
    max_file_size: u64,
    redactor: Redactor,
}

fn glob_set(field: &str, patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ConfigError::invalid(field, format!("bad glob {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ConfigError::invalid(field, e.to_string()))
}

impl ExtractionRules {
    /// Validate and compile settings
    ///
    /// # Errors
    /// Returns error for a bad glob, a bad redaction pattern, or a zero size
    /// cutoff
    pub fn compile(config: &EvidenceConfig) -> Result<Self, ConfigError> {
        if config.max_file_size == 0 {
            return Err(ConfigError::invalid("evidence.max_file_size", "must be > 0"));
        }
        let include = if config.include_globs.is_empty() {
            None
        } else {
            Some(glob_set("evidence.include_globs", &config.include_globs)?)
        };
        let exclude = glob_set("evidence.exclude_globs", &config.exclude_globs)?;
        let redactor = Redactor::new(&config.secret_patterns).map_err(|(pattern, e)| {
            ConfigError::invalid("evidence.secret_patterns", format!("bad pattern {pattern:?}: {e}"))
        })?;
        Ok(Self {
            include,
            exclude,
            max_file_size: config.max_file_size,
            redactor,
        })
    }

    /// Whether a root-relative path passes the glob filters
    #[must_use]
    pub fn admits(&self, path: &str) -> bool {
        !self.exclude.is_match(path) && self.include.as_ref().map_or(true, |set| set.is_match(path))
    }
}

struct Walked {
    rel: String,
    abs: PathBuf,
    size: u64,
}

struct WalkOutput {
    files: Vec<Walked>,
    errors: Vec<SkippedFile>,
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn walk(root: &Path) -> WalkOutput {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|d| e.file_name() == *d))
        });

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                files.push(Walked {
                    rel: relative(root, entry.path()),
                    abs: entry.path().to_path_buf(),
                    size,
                });
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map_or_else(String::new, |p| relative(root, p));
                tracing::warn!(path = %path, error = %e, "skipping unreadable entry");
                errors.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }
    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    WalkOutput { files, errors }
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|b| *b == 0)
}

/// Builds evidence packs
pub struct EvidenceExtractor {
    rules: ExtractionRules,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EvidenceExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceExtractor")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl EvidenceExtractor {
    /// Create extractor; fails before any I/O on bad settings
    ///
    /// # Errors
    /// Returns error if the settings are invalid
    pub fn new(config: &EvidenceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: ExtractionRules::compile(config)?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Use a specific clock for the pack timestamp
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Scan `root` and build a pack
    ///
    /// # Errors
    /// Returns error if the root cannot be scanned or the run is cancelled
    pub async fn build(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<EvidencePack, EvidenceError> {
        match tokio::fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(EvidenceError::Root {
                    path: root.to_path_buf(),
                    reason: "not a directory".into(),
                })
            }
            Err(e) => {
                return Err(EvidenceError::Root {
                    path: root.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
        tracing::info!(root = %root.display(), "evidence extraction started");

        let walk_root = root.to_path_buf();
        let walked = tokio::task::spawn_blocking(move || walk(&walk_root))
            .await
            .map_err(|e| EvidenceError::Walk(e.to_string()))?;
        let walked_count = walked.files.len();

        let mut stats = EvidenceStats::default();
        let mut files = Vec::new();
        let mut signals = SignalGroups::default();
        let mut skipped = walked.errors;
        stats.unreadable_count = skipped.len();

        for item in walked.files {
            if cancel.is_cancelled() {
                tracing::warn!("evidence extraction cancelled");
                return Err(EvidenceError::Cancelled);
            }
            if !self.rules.admits(&item.rel) {
                stats.excluded_count += 1;
                continue;
            }
            if item.size > self.rules.max_file_size {
                tracing::debug!(
                    path = %item.rel,
                    size = item.size,
                    max = self.rules.max_file_size,
                    "skipping large file"
                );
                stats.oversized_count += 1;
                continue;
            }

            let bytes = match tokio::fs::read(&item.abs).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %item.rel, error = %e, "skipping unreadable file");
                    stats.unreadable_count += 1;
                    skipped.push(SkippedFile {
                        path: item.rel,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let (category, lines) = if is_binary(&bytes) {
                (signals::category_for_path(&item.rel), 0)
            } else {
                let text = String::from_utf8_lossy(&bytes);
                let lines = u32::try_from(text.lines().count()).unwrap_or(u32::MAX);
                let (category, found) = signals::extract_file(&item.rel, &text, &self.rules.redactor);
                signals.dependencies.extend(found.dependencies);
                signals.routes.extend(found.routes);
                signals.schemas.extend(found.schemas);
                signals.auth.extend(found.auth);
                signals.ci.extend(found.ci);
                (category, lines)
            };
            tracing::debug!(path = %item.rel, ?category, "indexed file");

            stats.total_size += bytes.len() as u64;
            files.push(FileEntry {
                path: item.rel,
                hash: ContentHash::compute(&bytes),
                size: bytes.len() as u64,
                lines,
                category,
            });
        }

        let tracked = coverage::tracked_files(root).await;
        let (denominator, indexed_tracked) = match &tracked {
            Some(set) => (set.len(), files.iter().filter(|f| set.contains(&f.path)).count()),
            None => (walked_count, files.len()),
        };
        stats.file_count = files.len();
        stats.tracked_file_count = denominator;
        stats.coverage_percent = coverage::percent(indexed_tracked, denominator);

        files.sort_by(|a, b| a.path.cmp(&b.path));
        signals.sort();
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let pack_hash = ContentHash::compute_serializable(&(&stats, &files, &signals, &skipped))?;
        tracing::info!(
            files = stats.file_count,
            signals = signals.total(),
            coverage = stats.coverage_percent,
            pack = %pack_hash.short(),
            "evidence extraction finished"
        );

        Ok(EvidencePack {
            version: EVIDENCE_PACK_VERSION.to_string(),
            created: self.clock.now(),
            pack_hash,
            stats,
            files,
            signals,
            skipped,
        })
    }
}

/// Build a pack from `root` with `config`
///
/// # Errors
/// Returns error on invalid settings, an unscannable root, or cancellation
pub async fn build(
    root: &Path,
    config: &EvidenceConfig,
    cancel: &CancellationToken,
) -> Result<EvidencePack, EvidenceError> {
    EvidenceExtractor::new(config)?.build(root, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globs_filter_paths() {
        let rules = ExtractionRules::compile(
            &EvidenceConfig::default()
                .with_include(["src/**"])
                .with_exclude(["**/*.test.js"]),
        )
        .unwrap();
        assert!(rules.admits("src/app.js"));
        assert!(!rules.admits("src/app.test.js"));
        assert!(!rules.admits("docs/readme.md"));
    }

    #[test]
    fn default_excludes_dependency_dirs() {
        let rules = ExtractionRules::compile(&EvidenceConfig::default()).unwrap();
        assert!(!rules.admits("node_modules/x/index.js"));
        assert!(!rules.admits("web/node_modules/x/index.js"));
        assert!(rules.admits("src/index.js"));
    }

    #[test]
    fn bad_settings_fail_compilation() {
        let bad_glob = EvidenceConfig::default().with_exclude(["a/[b"]);
        assert!(ExtractionRules::compile(&bad_glob).is_err());

        let zero = EvidenceConfig::default().with_max_file_size(0);
        assert!(ExtractionRules::compile(&zero).is_err());

        let mut bad_pattern = EvidenceConfig::default();
        bad_pattern.secret_patterns = vec!["(".into()];
        let err = ExtractionRules::compile(&bad_pattern).unwrap_err();
        assert!(err.to_string().contains("secret_patterns"));
    }

    #[test]
    fn binary_sniff() {
        assert!(is_binary(b"\x89PNG\0\0"));
        assert!(!is_binary(b"plain text"));
    }
}
