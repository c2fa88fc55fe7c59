//! Functional tests for evidence extraction.
//!
//! Covers the guarantees discovery leans on:
//! - Extraction is deterministic for an unchanged tree.
//! - No credential from the tree reaches the pack.
//! - Bad settings fail before the tree is touched.

use pretty_assertions::assert_eq;
use ripp_core::{
    DependencyScope, Diagnose, ErrorKind, EvidenceConfig, FileCategory, Workspace,
};
use ripp_evidence::{load_pack, write_pack, EvidenceError, EvidenceExtractor};
use ripp_test_utils::{fixed_clock, write_sample_repo, SAMPLE_SECRET};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn extractor() -> EvidenceExtractor {
    EvidenceExtractor::new(&EvidenceConfig::default())
        .unwrap()
        .with_clock(fixed_clock())
}

async fn extract(root: &Path) -> ripp_core::EvidencePack {
    extractor().build(root, &CancellationToken::new()).await.unwrap()
}

/// Tenet: an empty tree yields an empty pack with zero coverage, not an error.
#[tokio::test]
async fn empty_tree_yields_zero_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let pack = extract(dir.path()).await;
    assert_eq!(pack.stats.file_count, 0);
    assert!(pack.stats.coverage_percent.abs() < f64::EPSILON);
    assert_eq!(pack.signals.total(), 0);
}

/// Tenet: structural idioms across manifests, routes, schemas, auth and CI
/// are recognised, and excluded directories are counted rather than indexed.
#[tokio::test]
async fn sample_tree_signals_are_extracted() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_repo(dir.path());
    let pack = extract(dir.path()).await;

    assert_eq!(pack.stats.file_count, 6);
    assert_eq!(pack.stats.excluded_count, 1);
    assert!(pack.files.iter().all(|f| !f.path.starts_with("node_modules/")));

    let deps: Vec<_> = pack
        .signals
        .dependencies
        .iter()
        .map(|d| (d.name.as_str(), d.scope))
        .collect();
    assert!(deps.contains(&("express", DependencyScope::Runtime)));
    assert!(deps.contains(&("jest", DependencyScope::Dev)));

    let routes: Vec<_> = pack
        .signals
        .routes
        .iter()
        .map(|r| (r.method.as_deref(), r.path.as_str()))
        .collect();
    assert!(routes.contains(&(Some("POST"), "/login")));
    assert!(routes.contains(&(Some("GET"), "/lists")));

    assert!(pack.signals.schemas.iter().any(|s| s.name == "User" && s.kind == "prisma"));
    assert!(pack.signals.auth.iter().any(|a| a.mechanism == "jwt"));
    assert_eq!(pack.signals.ci.len(), 1);
    assert_eq!(pack.signals.ci[0].triggers, vec!["pull_request", "push"]);

    let category = |path: &str| pack.files.iter().find(|f| f.path == path).map(|f| f.category);
    assert_eq!(category("package.json"), Some(FileCategory::Manifest));
    assert_eq!(category("src/app.js"), Some(FileCategory::Route));
    assert_eq!(category("README.md"), Some(FileCategory::Doc));

    let lines = |path: &str| pack.files.iter().find(|f| f.path == path).map(|f| f.lines);
    assert_eq!(lines("src/app.js"), Some(7));
    assert_eq!(lines("README.md"), Some(3));
}

/// Tenet: credential-shaped text never appears anywhere in the pack.
#[tokio::test]
async fn secrets_never_reach_the_pack() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_repo(dir.path());
    let pack = extract(dir.path()).await;

    let serialized = serde_json::to_string(&pack).unwrap();
    assert!(!serialized.contains(SAMPLE_SECRET));
    assert!(pack.signals.auth.iter().any(|a| a.redacted));

    let ws = Workspace::new(dir.path());
    write_pack(&ws, &pack).unwrap();
    for entry in std::fs::read_dir(ws.evidence_dir()).unwrap() {
        let text = std::fs::read_to_string(entry.unwrap().path()).unwrap();
        assert!(!text.contains(SAMPLE_SECRET));
    }
}

/// Tenet: repeated extraction of an unchanged tree is identical, including
/// after the pack itself has been written into the tree.
#[tokio::test]
async fn extraction_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_repo(dir.path());
    let first = extract(dir.path()).await;
    write_pack(&Workspace::new(dir.path()), &first).unwrap();
    let second = extract(dir.path()).await;
    assert_eq!(first, second);
}

/// Tenet: a written pack loads back unchanged.
#[tokio::test]
async fn written_pack_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_repo(dir.path());
    let pack = extract(dir.path()).await;
    let ws = Workspace::new(dir.path());
    write_pack(&ws, &pack).unwrap();
    assert_eq!(load_pack(&ws).unwrap(), pack);
    assert!(ws.evidence_dir().join("routes.json").exists());
}

/// Tenet: settings errors surface before any filesystem access.
#[tokio::test]
async fn bad_settings_fail_before_io() {
    let config = EvidenceConfig::default().with_exclude(["src/[oops"]);
    let err = ripp_evidence::build(
        Path::new("/definitely/not/a/real/root"),
        &config,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EvidenceError::Config(_)), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Config);
}

/// Tenet: a cancelled run returns a distinct error and writes nothing.
#[tokio::test]
async fn cancellation_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_repo(dir.path());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = extractor().build(dir.path(), &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(!Workspace::new(dir.path()).evidence_index_path().exists());
}

/// Tenet: files above the size cutoff are counted, not indexed.
#[tokio::test]
async fn oversized_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("big.txt"), "x".repeat(64)).unwrap();
    std::fs::write(dir.path().join("small.txt"), "x").unwrap();
    let pack = EvidenceExtractor::new(&EvidenceConfig::default().with_max_file_size(16))
        .unwrap()
        .build(dir.path(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(pack.stats.file_count, 1);
    assert_eq!(pack.stats.oversized_count, 1);
    assert_eq!(pack.files[0].path, "small.txt");
}
