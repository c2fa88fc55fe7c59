//! End-to-end tests for the `ripp` command.
//!
//! Drives every stage through the same entry point the binary uses, with
//! the in-context backend answering from a prepared response file.

use pretty_assertions::assert_eq;
use ripp_cli::{command, run, Failure, Io};
use ripp_core::{ErrorKind, Level, Packet, Workspace};
use ripp_test_utils::{response_for_level, write_sample_repo};
use std::path::Path;
use tokio_util::sync::CancellationToken;

const IN_CONTEXT_CONFIG: &str = "\
ai:
  enabled: true
  provider: in-context
  model: assistant
  max_retries: 2
  backoff_ms: 1
";

struct Outcome {
    result: anyhow::Result<bool>,
    stdout: String,
}

async fn ripp(root: &Path, args: &[&str]) -> Outcome {
    let root = root.to_string_lossy().into_owned();
    let argv = ["ripp", "--root", root.as_str()].into_iter().chain(args.iter().copied());
    let matches = command().try_get_matches_from(argv).unwrap();
    let mut input: &[u8] = b"";
    let mut output = Vec::new();
    let result = run(
        &matches,
        Io {
            input: &mut input,
            output: &mut output,
        },
        &CancellationToken::new(),
    )
    .await;
    Outcome {
        result,
        stdout: String::from_utf8(output).unwrap(),
    }
}

fn failure_kind(outcome: &Outcome) -> ErrorKind {
    let err = outcome.result.as_ref().unwrap_err();
    err.downcast_ref::<Failure>().unwrap().kind
}

fn prepare(root: &Path) -> Workspace {
    write_sample_repo(root);
    let ws = Workspace::new(root);
    std::fs::create_dir_all(ws.state_dir()).unwrap();
    std::fs::write(ws.config_path(), IN_CONTEXT_CONFIG).unwrap();
    std::fs::create_dir_all(ws.discovery_dir()).unwrap();
    std::fs::write(
        ws.discovery_dir().join("response.json"),
        response_for_level(Level::One),
    )
    .unwrap();
    ws
}

fn tick_all(ws: &Workspace, label: &str) {
    let text = std::fs::read_to_string(ws.checklist_path()).unwrap();
    let ticked = text.replace(&format!("- [ ] {label}"), &format!("- [x] {label}"));
    std::fs::write(ws.checklist_path(), ticked).unwrap();
}

/// Tenet: the pipeline runs end to end and yields a valid, lint-clean packet.
#[tokio::test]
async fn full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let ws = prepare(dir.path());

    let evidence = ripp(dir.path(), &["evidence", "build"]).await;
    assert!(evidence.result.unwrap());
    assert!(evidence.stdout.starts_with("indexed 6 files"));

    let discover = ripp(dir.path(), &["discover", "--enable-ai"]).await;
    assert!(discover.result.unwrap(), "{}", discover.stdout);
    assert!(ws.candidates_path().exists());
    assert!(ws.discovery_dir().join("prompt.md").exists());

    let checklist = ripp(dir.path(), &["confirm", "--checklist"]).await;
    assert!(checklist.result.unwrap());
    tick_all(&ws, "accept");

    let apply = ripp(dir.path(), &["confirm", "--checklist", "--apply", "--decider", "alice"]).await;
    assert!(apply.result.unwrap());
    assert!(apply.stdout.contains("3 accepted, 0 rejected, 0 skipped"));

    let build = ripp(dir.path(), &["build", "--id", "user-login", "--title", "User login"]).await;
    assert!(build.result.unwrap(), "{}", build.stdout);
    let packet_path = ws.packet_path("user-login");
    let packet: Packet = ripp_core::io::read_yaml(&packet_path).unwrap();
    assert_eq!(packet.level, Level::One);
    assert!(ws.summary_path("user-login").exists());

    let path = packet_path.to_string_lossy().into_owned();
    let validate = ripp(dir.path(), &["validate", &path]).await;
    assert!(validate.result.unwrap(), "{}", validate.stdout);
    assert!(validate.stdout.ends_with("PASS (0 errors, 0 warnings)\n"));

    let lint = ripp(dir.path(), &["lint", &path]).await;
    assert!(lint.result.unwrap(), "{}", lint.stdout);
}

/// Tenet: discovery refuses to run without both halves of the opt-in.
#[tokio::test]
async fn discovery_requires_config_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_repo(dir.path());
    let outcome = ripp(dir.path(), &["discover", "--enable-ai"]).await;
    assert_eq!(failure_kind(&outcome), ErrorKind::Config);
}

/// Tenet: a malformed config fails before any other work.
#[tokio::test]
async fn malformed_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::new(dir.path());
    std::fs::create_dir_all(ws.state_dir()).unwrap();
    std::fs::write(ws.config_path(), "evidence:\n  max_file_sise: 10\n").unwrap();
    let outcome = ripp(dir.path(), &["evidence", "build"]).await;
    assert_eq!(failure_kind(&outcome), ErrorKind::Config);
    assert!(!ws.evidence_index_path().exists());
}

/// Tenet: a packet missing a section for its declared level fails with
/// exit verdict false and names the section.
#[tokio::test]
async fn validate_reports_missing_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ripp.yaml");
    std::fs::write(
        &path,
        "ripp_version: '1.0'\npacket_id: broken\ntitle: Broken\ncreated: '2024-05-01'\n\
         updated: '2024-05-01'\nstatus: draft\nlevel: 1\npurpose:\n  problem: Shoppers lose saved lists\n  \
         solution: Accounts own the lists\n  value: Lists follow the shopper\n",
    )
    .unwrap();
    let path = path.to_string_lossy().into_owned();
    let outcome = ripp(dir.path(), &["validate", &path]).await;
    assert!(!outcome.result.unwrap());
    assert!(outcome.stdout.contains("ux_flow"));
    assert!(outcome.stdout.contains("FAIL"));
}

/// Tenet: `--apply` without `--checklist` is a usage error.
#[test]
fn apply_requires_checklist() {
    let err = command()
        .try_get_matches_from(["ripp", "confirm", "--apply"])
        .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

/// Tenet: levels outside 1..=3 are rejected at parse time.
#[test]
fn level_is_range_checked() {
    assert!(command()
        .try_get_matches_from(["ripp", "validate", "x.yaml", "--level", "4"])
        .is_err());
}
