//! Functional tests for confirmation.
//!
//! Covers the guarantees compilation leans on:
//! - Only explicit decisions are recorded; undecided blocks are skipped.
//! - A malformed checklist records nothing and names every bad block.
//! - Runs supersede earlier runs without destroying them.

use pretty_assertions::assert_eq;
use ripp_confirm::{ConfirmMode, ConfirmationLedger, LedgerError, LinePrompter, RejectedExport};
use ripp_core::io::read_yaml;
use ripp_core::{
    CandidateSet, ConfirmationMode, Diagnose, ErrorKind, SectionName, Verdict, Workspace,
};
use ripp_test_utils::{candidate_set, fixed_clock, fixed_time};
use std::path::Path;

const FIVE: [SectionName; 5] = [
    SectionName::Purpose,
    SectionName::UxFlow,
    SectionName::DataContracts,
    SectionName::ApiContracts,
    SectionName::Permissions,
];

fn ledger(root: &Path) -> ConfirmationLedger {
    ConfirmationLedger::new(Workspace::new(root)).with_clock(fixed_clock())
}

/// Tick `label` in block `block` of the checklist on disk
fn tick(root: &Path, block: usize, label: &str) {
    let path = Workspace::new(root).checklist_path();
    let mut text = std::fs::read_to_string(&path).unwrap();
    let start = text.find(&format!("## {block}. ")).unwrap();
    let target = format!("- [ ] {label}");
    let offset = start + text[start..].find(&target).unwrap();
    text.replace_range(offset..offset + target.len(), &format!("- [x] {label}"));
    std::fs::write(&path, text).unwrap();
}

fn edit_checklist(root: &Path, edit: impl FnOnce(String) -> String) {
    let path = Workspace::new(root).checklist_path();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, edit(text)).unwrap();
}

fn prepared(root: &Path) -> (ConfirmationLedger, CandidateSet) {
    let set = candidate_set(&FIVE);
    let ledger = ledger(root);
    ledger.write_checklist(&set).unwrap();
    (ledger, set)
}

/// Tenet: accepting three and rejecting two records exactly those decisions.
#[test]
fn checklist_accepts_three_rejects_two() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, set) = prepared(dir.path());
    for block in 1..=3 {
        tick(dir.path(), block, "accept");
    }
    for block in 4..=5 {
        tick(dir.path(), block, "reject");
    }

    let run = ledger.confirm(&set, ConfirmMode::Checklist).unwrap();
    assert_eq!(run.mode, ConfirmationMode::Checklist);
    assert_eq!(run.accepted().count(), 3);
    assert_eq!(run.rejected().count(), 2);
    assert!(run.skipped.is_empty());
    assert!(run.rejected().all(|d| d.content.is_none()));
    assert!(run.decisions.iter().all(|d| d.decided_at == fixed_time()));

    let accepted: Vec<_> = run.accepted().map(|d| d.section).collect();
    assert_eq!(accepted, FIVE[..3].to_vec());

    let export: RejectedExport =
        read_yaml(&Workspace::new(dir.path()).rejected_path()).unwrap();
    assert_eq!(export.run_id, run.run_id);
    assert_eq!(export.rejected.len(), 2);
}

/// Tenet: line-ending variation does not change what is recorded.
#[test]
fn crlf_checklist_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, set) = prepared(dir.path());
    tick(dir.path(), 1, "accept");
    tick(dir.path(), 2, "reject");
    edit_checklist(dir.path(), |text| text.replace('\n', "\r\n"));

    let run = ledger.confirm_checklist(&set).unwrap();
    assert_eq!(run.decisions.len(), 2);
    assert_eq!(run.decisions[0].verdict, Verdict::Accepted);
    assert_eq!(run.decisions[1].verdict, Verdict::Rejected);
    assert_eq!(run.skipped, vec![2, 3, 4]);
}

/// Tenet: a block with both boxes ticked is a conflict and nothing is
/// recorded, even for well-formed blocks.
#[test]
fn both_ticked_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, set) = prepared(dir.path());
    tick(dir.path(), 1, "accept");
    tick(dir.path(), 3, "accept");
    tick(dir.path(), 3, "reject");

    let err = ledger.confirm_checklist(&set).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    match &err {
        LedgerError::Checklist(e) => {
            assert_eq!(e.errors.len(), 1);
            assert_eq!(e.errors[0].block, Some(3));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!Workspace::new(dir.path()).confirmed_path().exists());
}

/// Tenet: an edited payload is recorded as edited, with the new content.
#[test]
fn edited_payload_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, set) = prepared(dir.path());
    tick(dir.path(), 1, "accept");
    edit_checklist(dir.path(), |text| {
        text.replacen(
            "Lists follow the shopper across phone and desktop",
            "Lists follow the shopper to every signed-in device",
            1,
        )
    });

    let run = ledger.confirm_checklist(&set).unwrap();
    let decision = &run.decisions[0];
    assert!(decision.edited);
    assert_eq!(
        decision.content.as_ref().unwrap()["value"],
        "Lists follow the shopper to every signed-in device"
    );
    assert_eq!(decision.original_confidence, set.candidates[0].confidence);
}

/// Tenet: edited content still has to satisfy the section schema.
#[test]
fn edited_payload_must_validate() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, set) = prepared(dir.path());
    tick(dir.path(), 4, "accept");
    edit_checklist(dir.path(), |text| text.replacen("method: POST", "method: FETCH", 1));

    let err = ledger.confirm_checklist(&set).unwrap_err();
    let LedgerError::Checklist(e) = err else {
        panic!("expected checklist error");
    };
    assert_eq!(e.errors[0].block, Some(4));
    assert!(e.errors[0].message.contains("api_contracts"));
}

/// Tenet: a later run supersedes an earlier one; both stay inspectable.
#[test]
fn later_run_supersedes_but_history_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let set = candidate_set(&FIVE);
    let ledger = ledger(dir.path());

    let mut accept_all = LinePrompter::new("a\na\na\na\na\n".as_bytes(), Vec::new());
    let first = ledger
        .confirm(&set, ConfirmMode::Interactive(&mut accept_all))
        .unwrap();

    ledger.write_checklist(&set).unwrap();
    tick(dir.path(), 2, "reject");
    let second = ledger.confirm(&set, ConfirmMode::Checklist).unwrap();

    let loaded = ledger.load().unwrap();
    assert_eq!(loaded.history().len(), 2);
    assert_eq!(loaded.current().unwrap().run_id, second.run_id);
    assert_eq!(loaded.run(first.run_id).unwrap().accepted().count(), 5);
    assert_eq!(ledger.rejected().unwrap().len(), 1);
    assert_eq!(ledger.rejected().unwrap()[0].section, SectionName::UxFlow);
}

/// Tenet: a checklist for another candidate set is refused.
#[test]
fn stale_checklist_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _) = prepared(dir.path());
    tick(dir.path(), 1, "accept");
    let newer = candidate_set(&FIVE[..4]);
    let err = ledger.confirm_checklist(&newer).unwrap_err();
    assert!(matches!(err, LedgerError::StaleChecklist { .. }));
    assert!(!err.is_retryable());
}

/// Tenet: a checklist whose candidate set line was deleted is refused.
#[test]
fn unstamped_checklist_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, set) = prepared(dir.path());
    tick(dir.path(), 1, "accept");
    edit_checklist(dir.path(), |text| {
        text.lines()
            .filter(|line| !line.starts_with("Candidate set:"))
            .map(|line| format!("{line}\n"))
            .collect()
    });
    let err = ledger.confirm_checklist(&set).unwrap_err();
    assert!(matches!(err, LedgerError::UnstampedChecklist { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.hint().unwrap().contains("ripp confirm --checklist"));
    assert!(!Workspace::new(dir.path()).confirmed_path().exists());
}

/// Tenet: when the rejected export cannot be written, the ledger is not
/// updated either.
#[test]
fn failed_rejected_export_leaves_ledger_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::new(dir.path());
    let (ledger, set) = prepared(dir.path());
    tick(dir.path(), 1, "accept");
    tick(dir.path(), 2, "reject");
    std::fs::create_dir_all(ws.rejected_path().join("blocked")).unwrap();

    let err = ledger.confirm(&set, ConfirmMode::Checklist).unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));
    assert!(!ws.confirmed_path().exists());
    assert!(ledger.load().unwrap().history().is_empty());
}

/// Tenet: confirming without a checklist names the step to run first.
#[test]
fn missing_checklist_has_a_hint() {
    let dir = tempfile::tempdir().unwrap();
    let err = ledger(dir.path())
        .confirm_checklist(&candidate_set(&FIVE))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.hint().unwrap().contains("ripp confirm --checklist"));
}
