//! Confirmation ledger
//!
//! Collects decisions over a candidate set and appends them to
//! `.ripp/intent.confirmed.yaml` as a new [`ConfirmationRun`]. Earlier runs
//! are kept; the newest one supersedes them.

use crate::checklist::{self, ChecklistEntry};
use crate::error::LedgerError;
use crate::prompter::{Choice, DecisionPrompter};
use chrono::{DateTime, Utc};
use ripp_core::io::{read_yaml, write_atomic, write_yaml_atomic};
use ripp_core::{
    CandidateSet, Clock, ConfirmationMode, ConfirmationRun, ContentHash, Decision, IntentLedger,
    StoreError, SystemClock, Verdict, Workspace,
};
use ripp_schema::SchemaValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Decider recorded when none is configured
pub const DEFAULT_DECIDER: &str = "local";

/// How to collect decisions
pub enum ConfirmMode<'a> {
    /// Prompt for each candidate
    Interactive(&'a mut dyn DecisionPrompter),
    /// Parse the edited checklist
    Checklist,
}

/// Export of the current run's rejections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedExport {
    /// Run the rejections belong to
    pub run_id: Ulid,
    /// Candidate set the run decided over
    pub candidate_set_hash: ContentHash,
    /// Rejected decisions
    pub rejected: Vec<Decision>,
}

/// Records human decisions for one workspace
pub struct ConfirmationLedger {
    workspace: Workspace,
    clock: Arc<dyn Clock>,
    decided_by: String,
}

impl std::fmt::Debug for ConfirmationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationLedger")
            .field("workspace", &self.workspace)
            .field("decided_by", &self.decided_by)
            .finish_non_exhaustive()
    }
}

impl ConfirmationLedger {
    /// Ledger for `workspace`
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            clock: Arc::new(SystemClock),
            decided_by: DEFAULT_DECIDER.to_string(),
        }
    }

    /// Override the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the identity stamped on decisions
    #[must_use]
    pub fn with_decider(mut self, decided_by: impl Into<String>) -> Self {
        self.decided_by = decided_by.into();
        self
    }

    /// Load the ledger; a missing file is an empty ledger
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or decoded
    pub fn load(&self) -> Result<IntentLedger, LedgerError> {
        match read_yaml(&self.workspace.confirmed_path()) {
            Ok(ledger) => Ok(ledger),
            Err(e) if e.is_not_found() => Ok(IntentLedger::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rejected decisions of the current run
    ///
    /// # Errors
    /// Returns error if the ledger cannot be loaded
    pub fn rejected(&self) -> Result<Vec<Decision>, LedgerError> {
        let ledger = self.load()?;
        Ok(ledger
            .current()
            .map(|run| run.rejected().cloned().collect())
            .unwrap_or_default())
    }

    /// Write the checklist for `set`, returning its path
    ///
    /// # Errors
    /// Returns error if the set is empty or the write fails
    pub fn write_checklist(&self, set: &CandidateSet) -> Result<PathBuf, LedgerError> {
        if set.is_empty() {
            return Err(LedgerError::EmptyCandidateSet);
        }
        let hash = set.content_hash()?;
        let path = self.workspace.checklist_path();
        write_atomic(&path, checklist::render(set, &hash).as_bytes())?;
        info!(path = %self.workspace.relative(&path), candidates = set.len(), "wrote checklist");
        Ok(path)
    }

    /// Collect decisions in `mode` and record them as a new run
    ///
    /// # Errors
    /// Returns error if no decision was made, the checklist is stale or
    /// malformed, or the ledger cannot be written
    pub fn confirm(
        &self,
        set: &CandidateSet,
        mode: ConfirmMode<'_>,
    ) -> Result<ConfirmationRun, LedgerError> {
        match mode {
            ConfirmMode::Interactive(prompter) => self.confirm_interactive(set, prompter),
            ConfirmMode::Checklist => self.confirm_checklist(set),
        }
    }

    /// Prompt for every candidate in order
    ///
    /// # Errors
    /// See [`ConfirmationLedger::confirm`]
    pub fn confirm_interactive(
        &self,
        set: &CandidateSet,
        prompter: &mut dyn DecisionPrompter,
    ) -> Result<ConfirmationRun, LedgerError> {
        if set.is_empty() {
            return Err(LedgerError::EmptyCandidateSet);
        }
        let hash = set.content_hash()?;
        let started_at = self.clock.now();
        let total = set.len();

        let mut entries = Vec::with_capacity(total);
        for (index, candidate) in set.candidates.iter().enumerate() {
            let verdict = match prompter.decide(index, total, candidate)? {
                Choice::Accept => Some(Verdict::Accepted),
                Choice::Reject => Some(Verdict::Rejected),
                Choice::Skip => None,
                Choice::Quit => {
                    debug!(remaining = total - index, "prompting stopped");
                    break;
                }
            };
            entries.push(ChecklistEntry {
                index,
                verdict,
                content: (verdict == Some(Verdict::Accepted)).then(|| candidate.content.clone()),
                edited: false,
            });
        }

        let run = self.assemble(set, hash, ConfirmationMode::Interactive, started_at, entries);
        self.record(run)
    }

    /// Parse the edited checklist and record its decisions
    ///
    /// # Errors
    /// See [`ConfirmationLedger::confirm`]
    pub fn confirm_checklist(&self, set: &CandidateSet) -> Result<ConfirmationRun, LedgerError> {
        if set.is_empty() {
            return Err(LedgerError::EmptyCandidateSet);
        }
        let hash = set.content_hash()?;
        let path = self.workspace.checklist_path();
        let text = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        let Some(found) = checklist::recorded_hash(&text) else {
            return Err(LedgerError::UnstampedChecklist { expected: hash });
        };
        if found.parse::<ContentHash>().ok() != Some(hash) {
            return Err(LedgerError::StaleChecklist {
                expected: hash,
                found,
            });
        }

        let started_at = self.clock.now();
        let validator = SchemaValidator::new()?;
        let entries = checklist::parse(&text, set, &validator).map_err(|e| {
            warn!(problems = e.errors.len(), "checklist rejected");
            e
        })?;

        let run = self.assemble(set, hash, ConfirmationMode::Checklist, started_at, entries);
        self.record(run)
    }

    fn assemble(
        &self,
        set: &CandidateSet,
        hash: ContentHash,
        mode: ConfirmationMode,
        started_at: DateTime<Utc>,
        entries: Vec<ChecklistEntry>,
    ) -> ConfirmationRun {
        let decided_at = self.clock.now();
        let mut decisions = Vec::new();
        let mut decided = vec![false; set.len()];

        for entry in entries {
            let (Some(verdict), Some(candidate)) = (entry.verdict, set.candidates.get(entry.index))
            else {
                continue;
            };
            decided[entry.index] = true;
            decisions.push(Decision {
                candidate_index: entry.index,
                section: candidate.section,
                verdict,
                content: entry.content.filter(|_: &Value| verdict == Verdict::Accepted),
                edited: entry.edited,
                original_confidence: candidate.confidence,
                evidence: candidate.evidence.clone(),
                decided_by: self.decided_by.clone(),
                decided_at,
            });
        }

        ConfirmationRun {
            run_id: Ulid::new(),
            mode,
            candidate_set_hash: hash,
            started_at,
            decisions,
            skipped: decided
                .iter()
                .enumerate()
                .filter_map(|(i, d)| (!d).then_some(i))
                .collect(),
        }
    }

    fn record(&self, run: ConfirmationRun) -> Result<ConfirmationRun, LedgerError> {
        if run.decisions.is_empty() {
            return Err(LedgerError::NoDecisions);
        }
        let mut ledger = self.load()?;
        ledger.push(run.clone());

        // rejected export first; a failed export leaves the ledger untouched
        self.export_rejected(&run)?;
        write_yaml_atomic(&self.workspace.confirmed_path(), &ledger)?;

        info!(
            run_id = %run.run_id,
            accepted = run.accepted().count(),
            rejected = run.rejected().count(),
            skipped = run.skipped.len(),
            runs = ledger.history().len(),
            "recorded confirmation run"
        );
        Ok(run)
    }

    fn export_rejected(&self, run: &ConfirmationRun) -> Result<(), StoreError> {
        let path = self.workspace.rejected_path();
        let rejected: Vec<Decision> = run.rejected().cloned().collect();
        if rejected.is_empty() {
            return match std::fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    Err(StoreError::Io { path, source: e })
                }
                _ => Ok(()),
            };
        }
        write_yaml_atomic(
            &path,
            &RejectedExport {
                run_id: run.run_id,
                candidate_set_hash: run.candidate_set_hash,
                rejected,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompter::LinePrompter;
    use pretty_assertions::assert_eq;
    use ripp_core::{Diagnose, ErrorKind, SectionName};
    use ripp_test_utils::{candidate_set, fixed_clock};

    fn ledger(dir: &std::path::Path) -> ConfirmationLedger {
        ConfirmationLedger::new(Workspace::new(dir))
            .with_clock(fixed_clock())
            .with_decider("alice")
    }

    fn set() -> CandidateSet {
        candidate_set(&[SectionName::Purpose, SectionName::UxFlow, SectionName::DataContracts])
    }

    #[test]
    fn missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ledger(dir.path()).load().unwrap();
        assert!(loaded.history().is_empty());
    }

    #[test]
    fn interactive_run_records_decisions_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompter = LinePrompter::new("a\nr\ns\n".as_bytes(), Vec::new());
        let run = ledger(dir.path())
            .confirm(&set(), ConfirmMode::Interactive(&mut prompter))
            .unwrap();

        assert_eq!(run.mode, ConfirmationMode::Interactive);
        assert_eq!(run.decisions.len(), 2);
        assert_eq!(run.skipped, vec![2]);
        assert_eq!(run.decisions[0].decided_by, "alice");
        assert!(run.decisions[0].content.is_some());
        assert!(run.decisions[1].content.is_none());
        assert_eq!(run.candidate_set_hash, set().content_hash().unwrap());
    }

    #[test]
    fn quitting_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompter = LinePrompter::new("a\nq\n".as_bytes(), Vec::new());
        let run = ledger(dir.path())
            .confirm_interactive(&set(), &mut prompter)
            .unwrap();
        assert_eq!(run.decisions.len(), 1);
        assert_eq!(run.skipped, vec![1, 2]);
    }

    #[test]
    fn no_decision_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompter = LinePrompter::new("s\ns\ns\n".as_bytes(), Vec::new());
        let ledger = ledger(dir.path());
        let err = ledger.confirm_interactive(&set(), &mut prompter).unwrap_err();
        assert!(matches!(err, LedgerError::NoDecisions));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!Workspace::new(dir.path()).confirmed_path().exists());
    }

    #[test]
    fn empty_set_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = ledger(dir.path())
            .write_checklist(&candidate_set(&[]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyCandidateSet));
    }

    #[test]
    fn stale_checklist_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        ledger.write_checklist(&set()).unwrap();
        let other = candidate_set(&[SectionName::Purpose]);
        let err = ledger.confirm_checklist(&other).unwrap_err();
        assert!(matches!(err, LedgerError::StaleChecklist { .. }), "{err:?}");
        assert!(err.hint().unwrap().contains("--checklist"));
    }

    #[test]
    fn rejected_export_tracks_the_current_run() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        let ws = Workspace::new(dir.path());

        let mut first = LinePrompter::new("r\na\na\n".as_bytes(), Vec::new());
        ledger.confirm_interactive(&set(), &mut first).unwrap();
        assert!(ws.rejected_path().exists());
        assert_eq!(ledger.rejected().unwrap().len(), 1);

        let mut second = LinePrompter::new("a\na\na\n".as_bytes(), Vec::new());
        ledger.confirm_interactive(&set(), &mut second).unwrap();
        assert!(!ws.rejected_path().exists());
        assert!(ledger.rejected().unwrap().is_empty());
        assert_eq!(ledger.load().unwrap().history().len(), 2);
    }
}
