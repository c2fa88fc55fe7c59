//! Confirmed intent: the human-curated decision ledger
//!
//! Each confirmation run appends a [`ConfirmationRun`]; earlier runs remain
//! in the ledger and stay inspectable. The newest run is authoritative.

use crate::candidate::{Confidence, EvidenceRef};
use crate::hash::ContentHash;
use crate::level::SectionName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// Ledger format version
pub const LEDGER_VERSION: &str = "1.0";

/// Outcome of a human decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Content may be compiled
    Accepted,
    /// Content must never be compiled
    Rejected,
}

/// How a run collected decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Per-candidate prompts
    Interactive,
    /// Edited checklist artifact
    Checklist,
}

/// A decision over one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Position of the candidate in its set
    pub candidate_index: usize,
    /// Section the candidate targets
    pub section: SectionName,
    /// Accept or reject
    pub verdict: Verdict,
    /// Content snapshot; present only when accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Whether the human changed the payload before accepting
    #[serde(default)]
    pub edited: bool,
    /// Confidence the backend reported
    pub original_confidence: Confidence,
    /// Evidence carried over from the candidate
    pub evidence: Vec<EvidenceRef>,
    /// Decider identity
    pub decided_by: String,
    /// Decision time
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// Whether this decision admits content into a packet
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }
}

/// One confirmation run (a confirmed intent set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRun {
    /// Run identifier
    pub run_id: Ulid,
    /// Collection mode
    pub mode: ConfirmationMode,
    /// Hash of the candidate set decided over
    pub candidate_set_hash: ContentHash,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Recorded decisions, in candidate order
    pub decisions: Vec<Decision>,
    /// Candidate indexes left undecided
    #[serde(default)]
    pub skipped: Vec<usize>,
}

impl ConfirmationRun {
    /// Accepted decisions
    pub fn accepted(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| d.is_accepted())
    }

    /// Rejected decisions
    pub fn rejected(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| !d.is_accepted())
    }
}

/// Append-only history of confirmation runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentLedger {
    /// Format version
    pub version: String,
    /// Runs, oldest first
    pub runs: Vec<ConfirmationRun>,
}

impl Default for IntentLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION.to_string(),
            runs: Vec::new(),
        }
    }
}

impl IntentLedger {
    /// Newest run, which supersedes every earlier one
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&ConfirmationRun> {
        self.runs.last()
    }

    /// All runs, oldest first
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[ConfirmationRun] {
        &self.runs
    }

    /// Look up a run by id
    #[must_use]
    pub fn run(&self, run_id: Ulid) -> Option<&ConfirmationRun> {
        self.runs.iter().find(|r| r.run_id == run_id)
    }

    /// Append a run; earlier runs are retained
    pub fn push(&mut self, run: ConfirmationRun) {
        self.runs.push(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decision(verdict: Verdict) -> Decision {
        Decision {
            candidate_index: 0,
            section: SectionName::Purpose,
            verdict,
            content: (verdict == Verdict::Accepted).then(|| json!({"problem": "x"})),
            edited: false,
            original_confidence: Confidence::clamped(0.8),
            evidence: vec![],
            decided_by: "alice".into(),
            decided_at: DateTime::<Utc>::default(),
        }
    }

    fn run(decisions: Vec<Decision>) -> ConfirmationRun {
        ConfirmationRun {
            run_id: Ulid::new(),
            mode: ConfirmationMode::Interactive,
            candidate_set_hash: ContentHash::default(),
            started_at: DateTime::<Utc>::default(),
            decisions,
            skipped: vec![],
        }
    }

    #[test]
    fn newer_run_supersedes_but_keeps_history() {
        let mut ledger = IntentLedger::default();
        let first = run(vec![decision(Verdict::Accepted)]);
        let first_id = first.run_id;
        ledger.push(first);
        ledger.push(run(vec![decision(Verdict::Rejected)]));

        assert_eq!(ledger.history().len(), 2);
        assert_eq!(ledger.current().unwrap().accepted().count(), 0);
        assert_eq!(ledger.run(first_id).unwrap().accepted().count(), 1);
    }

    #[test]
    fn rejected_decision_has_no_content_on_disk() {
        let yaml = serde_yaml::to_string(&decision(Verdict::Rejected)).unwrap();
        assert!(!yaml.contains("content"));
    }
}
