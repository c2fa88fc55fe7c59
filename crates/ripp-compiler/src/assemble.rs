//! Pure packet assembly
//!
//! Everything here is a function of the confirmation run, the caller's
//! options and the clock. The clock feeds only `provenance.generated_at`.

use crate::error::CompileError;
use ripp_core::{
    Clock, ConfirmationRun, ContentHash, Decision, Level, Packet, Provenance, SectionName, Status,
    RIPP_VERSION,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Name stamped into provenance
pub const COMPILER_NAME: &str = concat!("ripp-compiler ", env!("CARGO_PKG_VERSION"));

/// Caller-supplied packet metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Kebab-case packet identifier
    pub packet_id: String,
    /// Feature title
    pub title: String,
    /// Fail when the derived level is lower
    pub min_level: Option<Level>,
}

impl BuildOptions {
    /// Options without a level floor
    pub fn new(packet_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            packet_id: packet_id.into(),
            title: title.into(),
            min_level: None,
        }
    }

    /// Require at least `level`
    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = Some(level);
        self
    }

    fn check(&self) -> Result<(), CompileError> {
        let kebab = self.packet_id.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        });
        if !kebab {
            return Err(CompileError::InvalidOption {
                field: "identifier",
                reason: format!("`{}` is not kebab-case", self.packet_id),
            });
        }
        if self.title.trim().is_empty() {
            return Err(CompileError::InvalidOption {
                field: "title",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Accepted decisions keyed by section, rejecting duplicates
///
/// # Errors
/// Returns [`CompileError::DuplicateSection`] on a second accepted decision
/// for one section
pub fn accepted_sections(
    run: &ConfirmationRun,
) -> Result<BTreeMap<SectionName, &Decision>, CompileError> {
    let mut sections: BTreeMap<SectionName, &Decision> = BTreeMap::new();
    for decision in run.accepted() {
        if let Some(first) = sections.insert(decision.section, decision) {
            return Err(CompileError::DuplicateSection {
                section: decision.section,
                first: first.candidate_index,
                second: decision.candidate_index,
            });
        }
    }
    Ok(sections)
}

/// Hash over the accepted `(section, content)` pairs in canonical order
///
/// # Errors
/// Returns error if the content cannot be serialized
pub fn input_hash(accepted: &BTreeMap<SectionName, &Decision>) -> Result<ContentHash, CompileError> {
    let pairs: Vec<(&str, &Value)> = SectionName::ALL
        .iter()
        .filter_map(|s| {
            let content = accepted.get(s)?.content.as_ref()?;
            Some((s.as_str(), content))
        })
        .collect();
    Ok(ContentHash::compute_serializable(&pairs)?)
}

/// Assemble a packet from the accepted decisions of `run`
///
/// Rejected decisions are never read. The result is not yet validated.
///
/// # Errors
/// Returns error on bad options, duplicate sections, or a derived level
/// below level one or `options.min_level`
pub fn assemble(
    run: &ConfirmationRun,
    options: &BuildOptions,
    clock: &dyn Clock,
) -> Result<Packet, CompileError> {
    options.check()?;
    let accepted = accepted_sections(run)?;
    if accepted.is_empty() {
        return Err(CompileError::NothingAccepted);
    }

    let present = |s: SectionName| accepted.get(&s).is_some_and(|d| d.content.is_some());
    let missing_for = |level: Level| -> Vec<SectionName> {
        level
            .required_sections()
            .into_iter()
            .filter(|s| !present(*s))
            .collect()
    };

    let Some(level) = Level::derive(present) else {
        return Err(CompileError::BelowLevelOne {
            missing: missing_for(Level::One),
        });
    };
    if let Some(required) = options.min_level.filter(|min| *min > level) {
        return Err(CompileError::LevelTooLow {
            derived: level,
            required,
            missing: missing_for(required),
        });
    }

    let sections: BTreeMap<String, Value> = accepted
        .iter()
        .filter_map(|(section, decision)| {
            decision
                .content
                .clone()
                .map(|content| (section.as_str().to_string(), content))
        })
        .collect();

    let dates = accepted.values().map(|d| d.decided_at.date_naive());
    let created = dates.clone().min().unwrap_or_else(|| run.started_at.date_naive());
    let updated = dates.max().unwrap_or(created);

    Ok(Packet {
        ripp_version: RIPP_VERSION.to_string(),
        packet_id: options.packet_id.clone(),
        title: options.title.trim().to_string(),
        created,
        updated,
        status: Status::Draft,
        level,
        sections,
        provenance: Some(Provenance {
            compiler: COMPILER_NAME.to_string(),
            input_hash: input_hash(&accepted)?,
            generated_at: clock.now(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use ripp_core::{ConfirmationMode, FixedClock, Verdict};
    use ripp_test_utils::{fixed_clock, fixed_time, section_content};

    fn decision(index: usize, section: SectionName, verdict: Verdict) -> Decision {
        Decision {
            candidate_index: index,
            section,
            verdict,
            content: (verdict == Verdict::Accepted).then(|| section_content(section)),
            edited: false,
            original_confidence: ripp_core::Confidence::clamped(0.8),
            evidence: vec![],
            decided_by: "alice".into(),
            decided_at: fixed_time(),
        }
    }

    fn run(decisions: Vec<Decision>) -> ConfirmationRun {
        ConfirmationRun {
            run_id: ulid::Ulid::new(),
            mode: ConfirmationMode::Interactive,
            candidate_set_hash: ContentHash::compute(b"set"),
            started_at: fixed_time(),
            decisions,
            skipped: vec![],
        }
    }

    fn level_one() -> Vec<Decision> {
        Level::One
            .required_sections()
            .into_iter()
            .enumerate()
            .map(|(i, s)| decision(i, s, Verdict::Accepted))
            .collect()
    }

    fn options() -> BuildOptions {
        BuildOptions::new("user-login", "User login")
    }

    #[test]
    fn accepted_sections_become_a_level_one_packet() {
        let packet = assemble(&run(level_one()), &options(), fixed_clock().as_ref()).unwrap();
        assert_eq!(packet.level, Level::One);
        assert_eq!(packet.status, Status::Draft);
        assert_eq!(packet.present_sections(), Level::One.required_sections());
        assert_eq!(packet.created, fixed_time().date_naive());
        let provenance = packet.provenance.unwrap();
        assert_eq!(provenance.compiler, COMPILER_NAME);
        assert_eq!(provenance.generated_at, fixed_time());
    }

    #[test]
    fn rejected_sections_are_not_read() {
        let mut decisions = level_one();
        decisions.push(decision(3, SectionName::Permissions, Verdict::Rejected));
        let packet = assemble(&run(decisions), &options(), fixed_clock().as_ref()).unwrap();
        assert!(packet.section(SectionName::Permissions).is_none());
    }

    #[test]
    fn duplicate_accepted_section_is_a_conflict() {
        let mut decisions = level_one();
        decisions.push(decision(7, SectionName::Purpose, Verdict::Accepted));
        let err = assemble(&run(decisions), &options(), fixed_clock().as_ref()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateSection { section: SectionName::Purpose, first: 0, second: 7 }
        ));
    }

    #[test]
    fn incomplete_level_one_aborts() {
        let decisions = vec![decision(0, SectionName::Purpose, Verdict::Accepted)];
        let err = assemble(&run(decisions), &options(), fixed_clock().as_ref()).unwrap_err();
        match err {
            CompileError::BelowLevelOne { missing } => {
                assert_eq!(missing, vec![SectionName::UxFlow, SectionName::DataContracts]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn min_level_is_enforced() {
        let opts = options().with_min_level(Level::Two);
        let err = assemble(&run(level_one()), &opts, fixed_clock().as_ref()).unwrap_err();
        match err {
            CompileError::LevelTooLow { derived, required, missing } => {
                assert_eq!(derived, Level::One);
                assert_eq!(required, Level::Two);
                assert_eq!(missing.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_identifier_is_rejected_before_assembly() {
        for id in ["User-Login", "user--login", "-user", "", "user_login"] {
            let opts = BuildOptions::new(id, "User login");
            let err = assemble(&run(level_one()), &opts, fixed_clock().as_ref()).unwrap_err();
            assert!(matches!(err, CompileError::InvalidOption { field: "identifier", .. }), "{id}");
        }
    }

    #[test]
    fn dates_span_the_decisions() {
        let mut decisions = level_one();
        decisions[1].decided_at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let packet = assemble(&run(decisions), &options(), fixed_clock().as_ref()).unwrap();
        assert_eq!(packet.created.to_string(), "2024-05-01");
        assert_eq!(packet.updated.to_string(), "2024-06-03");
    }

    proptest! {
        #[test]
        fn only_generated_at_depends_on_the_clock(a in 0i64..4_000_000_000, b in 0i64..4_000_000_000) {
            let input = run(level_one());
            let at = |secs| FixedClock(DateTime::<Utc>::from_timestamp(secs, 0).unwrap());
            let first = assemble(&input, &options(), &at(a)).unwrap();
            let second = assemble(&input, &options(), &at(b)).unwrap();
            prop_assert_eq!(first.masked(), second.masked());
        }

        #[test]
        fn input_hash_ignores_decision_order(swap in any::<bool>()) {
            let mut decisions = level_one();
            if swap {
                decisions.reverse();
            }
            let accepted = run(decisions);
            let hash = input_hash(&accepted_sections(&accepted).unwrap()).unwrap();
            let baseline = input_hash(&accepted_sections(&run(level_one())).unwrap()).unwrap();
            prop_assert_eq!(hash, baseline);
        }
    }
}
