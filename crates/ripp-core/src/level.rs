//! Conformance levels and the section groups they require
//!
//! A packet's level is derived from which section groups are present, never
//! asserted independently.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Packet section names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    /// Problem, solution and value
    Purpose,
    /// Ordered user interaction steps
    UxFlow,
    /// Input and output entities
    DataContracts,
    /// Endpoint definitions
    ApiContracts,
    /// Role requirements per action
    Permissions,
    /// Failure scenarios and handling
    FailureModes,
    /// Auditable events
    AuditEvents,
    /// Non-functional requirements
    Nfrs,
    /// Given/when/then verification
    AcceptanceTests,
}

impl SectionName {
    /// All sections in canonical order
    pub const ALL: [SectionName; 9] = [
        SectionName::Purpose,
        SectionName::UxFlow,
        SectionName::DataContracts,
        SectionName::ApiContracts,
        SectionName::Permissions,
        SectionName::FailureModes,
        SectionName::AuditEvents,
        SectionName::Nfrs,
        SectionName::AcceptanceTests,
    ];

    /// Wire name of the section
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SectionName::Purpose => "purpose",
            SectionName::UxFlow => "ux_flow",
            SectionName::DataContracts => "data_contracts",
            SectionName::ApiContracts => "api_contracts",
            SectionName::Permissions => "permissions",
            SectionName::FailureModes => "failure_modes",
            SectionName::AuditEvents => "audit_events",
            SectionName::Nfrs => "nfrs",
            SectionName::AcceptanceTests => "acceptance_tests",
        }
    }

    /// The lowest level that requires this section
    #[must_use]
    pub const fn introduced_at(self) -> Level {
        match self {
            SectionName::Purpose | SectionName::UxFlow | SectionName::DataContracts => Level::One,
            SectionName::ApiContracts | SectionName::Permissions | SectionName::FailureModes => {
                Level::Two
            }
            SectionName::AuditEvents | SectionName::Nfrs | SectionName::AcceptanceTests => {
                Level::Three
            }
        }
    }

    /// Human-readable title used in summaries and checklists
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            SectionName::Purpose => "Purpose",
            SectionName::UxFlow => "UX Flow",
            SectionName::DataContracts => "Data Contracts",
            SectionName::ApiContracts => "API Contracts",
            SectionName::Permissions => "Permissions",
            SectionName::FailureModes => "Failure Modes",
            SectionName::AuditEvents => "Audit Events",
            SectionName::Nfrs => "Non-Functional Requirements",
            SectionName::AcceptanceTests => "Acceptance Tests",
        }
    }
}

impl Display for SectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionName::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| LevelError::UnknownSection(s.to_string()))
    }
}

/// Conformance tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    /// Purpose, UX flow and data contracts
    One,
    /// Level one plus API contracts, permissions and failure modes
    Two,
    /// Level two plus audit events, NFRs and acceptance tests
    Three,
}

impl Level {
    /// All levels, lowest first
    pub const ALL: [Level; 3] = [Level::One, Level::Two, Level::Three];

    /// Numeric value
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
        }
    }

    /// Sections required at this level (cumulative)
    #[must_use]
    pub fn required_sections(self) -> Vec<SectionName> {
        SectionName::ALL
            .into_iter()
            .filter(|section| section.introduced_at() <= self)
            .collect()
    }

    /// Highest level whose required section set is fully present
    ///
    /// Returns `None` when even level one is incomplete.
    #[must_use]
    pub fn derive(is_present: impl Fn(SectionName) -> bool) -> Option<Level> {
        Level::ALL
            .into_iter()
            .take_while(|level| level.required_sections().into_iter().all(&is_present))
            .last()
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            other => Err(LevelError::OutOfRange(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.value()
    }
}

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| LevelError::NotANumber(s.to_string()))?;
        Level::try_from(value)
    }
}

/// Level and section name errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    /// Level outside 1..=3
    #[error("level must be 1, 2 or 3 (got {0})")]
    OutOfRange(u8),

    /// Level text is not numeric
    #[error("level must be numeric (got '{0}')")]
    NotANumber(String),

    /// Unknown section name
    #[error("unknown section '{0}'")]
    UnknownSection(String),
}
