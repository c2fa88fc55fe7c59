//! Canonical packet document
//!
//! The typed view of a compiled packet. Section payloads stay as JSON values
//! so unknown sections survive a load/save cycle untouched.

use crate::hash::ContentHash;
use crate::level::{Level, SectionName};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Protocol version written into every packet
pub const RIPP_VERSION: &str = "1.0";

/// Lifecycle status of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Being written
    Draft,
    /// Signed off
    Approved,
    /// Shipped
    Implemented,
    /// Retired
    Deprecated,
}

/// Compiler provenance block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Compiler name and version
    pub compiler: String,
    /// Hash of the accepted decisions that produced the packet
    pub input_hash: ContentHash,
    /// Wall-clock time of generation
    ///
    /// The only field that differs between two compilations of the same input.
    pub generated_at: DateTime<Utc>,
}

/// A canonical packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Protocol version
    pub ripp_version: String,
    /// Kebab-case identifier
    pub packet_id: String,
    /// Feature title
    pub title: String,
    /// Creation date
    pub created: NaiveDate,
    /// Last update date
    pub updated: NaiveDate,
    /// Lifecycle status
    pub status: Status,
    /// Derived conformance level
    pub level: Level,
    /// Section payloads keyed by wire name
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
    /// Compiler provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Packet {
    /// Get a known section payload
    #[inline]
    #[must_use]
    pub fn section(&self, name: SectionName) -> Option<&Value> {
        self.sections.get(name.as_str())
    }

    /// Known sections present in this packet, canonical order
    #[must_use]
    pub fn present_sections(&self) -> Vec<SectionName> {
        SectionName::ALL
            .into_iter()
            .filter(|s| self.sections.contains_key(s.as_str()))
            .collect()
    }

    /// Level derived from present sections
    #[must_use]
    pub fn derived_level(&self) -> Option<Level> {
        Level::derive(|s| self.sections.contains_key(s.as_str()))
    }

    /// Copy with the provenance timestamp zeroed
    ///
    /// Used to compare two compilations of the same input.
    #[must_use]
    pub fn masked(&self) -> Packet {
        let mut copy = self.clone();
        if let Some(provenance) = copy.provenance.as_mut() {
            provenance.generated_at = DateTime::<Utc>::default();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn packet() -> Packet {
        let mut sections = BTreeMap::new();
        sections.insert("purpose".to_string(), json!({"problem": "p"}));
        sections.insert("x_custom".to_string(), json!(true));
        Packet {
            ripp_version: RIPP_VERSION.to_string(),
            packet_id: "user-login".to_string(),
            title: "User login".to_string(),
            created: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            updated: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            status: Status::Draft,
            level: Level::One,
            sections,
            provenance: None,
        }
    }

    #[test]
    fn unknown_sections_survive_round_trip() {
        let original = packet();
        let yaml = serde_yaml::to_string(&original).unwrap();
        let decoded: Packet = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(decoded, original);
        assert!(yaml.contains("x_custom"));
        assert!(yaml.contains("2024-01-02"));
    }

    #[test]
    fn present_sections_skip_unknown() {
        assert_eq!(packet().present_sections(), vec![SectionName::Purpose]);
        assert_eq!(packet().derived_level(), None);
    }

    #[test]
    fn masked_zeroes_only_timestamp() {
        let mut p = packet();
        p.provenance = Some(Provenance {
            compiler: "c".into(),
            input_hash: ContentHash::compute(b"x"),
            generated_at: Utc::now(),
        });
        let masked = p.masked();
        let prov = masked.provenance.as_ref().unwrap();
        assert_eq!(prov.generated_at, DateTime::<Utc>::default());
        assert_eq!(prov.input_hash, ContentHash::compute(b"x"));
    }
}
