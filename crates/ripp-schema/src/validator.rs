//! Structural and level-conformance validation
//!
//! Validation runs in two phases:
//! 1. **Structural**: the embedded draft-7 schema checks required metadata,
//!    types, enums and formats; each violation becomes a path-addressed error.
//! 2. **Level conformance**: every section required by the declared level must
//!    be present. A missing section is an error, never a silent downgrade.
//!
//! Unknown top-level keys are ignored. The validator is pure: it reads the
//! value it is given and nothing else.

use crate::error::SchemaError;
use crate::finding::{Finding, ValidationReport};
use chrono::NaiveDate;
use jsonschema::{Draft, JSONSchema};
use ripp_core::{Level, Packet, SectionName};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// The packet schema, draft-07
pub const PACKET_SCHEMA: &str = include_str!("../schema/ripp-1.schema.json");

/// Compiled packet and per-section schemas
pub struct SchemaValidator {
    packet: JSONSchema,
    sections: BTreeMap<SectionName, JSONSchema>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn compile(schema: &Value) -> Result<JSONSchema, SchemaError> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| SchemaError::Compile(e.to_string()))
}

impl SchemaValidator {
    /// Compile the embedded schema
    ///
    /// # Errors
    /// Returns error if the embedded schema is invalid
    pub fn new() -> Result<Self, SchemaError> {
        let schema: Value = serde_json::from_str(PACKET_SCHEMA)?;
        let packet = compile(&schema)?;

        let definitions = schema.get("definitions").cloned().unwrap_or(Value::Null);
        let mut sections = BTreeMap::new();
        for section in SectionName::ALL {
            let name = section.as_str();
            let wrapper = json!({
                "type": "object",
                "properties": { name: { "$ref": format!("#/definitions/{name}") } },
                "required": [name],
                "definitions": definitions,
            });
            sections.insert(section, compile(&wrapper)?);
        }

        Ok(Self { packet, sections })
    }

    /// Validate a document
    ///
    /// `declared` overrides the document's own `level` field when given.
    #[must_use]
    pub fn validate(&self, document: &Value, declared: Option<Level>) -> ValidationReport {
        let mut findings = Vec::new();

        if let Err(errors) = self.packet.validate(document) {
            findings.extend(
                errors.map(|e| Finding::error(e.instance_path.to_string(), "schema", e.to_string())),
            );
        }
        findings.extend(check_dates(document));

        let document_level = level_field(document);
        let declared = declared.or(document_level);
        let computed = Level::derive(|s| section_present(document, s));

        if let (Some(imposed), Some(own)) = (declared, document_level) {
            if imposed != own {
                findings.push(Finding::warning(
                    "/level",
                    "level-mismatch",
                    format!("document declares level {own}, validating against level {imposed}"),
                ));
            }
        }

        if let Some(declared) = declared {
            for section in declared.required_sections() {
                if !section_present(document, section) {
                    findings.push(Finding::error(
                        format!("/{section}"),
                        "missing-section",
                        format!("level {declared} requires section `{section}`, which is missing"),
                    ));
                }
            }
            if let Some(computed) = computed.filter(|c| *c > declared) {
                findings.push(Finding::warning(
                    "/level",
                    "level-understated",
                    format!("sections satisfy level {computed} but level {declared} is declared"),
                ));
            }
        }

        tracing::debug!(
            findings = findings.len(),
            declared = ?declared,
            computed = ?computed,
            "validated document"
        );

        ValidationReport {
            findings,
            declared_level: declared,
            computed_level: computed,
        }
    }

    /// Validate a typed packet
    ///
    /// # Errors
    /// Returns error if the packet cannot be converted to a JSON value
    pub fn validate_packet(&self, packet: &Packet) -> Result<ValidationReport, serde_json::Error> {
        let value = serde_json::to_value(packet)?;
        Ok(self.validate(&value, Some(packet.level)))
    }

    /// Structural check of one section payload
    ///
    /// Paths are rooted at the section name, e.g. `/purpose/problem`.
    #[must_use]
    pub fn validate_section(&self, section: SectionName, content: &Value) -> Vec<Finding> {
        let Some(schema) = self.sections.get(&section) else {
            return Vec::new();
        };
        let wrapped = json!({ section.as_str(): content });
        let findings = match schema.validate(&wrapped) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| Finding::error(e.instance_path.to_string(), "schema", e.to_string()))
                .collect(),
        };
        findings
    }
}

fn level_field(document: &Value) -> Option<Level> {
    document
        .get("level")
        .and_then(Value::as_u64)
        .and_then(|n| u8::try_from(n).ok())
        .and_then(|n| Level::try_from(n).ok())
}

fn section_present(document: &Value, section: SectionName) -> bool {
    document
        .get(section.as_str())
        .is_some_and(|v| !v.is_null())
}

fn parse_date(document: &Value, field: &str) -> Option<Result<NaiveDate, String>> {
    let text = document.get(field)?.as_str()?;
    Some(NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| text.to_string()))
}

fn check_dates(document: &Value) -> Vec<Finding> {
    let mut findings = Vec::new();
    let created = parse_date(document, "created");
    let updated = parse_date(document, "updated");

    for (field, parsed) in [("created", &created), ("updated", &updated)] {
        if let Some(Err(text)) = parsed {
            findings.push(Finding::error(
                format!("/{field}"),
                "invalid-date",
                format!("{text:?} is not a calendar date (YYYY-MM-DD)"),
            ));
        }
    }
    if let (Some(Ok(created)), Some(Ok(updated))) = (created, updated) {
        if updated < created {
            findings.push(Finding::error(
                "/updated",
                "date-order",
                format!("updated {updated} is earlier than created {created}"),
            ));
        }
    }
    findings
}
