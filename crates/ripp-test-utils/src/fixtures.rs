//! Section contents, candidate responses and time fixtures
//!
//! Every section payload here passes structural validation, clears the
//! default quality threshold and lints clean.

use chrono::{DateTime, TimeZone, Utc};
use ripp_core::{
    Candidate, CandidateSet, ContentHash, EvidencePack, EvidenceRef, EvidenceStats, FileCategory,
    FileEntry, FixedClock, GeneratedBy, Level, RouteSignal, SectionName, SignalGroups,
    CANDIDATE_SET_VERSION, EVIDENCE_PACK_VERSION,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// 2024-05-01T12:00:00Z
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(fixed_time()))
}

/// Valid, lint-clean content for `section`
pub fn section_content(section: SectionName) -> Value {
    match section {
        SectionName::Purpose => json!({
            "problem": "Shoppers lose their saved lists when they switch devices",
            "solution": "Email and password accounts that own the saved lists",
            "value": "Lists follow the shopper across phone and desktop",
            "out_of_scope": "Social login providers"
        }),
        SectionName::UxFlow => json!([
            {"step": 1, "actor": "Shopper", "action": "Submits email and password on the login form", "result": "Session cookie is issued"},
            {"step": 2, "actor": "Shopper", "action": "Opens the saved lists page", "result": "Lists owned by the account are shown"}
        ]),
        SectionName::DataContracts => json!({
            "inputs": [{
                "name": "Credentials",
                "description": "Login form submission",
                "fields": [
                    {"name": "email", "type": "string", "required": true, "description": "Account email"},
                    {"name": "password", "type": "string", "required": true, "description": "Plain password, never stored"}
                ]
            }],
            "outputs": [{
                "name": "Session",
                "description": "Authenticated session",
                "fields": [
                    {"name": "user_id", "type": "string", "required": true, "description": "Owner of the session"}
                ]
            }]
        }),
        SectionName::ApiContracts => json!([{
            "endpoint": "/login",
            "method": "POST",
            "purpose": "Authenticate a shopper and start a session",
            "request": {"schema": "Credentials"},
            "response": {"schema": "Session", "status": 200}
        }]),
        SectionName::Permissions => json!([
            {"action": "read saved lists", "required_roles": ["shopper"], "description": "Only the owner sees a list"}
        ]),
        SectionName::FailureModes => json!([{
            "scenario": "POST /login with a wrong password",
            "impact": "Shopper cannot reach saved lists",
            "handling": "Respond 401 and count the failed attempt",
            "user_message": "Email or password is incorrect"
        }]),
        SectionName::AuditEvents => json!([
            {"event": "login.failed", "severity": "warn", "includes": ["email", "ip"], "purpose": "Detect credential stuffing"}
        ]),
        SectionName::Nfrs => json!({
            "performance": {"login_p95_ms": 300},
            "security": {"password_hash": "bcrypt cost 12"}
        }),
        SectionName::AcceptanceTests => json!([{
            "title": "Valid login",
            "given": "a registered shopper",
            "when": "they POST /login with correct credentials",
            "then": "the response is 200 and sets a session cookie",
            "verification": "integration test against the login route"
        }]),
    }
}

/// Raw candidate JSON as a backend would return it
pub fn candidate_json(section: SectionName, confidence: f64) -> Value {
    json!({
        "section": section.as_str(),
        "confidence": confidence,
        "evidence": [{"file": "src/app.js", "line": 4, "snippet": "app.post('/login', ...)"}],
        "content": section_content(section)
    })
}

/// Response text covering `sections`, each at confidence 0.9
pub fn response_for(sections: &[SectionName]) -> String {
    let candidates: Vec<Value> = sections.iter().map(|s| candidate_json(*s, 0.9)).collect();
    json!({ "candidates": candidates }).to_string()
}

/// Response text covering every section `level` requires
pub fn response_for_level(level: Level) -> String {
    response_for(&level.required_sections())
}

/// Typed candidate set over `sections`
pub fn candidate_set(sections: &[SectionName]) -> CandidateSet {
    CandidateSet {
        version: CANDIDATE_SET_VERSION.to_string(),
        created: fixed_time(),
        generated_by: GeneratedBy {
            provider: "scripted".into(),
            model: "fixture".into(),
            evidence_pack_hash: ContentHash::compute(b"fixture pack"),
            target_level: Level::One,
            attempts: 1,
        },
        candidates: sections
            .iter()
            .map(|s| {
                Candidate::new(
                    *s,
                    0.8,
                    vec![EvidenceRef {
                        file: "src/app.js".into(),
                        line: 4,
                        snippet: None,
                    }],
                    section_content(*s),
                )
            })
            .collect(),
    }
}

/// Small pack with one route, indexing only `src/app.js`
pub fn evidence_pack() -> EvidencePack {
    let source = b"const express = require('express');\nconst app = express();\n\napp.post('/login', login);\n";
    EvidencePack {
        version: EVIDENCE_PACK_VERSION.to_string(),
        created: fixed_time(),
        pack_hash: ContentHash::compute(b"fixture pack"),
        stats: EvidenceStats {
            file_count: 1,
            total_size: source.len() as u64,
            tracked_file_count: 1,
            coverage_percent: 100.0,
            ..EvidenceStats::default()
        },
        files: vec![FileEntry {
            path: "src/app.js".into(),
            hash: ContentHash::compute(source),
            size: source.len() as u64,
            lines: 4,
            category: FileCategory::Route,
        }],
        signals: SignalGroups {
            routes: vec![RouteSignal {
                file: "src/app.js".into(),
                line: 4,
                method: Some("POST".into()),
                path: "/login".into(),
                framework: "express".into(),
                snippet: "app.post('/login', login);".into(),
                redacted: false,
            }],
            ..SignalGroups::default()
        },
        skipped: Vec::new(),
    }
}
