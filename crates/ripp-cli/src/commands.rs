//! Subcommand implementations
//!
//! Each returns the command's verdict. Stage errors are wrapped with
//! [`diagnosed`] so the binary can print their hint.

use crate::error::diagnosed;
use crate::Io;
use ripp_compiler::{BuildOptions, CanonicalCompiler};
use ripp_confirm::{ConfirmMode, ConfirmationLedger, LedgerError, LinePrompter, DEFAULT_DECIDER};
use ripp_core::{Level, RippConfig, Workspace};
use ripp_discovery::{
    ensure_ai_enabled, from_config, load_candidates, runtime_enabled_from_env, write_candidates,
    CandidateInferenceEngine, DiscoveryError, InferenceOptions,
};
use ripp_evidence::{load_pack, write_pack, EvidenceExtractor};
use ripp_schema::{load_document, Finding, LintEngine, SchemaValidator};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// `ripp evidence build`
///
/// # Errors
/// Returns error on bad settings, an unscannable root, or cancellation
pub async fn evidence_build(
    workspace: &Workspace,
    config: &RippConfig,
    out: &mut dyn Write,
    cancel: &CancellationToken,
) -> anyhow::Result<bool> {
    let pack = EvidenceExtractor::new(&config.evidence)
        .map_err(diagnosed)?
        .build(workspace.root(), cancel)
        .await
        .map_err(diagnosed)?;
    write_pack(workspace, &pack).map_err(diagnosed)?;

    writeln!(
        out,
        "indexed {} files ({:.1}% coverage, {} skipped), {} signals, pack {}",
        pack.stats.file_count,
        pack.stats.coverage_percent,
        pack.skipped.len(),
        pack.signals.total(),
        pack.pack_hash.short()
    )?;
    Ok(true)
}

/// Options of `ripp discover`
#[derive(Debug, Clone, Default)]
pub struct DiscoverArgs {
    /// `--enable-ai`
    pub enable_ai: bool,
    /// `--level`
    pub level: Option<Level>,
}

/// `ripp discover`
///
/// # Errors
/// Returns error when AI is not enabled on both halves, the pack is missing,
/// or inference fails
pub async fn discover(
    workspace: &Workspace,
    config: &RippConfig,
    args: &DiscoverArgs,
    out: &mut dyn Write,
    cancel: &CancellationToken,
) -> anyhow::Result<bool> {
    let runtime = args.enable_ai || runtime_enabled_from_env();
    ensure_ai_enabled(&config.ai, runtime).map_err(diagnosed)?;

    let pack = load_pack(workspace).map_err(|e| diagnosed(DiscoveryError::from(e)))?;
    let backend = from_config(&config.ai, workspace)
        .map_err(|e| diagnosed(DiscoveryError::from(e)))?;
    let engine =
        CandidateInferenceEngine::new(backend, &config.ai, &config.discovery).map_err(diagnosed)?;
    let target_level = args.level.unwrap_or(config.discovery.target_level);
    let set = engine
        .infer_intent(&pack, InferenceOptions { target_level }, cancel)
        .await
        .map_err(diagnosed)?;
    write_candidates(workspace, &set).map_err(|e| diagnosed(DiscoveryError::from(e)))?;

    writeln!(
        out,
        "{} candidates for level {target_level} after {} attempt(s); review with `ripp confirm`",
        set.len(),
        set.generated_by.attempts
    )?;
    Ok(true)
}

/// Options of `ripp confirm`
#[derive(Debug, Clone, Default)]
pub struct ConfirmArgs {
    /// `--checklist`
    pub checklist: bool,
    /// `--apply`
    pub apply: bool,
    /// `--decider`
    pub decider: Option<String>,
}

/// `ripp confirm`
///
/// # Errors
/// Returns error when there are no candidates, the checklist is stale or
/// malformed, or nothing was decided
pub fn confirm(workspace: &Workspace, args: &ConfirmArgs, io: Io<'_>) -> anyhow::Result<bool> {
    let set = load_candidates(workspace).map_err(|e| diagnosed(LedgerError::from(e)))?;
    let decider = args
        .decider
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| DEFAULT_DECIDER.to_string());
    let ledger = ConfirmationLedger::new(workspace.clone()).with_decider(decider);

    if args.checklist && !args.apply {
        let path = ledger.write_checklist(&set).map_err(diagnosed)?;
        writeln!(
            io.output,
            "wrote {}; tick one box per block, then run `ripp confirm --checklist --apply`",
            workspace.relative(&path)
        )?;
        return Ok(true);
    }

    let run = if args.apply {
        ledger.confirm(&set, ConfirmMode::Checklist)
    } else {
        let mut prompter = LinePrompter::new(&mut *io.input, &mut *io.output);
        ledger.confirm(&set, ConfirmMode::Interactive(&mut prompter))
    }
    .map_err(diagnosed)?;

    writeln!(
        io.output,
        "run {}: {} accepted, {} rejected, {} skipped",
        run.run_id,
        run.accepted().count(),
        run.rejected().count(),
        run.skipped.len()
    )?;
    Ok(true)
}

/// Options of `ripp build`
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    /// `--id`
    pub id: String,
    /// `--title`
    pub title: String,
    /// `--min-level`
    pub min_level: Option<Level>,
}

/// `ripp build`
///
/// # Errors
/// Returns error when there is nothing confirmed or the packet fails
/// validation; nothing is written in either case
pub fn build(workspace: &Workspace, args: &BuildArgs, out: &mut dyn Write) -> anyhow::Result<bool> {
    let mut options = BuildOptions::new(args.id.clone(), args.title.clone());
    if let Some(level) = args.min_level {
        options = options.with_min_level(level);
    }
    let output = CanonicalCompiler::new(workspace.clone())
        .map_err(diagnosed)?
        .build(&options)
        .map_err(diagnosed)?;

    writeln!(
        out,
        "level {} packet with {} sections written to {} (summary {})",
        output.packet.level,
        output.packet.sections.len(),
        workspace.relative(&output.packet_path),
        workspace.relative(&output.summary_path)
    )?;
    Ok(true)
}

/// `ripp validate`
///
/// # Errors
/// Returns error when the document cannot be loaded
pub fn validate(
    path: &Path,
    level: Option<Level>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let document = load_document(path).map_err(diagnosed)?;
    let report = SchemaValidator::new()
        .map_err(diagnosed)?
        .validate(&document, level);
    let passed = report.passed();
    print_report(out, &report, &report.findings, passed, json)?;
    Ok(passed)
}

/// `ripp lint`
///
/// # Errors
/// Returns error when the document cannot be loaded
pub fn lint(path: &Path, strict: bool, json: bool, out: &mut dyn Write) -> anyhow::Result<bool> {
    let document = load_document(path).map_err(diagnosed)?;
    let report = LintEngine::new().strict(strict).lint(&document);
    let passed = report.passed();
    print_report(out, &report, &report.findings, passed, json)?;
    Ok(passed)
}

fn print_report<T: Serialize>(
    out: &mut dyn Write,
    report: &T,
    findings: &[Finding],
    passed: bool,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        return Ok(());
    }
    for finding in findings {
        writeln!(out, "{finding}")?;
    }
    let errors = findings.iter().filter(|f| f.is_error()).count();
    let warnings = findings.len() - errors;
    let verdict = if passed { "PASS" } else { "FAIL" };
    writeln!(out, "{verdict} ({errors} errors, {warnings} warnings)")?;
    Ok(())
}
