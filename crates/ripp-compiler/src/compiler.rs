//! Write-after-validate packet emission

use crate::assemble::{assemble, BuildOptions};
use crate::error::CompileError;
use crate::summary;
use ripp_core::io::{read_yaml, write_atomic, write_yaml_atomic};
use ripp_core::{Clock, ConfirmationRun, IntentLedger, Packet, SystemClock, Workspace};
use ripp_schema::SchemaValidator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// What a successful build wrote
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// Compiled packet
    pub packet: Packet,
    /// `.ripp/output/<id>.ripp.yaml`
    pub packet_path: PathBuf,
    /// `.ripp/output/<id>.summary.md`
    pub summary_path: PathBuf,
}

/// Compiles confirmed intent into canonical packets
pub struct CanonicalCompiler {
    workspace: Workspace,
    validator: SchemaValidator,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CanonicalCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalCompiler")
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

impl CanonicalCompiler {
    /// Compiler for `workspace`
    ///
    /// # Errors
    /// Returns error if the embedded schema fails to compile
    pub fn new(workspace: Workspace) -> Result<Self, CompileError> {
        Ok(Self {
            workspace,
            validator: SchemaValidator::new()?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Override the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Assemble and validate without writing
    ///
    /// # Errors
    /// Returns error if assembly or validation fails
    pub fn compile(
        &self,
        run: &ConfirmationRun,
        options: &BuildOptions,
    ) -> Result<Packet, CompileError> {
        let packet = assemble(run, options, self.clock.as_ref())?;
        let report = self.validator.validate_packet(&packet)?;
        for finding in report.warnings() {
            warn!(%finding, "packet warning");
        }
        if !report.passed() {
            return Err(CompileError::Validation { report });
        }
        Ok(packet)
    }

    /// Compile the ledger's current run and write the packet and summary
    ///
    /// Nothing is written unless the packet validates.
    ///
    /// # Errors
    /// Returns error if the ledger is missing or empty, compilation fails,
    /// or a write fails
    pub fn build(&self, options: &BuildOptions) -> Result<CompileOutput, CompileError> {
        let ledger: IntentLedger = read_yaml(&self.workspace.confirmed_path())?;
        let run = ledger.current().ok_or(CompileError::NoConfirmedIntent)?;
        info!(run_id = %run.run_id, packet_id = %options.packet_id, "compiling packet");

        let packet = self.compile(run, options)?;
        self.emit(packet)
    }

    /// Write a validated packet and its summary
    fn emit(&self, packet: Packet) -> Result<CompileOutput, CompileError> {
        let packet_path = self.workspace.packet_path(&packet.packet_id);
        let summary_path = self.workspace.summary_path(&packet.packet_id);

        write_yaml_atomic(&packet_path, &packet)?;
        write_atomic(&summary_path, summary::render(&packet).as_bytes())?;

        info!(
            path = %self.workspace.relative(&packet_path),
            level = %packet.level,
            sections = packet.sections.len(),
            "wrote packet"
        );
        Ok(CompileOutput {
            packet,
            packet_path,
            summary_path,
        })
    }
}
