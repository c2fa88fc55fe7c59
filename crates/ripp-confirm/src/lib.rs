//! RIPP Confirm - human confirmation of inferred intent
//!
//! Nothing inferred reaches a packet without a recorded human decision.
//! Two ways to collect decisions:
//! - Interactive prompts through any [`DecisionPrompter`]
//! - An editable Markdown checklist, re-parsed strictly block by block
//!
//! Every run is appended to the [`ConfirmationLedger`]; the newest run is
//! authoritative and earlier runs stay inspectable.
//!
//! # Example
//!
//! ```rust,no_run
//! use ripp_confirm::{ConfirmMode, ConfirmationLedger};
//! use ripp_core::Workspace;
//!
//! # fn run(set: &ripp_core::CandidateSet) -> Result<(), ripp_confirm::LedgerError> {
//! let ledger = ConfirmationLedger::new(Workspace::new("."));
//! ledger.write_checklist(set)?;
//! // ... a human ticks boxes in .ripp/intent.checklist.md ...
//! let run = ledger.confirm(set, ConfirmMode::Checklist)?;
//! println!("accepted {}", run.accepted().count());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod checklist;
pub mod error;
pub mod ledger;
pub mod prompter;

pub use checklist::ChecklistEntry;
pub use error::{BlockError, ChecklistError, LedgerError};
pub use ledger::{ConfirmMode, ConfirmationLedger, RejectedExport, DEFAULT_DECIDER};
pub use prompter::{Choice, DecisionPrompter, LinePrompter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
