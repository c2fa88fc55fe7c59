//! RIPP Compiler - canonical packet compilation
//!
//! Turns the current confirmation run into a canonical packet:
//! - Only accepted decisions contribute content
//! - The level is derived from the sections present, never asserted
//! - `provenance.generated_at` is the only non-deterministic field
//! - The packet is validated before anything is written
//!
//! # Example
//!
//! ```rust,no_run
//! use ripp_compiler::{BuildOptions, CanonicalCompiler};
//! use ripp_core::Workspace;
//!
//! # fn run() -> Result<(), ripp_compiler::CompileError> {
//! let compiler = CanonicalCompiler::new(Workspace::new("."))?;
//! let output = compiler.build(&BuildOptions::new("user-login", "User login"))?;
//! println!("level {} packet at {}", output.packet.level, output.packet_path.display());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod assemble;
pub mod compiler;
pub mod error;
pub mod summary;

pub use assemble::{accepted_sections, assemble, input_hash, BuildOptions, COMPILER_NAME};
pub use compiler::{CanonicalCompiler, CompileOutput};
pub use error::CompileError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
