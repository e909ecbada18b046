// Build stages report through tracing and return values, never stderr.
#![deny(clippy::print_stderr)]

//! Source compilation and module assembly.
//!
//! This crate turns a source unit into a loadable native module:
//!
//! * [`paths`]: validated artifact, module and scratch directories
//! * [`compile`]: the [`SourceCompiler`] collaborator and its C compiler driver
//! * [`write`]: persisting an in-memory object image to the artifact directory
//! * [`assemble`]: the [`ModuleAssembler`] collaborator and the staleness/cleanup
//!   rules around it
//!
//! Each stage has its own error type so callers can report them independently.

pub mod assemble;
pub mod compile;
pub mod diagnostic;
mod error;
pub mod paths;
pub mod source;
mod tool;
pub mod write;

pub use assemble::{AssembleOptions, LinkAssembler, ModuleAssembler, assemble_module};
pub use compile::{CcCompiler, SourceCompiler};
pub use diagnostic::{Diagnostic, Severity, parse_diagnostics};
pub use error::{AssembleError, CompileError, PathError, WriteError};
pub use paths::{ArtifactPaths, BYTECODE_EXTENSIONS, MODULE_EXTENSIONS, check_extension, library_extension, object_extension};
pub use source::{BytecodeUnit, SourceEncoding, SourceInput, SourceUnit};
pub use tool::find_c_compiler;
pub use write::persist;
