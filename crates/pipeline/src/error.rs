use hotsplice_build::{AssembleError, CompileError, PathError, WriteError};
use hotsplice_loader::{LoadError, MergeError, SymbolNameError};
use thiserror::Error;

use crate::status::Stage;

/// Why a run failed. Each variant maps to the stage that reported it.
#[derive(Debug, Error)]
pub enum PipelineError {
	#[error(transparent)]
	Compile(#[from] CompileError),
	#[error(transparent)]
	Write(#[from] WriteError),
	#[error(transparent)]
	Assemble(#[from] AssembleError),
	#[error(transparent)]
	Merge(#[from] MergeError),
	#[error(transparent)]
	Load(#[from] LoadError),
	#[error("none of the {} requested symbols resolved", failures.len())]
	Unresolved { failures: Vec<LoadError> },
	#[error("{stage} worker failed: {message}")]
	Worker { stage: Stage, message: String },
}

/// Invalid [`crate::CompileRequest`] input, reported before anything runs.
#[derive(Debug, Error)]
pub enum RequestError {
	#[error("source identifier {0:?} has no usable file stem")]
	Identifier(String),
	#[error("no source given for {0}")]
	MissingSource(String),
	#[error(transparent)]
	Symbol(#[from] SymbolNameError),
	#[error(transparent)]
	FileName(#[from] PathError),
}

/// Invalid [`crate::PipelineBuilder`] configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{0} directory not configured")]
	MissingDirectory(&'static str),
	#[error(transparent)]
	Paths(#[from] PathError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
