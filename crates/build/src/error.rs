use std::path::PathBuf;

use thiserror::Error;

/// Invalid directory or file-name configuration.
#[derive(Debug, Error)]
pub enum PathError {
	#[error("path must be absolute: {}", .0.display())]
	NotAbsolute(PathBuf),
	#[error("not an existing directory: {}", .0.display())]
	NotADirectory(PathBuf),
	#[error("artifact and module directories must differ: {}", .0.display())]
	SameDirectory(PathBuf),
	#[error("scratch directory must not be shared with artifacts or modules: {}", .0.display())]
	ScratchShared(PathBuf),
	#[error("{name:?} must end with exactly one of: {accepted}")]
	BadExtension { name: String, accepted: String },
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Failure of the source-to-object stage.
#[derive(Debug, Error)]
pub enum CompileError {
	/// The source has errors. Location is that of the first reported error.
	#[error("compilation failed: {message}{}", location_suffix(.file, .line, .column))]
	Rejected {
		message: String,
		file: Option<String>,
		line: Option<u32>,
		column: Option<u32>,
	},
	#[error("no C compiler found; install clang/gcc or set CC")]
	CompilerNotFound,
	#[error("compiler configuration failed: {0}")]
	Configure(#[from] cc::Error),
	#[error("failed to run compiler {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},
	#[error("source file {} is not valid {encoding}", path.display())]
	Decode { path: PathBuf, encoding: &'static str },
	#[error("compiler produced no object for unit {0}")]
	NoOutput(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

fn location_suffix(file: &Option<String>, line: &Option<u32>, column: &Option<u32>) -> String {
	match (file, line, column) {
		(Some(file), Some(line), Some(column)) => format!(" ({file}:{line}:{column})"),
		(Some(file), Some(line), None) => format!(" ({file}:{line})"),
		(Some(file), None, _) => format!(" ({file})"),
		_ => String::new(),
	}
}

/// Failure to persist an object image.
#[derive(Debug, Error)]
pub enum WriteError {
	#[error("no compiled unit to write")]
	NoUnits,
	#[error("failed to write {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Failure of the object-to-module stage.
#[derive(Debug, Error)]
pub enum AssembleError {
	#[error("no input objects given")]
	NoInputs,
	#[error("input object not found: {}", .0.display())]
	MissingInput(PathBuf),
	#[error("failed to run {tool}: {source}")]
	Spawn {
		tool: String,
		#[source]
		source: std::io::Error,
	},
	#[error("{tool} failed ({}): {stderr}", exit_label(.status))]
	Tool { tool: String, status: Option<i32>, stderr: String },
	#[error("assembly succeeded but module not found at {}", .0.display())]
	MissingOutput(PathBuf),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

fn exit_label(status: &Option<i32>) -> String {
	match status {
		Some(code) => format!("exit code {code}"),
		None => "terminated by signal".to_string(),
	}
}
