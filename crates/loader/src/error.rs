use std::path::PathBuf;

use thiserror::Error;

/// Failure to splice a module into a loader element list.
///
/// A merge that fails leaves the target list exactly as it was.
#[derive(Debug, Error)]
pub enum MergeError {
	/// The incoming module exposes no elements, so it has no representative identity.
	#[error("module has no loadable elements")]
	EmptyModule,
	/// An element's underlying module identity could not be read.
	#[error("{list} element {index} has no readable module identity")]
	MissingIdentity { list: &'static str, index: usize },
	/// The incoming module could not be opened.
	#[error("cannot open module to merge: {0}")]
	Open(#[source] LoadError),
	/// The loader state could not be read or written.
	#[error("host loader state inaccessible: {0}")]
	Inaccessible(String),
}

/// Failure to open a module or resolve a symbol from it.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("module file not found: {}", .0.display())]
	ModuleMissing(PathBuf),
	#[error("failed to open module {}: {message}", path.display())]
	Open { path: PathBuf, message: String },
	#[error("symbol {symbol} not found in {searched}")]
	SymbolNotFound { symbol: String, searched: String },
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl LoadError {
	/// Name of the unresolved symbol, for per-name failures.
	pub fn symbol(&self) -> Option<&str> {
		match self {
			Self::SymbolNotFound { symbol, .. } => Some(symbol),
			_ => None,
		}
	}
}
