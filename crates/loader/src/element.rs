//! Module elements: the units a loader searches when resolving a symbol.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::LoadError;
use crate::identity::ModuleIdentity;
use crate::symbol::{SymbolAddress, SymbolHandle, SymbolName};

/// One searchable entry of a loader's element list.
///
/// Implemented per host platform. The merge and resolution algorithms only rely on
/// an element answering lookups and naming the module file it came from.
pub trait ModuleElement: Send + Sync + fmt::Debug {
	/// Identity of the module file backing this element, if readable.
	fn identity(&self) -> Option<&ModuleIdentity>;

	/// Looks up one symbol in this element only.
	fn find(&self, symbol: &SymbolName) -> Option<SymbolAddress>;
}

/// Shared reference to an element. Lists hold these so a published list can be
/// rebuilt without reopening modules.
pub type ElementRef = Arc<dyn ModuleElement>;

/// Resolves `symbol` against `elements` in order; the first element that answers wins.
pub fn resolve_first(elements: &[ElementRef], symbol: &SymbolName) -> Option<SymbolHandle> {
	elements
		.iter()
		.find_map(|element| element.find(symbol).map(|addr| SymbolHandle::new(symbol.clone(), addr, Arc::clone(element))))
}

/// A module opened on its own: the module-scoped loader.
///
/// Lookups only see this module's elements, never the host's.
#[derive(Debug)]
pub struct LoadedModule {
	identity: ModuleIdentity,
	elements: Vec<ElementRef>,
}

impl LoadedModule {
	pub fn new(identity: ModuleIdentity, elements: Vec<ElementRef>) -> Self {
		Self { identity, elements }
	}

	pub fn identity(&self) -> &ModuleIdentity {
		&self.identity
	}

	/// The module's own element list, in resolution order.
	pub fn elements(&self) -> &[ElementRef] {
		&self.elements
	}

	pub fn resolve(&self, symbol: &SymbolName) -> Option<SymbolHandle> {
		resolve_first(&self.elements, symbol)
	}
}

/// Opens module files into [`LoadedModule`]s.
pub trait ModuleOpener: Send + Sync {
	/// Opens `module_file`. `scratch_dir` is private working space the opener may use
	/// freely (shadow copies, caches).
	///
	/// # Errors
	///
	/// [`LoadError::ModuleMissing`] when the file does not exist, [`LoadError::Open`]
	/// when the platform loader rejects it.
	fn open(&self, module_file: &Path, scratch_dir: &Path) -> Result<LoadedModule, LoadError>;
}
