//! Batch symbol resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::element::{LoadedModule, ModuleOpener};
use crate::error::LoadError;
use crate::host::HostLoader;
use crate::identity::ModuleIdentity;
use crate::registry::SymbolRegistry;
use crate::symbol::{SymbolHandle, SymbolName};

/// Where a batch of symbols is resolved.
#[derive(Debug, Clone, Copy)]
pub enum ResolveVia<'a> {
	/// Through the host loader, after the module has been merged into it.
	Host(&'a HostLoader),
	/// Through a loader scoped to this module file only.
	Module(&'a Path),
}

/// Outcome of resolving several names at once.
///
/// A name that fails does not discard the names that succeeded.
#[derive(Debug, Default)]
pub struct BatchResolution {
	/// Resolved handles in request order.
	pub resolved: IndexMap<String, SymbolHandle>,
	/// One error per unresolved name, in request order.
	pub failures: Vec<LoadError>,
}

impl BatchResolution {
	/// True when every requested name resolved.
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<&SymbolHandle> {
		self.resolved.get(name)
	}
}

/// Resolves symbols and publishes them into a [`SymbolRegistry`].
///
/// Module-scoped loaders are cached per module identity, so repeated resolution
/// against an unchanged module file reuses the already opened module.
pub struct SymbolLoader {
	opener: Arc<dyn ModuleOpener>,
	scratch_dir: PathBuf,
	registry: Arc<SymbolRegistry>,
	modules: Mutex<FxHashMap<ModuleIdentity, Arc<LoadedModule>>>,
}

impl SymbolLoader {
	pub fn new(opener: Arc<dyn ModuleOpener>, scratch_dir: impl Into<PathBuf>, registry: Arc<SymbolRegistry>) -> Self {
		Self {
			opener,
			scratch_dir: scratch_dir.into(),
			registry,
			modules: Mutex::new(FxHashMap::default()),
		}
	}

	pub fn registry(&self) -> &Arc<SymbolRegistry> {
		&self.registry
	}

	/// Opens `module_file`, reusing a cached loader when the file is unchanged.
	///
	/// At most one loader is cached per path: opening a rebuilt file evicts the
	/// loader of its previous version.
	///
	/// # Errors
	///
	/// [`LoadError::ModuleMissing`] if the file does not exist, otherwise whatever the
	/// opener reports.
	pub fn open(&self, module_file: &Path) -> Result<Arc<LoadedModule>, LoadError> {
		if !module_file.exists() {
			return Err(LoadError::ModuleMissing(module_file.to_path_buf()));
		}
		let identity = ModuleIdentity::of(module_file)?;
		if let Some(module) = self.modules.lock().get(&identity) {
			debug!(module = %identity, "Reusing module loader");
			return Ok(Arc::clone(module));
		}

		let opened = Arc::new(self.opener.open(module_file, &self.scratch_dir)?);
		let identity = opened.identity().clone();
		let mut modules = self.modules.lock();
		// A rebuilt file replaces its predecessor; handles already issued keep their element alive.
		let before = modules.len();
		modules.retain(|cached, _| cached.path() != identity.path() || *cached == identity);
		if modules.len() < before {
			debug!(module = %identity, evicted = before - modules.len(), "Dropped stale module loaders");
		}
		let module = modules.entry(identity).or_insert(opened);
		Ok(Arc::clone(module))
	}

	/// Number of module loaders currently cached.
	pub fn cached_modules(&self) -> usize {
		self.modules.lock().len()
	}

	/// Resolves every name in `symbols`.
	///
	/// Each success is registered. Unresolved names are collected as
	/// [`LoadError::SymbolNotFound`] in the returned batch.
	///
	/// # Errors
	///
	/// Only failures that prevent any lookup (the module cannot be opened) are
	/// returned as `Err`.
	pub fn resolve(&self, symbols: &[SymbolName], via: ResolveVia<'_>) -> Result<BatchResolution, LoadError> {
		let mut batch = BatchResolution::default();
		match via {
			ResolveVia::Host(host) => {
				for symbol in symbols {
					self.record(&mut batch, symbol, host.resolve(symbol), "host loader");
				}
			}
			ResolveVia::Module(module_file) => {
				let module = self.open(module_file)?;
				let searched = module.identity().to_string();
				for symbol in symbols {
					self.record(&mut batch, symbol, module.resolve(symbol), &searched);
				}
			}
		}
		Ok(batch)
	}

	fn record(&self, batch: &mut BatchResolution, symbol: &SymbolName, found: Option<SymbolHandle>, searched: &str) {
		match found {
			Some(handle) => {
				self.registry.insert(handle.clone());
				batch.resolved.insert(symbol.as_str().to_string(), handle);
			}
			None => {
				warn!(symbol = %symbol, searched, "Symbol not found");
				batch.failures.push(LoadError::SymbolNotFound {
					symbol: symbol.as_str().to_string(),
					searched: searched.to_string(),
				});
			}
		}
	}
}
