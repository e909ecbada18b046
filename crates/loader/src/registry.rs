use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::symbol::SymbolHandle;

/// Owned cache of resolved symbols, keyed by fully-qualified name.
///
/// Entries are never evicted. Inserting replaces (last writer wins); re-inserting
/// the handle a name already maps to changes nothing. Create one per host and share
/// it by `Arc` with every pipeline that should publish into it.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
	entries: RwLock<FxHashMap<String, SymbolHandle>>,
}

impl SymbolRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the handle registered for `name`.
	pub fn get(&self, name: &str) -> Option<SymbolHandle> {
		self.entries.read().get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.read().contains_key(name)
	}

	/// Registers `handle` under its qualified name, returning the handle it replaced.
	pub fn insert(&self, handle: SymbolHandle) -> Option<SymbolHandle> {
		let name = handle.name().as_str().to_string();
		self.entries.write().insert(name, handle)
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Registered names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
		names.sort();
		names
	}
}
