//! The host process's loader element list.
//!
//! # Concurrency
//!
//! * Readers pin an `Arc<Vec<ElementRef>>` snapshot and scan it without locks.
//! * The merge is the only writer. It builds a complete replacement list and
//!   publishes it with compare-and-swap, so a reader sees either the old list or the
//!   new one, never a half-updated list.
//! * Old snapshots stay alive while pinned by an in-flight lookup.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::element::{ElementRef, resolve_first};
use crate::error::{LoadError, MergeError};
use crate::identity::ModuleIdentity;
use crate::native::NativeElement;
use crate::symbol::{SymbolHandle, SymbolName};

/// An immutable, published element list.
pub type ElementList = Arc<Vec<ElementRef>>;

/// Read/write access to a loader's ordered element list.
///
/// This is the capability a host platform provides to the merge algorithm; how the
/// list is reached (a field of a runtime object, an owned container) is up to the
/// implementation.
pub trait LoaderState: Send + Sync {
	/// Returns the currently published list.
	fn snapshot(&self) -> Result<ElementList, MergeError>;

	/// Installs `next` if the published list is still `expected`.
	///
	/// Returns `Ok(false)` when another writer published first; the caller re-plans
	/// from a fresh snapshot.
	fn publish(&self, expected: &ElementList, next: Vec<ElementRef>) -> Result<bool, MergeError>;
}

/// Loader owned by the host process.
#[derive(Debug)]
pub struct HostLoader {
	elements: ArcSwap<Vec<ElementRef>>,
}

impl Default for HostLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl HostLoader {
	/// Creates a loader with an empty element list.
	pub fn new() -> Self {
		Self::from_elements(Vec::new())
	}

	/// Creates a loader over an initial list, kept in order.
	pub fn from_elements(elements: Vec<ElementRef>) -> Self {
		Self {
			elements: ArcSwap::from_pointee(elements),
		}
	}

	/// Creates a loader whose first element is the running executable, so symbols it
	/// exports take precedence over anything merged later.
	pub fn with_process_image() -> Result<Self, LoadError> {
		let image: ElementRef = Arc::new(NativeElement::process_image()?);
		Ok(Self::from_elements(vec![image]))
	}

	/// Pins the current list.
	pub fn elements(&self) -> ElementList {
		self.elements.load_full()
	}

	pub fn len(&self) -> usize {
		self.elements.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns true if any element was opened from the module with `identity`.
	pub fn contains(&self, identity: &ModuleIdentity) -> bool {
		self.elements.load().iter().any(|e| e.identity() == Some(identity))
	}

	/// Resolves `symbol` against the current list; first match wins.
	pub fn resolve(&self, symbol: &SymbolName) -> Option<SymbolHandle> {
		let snapshot = self.elements.load();
		resolve_first(&snapshot, symbol)
	}
}

impl LoaderState for HostLoader {
	fn snapshot(&self) -> Result<ElementList, MergeError> {
		Ok(self.elements.load_full())
	}

	fn publish(&self, expected: &ElementList, next: Vec<ElementRef>) -> Result<bool, MergeError> {
		let prev = self.elements.compare_and_swap(expected, Arc::new(next));
		Ok(Arc::ptr_eq(&prev, expected))
	}
}
