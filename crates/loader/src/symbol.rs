//! Symbol names and resolved handles.

use std::ffi::c_void;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::element::ElementRef;
use crate::identity::ModuleIdentity;

/// Rejected symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolNameError {
	#[error("symbol name is empty")]
	Empty,
	#[error("invalid segment {segment:?} in symbol name {name:?}")]
	InvalidSegment { name: String, segment: String },
	#[error("segment {segment:?} of dotted name {name:?} contains '_', which would be ambiguous once exported")]
	AmbiguousSegment { name: String, segment: String },
}

/// A fully-qualified, dot-separated symbol name such as `com.example.Greeter`.
///
/// Modules export the name with dots replaced by underscores
/// (`com_example_Greeter`), which is what loaders look up. Segments of a dotted
/// name may not contain `_` themselves, so distinct dotted names never share an
/// export. A single segment is a plain C symbol and may; `a_b` and `a.b` are the
/// same export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolName {
	qualified: String,
	exported: String,
}

impl SymbolName {
	/// Parses and validates a fully-qualified name.
	///
	/// Every segment must be a C identifier: an ASCII letter or `_` followed by ASCII
	/// alphanumerics or `_`. With more than one segment, `_` is not allowed at all.
	pub fn parse(name: &str) -> Result<Self, SymbolNameError> {
		if name.is_empty() {
			return Err(SymbolNameError::Empty);
		}
		if let Some(segment) = name.split('.').find(|s| !is_c_identifier(s)) {
			return Err(SymbolNameError::InvalidSegment {
				name: name.to_string(),
				segment: segment.to_string(),
			});
		}
		if name.contains('.')
			&& let Some(segment) = name.split('.').find(|s| s.contains('_'))
		{
			return Err(SymbolNameError::AmbiguousSegment {
				name: name.to_string(),
				segment: segment.to_string(),
			});
		}
		Ok(Self {
			qualified: name.to_string(),
			exported: name.replace('.', "_"),
		})
	}

	/// The dotted name as requested.
	pub fn as_str(&self) -> &str {
		&self.qualified
	}

	/// The name the symbol is exported under.
	pub fn exported(&self) -> &str {
		&self.exported
	}

	/// Last dotted segment (`Greeter` for `com.example.Greeter`).
	pub fn simple_name(&self) -> &str {
		self.qualified.rsplit('.').next().unwrap_or(&self.qualified)
	}
}

fn is_c_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
		_ => false,
	}
}

impl FromStr for SymbolName {
	type Err = SymbolNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for SymbolName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.qualified)
	}
}

/// Address of a resolved symbol inside a loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolAddress(usize);

impl SymbolAddress {
	/// Wraps a raw address. Returns `None` for null.
	pub fn new(ptr: *const c_void) -> Option<Self> {
		(!ptr.is_null()).then_some(Self(ptr as usize))
	}

	pub fn as_ptr(self) -> *const c_void {
		self.0 as *const c_void
	}
}

/// A resolved symbol.
///
/// The handle keeps the element that produced it alive, so the address stays valid
/// for as long as any clone of the handle exists.
#[derive(Clone)]
pub struct SymbolHandle {
	name: SymbolName,
	address: SymbolAddress,
	origin: ElementRef,
}

impl SymbolHandle {
	pub fn new(name: SymbolName, address: SymbolAddress, origin: ElementRef) -> Self {
		Self { name, address, origin }
	}

	pub fn name(&self) -> &SymbolName {
		&self.name
	}

	pub fn address(&self) -> SymbolAddress {
		self.address
	}

	/// Identity of the module that answered the lookup.
	pub fn origin(&self) -> Option<&ModuleIdentity> {
		self.origin.identity()
	}

	/// Reinterprets the symbol address as a function pointer or other pointer-sized
	/// value.
	///
	/// # Safety
	///
	/// `F` must be pointer-sized and match the real type of the exported symbol, and
	/// the returned value must not be used after every clone of this handle is dropped.
	pub unsafe fn cast<F: Copy>(&self) -> F {
		assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>(), "symbol casts must be pointer-sized");
		let ptr = self.address.as_ptr();
		// SAFETY: sizes checked above; type correctness is the caller's contract.
		unsafe { std::mem::transmute_copy(&ptr) }
	}
}

impl PartialEq for SymbolHandle {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.address == other.address
	}
}

impl Eq for SymbolHandle {}

impl fmt::Debug for SymbolHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SymbolHandle")
			.field("name", &self.name.as_str())
			.field("address", &self.address.as_ptr())
			.field("origin", &self.origin())
			.finish()
	}
}
