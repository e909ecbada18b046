//! Shared-library backed module elements.
//!
//! Platform loaders cache images by path: opening a rebuilt library under its old
//! path can hand back the stale image. [`NativeOpener`] therefore opens a shadow copy
//! with a unique name inside the scratch directory, and the original module file
//! stays free to be deleted or rebuilt.

use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, warn};

use crate::element::{LoadedModule, ModuleElement, ModuleOpener};
use crate::error::LoadError;
use crate::identity::ModuleIdentity;
use crate::symbol::{SymbolAddress, SymbolName};

/// An element backed by an open shared library.
pub struct NativeElement {
	identity: ModuleIdentity,
	library: Library,
	shadow: Option<PathBuf>,
}

impl NativeElement {
	/// Element for the running executable itself.
	///
	/// Only symbols exported into the dynamic symbol table are visible through it.
	pub fn process_image() -> Result<Self, LoadError> {
		let exe = std::env::current_exe()?;
		let identity = ModuleIdentity::of(&exe)?;

		#[cfg(unix)]
		let library: Library = libloading::os::unix::Library::this().into();
		#[cfg(windows)]
		let library: Library = libloading::os::windows::Library::this()
			.map_err(|e| LoadError::Open {
				path: exe.clone(),
				message: e.to_string(),
			})?
			.into();

		Ok(Self {
			identity,
			library,
			shadow: None,
		})
	}
}

impl ModuleElement for NativeElement {
	fn identity(&self) -> Option<&ModuleIdentity> {
		Some(&self.identity)
	}

	fn find(&self, symbol: &SymbolName) -> Option<SymbolAddress> {
		// SAFETY: the symbol is only read as an address; no call happens here.
		let sym = unsafe { self.library.get::<*mut c_void>(symbol.exported().as_bytes()) }.ok()?;
		SymbolAddress::new(*sym as *const c_void)
	}
}

impl std::fmt::Debug for NativeElement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NativeElement")
			.field("identity", &self.identity)
			.field("shadow", &self.shadow)
			.finish_non_exhaustive()
	}
}

impl Drop for NativeElement {
	fn drop(&mut self) {
		if let Some(shadow) = &self.shadow
			&& let Err(e) = fs::remove_file(shadow)
		{
			warn!(shadow = %shadow.display(), error = %e, "Failed to remove module shadow copy");
		}
	}
}

/// Opens module files as shared libraries through `libloading`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl ModuleOpener for NativeOpener {
	fn open(&self, module_file: &Path, scratch_dir: &Path) -> Result<LoadedModule, LoadError> {
		if !module_file.is_file() {
			return Err(LoadError::ModuleMissing(module_file.to_path_buf()));
		}
		let identity = ModuleIdentity::of(module_file)?;

		fs::create_dir_all(scratch_dir)?;
		let shadow = scratch_dir.join(shadow_name(module_file));
		fs::copy(module_file, &shadow)?;

		debug!(module = %identity, shadow = %shadow.display(), "Opening module");

		// SAFETY: opening a library runs its initialisers. Modules handed to the
		// opener are the caller's own freshly assembled code.
		let library = match unsafe { Library::new(&shadow) } {
			Ok(library) => library,
			Err(e) => {
				let _ = fs::remove_file(&shadow);
				return Err(LoadError::Open {
					path: module_file.to_path_buf(),
					message: e.to_string(),
				});
			}
		};

		let element = NativeElement {
			identity: identity.clone(),
			library,
			shadow: Some(shadow),
		};
		Ok(LoadedModule::new(identity, vec![Arc::new(element)]))
	}
}

/// `<stem>-<uuid>.<ext>`, keeping the extension so the platform loader accepts it.
fn shadow_name(module_file: &Path) -> String {
	let stem = module_file.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
	let id = uuid::Uuid::new_v4().simple();
	match module_file.extension().and_then(|e| e.to_str()) {
		Some(ext) => format!("{stem}-{id}.{ext}"),
		None => format!("{stem}-{id}"),
	}
}
