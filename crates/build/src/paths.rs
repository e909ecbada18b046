//! Working directories and file-name rules.
//!
//! Three directories are involved in every run:
//!
//! * artifact directory: transient object files, deleted after assembly
//! * module directory: durable loadable modules, checked for existence every run
//! * scratch directory: private to the loading mechanism (shadow copies)
//!
//! The artifact and module directories must differ, otherwise cleaning up objects
//! could remove modules. The scratch directory must differ from both.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PathError;

/// Accepted extensions for object (intermediate) files.
pub const BYTECODE_EXTENSIONS: &[&str] = &["o", "obj"];

/// Accepted extensions for loadable module files.
pub const MODULE_EXTENSIONS: &[&str] = &["so", "dylib", "dll"];

/// Validated, canonical working directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
	artifact_dir: PathBuf,
	module_dir: PathBuf,
	scratch_dir: PathBuf,
}

impl ArtifactPaths {
	/// Validates three existing, absolute, pairwise distinct directories.
	///
	/// # Errors
	///
	/// * [`PathError::NotAbsolute`] / [`PathError::NotADirectory`] for a bad path.
	/// * [`PathError::SameDirectory`] when artifacts and modules share a directory.
	/// * [`PathError::ScratchShared`] when scratch equals either of the others.
	pub fn new(artifact_dir: impl Into<PathBuf>, module_dir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Result<Self, PathError> {
		let artifact_dir = existing_dir(artifact_dir.into())?;
		let module_dir = existing_dir(module_dir.into())?;
		let scratch_dir = existing_dir(scratch_dir.into())?;

		if artifact_dir == module_dir {
			return Err(PathError::SameDirectory(module_dir));
		}
		if scratch_dir == artifact_dir || scratch_dir == module_dir {
			return Err(PathError::ScratchShared(scratch_dir));
		}

		Ok(Self {
			artifact_dir,
			module_dir,
			scratch_dir,
		})
	}

	/// Creates `root/{artifacts,modules,scratch}` as needed and validates them.
	pub fn bootstrap(root: &Path) -> Result<Self, PathError> {
		Self::bootstrap_dirs(root.join("artifacts"), root.join("modules"), root.join("scratch"))
	}

	/// Creates the given directories as needed and validates them.
	pub fn bootstrap_dirs(artifact_dir: PathBuf, module_dir: PathBuf, scratch_dir: PathBuf) -> Result<Self, PathError> {
		for dir in [&artifact_dir, &module_dir, &scratch_dir] {
			if !dir.is_absolute() {
				return Err(PathError::NotAbsolute(dir.clone()));
			}
			if !dir.exists() {
				debug!(dir = %dir.display(), "Creating working directory");
				fs::create_dir_all(dir)?;
			}
		}
		Self::new(artifact_dir, module_dir, scratch_dir)
	}

	pub fn artifact_dir(&self) -> &Path {
		&self.artifact_dir
	}

	pub fn module_dir(&self) -> &Path {
		&self.module_dir
	}

	pub fn scratch_dir(&self) -> &Path {
		&self.scratch_dir
	}

	pub fn bytecode_path(&self, file_name: &str) -> PathBuf {
		self.artifact_dir.join(file_name)
	}

	pub fn module_path(&self, file_name: &str) -> PathBuf {
		self.module_dir.join(file_name)
	}
}

fn existing_dir(path: PathBuf) -> Result<PathBuf, PathError> {
	if !path.is_absolute() {
		return Err(PathError::NotAbsolute(path));
	}
	if !path.is_dir() {
		return Err(PathError::NotADirectory(path));
	}
	Ok(fs::canonicalize(path)?)
}

/// Extension of loadable modules on this platform.
pub const fn library_extension() -> &'static str {
	if cfg!(target_os = "macos") {
		"dylib"
	} else if cfg!(target_os = "windows") {
		"dll"
	} else {
		"so"
	}
}

/// Extension used for object files.
pub const fn object_extension() -> &'static str {
	"o"
}

/// Checks that `file_name` has a non-empty stem and ends with exactly one of the
/// `accepted` extensions.
pub fn check_extension(file_name: &str, accepted: &[&str]) -> Result<(), PathError> {
	let matches: Vec<&str> = accepted
		.iter()
		.copied()
		.filter(|ext| {
			file_name
				.strip_suffix(ext)
				.and_then(|rest| rest.strip_suffix('.'))
				.is_some_and(|stem| !stem.is_empty())
		})
		.collect();

	if matches.len() == 1 {
		Ok(())
	} else {
		Err(PathError::BadExtension {
			name: file_name.to_string(),
			accepted: accepted.join(", "),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dirs(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
		let dirs = (root.join("a"), root.join("m"), root.join("s"));
		for d in [&dirs.0, &dirs.1, &dirs.2] {
			fs::create_dir_all(d).unwrap();
		}
		dirs
	}

	#[test]
	fn accepts_distinct_directories() {
		let root = tempfile::tempdir().unwrap();
		let (a, m, s) = dirs(root.path());
		let paths = ArtifactPaths::new(&a, &m, &s).unwrap();
		assert!(paths.bytecode_path("Greeter.o").ends_with("a/Greeter.o"));
		assert!(paths.module_path("Greeter.so").ends_with("m/Greeter.so"));
	}

	#[test]
	fn rejects_shared_artifact_and_module_dir() {
		let root = tempfile::tempdir().unwrap();
		let (a, _, s) = dirs(root.path());
		let err = ArtifactPaths::new(&a, a.join("."), &s).unwrap_err();
		assert!(matches!(err, PathError::SameDirectory(_)));
	}

	#[test]
	fn rejects_shared_scratch() {
		let root = tempfile::tempdir().unwrap();
		let (a, m, _) = dirs(root.path());
		assert!(matches!(ArtifactPaths::new(&a, &m, &m), Err(PathError::ScratchShared(_))));
	}

	#[test]
	fn rejects_relative_and_missing() {
		let root = tempfile::tempdir().unwrap();
		let (a, m, s) = dirs(root.path());
		assert!(matches!(ArtifactPaths::new("rel", &m, &s), Err(PathError::NotAbsolute(_))));
		assert!(matches!(
			ArtifactPaths::new(&a, root.path().join("missing"), &s),
			Err(PathError::NotADirectory(_))
		));
	}

	#[test]
	fn bootstrap_creates_layout() {
		let root = tempfile::tempdir().unwrap();
		let paths = ArtifactPaths::bootstrap(root.path()).unwrap();
		assert!(paths.artifact_dir().is_dir());
		assert!(paths.module_dir().is_dir());
		assert!(paths.scratch_dir().is_dir());
		// Idempotent.
		assert_eq!(ArtifactPaths::bootstrap(root.path()).unwrap(), paths);
	}

	#[test]
	fn extension_rules() {
		assert!(check_extension("Greeter.o", BYTECODE_EXTENSIONS).is_ok());
		assert!(check_extension("Greeter.obj", BYTECODE_EXTENSIONS).is_ok());
		assert!(check_extension("Greeter.so", MODULE_EXTENSIONS).is_ok());
		assert!(check_extension("Greeter.dylib", MODULE_EXTENSIONS).is_ok());

		for bad in ["Greeter", "Greeter.c", ".so", "Greeter.so.bak", "Greeterso"] {
			assert!(check_extension(bad, MODULE_EXTENSIONS).is_err(), "{bad} accepted");
		}
	}
}
