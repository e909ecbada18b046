//! Module file identity.
//!
//! Two elements belong to the same module when they were opened from the same file
//! object. A rebuilt module is written as a new file, so it gets a new identity even
//! though its path is unchanged.

use std::fmt;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// File object identity plus a content stamp. Filesystems recycle inode numbers
/// as soon as a file is deleted, so the stamp tells a rebuild apart even then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FileKey {
	dev: u64,
	ino: u64,
	len: u64,
	modified_nanos: u128,
}

/// Identity of the file a module was opened from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
	path: PathBuf,
	key: FileKey,
}

impl ModuleIdentity {
	/// Reads the identity of the module file at `path`.
	///
	/// # Errors
	///
	/// Fails when the path cannot be canonicalised or its metadata read.
	pub fn of(path: &Path) -> io::Result<Self> {
		let path = fs::canonicalize(path)?;
		let meta = fs::metadata(&path)?;
		Ok(Self {
			key: file_key(&meta)?,
			path,
		})
	}

	/// Canonical path of the module file.
	pub fn path(&self) -> &Path {
		&self.path
	}
}

fn file_key(meta: &fs::Metadata) -> io::Result<FileKey> {
	#[cfg(unix)]
	let (dev, ino) = {
		use std::os::unix::fs::MetadataExt;
		(meta.dev(), meta.ino())
	};
	#[cfg(not(unix))]
	let (dev, ino) = (0, 0);

	let modified_nanos = meta
		.modified()?
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_nanos())
		.unwrap_or_default();
	Ok(FileKey {
		dev,
		ino,
		len: meta.len(),
		modified_nanos,
	})
}

impl fmt::Display for ModuleIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.path.display())
	}
}
