use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::WriteError;
use crate::source::BytecodeUnit;

/// Writes the image of `unit_name` (or, failing that, the first unit) to
/// `dest_dir/file_name`, creating `dest_dir` if needed and truncating any previous
/// file.
///
/// # Errors
///
/// [`WriteError::NoUnits`] when `units` is empty, [`WriteError::Io`] for any
/// filesystem failure.
pub fn persist(units: &[BytecodeUnit], unit_name: &str, dest_dir: &Path, file_name: &str) -> Result<PathBuf, WriteError> {
	let unit = units.iter().find(|u| u.name == unit_name).or_else(|| units.first()).ok_or(WriteError::NoUnits)?;

	let io_err = |path: &Path| {
		let path = path.to_path_buf();
		move |source| WriteError::Io { path, source }
	};

	fs::create_dir_all(dest_dir).map_err(io_err(dest_dir))?;
	let path = dest_dir.join(file_name);
	let mut file = fs::File::create(&path).map_err(io_err(&path))?;
	file.write_all(&unit.bytes).map_err(io_err(&path))?;
	file.sync_all().map_err(io_err(&path))?;

	debug!(unit = %unit.name, path = %path.display(), bytes = unit.bytes.len(), "Wrote object file");
	Ok(path)
}
