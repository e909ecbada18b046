//! Locating the platform C toolchain.

use std::path::PathBuf;
use std::sync::OnceLock;

#[cfg(unix)]
const CC_CANDIDATES: &[&str] = &["cc", "clang", "gcc"];
#[cfg(not(unix))]
const CC_CANDIDATES: &[&str] = &["clang", "gcc", "cc"];

/// Resolves the C compiler driver: `$CC` first, then the first candidate on `PATH`.
///
/// The lookup runs once per process; later calls return the cached answer.
pub fn find_c_compiler() -> Option<PathBuf> {
	static COMPILER: OnceLock<Option<PathBuf>> = OnceLock::new();
	COMPILER
		.get_or_init(|| {
			let from_env = std::env::var("CC").ok().filter(|cc| !cc.trim().is_empty()).and_then(|cc| which::which(cc.trim()).ok());
			let found = from_env.or_else(|| CC_CANDIDATES.iter().find_map(|name| which::which(name).ok()));
			match &found {
				Some(path) => tracing::debug!(compiler = %path.display(), "Resolved C compiler"),
				None => tracing::warn!("No C compiler found on PATH"),
			}
			found
		})
		.clone()
}
