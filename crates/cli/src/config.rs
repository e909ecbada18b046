//! `hotsplice.toml` handling.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use hotsplice_build::ArtifactPaths;
use serde::Deserialize;
use tracing::debug;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "HOTSPLICE_CONFIG";

/// Settings read from the config file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub artifact_dir: Option<PathBuf>,
	pub module_dir: Option<PathBuf>,
	pub scratch_dir: Option<PathBuf>,
	/// C compiler driver used for compiling and linking.
	pub compiler: Option<PathBuf>,
	pub diagnostics: bool,
	pub link_flags: Vec<String>,
}

impl Config {
	/// Loads the config from `explicit`, `$HOTSPLICE_CONFIG`, or
	/// `<config dir>/hotsplice/config.toml`, in that order.
	///
	/// A missing file is only an error when it was named explicitly.
	pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
		let named = explicit.map(Path::to_path_buf).or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
		let path = match named {
			Some(path) => {
				if !path.is_file() {
					bail!("config file not found: {}", path.display());
				}
				path
			}
			None => match dirs::config_dir().map(|d| d.join("hotsplice").join("config.toml")) {
				Some(path) if path.is_file() => path,
				_ => return Ok(Self::default()),
			},
		};

		debug!(path = %path.display(), "Loading config");
		let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
		let config = Self::parse(&text).with_context(|| format!("parsing {}", path.display()))?;
		Ok(match path.parent() {
			Some(base) => config.relative_to(base),
			None => config,
		})
	}

	pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	/// Resolves relative paths against `base`, the config file's directory.
	fn relative_to(mut self, base: &Path) -> Self {
		for dir in [&mut self.artifact_dir, &mut self.module_dir, &mut self.scratch_dir] {
			if let Some(path) = dir
				&& path.is_relative()
			{
				*path = base.join(&*path);
			}
		}
		self
	}

	/// The working directories, created if needed.
	///
	/// Unset directories default to `<cache dir>/hotsplice/{artifacts,modules,scratch}`.
	pub fn paths(&self) -> anyhow::Result<ArtifactPaths> {
		let root = default_root();
		let artifact_dir = self.artifact_dir.clone().unwrap_or_else(|| root.join("artifacts"));
		let module_dir = self.module_dir.clone().unwrap_or_else(|| root.join("modules"));
		let scratch_dir = self.scratch_dir.clone().unwrap_or_else(|| root.join("scratch"));
		Ok(ArtifactPaths::bootstrap_dirs(artifact_dir, module_dir, scratch_dir)?)
	}
}

fn default_root() -> PathBuf {
	dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("hotsplice")
}
