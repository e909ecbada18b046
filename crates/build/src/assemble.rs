//! Object-to-module assembly.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::AssembleError;
use crate::tool::find_c_compiler;

/// Turns object files into one loadable module.
pub trait ModuleAssembler: Send + Sync {
	/// Produces `output` from `inputs`. Preconditions, staleness and cleanup are
	/// handled by [`assemble_module`]; implementations only run the tool.
	fn assemble(&self, inputs: &[PathBuf], output: &Path, extra_flags: &[String]) -> Result<(), AssembleError>;
}

/// Options for [`assemble_module`].
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
	/// Delete an existing output before assembling.
	pub force_rebuild: bool,
	/// Extra flags passed through to the tool.
	pub extra_flags: Vec<String>,
}

/// Runs `assembler` with the stage rules applied:
///
/// 1. Every input must exist, otherwise the tool is never invoked.
/// 2. With `force_rebuild` an existing output is deleted first.
/// 3. After the tool returns the output must exist.
/// 4. On success the intermediate inputs are deleted. On failure they are kept for
///    inspection.
pub fn assemble_module(assembler: &dyn ModuleAssembler, inputs: &[PathBuf], output: &Path, options: &AssembleOptions) -> Result<(), AssembleError> {
	if inputs.is_empty() {
		return Err(AssembleError::NoInputs);
	}
	if let Some(missing) = inputs.iter().find(|p| !p.is_file()) {
		return Err(AssembleError::MissingInput(missing.clone()));
	}

	if options.force_rebuild && output.exists() {
		debug!(module = %output.display(), "Deleting stale module");
		fs::remove_file(output)?;
	}
	if let Some(parent) = output.parent() {
		fs::create_dir_all(parent)?;
	}

	assembler.assemble(inputs, output, &options.extra_flags)?;

	if !output.exists() {
		return Err(AssembleError::MissingOutput(output.to_path_buf()));
	}

	for input in inputs {
		if let Err(e) = fs::remove_file(input) {
			warn!(object = %input.display(), error = %e, "Failed to delete intermediate object");
		}
	}
	info!(module = %output.display(), inputs = inputs.len(), "Assembled module");
	Ok(())
}

/// Links objects into a shared library with the system compiler driver.
#[derive(Debug, Clone)]
pub struct LinkAssembler {
	program: PathBuf,
}

impl LinkAssembler {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}

	/// Uses the compiler driver found by [`crate::find_c_compiler`].
	pub fn detect() -> Result<Self, AssembleError> {
		find_c_compiler().map(Self::new).ok_or_else(|| AssembleError::Spawn {
			tool: "cc".into(),
			source: std::io::Error::new(std::io::ErrorKind::NotFound, "no C compiler driver on PATH"),
		})
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	fn command(&self, inputs: &[PathBuf], output: &Path, extra_flags: &[String]) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.arg("-shared");

		// Leave references to host symbols for the loader to bind.
		#[cfg(target_os = "macos")]
		cmd.arg("-Wl,-undefined,dynamic_lookup");

		#[cfg(target_os = "linux")]
		cmd.arg("-Wl,-z,relro,-z,now");

		cmd.args(extra_flags).arg("-o").arg(output).args(inputs);
		cmd
	}
}

impl ModuleAssembler for LinkAssembler {
	fn assemble(&self, inputs: &[PathBuf], output: &Path, extra_flags: &[String]) -> Result<(), AssembleError> {
		let tool = self.program.display().to_string();
		let output = self
			.command(inputs, output, extra_flags)
			.output()
			.map_err(|source| AssembleError::Spawn { tool: tool.clone(), source })?;

		if output.status.success() {
			Ok(())
		} else {
			Err(AssembleError::Tool {
				tool,
				status: output.status.code(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			})
		}
	}
}
