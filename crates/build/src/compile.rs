//! Source-to-object compilation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::diagnostic::{Diagnostic, Severity, parse_diagnostics};
use crate::error::CompileError;
use crate::source::{BytecodeUnit, SourceUnit};
use crate::tool::find_c_compiler;

/// Compiles one named source unit into object images.
pub trait SourceCompiler: Send + Sync {
	/// Compiles `unit`.
	///
	/// When `diagnostics` is given, every error and warning is passed to it before
	/// this returns, and debug information is emitted. Warnings never fail the call.
	///
	/// # Errors
	///
	/// [`CompileError::Rejected`] when the source has errors; other variants when the
	/// compiler itself could not run.
	fn compile(&self, unit: &SourceUnit, diagnostics: Option<&mut dyn FnMut(Diagnostic)>) -> Result<Vec<BytecodeUnit>, CompileError>;
}

/// Drives a GCC/Clang compatible C compiler in `-c` mode.
///
/// Target, PIC, optimisation and debug flags are chosen by `cc::Build` for the host
/// triple; user flags follow them.
///
/// The unit is compiled inside a throwaway directory as `<name>.c`, so diagnostics
/// name the unit rather than a temporary path.
#[derive(Debug, Clone)]
pub struct CcCompiler {
	program: PathBuf,
	flags: Vec<String>,
}

impl CcCompiler {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			flags: Vec::new(),
		}
	}

	/// Uses the compiler found by [`crate::find_c_compiler`].
	pub fn detect() -> Result<Self, CompileError> {
		find_c_compiler().map(Self::new).ok_or(CompileError::CompilerNotFound)
	}

	/// Adds a flag passed on every compile (`-I...`, `-D...`, `-std=...`).
	pub fn flag(mut self, flag: impl Into<String>) -> Self {
		self.flags.push(flag.into());
		self
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	/// Compiler invocation with target flags from `cc`, without inputs or outputs.
	///
	/// Debug builds get `-g` and no optimisation; otherwise `-O2`. Objects are always
	/// position independent so they can be linked into a shared module.
	fn tool(&self, debug_info: bool) -> Result<cc::Tool, CompileError> {
		let target = target_triple();
		let mut build = cc::Build::new();
		build
			.cargo_metadata(false)
			.cargo_warnings(false)
			.emit_rerun_if_env_changed(false)
			.warnings(false)
			.host(&target)
			.target(&target)
			.pic(true)
			.debug(debug_info)
			.opt_level(if debug_info { 0 } else { 2 })
			.compiler(&self.program);
		for flag in &self.flags {
			build.flag(flag);
		}
		Ok(build.try_get_compiler()?)
	}
}

/// Target triple of the running host, or `$TARGET` when set.
fn target_triple() -> String {
	std::env::var("TARGET").unwrap_or_else(|_| {
		let arch = std::env::consts::ARCH;
		if cfg!(target_os = "windows") {
			format!("{arch}-pc-windows-msvc")
		} else if cfg!(target_os = "macos") {
			format!("{arch}-apple-darwin")
		} else {
			format!("{arch}-unknown-linux-gnu")
		}
	})
}

impl SourceCompiler for CcCompiler {
	fn compile(&self, unit: &SourceUnit, diagnostics: Option<&mut dyn FnMut(Diagnostic)>) -> Result<Vec<BytecodeUnit>, CompileError> {
		let text = unit.source.read_text()?;
		let work = tempfile::Builder::new().prefix("hotsplice-cc-").tempdir()?;

		let source_name = format!("{}.c", unit.name);
		let object_name = format!("{}.o", unit.name);
		fs::write(work.path().join(&source_name), text)?;

		let debug_info = diagnostics.is_some();
		let tool = self.tool(debug_info)?;
		let mut cmd = tool.to_command();
		cmd.current_dir(work.path());
		if tool.is_like_msvc() {
			cmd.arg("/c").arg(format!("/Fo{object_name}")).arg(&source_name);
		} else {
			cmd.args(["-c", "-fdiagnostics-color=never", "-o"]).arg(&object_name).arg(&source_name);
		}

		debug!(unit = %unit.name, compiler = %self.program.display(), debug_info, "Compiling unit");

		let output = cmd.output().map_err(|source| CompileError::Spawn {
			program: self.program.display().to_string(),
			source,
		})?;
		let stderr = String::from_utf8_lossy(&output.stderr);
		let parsed = parse_diagnostics(&stderr);

		if let Some(sink) = diagnostics {
			for diagnostic in &parsed {
				sink(diagnostic.clone());
			}
		}

		if !output.status.success() {
			return Err(rejection(&parsed, &stderr));
		}

		let object = work.path().join(&object_name);
		if !object.exists() {
			return Err(CompileError::NoOutput(unit.name.clone()));
		}
		let bytes = fs::read(&object)?;
		info!(unit = %unit.name, bytes = bytes.len(), "Compiled unit");

		Ok(vec![BytecodeUnit {
			name: unit.name.clone(),
			bytes,
		}])
	}
}

fn rejection(parsed: &[Diagnostic], stderr: &str) -> CompileError {
	match parsed.iter().find(|d| d.severity == Severity::Error) {
		Some(first) => CompileError::Rejected {
			message: first.message.clone(),
			file: Some(first.file.clone()),
			line: Some(first.line),
			column: Some(first.column),
		},
		None => CompileError::Rejected {
			message: stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("compiler exited with failure").trim().to_string(),
			file: None,
			line: None,
			column: None,
		},
	}
}
