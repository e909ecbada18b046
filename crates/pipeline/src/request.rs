//! Compile requests and their builder.

use std::path::{Path, PathBuf};

use hotsplice_build::{BYTECODE_EXTENSIONS, MODULE_EXTENSIONS, SourceEncoding, SourceInput, SourceUnit, check_extension, library_extension, object_extension};
use hotsplice_loader::SymbolName;

use crate::error::RequestError;

/// Everything one pipeline run needs. Built through [`CompileRequest::builder`].
#[derive(Debug, Clone)]
pub struct CompileRequest {
	source_identifier: String,
	unit_name: String,
	source: SourceInput,
	bytecode_file_name: String,
	module_file_name: String,
	symbols: Vec<SymbolName>,
	merge_into_host: bool,
	force_rebuild: bool,
	emit_diagnostics: bool,
	extra_link_flags: Vec<String>,
}

impl CompileRequest {
	/// Starts a request for the unit named by `source_identifier`.
	///
	/// The identifier's file stem (`Greeter` for `src/Greeter.c`) names the unit and
	/// the default output files.
	pub fn builder(source_identifier: impl Into<String>) -> CompileRequestBuilder {
		CompileRequestBuilder {
			source_identifier: source_identifier.into(),
			source: None,
			bytecode_file_name: None,
			module_file_name: None,
			symbols: Vec::new(),
			merge_into_host: false,
			force_rebuild: false,
			emit_diagnostics: false,
			extra_link_flags: Vec::new(),
		}
	}

	pub fn source_identifier(&self) -> &str {
		&self.source_identifier
	}

	pub fn unit_name(&self) -> &str {
		&self.unit_name
	}

	pub fn source(&self) -> &SourceInput {
		&self.source
	}

	pub fn bytecode_file_name(&self) -> &str {
		&self.bytecode_file_name
	}

	pub fn module_file_name(&self) -> &str {
		&self.module_file_name
	}

	pub fn symbols(&self) -> &[SymbolName] {
		&self.symbols
	}

	pub fn merge_into_host(&self) -> bool {
		self.merge_into_host
	}

	pub fn force_rebuild(&self) -> bool {
		self.force_rebuild
	}

	pub fn emit_diagnostics(&self) -> bool {
		self.emit_diagnostics
	}

	pub fn extra_link_flags(&self) -> &[String] {
		&self.extra_link_flags
	}

	pub(crate) fn source_unit(&self) -> SourceUnit {
		SourceUnit {
			name: self.unit_name.clone(),
			source: self.source.clone(),
		}
	}
}

/// Builder for [`CompileRequest`].
#[derive(Debug, Clone)]
#[must_use]
pub struct CompileRequestBuilder {
	source_identifier: String,
	source: Option<SourceInput>,
	bytecode_file_name: Option<String>,
	module_file_name: Option<String>,
	symbols: Vec<String>,
	merge_into_host: bool,
	force_rebuild: bool,
	emit_diagnostics: bool,
	extra_link_flags: Vec<String>,
}

impl CompileRequestBuilder {
	/// In-memory source text.
	pub fn source_text(mut self, text: impl Into<String>) -> Self {
		self.source = Some(SourceInput::Text(text.into()));
		self
	}

	/// Source read from `path`, decoded with `encoding`.
	pub fn source_file(mut self, path: impl Into<PathBuf>, encoding: SourceEncoding) -> Self {
		self.source = Some(SourceInput::File {
			path: path.into(),
			encoding,
		});
		self
	}

	/// Adds a fully-qualified symbol to resolve once the module is loaded.
	pub fn symbol(mut self, name: impl Into<String>) -> Self {
		self.symbols.push(name.into());
		self
	}

	pub fn symbols<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.symbols.extend(names.into_iter().map(Into::into));
		self
	}

	pub fn merge_into_host(mut self, merge: bool) -> Self {
		self.merge_into_host = merge;
		self
	}

	pub fn force_rebuild(mut self, force: bool) -> Self {
		self.force_rebuild = force;
		self
	}

	/// Reports compiler diagnostics and progress messages, and builds with debug info.
	pub fn diagnostics(mut self, enabled: bool) -> Self {
		self.emit_diagnostics = enabled;
		self
	}

	/// Overrides the intermediate object file name (`<stem>.o` by default).
	pub fn bytecode_file_name(mut self, name: impl Into<String>) -> Self {
		self.bytecode_file_name = Some(name.into());
		self
	}

	/// Overrides the module file name (`<stem>.<platform extension>` by default).
	pub fn module_file_name(mut self, name: impl Into<String>) -> Self {
		self.module_file_name = Some(name.into());
		self
	}

	pub fn link_flag(mut self, flag: impl Into<String>) -> Self {
		self.extra_link_flags.push(flag.into());
		self
	}

	pub fn link_flags<I, S>(mut self, flags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.extra_link_flags.extend(flags.into_iter().map(Into::into));
		self
	}

	/// Validates the request.
	///
	/// # Errors
	///
	/// Fails on the first invalid input: an identifier without a stem, a missing
	/// source, a malformed symbol name, or a file name override with the wrong
	/// extension.
	pub fn build(self) -> Result<CompileRequest, RequestError> {
		let unit_name = unit_name(&self.source_identifier).ok_or_else(|| RequestError::Identifier(self.source_identifier.clone()))?;
		let source = self.source.ok_or_else(|| RequestError::MissingSource(self.source_identifier.clone()))?;

		let bytecode_file_name = match self.bytecode_file_name {
			Some(name) => {
				check_extension(&name, BYTECODE_EXTENSIONS)?;
				name
			}
			None => format!("{unit_name}.{}", object_extension()),
		};
		let module_file_name = match self.module_file_name {
			Some(name) => {
				check_extension(&name, MODULE_EXTENSIONS)?;
				name
			}
			None => format!("{unit_name}.{}", library_extension()),
		};

		let symbols = self.symbols.iter().map(|name| SymbolName::parse(name)).collect::<Result<Vec<_>, _>>()?;

		Ok(CompileRequest {
			source_identifier: self.source_identifier,
			unit_name,
			source,
			bytecode_file_name,
			module_file_name,
			symbols,
			merge_into_host: self.merge_into_host,
			force_rebuild: self.force_rebuild,
			emit_diagnostics: self.emit_diagnostics,
			extra_link_flags: self.extra_link_flags,
		})
	}
}

fn unit_name(identifier: &str) -> Option<String> {
	let stem = Path::new(identifier).file_stem()?.to_str()?;
	let valid = !stem.is_empty() && !stem.starts_with('.') && stem.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
	valid.then(|| stem.to_string())
}

#[cfg(test)]
mod tests {
	use hotsplice_build::PathError;

	use super::*;

	#[test]
	fn names_derive_from_stem() {
		let request = CompileRequest::builder("src/Greeter.c")
			.source_text("int x;")
			.symbol("com.example.Greeter")
			.build()
			.unwrap();
		assert_eq!(request.unit_name(), "Greeter");
		assert_eq!(request.bytecode_file_name(), "Greeter.o");
		assert_eq!(request.module_file_name(), format!("Greeter.{}", library_extension()));
		assert_eq!(request.symbols()[0].exported(), "com_example_Greeter");
		assert!(!request.merge_into_host());
		assert!(!request.force_rebuild());
	}

	#[test]
	fn overrides_must_carry_one_accepted_extension() {
		let ok = CompileRequest::builder("Greeter").source_text("").module_file_name("custom.so").bytecode_file_name("g.obj").build().unwrap();
		assert_eq!(ok.module_file_name(), "custom.so");
		assert_eq!(ok.bytecode_file_name(), "g.obj");

		let err = CompileRequest::builder("Greeter").source_text("").module_file_name("custom.txt").build().unwrap_err();
		assert!(matches!(err, RequestError::FileName(PathError::BadExtension { .. })));

		let err = CompileRequest::builder("Greeter").source_text("").bytecode_file_name("g.so").build().unwrap_err();
		assert!(matches!(err, RequestError::FileName(PathError::BadExtension { .. })));
	}

	#[test]
	fn first_bad_symbol_fails_the_request() {
		let err = CompileRequest::builder("Greeter")
			.source_text("")
			.symbols(["com.example.Greeter", "com..bad", "also-bad"])
			.build()
			.unwrap_err();
		assert!(err.to_string().contains("com..bad"), "{err}");
	}

	#[test]
	fn identifier_and_source_are_required() {
		assert!(matches!(CompileRequest::builder("").source_text("").build(), Err(RequestError::Identifier(_))));
		assert!(matches!(CompileRequest::builder("a/b/..").source_text("").build(), Err(RequestError::Identifier(_))));
		assert!(matches!(CompileRequest::builder("Greeter").build(), Err(RequestError::MissingSource(_))));
	}
}
