#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use hotsplice_build::{ArtifactPaths, AssembleError, BytecodeUnit, CompileError, Diagnostic, ModuleAssembler, Severity, SourceCompiler, SourceUnit};
use hotsplice_loader::{ElementRef, HostLoader, LoadError, LoadedModule, ModuleElement, ModuleIdentity, ModuleOpener, SymbolAddress, SymbolName};
use hotsplice_pipeline::{CompileRequest, Pipeline, PipelineBuilder};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const GREETER: &str = "export com_example_Greeter=4096\n";
pub const GREETER_ADDR: usize = 4096;

/// Element answering a fixed set of exported names.
#[derive(Debug)]
pub struct FakeElement {
	pub identity: Option<ModuleIdentity>,
	pub symbols: HashMap<String, usize>,
}

impl ModuleElement for FakeElement {
	fn identity(&self) -> Option<&ModuleIdentity> {
		self.identity.as_ref()
	}

	fn find(&self, symbol: &SymbolName) -> Option<SymbolAddress> {
		self.symbols.get(symbol.exported()).and_then(|&addr| SymbolAddress::new(addr as *const c_void))
	}
}

pub fn element(path: &Path, symbols: &[(&str, usize)]) -> ElementRef {
	fs::write(path, "host").unwrap();
	Arc::new(FakeElement {
		identity: Some(ModuleIdentity::of(path).unwrap()),
		symbols: symbols.iter().map(|(n, a)| (n.to_string(), *a)).collect(),
	})
}

/// Blocks a compile until released, reporting when it started.
pub struct Gate {
	started: Mutex<mpsc::Sender<()>>,
	release: Mutex<mpsc::Receiver<()>>,
}

impl Gate {
	pub fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
		let (started_tx, started_rx) = mpsc::channel();
		let (release_tx, release_rx) = mpsc::channel();
		let gate = Self {
			started: Mutex::new(started_tx),
			release: Mutex::new(release_rx),
		};
		(gate, started_rx, release_tx)
	}
}

/// "Compiles" a line-based toy language:
///
/// * `export NAME=ADDR` exports `NAME` at `ADDR`
/// * `warn MESSAGE` reports a warning
/// * `error MESSAGE` reports an error and rejects the unit
#[derive(Default)]
pub struct FakeCompiler {
	pub calls: Arc<AtomicUsize>,
	pub gate: Option<Gate>,
}

impl SourceCompiler for FakeCompiler {
	fn compile(&self, unit: &SourceUnit, mut diagnostics: Option<&mut dyn FnMut(Diagnostic)>) -> Result<Vec<BytecodeUnit>, CompileError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(gate) = &self.gate {
			let _ = gate.started.lock().send(());
			let _ = gate.release.lock().recv();
		}

		let text = unit.source.read_text()?;
		let file = format!("{}.c", unit.name);
		let mut bytes = String::new();
		let mut first_error = None;
		for (index, line) in text.lines().enumerate() {
			let line_no = index as u32 + 1;
			let (severity, message) = if let Some(export) = line.strip_prefix("export ") {
				bytes.push_str(export);
				bytes.push('\n');
				continue;
			} else if let Some(message) = line.strip_prefix("warn ") {
				(Severity::Warning, message)
			} else if let Some(message) = line.strip_prefix("error ") {
				(Severity::Error, message)
			} else {
				continue;
			};

			if severity == Severity::Error && first_error.is_none() {
				first_error = Some((message.to_string(), line_no));
			}
			if let Some(sink) = diagnostics.as_mut() {
				sink(Diagnostic {
					severity,
					file: file.clone(),
					line: line_no,
					column: 1,
					message: message.to_string(),
				});
			}
		}

		if let Some((message, line)) = first_error {
			return Err(CompileError::Rejected {
				message,
				file: Some(file),
				line: Some(line),
				column: Some(1),
			});
		}
		Ok(vec![BytecodeUnit {
			name: unit.name.clone(),
			bytes: bytes.into_bytes(),
		}])
	}
}

/// Concatenates its inputs into the output.
#[derive(Default)]
pub struct FakeAssembler {
	pub calls: Arc<AtomicUsize>,
	pub fail: bool,
}

impl ModuleAssembler for FakeAssembler {
	fn assemble(&self, inputs: &[PathBuf], output: &Path, _extra_flags: &[String]) -> Result<(), AssembleError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			return Err(AssembleError::Tool {
				tool: "fake-ld".into(),
				status: Some(1),
				stderr: "undefined reference".into(),
			});
		}
		let mut body = Vec::new();
		for input in inputs {
			body.extend(fs::read(input)?);
		}
		fs::write(output, body)?;
		Ok(())
	}
}

/// Opens module files written by [`FakeAssembler`].
#[derive(Default)]
pub struct FakeOpener {
	pub calls: Arc<AtomicUsize>,
	pub fail: bool,
}

impl ModuleOpener for FakeOpener {
	fn open(&self, module_file: &Path, _scratch_dir: &Path) -> Result<LoadedModule, LoadError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			return Err(LoadError::Open {
				path: module_file.to_path_buf(),
				message: "bad image".into(),
			});
		}
		let text = fs::read_to_string(module_file)?;
		let symbols = text
			.lines()
			.filter_map(|line| line.split_once('='))
			.filter_map(|(name, addr)| Some((name.to_string(), addr.parse().ok()?)))
			.collect();
		let identity = ModuleIdentity::of(module_file)?;
		let element = Arc::new(FakeElement {
			identity: Some(identity.clone()),
			symbols,
		});
		Ok(LoadedModule::new(identity, vec![element]))
	}
}

pub struct Fixture {
	pub dir: TempDir,
	pub paths: ArtifactPaths,
	pub pipeline: Pipeline,
	pub compiles: Arc<AtomicUsize>,
	pub assembles: Arc<AtomicUsize>,
	pub opens: Arc<AtomicUsize>,
}

impl Fixture {
	pub fn new() -> Self {
		Self::with(FakeCompiler::default(), FakeAssembler::default(), |builder| builder)
	}

	pub fn with(compiler: FakeCompiler, assembler: FakeAssembler, configure: impl FnOnce(PipelineBuilder) -> PipelineBuilder) -> Self {
		let dir = tempfile::tempdir().unwrap();
		let paths = ArtifactPaths::bootstrap(dir.path()).unwrap();
		let opener = FakeOpener::default();
		let (compiles, assembles, opens) = (Arc::clone(&compiler.calls), Arc::clone(&assembler.calls), Arc::clone(&opener.calls));
		let builder = Pipeline::builder().paths(&paths).compiler(compiler).assembler(assembler).opener(opener);
		let pipeline = configure(builder).build().unwrap();
		Self {
			dir,
			paths,
			pipeline,
			compiles,
			assembles,
			opens,
		}
	}

	pub fn with_host(host: Arc<HostLoader>) -> Self {
		Self::with(FakeCompiler::default(), FakeAssembler::default(), |builder| builder.host_loader(host))
	}

	pub fn compiles(&self) -> usize {
		self.compiles.load(Ordering::SeqCst)
	}

	pub fn assembles(&self) -> usize {
		self.assembles.load(Ordering::SeqCst)
	}

	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}
}

pub fn greeter() -> hotsplice_pipeline::CompileRequestBuilder {
	CompileRequest::builder("Greeter.c").source_text(GREETER).symbol("com.example.Greeter")
}
