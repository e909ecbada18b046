//! The orchestrator: runs one request through its stages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotsplice_build::{
	ArtifactPaths, AssembleError, AssembleOptions, BytecodeUnit, CcCompiler, CompileError, Diagnostic, LinkAssembler, ModuleAssembler, Severity, SourceCompiler, SourceUnit,
	assemble_module, persist,
};
use hotsplice_loader::{BatchResolution, HostLoader, MergeError, MergeOutcome, ModuleOpener, NativeOpener, ResolveVia, SymbolLoader, SymbolRegistry, merge_into};
use hotsplice_worker::{Scope, TaskClass};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, PipelineError, Result};
use crate::event::{Emitter, LoadReport, PipelineEvent, PipelineRun};
use crate::request::CompileRequest;
use crate::state::PipelineState;
use crate::status::{PipelineStatus, Stage};

struct Shared {
	paths: ArtifactPaths,
	compiler: Arc<dyn SourceCompiler>,
	assembler: Arc<dyn ModuleAssembler>,
	host: Arc<HostLoader>,
	loader: SymbolLoader,
	link_flags: Vec<String>,
}

/// Compiles, assembles, merges and loads [`CompileRequest`]s.
///
/// Cloning is cheap; clones share the host loader, the registry and the cache of
/// opened modules. Distinct requests run in parallel.
#[derive(Clone)]
pub struct Pipeline {
	shared: Arc<Shared>,
}

impl Pipeline {
	pub fn builder() -> PipelineBuilder {
		PipelineBuilder::default()
	}

	pub fn paths(&self) -> &ArtifactPaths {
		&self.shared.paths
	}

	pub fn host(&self) -> &Arc<HostLoader> {
		&self.shared.host
	}

	pub fn registry(&self) -> &Arc<SymbolRegistry> {
		self.shared.loader.registry()
	}

	pub fn symbol_loader(&self) -> &SymbolLoader {
		&self.shared.loader
	}

	/// Where `request`'s module lives once built.
	pub fn module_path(&self, request: &CompileRequest) -> PathBuf {
		self.shared.paths.module_path(request.module_file_name())
	}

	/// True when the module for `request` exists, so a run without
	/// `force_rebuild` would skip straight to loading.
	pub fn is_built(&self, request: &CompileRequest) -> bool {
		self.module_path(request).is_file()
	}

	/// Deletes the module for `request`. Returns false if there was none.
	pub fn remove_module(&self, request: &CompileRequest) -> io::Result<bool> {
		self.remove_module_file(request.module_file_name())
	}

	/// Deletes `module_dir/<file_name>`. Returns false if there was none.
	pub fn remove_module_file(&self, file_name: &str) -> io::Result<bool> {
		let path = self.shared.paths.module_path(file_name);
		remove_if_present(&path)
	}

	/// Starts `request` on the worker runtime.
	///
	/// The run is bound to a child of `scope`: cancelling either abandons the stage in
	/// flight and stops event delivery.
	pub fn submit(&self, request: CompileRequest, scope: &Scope) -> PipelineRun {
		let scope = scope.child(format!("pipeline:{}", request.unit_name()));
		let (emit, events) = Emitter::channel(scope.clone(), request.emit_diagnostics());
		let shared = Arc::clone(&self.shared);
		let request = Arc::new(request);
		let run_scope = scope.clone();

		let task = hotsplice_worker::spawn(TaskClass::Background, async move {
			tokio::select! {
				biased;
				() = run_scope.cancelled() => {
					debug!(scope = run_scope.id(), unit = request.unit_name(), "Pipeline run abandoned");
				}
				outcome = run(&shared, &request, &emit) => emit.send(PipelineEvent::Finished(outcome)),
			}
		});
		PipelineRun::new(scope, events, task)
	}
}

async fn run(shared: &Arc<Shared>, request: &Arc<CompileRequest>, emit: &Emitter) -> Result<LoadReport> {
	let unit = request.unit_name();
	let module = shared.paths.module_path(request.module_file_name());
	let merge = request.merge_into_host();
	let cached = !request.force_rebuild() && module.is_file();
	if cached {
		debug!(unit, module = %module.display(), "Module already built");
		emit.info(|| format!("{} is up to date", module.display()));
	}

	let mut state = PipelineState::begin(cached, merge);
	let mut units = Vec::new();
	let mut object = None;
	let mut merged = None;
	let mut batch = BatchResolution::default();

	while let Some(stage) = state.stage() {
		emit.status(stage.start());
		emit.info(|| format!("{stage}: {unit}"));

		let result = match stage {
			Stage::Compile => compile(shared, request, emit).await.map(|out| units = out),
			Stage::Write => write(shared, request, std::mem::take(&mut units)).await.map(|path| object = Some(path)),
			Stage::Assemble => assemble(shared, request, object.take().into_iter().collect()).await,
			Stage::Merge => merge_module(shared, &module).await.map(|outcome| merged = Some(outcome)),
			Stage::Load => load(shared, request, &module, emit).await.map(|out| batch = out),
		};

		if let Err(err) = result {
			warn!(unit, state = ?state.fail(), error = %err, "Pipeline stage failed");
			emit.info(|| format!("{stage} failed: {err}"));
			emit.status(stage.error());
			return Err(err);
		}
		emit.status(stage.finish());
		state = state.advance(merge);
	}

	info!(
		unit,
		module = %module.display(),
		rebuilt = !cached,
		resolved = batch.resolved.len(),
		failed = batch.failures.len(),
		"Pipeline finished"
	);
	Ok(LoadReport {
		module,
		rebuilt: !cached,
		merge: merged,
		symbols: batch,
	})
}

async fn blocking<T, F>(stage: Stage, class: TaskClass, f: F) -> Result<T>
where
	F: FnOnce() -> Result<T> + Send + 'static,
	T: Send + 'static,
{
	hotsplice_worker::spawn_blocking(class, f).await.unwrap_or_else(|join| {
		Err(PipelineError::Worker {
			stage,
			message: join.to_string(),
		})
	})
}

async fn compile(shared: &Arc<Shared>, request: &Arc<CompileRequest>, emit: &Emitter) -> Result<Vec<BytecodeUnit>> {
	let (shared, request, emit) = (Arc::clone(shared), Arc::clone(request), emit.clone());
	blocking(Stage::Compile, TaskClass::CpuBlocking, move || {
		if request.force_rebuild() {
			let module = shared.paths.module_path(request.module_file_name());
			remove_if_present(&module).map_err(CompileError::from)?;
		}

		let unit: SourceUnit = request.source_unit();
		let units = if request.emit_diagnostics() {
			let mut sink = |diagnostic: Diagnostic| {
				if diagnostic.severity == Severity::Warning {
					emit.status(PipelineStatus::CompileWarning);
				}
				emit.diagnostic(diagnostic);
			};
			shared.compiler.compile(&unit, Some(&mut sink))?
		} else {
			shared.compiler.compile(&unit, None)?
		};
		debug_assert!(units.iter().any(|u| u.name == unit.name), "compiler returned no unit named {}", unit.name);
		Ok(units)
	})
	.await
}

async fn write(shared: &Arc<Shared>, request: &Arc<CompileRequest>, units: Vec<BytecodeUnit>) -> Result<PathBuf> {
	let (shared, request) = (Arc::clone(shared), Arc::clone(request));
	blocking(Stage::Write, TaskClass::IoBlocking, move || {
		Ok(persist(&units, request.unit_name(), shared.paths.artifact_dir(), request.bytecode_file_name())?)
	})
	.await
}

async fn assemble(shared: &Arc<Shared>, request: &Arc<CompileRequest>, inputs: Vec<PathBuf>) -> Result<()> {
	let (shared, request) = (Arc::clone(shared), Arc::clone(request));
	blocking(Stage::Assemble, TaskClass::CpuBlocking, move || {
		let output = shared.paths.module_path(request.module_file_name());
		let options = AssembleOptions {
			force_rebuild: request.force_rebuild(),
			extra_flags: shared.link_flags.iter().chain(request.extra_link_flags()).cloned().collect(),
		};
		Ok(assemble_module(shared.assembler.as_ref(), &inputs, &output, &options)?)
	})
	.await
}

async fn merge_module(shared: &Arc<Shared>, module: &Path) -> Result<MergeOutcome> {
	let (shared, module) = (Arc::clone(shared), module.to_path_buf());
	blocking(Stage::Merge, TaskClass::IoBlocking, move || {
		let loaded = shared.loader.open(&module).map_err(MergeError::Open)?;
		Ok(merge_into(shared.host.as_ref(), loaded.elements())?)
	})
	.await
}

/// Resolves the requested symbols. Succeeds when at least one resolved, or when
/// none were requested; each miss is reported as `resolve-error`.
async fn load(shared: &Arc<Shared>, request: &Arc<CompileRequest>, module: &Path, emit: &Emitter) -> Result<BatchResolution> {
	let (shared_for_task, request_for_task, module) = (Arc::clone(shared), Arc::clone(request), module.to_path_buf());
	let batch = blocking(Stage::Load, TaskClass::IoBlocking, move || {
		let via = if request_for_task.merge_into_host() {
			ResolveVia::Host(shared_for_task.host.as_ref())
		} else {
			ResolveVia::Module(&module)
		};
		Ok(shared_for_task.loader.resolve(request_for_task.symbols(), via)?)
	})
	.await?;

	for failure in &batch.failures {
		emit.status(PipelineStatus::ResolveError);
		emit.info(|| failure.to_string());
	}
	if !request.symbols().is_empty() && batch.resolved.is_empty() {
		return Err(PipelineError::Unresolved { failures: batch.failures });
	}
	Ok(batch)
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
	match fs::remove_file(path) {
		Ok(()) => {
			info!(module = %path.display(), "Removed module");
			Ok(true)
		}
		Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
		Err(err) => Err(err),
	}
}

/// The system C toolchain, located on first use.
#[derive(Debug)]
struct SystemToolchain;

impl SourceCompiler for SystemToolchain {
	fn compile(&self, unit: &SourceUnit, diagnostics: Option<&mut dyn FnMut(Diagnostic)>) -> std::result::Result<Vec<BytecodeUnit>, CompileError> {
		CcCompiler::detect()?.compile(unit, diagnostics)
	}
}

impl ModuleAssembler for SystemToolchain {
	fn assemble(&self, inputs: &[PathBuf], output: &Path, extra_flags: &[String]) -> std::result::Result<(), AssembleError> {
		LinkAssembler::detect()?.assemble(inputs, output, extra_flags)
	}
}

/// Configures a [`Pipeline`].
///
/// The three directories are required. Everything else defaults: the system C
/// toolchain, [`NativeOpener`], an empty [`HostLoader`] and a fresh
/// [`SymbolRegistry`].
#[derive(Default)]
#[must_use]
pub struct PipelineBuilder {
	artifact_dir: Option<PathBuf>,
	module_dir: Option<PathBuf>,
	scratch_dir: Option<PathBuf>,
	compiler: Option<Arc<dyn SourceCompiler>>,
	assembler: Option<Arc<dyn ModuleAssembler>>,
	opener: Option<Arc<dyn ModuleOpener>>,
	host: Option<Arc<HostLoader>>,
	registry: Option<Arc<SymbolRegistry>>,
	link_flags: Vec<String>,
	fallback_threads: Option<usize>,
}

impl PipelineBuilder {
	/// Uses already validated directories.
	pub fn paths(self, paths: &ArtifactPaths) -> Self {
		self.artifact_dir(paths.artifact_dir()).module_dir(paths.module_dir()).scratch_dir(paths.scratch_dir())
	}

	/// Directory for intermediate object files.
	pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.artifact_dir = Some(dir.into());
		self
	}

	/// Directory for built modules.
	pub fn module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.module_dir = Some(dir.into());
		self
	}

	/// Directory for the shadow copies modules are opened from.
	pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.scratch_dir = Some(dir.into());
		self
	}

	pub fn compiler(mut self, compiler: impl SourceCompiler + 'static) -> Self {
		self.compiler = Some(Arc::new(compiler));
		self
	}

	pub fn assembler(mut self, assembler: impl ModuleAssembler + 'static) -> Self {
		self.assembler = Some(Arc::new(assembler));
		self
	}

	pub fn opener(mut self, opener: impl ModuleOpener + 'static) -> Self {
		self.opener = Some(Arc::new(opener));
		self
	}

	/// Host loader that merged modules are appended to.
	pub fn host_loader(mut self, host: Arc<HostLoader>) -> Self {
		self.host = Some(host);
		self
	}

	/// Registry resolved symbols are published to.
	pub fn registry(mut self, registry: Arc<SymbolRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Flag passed to every assemble, before the request's own flags.
	pub fn link_flag(mut self, flag: impl Into<String>) -> Self {
		self.link_flags.push(flag.into());
		self
	}

	/// Async worker count for runs submitted from outside a tokio runtime.
	///
	/// Process wide and fixed by the first pipeline that sets it or the first run
	/// that needs the fallback runtime; later values are ignored.
	pub fn fallback_threads(mut self, threads: usize) -> Self {
		self.fallback_threads = Some(threads);
		self
	}

	/// Validates the configuration.
	///
	/// # Errors
	///
	/// A missing directory, or any [`ArtifactPaths`] rule violation such as the
	/// artifact and module directories being the same.
	pub fn build(self) -> std::result::Result<Pipeline, ConfigError> {
		let artifact_dir = self.artifact_dir.ok_or(ConfigError::MissingDirectory("artifact"))?;
		let module_dir = self.module_dir.ok_or(ConfigError::MissingDirectory("module"))?;
		let scratch_dir = self.scratch_dir.ok_or(ConfigError::MissingDirectory("scratch"))?;
		let paths = ArtifactPaths::new(artifact_dir, module_dir, scratch_dir)?;

		if let Some(threads) = self.fallback_threads
			&& !hotsplice_worker::set_fallback_threads(threads)
		{
			warn!(requested = threads, using = hotsplice_worker::fallback_threads(), "Fallback runtime size already fixed");
		}

		let opener = self.opener.unwrap_or_else(|| Arc::new(NativeOpener));
		let registry = self.registry.unwrap_or_default();
		let loader = SymbolLoader::new(opener, paths.scratch_dir(), registry);

		info!(
			artifacts = %paths.artifact_dir().display(),
			modules = %paths.module_dir().display(),
			scratch = %paths.scratch_dir().display(),
			"Pipeline configured"
		);
		Ok(Pipeline {
			shared: Arc::new(Shared {
				paths,
				compiler: self.compiler.unwrap_or_else(|| Arc::new(SystemToolchain)),
				assembler: self.assembler.unwrap_or_else(|| Arc::new(SystemToolchain)),
				host: self.host.unwrap_or_default(),
				loader,
				link_flags: self.link_flags,
			}),
		})
	}
}
