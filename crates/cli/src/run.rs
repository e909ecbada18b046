//! The `run` subcommand.

use std::ffi::c_int;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use hotsplice_build::{CcCompiler, LinkAssembler, SourceEncoding};
use hotsplice_loader::HostLoader;
use hotsplice_pipeline::{CompileRequest, Pipeline, PipelineEvent};
use hotsplice_worker::Scope;
use tracing::info;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
	/// C source file; its stem names the module
	pub file: PathBuf,

	/// Fully-qualified symbol to resolve (`com.example.Greeter` looks up `com_example_Greeter`)
	#[arg(short, long = "symbol", value_name = "NAME")]
	pub symbols: Vec<String>,

	/// Merge the module into this process's loader before resolving
	#[arg(long)]
	pub merge: bool,

	/// Rebuild even if the module already exists
	#[arg(short, long)]
	pub force: bool,

	/// Print compiler diagnostics and progress, and build with debug info
	#[arg(short, long)]
	pub diagnostics: bool,

	/// Call each resolved symbol as `int (*)(void)` and print the result
	#[arg(long)]
	pub call: bool,

	/// Source file encoding
	#[arg(long, value_enum, default_value_t = Encoding::Utf8)]
	pub encoding: Encoding,

	/// Extra flag for the link step (repeatable)
	#[arg(long = "link-flag", value_name = "FLAG", allow_hyphen_values = true)]
	pub link_flags: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Encoding {
	Utf8,
	Latin1,
}

impl From<Encoding> for SourceEncoding {
	fn from(encoding: Encoding) -> Self {
		match encoding {
			Encoding::Utf8 => Self::Utf8,
			Encoding::Latin1 => Self::Latin1,
		}
	}
}

pub async fn run(config: &Config, args: RunArgs) -> anyhow::Result<()> {
	let paths = config.paths()?;
	let mut builder = Pipeline::builder().paths(&paths);
	if let Some(compiler) = &config.compiler {
		builder = builder.compiler(CcCompiler::new(compiler)).assembler(LinkAssembler::new(compiler));
	}
	for flag in &config.link_flags {
		builder = builder.link_flag(flag.clone());
	}
	if args.merge {
		builder = builder.host_loader(Arc::new(HostLoader::with_process_image()?));
	}
	let pipeline = builder.build()?;

	let identifier = args.file.to_string_lossy().into_owned();
	let request = CompileRequest::builder(identifier)
		.source_file(&args.file, args.encoding.into())
		.symbols(args.symbols)
		.merge_into_host(args.merge)
		.force_rebuild(args.force)
		.diagnostics(args.diagnostics || config.diagnostics)
		.link_flags(args.link_flags)
		.build()?;

	let scope = Scope::new("cli");
	let mut run = pipeline.submit(request, &scope);
	let mut outcome = None;
	while let Some(event) = run.next().await {
		match event {
			PipelineEvent::Status(status) => println!("{status}"),
			PipelineEvent::Diagnostic(diagnostic) => eprintln!("{diagnostic}"),
			PipelineEvent::Info(message) => info!("{message}"),
			PipelineEvent::Finished(result) => outcome = Some(result),
		}
	}

	let Some(outcome) = outcome else {
		bail!("run ended without a result");
	};
	let report = outcome.context("pipeline failed")?;
	for failure in &report.symbols.failures {
		eprintln!("{failure}");
	}
	for (name, handle) in &report.symbols.resolved {
		println!("{name} = {:p}", handle.address().as_ptr());
		if args.call {
			// SAFETY: `--call` is the user's assertion that the symbol is `int (*)(void)`.
			let function: extern "C" fn() -> c_int = unsafe { handle.cast() };
			println!("{name}() = {}", function());
		}
	}
	Ok(())
}
