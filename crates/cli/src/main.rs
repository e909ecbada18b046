//! hotsplice command line front end.
//!
//! Compiles a C file into a loadable module, optionally splices it into the
//! running process's loader, and resolves (and calls) symbols from it.

mod config;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "hotsplice", version)]
#[command(about = "Compile C source into a module and load symbols from it at runtime")]
struct Args {
	/// Config file (defaults to $HOTSPLICE_CONFIG, then the user config dir)
	#[arg(short, long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Build a source file and resolve symbols from the resulting module
	Run(run::RunArgs),
	/// Delete a built module
	Clean {
		/// Unit name (`Greeter`) or module file name (`Greeter.so`)
		name: String,
	},
	/// Print the working directories
	Paths,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let config = Config::load(args.config.as_deref())?;
	debug!(?config, "Effective config");

	match args.command {
		Command::Run(run_args) => run::run(&config, run_args).await,
		Command::Clean { name } => clean(&config, &name),
		Command::Paths => {
			let paths = config.paths()?;
			println!("artifacts {}", paths.artifact_dir().display());
			println!("modules   {}", paths.module_dir().display());
			println!("scratch   {}", paths.scratch_dir().display());
			Ok(())
		}
	}
}

fn clean(config: &Config, name: &str) -> anyhow::Result<()> {
	let paths = config.paths()?;
	let file_name = if hotsplice_build::check_extension(name, hotsplice_build::MODULE_EXTENSIONS).is_ok() {
		name.to_string()
	} else {
		format!("{name}.{}", hotsplice_build::library_extension())
	};
	let path = paths.module_path(&file_name);
	match std::fs::remove_file(&path) {
		Ok(()) => println!("removed {}", path.display()),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => println!("{} is not built", file_name),
		Err(err) => return Err(err.into()),
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("HOTSPLICE_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("hotsplice=debug,hotsplice_pipeline=debug,hotsplice_build=debug,hotsplice_loader=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}
