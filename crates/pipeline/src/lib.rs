//! The hotsplice pipeline: compile C source, write the object, assemble a module,
//! optionally merge it into the host loader, and resolve symbols from it.
//!
//! ```no_run
//! # async fn demo(pipeline: hotsplice_pipeline::Pipeline) -> Result<(), Box<dyn std::error::Error>> {
//! use hotsplice_pipeline::{CompileRequest, PipelineEvent};
//! use hotsplice_worker::Scope;
//!
//! let request = CompileRequest::builder("Greeter.c")
//! 	.source_text("int com_example_Greeter(void) { return 42; }")
//! 	.symbol("com.example.Greeter")
//! 	.build()?;
//! let mut run = pipeline.submit(request, &Scope::default());
//! while let Some(event) = run.next().await {
//! 	if let PipelineEvent::Status(status) = event {
//! 		println!("{status}");
//! 	}
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod event;
mod pipeline;
mod request;
mod state;
mod status;

pub use error::{ConfigError, PipelineError, RequestError, Result};
pub use event::{LoadReport, PipelineEvent, PipelineRun, Transcript};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use request::{CompileRequest, CompileRequestBuilder};
pub use state::PipelineState;
pub use status::{PipelineStatus, Stage};
