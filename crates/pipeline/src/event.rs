//! The typed event stream a run reports through.

use std::path::PathBuf;

use hotsplice_build::Diagnostic;
use hotsplice_loader::{BatchResolution, MergeOutcome, SymbolHandle};
use hotsplice_worker::Scope;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::PipelineError;
use crate::status::PipelineStatus;

/// One notification from a run, in emission order.
#[derive(Debug)]
pub enum PipelineEvent {
	Status(PipelineStatus),
	/// A compiler error or warning. Only sent with diagnostics enabled.
	Diagnostic(Diagnostic),
	/// Human-readable progress. Only sent with diagnostics enabled.
	Info(String),
	/// Final outcome; always the last event of a run that was not cancelled.
	Finished(Result<LoadReport, PipelineError>),
}

/// What a successful run produced.
#[derive(Debug)]
pub struct LoadReport {
	/// The module file symbols were resolved from.
	pub module: PathBuf,
	/// False when a cached module was reused.
	pub rebuilt: bool,
	/// Outcome of the merge stage, when merging was requested.
	pub merge: Option<MergeOutcome>,
	/// Resolved handles and per-symbol failures.
	pub symbols: BatchResolution,
}

impl LoadReport {
	pub fn symbol(&self, name: &str) -> Option<&SymbolHandle> {
		self.symbols.get(name)
	}
}

/// Sending half, shared by the orchestrator and its blocking stages.
///
/// Sends are dropped once the run's scope is cancelled.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
	tx: UnboundedSender<PipelineEvent>,
	scope: Scope,
	diagnostics: bool,
}

impl Emitter {
	pub(crate) fn channel(scope: Scope, diagnostics: bool) -> (Self, UnboundedReceiver<PipelineEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx, scope, diagnostics }, rx)
	}

	pub(crate) fn send(&self, event: PipelineEvent) {
		if self.scope.is_cancelled() {
			return;
		}
		let _ = self.tx.send(event);
	}

	pub(crate) fn status(&self, status: PipelineStatus) {
		tracing::debug!(scope = self.scope.id(), status = status.as_str(), "pipeline.status");
		self.send(PipelineEvent::Status(status));
	}

	pub(crate) fn diagnostic(&self, diagnostic: Diagnostic) {
		if self.diagnostics {
			self.send(PipelineEvent::Diagnostic(diagnostic));
		}
	}

	pub(crate) fn info(&self, message: impl FnOnce() -> String) {
		if self.diagnostics {
			self.send(PipelineEvent::Info(message()));
		}
	}
}

/// Receiving half of a submitted run.
///
/// Drain it from whichever task or thread owns the caller's state; events arrive in
/// order and nothing is delivered once the run's scope is cancelled.
#[derive(Debug)]
pub struct PipelineRun {
	scope: Scope,
	events: UnboundedReceiver<PipelineEvent>,
	task: JoinHandle<()>,
}

impl PipelineRun {
	pub(crate) fn new(scope: Scope, events: UnboundedReceiver<PipelineEvent>, task: JoinHandle<()>) -> Self {
		Self { scope, events, task }
	}

	/// Scope the run is bound to.
	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	/// Abandons the run. No further events are delivered.
	pub fn cancel(&self) {
		self.scope.cancel();
	}

	/// True once the run's task has stopped.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	/// Waits for the next event. `None` after the final event or once cancelled.
	pub async fn next(&mut self) -> Option<PipelineEvent> {
		if self.scope.is_cancelled() {
			return None;
		}
		tokio::select! {
			biased;
			() = self.scope.cancelled() => None,
			event = self.events.recv() => event.filter(|_| !self.scope.is_cancelled()),
		}
	}

	/// Returns an already queued event without waiting, for polling from a loop.
	pub fn try_next(&mut self) -> Option<PipelineEvent> {
		if self.scope.is_cancelled() {
			return None;
		}
		self.events.try_recv().ok()
	}

	/// Drains the run into a [`Transcript`].
	pub async fn transcript(mut self) -> Transcript {
		let mut transcript = Transcript::default();
		while let Some(event) = self.next().await {
			match event {
				PipelineEvent::Status(status) => transcript.statuses.push(status),
				PipelineEvent::Diagnostic(diagnostic) => transcript.diagnostics.push(diagnostic),
				PipelineEvent::Info(message) => transcript.info.push(message),
				PipelineEvent::Finished(outcome) => {
					transcript.outcome = Some(outcome);
					break;
				}
			}
		}
		transcript
	}

	/// Waits for the final outcome, discarding intermediate events.
	///
	/// `None` if the run was cancelled first.
	pub async fn finish(self) -> Option<Result<LoadReport, PipelineError>> {
		self.transcript().await.outcome
	}
}

/// Every event of a run, grouped by kind.
#[derive(Debug, Default)]
pub struct Transcript {
	pub statuses: Vec<PipelineStatus>,
	pub diagnostics: Vec<Diagnostic>,
	pub info: Vec<String>,
	/// `None` when the run was cancelled before finishing.
	pub outcome: Option<Result<LoadReport, PipelineError>>,
}
