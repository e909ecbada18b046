use std::fmt;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	Compile,
	Write,
	Assemble,
	Merge,
	Load,
}

impl Stage {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Compile => "compile",
			Self::Write => "write",
			Self::Assemble => "assemble",
			Self::Merge => "merge",
			Self::Load => "load",
		}
	}

	pub const fn start(self) -> PipelineStatus {
		match self {
			Self::Compile => PipelineStatus::CompileStart,
			Self::Write => PipelineStatus::WriteStart,
			Self::Assemble => PipelineStatus::AssembleStart,
			Self::Merge => PipelineStatus::MergeStart,
			Self::Load => PipelineStatus::LoadStart,
		}
	}

	pub const fn finish(self) -> PipelineStatus {
		match self {
			Self::Compile => PipelineStatus::CompileFinish,
			Self::Write => PipelineStatus::WriteFinish,
			Self::Assemble => PipelineStatus::AssembleFinish,
			Self::Merge => PipelineStatus::MergeFinish,
			Self::Load => PipelineStatus::LoadFinish,
		}
	}

	pub const fn error(self) -> PipelineStatus {
		match self {
			Self::Compile => PipelineStatus::CompileError,
			Self::Write => PipelineStatus::WriteError,
			Self::Assemble => PipelineStatus::AssembleError,
			Self::Merge => PipelineStatus::MergeError,
			Self::Load => PipelineStatus::LoadError,
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Status notifications emitted by a run.
///
/// Every executed stage emits its `*Start` status, then exactly one of its
/// `*Finish` or `*Error` statuses. `CompileWarning` and `ResolveError` are
/// non-terminal notifications inside the compile and load stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStatus {
	CompileStart,
	CompileError,
	CompileWarning,
	CompileFinish,
	WriteStart,
	WriteError,
	WriteFinish,
	AssembleStart,
	AssembleError,
	AssembleFinish,
	MergeStart,
	MergeError,
	MergeFinish,
	LoadStart,
	LoadError,
	LoadFinish,
	ResolveError,
}

impl PipelineStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::CompileStart => "compile-start",
			Self::CompileError => "compile-error",
			Self::CompileWarning => "compile-warning",
			Self::CompileFinish => "compile-finish",
			Self::WriteStart => "write-start",
			Self::WriteError => "write-error",
			Self::WriteFinish => "write-finish",
			Self::AssembleStart => "assemble-start",
			Self::AssembleError => "assemble-error",
			Self::AssembleFinish => "assemble-finish",
			Self::MergeStart => "merge-start",
			Self::MergeError => "merge-error",
			Self::MergeFinish => "merge-finish",
			Self::LoadStart => "load-start",
			Self::LoadError => "load-error",
			Self::LoadFinish => "load-finish",
			Self::ResolveError => "resolve-error",
		}
	}

	/// The stage this status belongs to.
	pub const fn stage(self) -> Stage {
		match self {
			Self::CompileStart | Self::CompileError | Self::CompileWarning | Self::CompileFinish => Stage::Compile,
			Self::WriteStart | Self::WriteError | Self::WriteFinish => Stage::Write,
			Self::AssembleStart | Self::AssembleError | Self::AssembleFinish => Stage::Assemble,
			Self::MergeStart | Self::MergeError | Self::MergeFinish => Stage::Merge,
			Self::LoadStart | Self::LoadError | Self::LoadFinish | Self::ResolveError => Stage::Load,
		}
	}

	/// True for the statuses that close a stage.
	pub const fn is_terminal(self) -> bool {
		matches!(
			self,
			Self::CompileError
				| Self::CompileFinish
				| Self::WriteError
				| Self::WriteFinish
				| Self::AssembleError
				| Self::AssembleFinish
				| Self::MergeError
				| Self::MergeFinish
				| Self::LoadError
				| Self::LoadFinish
		)
	}

	pub const fn is_error(self) -> bool {
		matches!(
			self,
			Self::CompileError | Self::WriteError | Self::AssembleError | Self::MergeError | Self::LoadError | Self::ResolveError
		)
	}
}

impl fmt::Display for PipelineStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
