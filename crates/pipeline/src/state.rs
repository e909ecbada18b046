use crate::status::Stage;

/// Where a run currently is.
///
/// ```text
/// Idle -> Compiling -> Writing -> Assembling -> Merging? -> Loading -> Done
/// ```
///
/// Every working state can instead end in [`PipelineState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
	Idle,
	Compiling,
	Writing,
	Assembling,
	Merging,
	Loading,
	Done,
	Failed(Stage),
}

impl PipelineState {
	/// First working state of a run. A cached module skips straight past assembly.
	pub const fn begin(cached: bool, merge: bool) -> Self {
		match (cached, merge) {
			(false, _) => Self::Compiling,
			(true, true) => Self::Merging,
			(true, false) => Self::Loading,
		}
	}

	/// Successor after the current stage succeeded.
	pub const fn advance(self, merge: bool) -> Self {
		match self {
			Self::Idle => Self::Compiling,
			Self::Compiling => Self::Writing,
			Self::Writing => Self::Assembling,
			Self::Assembling if merge => Self::Merging,
			Self::Assembling | Self::Merging => Self::Loading,
			Self::Loading | Self::Done => Self::Done,
			Self::Failed(stage) => Self::Failed(stage),
		}
	}

	/// Terminal state after the current stage failed.
	pub const fn fail(self) -> Self {
		match self.stage() {
			Some(stage) => Self::Failed(stage),
			None => self,
		}
	}

	/// Stage executed in this state, if any.
	pub const fn stage(self) -> Option<Stage> {
		match self {
			Self::Compiling => Some(Stage::Compile),
			Self::Writing => Some(Stage::Write),
			Self::Assembling => Some(Stage::Assemble),
			Self::Merging => Some(Stage::Merge),
			Self::Loading => Some(Stage::Load),
			Self::Idle | Self::Done | Self::Failed(_) => None,
		}
	}

	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Done | Self::Failed(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn walk(mut state: PipelineState, merge: bool) -> Vec<Stage> {
		let mut stages = Vec::new();
		while let Some(stage) = state.stage() {
			stages.push(stage);
			state = state.advance(merge);
		}
		assert_eq!(state, PipelineState::Done);
		stages
	}

	#[test]
	fn full_run_without_merge() {
		assert_eq!(
			walk(PipelineState::Idle.advance(false), false),
			[Stage::Compile, Stage::Write, Stage::Assemble, Stage::Load]
		);
	}

	#[test]
	fn full_run_with_merge() {
		assert_eq!(
			walk(PipelineState::begin(false, true), true),
			[Stage::Compile, Stage::Write, Stage::Assemble, Stage::Merge, Stage::Load]
		);
	}

	#[test]
	fn cached_runs_still_merge_and_load() {
		assert_eq!(walk(PipelineState::begin(true, true), true), [Stage::Merge, Stage::Load]);
		assert_eq!(walk(PipelineState::begin(true, false), false), [Stage::Load]);
	}

	#[test]
	fn failure_is_terminal() {
		let failed = PipelineState::Assembling.fail();
		assert_eq!(failed, PipelineState::Failed(Stage::Assemble));
		assert!(failed.is_terminal());
		assert_eq!(failed.advance(true), failed);
		assert_eq!(PipelineState::Done.fail(), PipelineState::Done);
	}
}
