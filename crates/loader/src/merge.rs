//! Splicing a loaded module into a loader element list.
//!
//! # Algorithm
//!
//! 1. The incoming module is represented by the identity of its first element.
//! 2. If any host element already carries that identity the merge has been applied
//!    before; the host list is returned untouched.
//! 3. Otherwise a new list holds the host elements in their original order followed
//!    by the incoming elements in theirs.
//! 4. The new list is published in one swap.
//!
//! Resolution is first-match-wins, so appending means a merged module only supplies
//! names the host does not already answer. It never shadows a host symbol.

use tracing::{debug, info};

use crate::element::ElementRef;
use crate::error::MergeError;
use crate::host::LoaderState;
use crate::identity::ModuleIdentity;

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
	/// The module's elements were appended.
	Merged { added: usize, total: usize },
	/// The module was already present; nothing changed.
	AlreadyMerged,
}

/// Computes the merged list without publishing it.
///
/// Returns `Ok(None)` when `incoming` is already part of `host`.
///
/// # Errors
///
/// [`MergeError::EmptyModule`] when `incoming` is empty, and
/// [`MergeError::MissingIdentity`] when the representative identity or any host
/// identity cannot be read.
pub fn plan_merge(host: &[ElementRef], incoming: &[ElementRef]) -> Result<Option<Vec<ElementRef>>, MergeError> {
	let representative = representative_identity(incoming)?;

	for (index, element) in host.iter().enumerate() {
		let identity = element.identity().ok_or(MergeError::MissingIdentity { list: "host", index })?;
		if identity == representative {
			return Ok(None);
		}
	}

	let mut merged = Vec::with_capacity(host.len() + incoming.len());
	merged.extend(host.iter().cloned());
	merged.extend(incoming.iter().cloned());
	Ok(Some(merged))
}

fn representative_identity(incoming: &[ElementRef]) -> Result<&ModuleIdentity, MergeError> {
	let first = incoming.first().ok_or(MergeError::EmptyModule)?;
	first.identity().ok_or(MergeError::MissingIdentity { list: "incoming", index: 0 })
}

/// Merges `incoming` into `state`.
///
/// A lost publish race re-plans against the newer list, so concurrent merges of
/// different modules both land, and concurrent merges of the same module land once.
pub fn merge_into(state: &dyn LoaderState, incoming: &[ElementRef]) -> Result<MergeOutcome, MergeError> {
	loop {
		let current = state.snapshot()?;
		let Some(next) = plan_merge(&current, incoming)? else {
			debug!(elements = current.len(), "Module already merged into host loader");
			return Ok(MergeOutcome::AlreadyMerged);
		};

		let total = next.len();
		if state.publish(&current, next)? {
			info!(added = incoming.len(), total, "Merged module into host loader");
			return Ok(MergeOutcome::Merged {
				added: incoming.len(),
				total,
			});
		}
		debug!("Host loader changed during merge, retrying");
	}
}
