use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::{CancellationToken, DropGuard};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle scope a pipeline run is bound to.
///
/// Cancelling the scope abandons any in-flight stage of every run bound to it, and
/// nothing further is delivered to the run's consumer. Child scopes are cancelled
/// with their parent but can also be cancelled on their own.
#[derive(Debug, Clone)]
pub struct Scope {
	id: u64,
	cancel: CancellationToken,
	label: Arc<str>,
}

impl Default for Scope {
	fn default() -> Self {
		Self::new("root")
	}
}

impl Scope {
	/// Creates a fresh, live scope.
	pub fn new(label: impl Into<Arc<str>>) -> Self {
		Self {
			id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
			cancel: CancellationToken::new(),
			label: label.into(),
		}
	}

	/// Process-unique scope ID, used in log fields.
	pub const fn id(&self) -> u64 {
		self.id
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	/// Returns true once the scope has ended.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Ends the scope.
	pub fn cancel(&self) {
		tracing::debug!(scope = self.id, label = %self.label, "scope.cancel");
		self.cancel.cancel();
	}

	/// Future resolving when the scope ends.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a child scope ended together with this one.
	pub fn child(&self, label: impl Into<Arc<str>>) -> Self {
		Self {
			id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
			cancel: self.cancel.child_token(),
			label: label.into(),
		}
	}

	/// Ties the scope to a value's lifetime: dropping the guard ends the scope.
	pub fn guard(&self) -> ScopeGuard {
		ScopeGuard {
			_inner: self.cancel.clone().drop_guard(),
		}
	}
}

/// Ends its [`Scope`] when dropped.
#[must_use = "dropping the guard ends the scope immediately"]
pub struct ScopeGuard {
	_inner: DropGuard,
}
