//! Worker runtime primitives shared by hotsplice pipeline runs.
//!
//! * [`spawn`] / [`spawn_blocking`] route work onto the ambient tokio runtime, or a
//!   shared fallback runtime when called from a plain thread. Its size is set once
//!   with [`set_fallback_threads`].
//! * [`Scope`] is the lifecycle a run is bound to; ending it cancels the run.

mod class;
mod scope;
mod spawn;

pub use class::TaskClass;
pub use scope::{Scope, ScopeGuard};
pub use spawn::{fallback_threads, set_fallback_threads, spawn, spawn_blocking};
