use std::future::Future;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Upper bound for the default fallback size. Stages mostly wait on external
/// compilers, so more async workers than this buys nothing.
const MAX_DEFAULT_THREADS: usize = 4;

static FALLBACK_THREADS: OnceLock<usize> = OnceLock::new();
static FALLBACK_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Fixes the async worker count of the fallback runtime used by callers that
/// submit pipeline runs from outside tokio.
///
/// Returns `false` when the count was already fixed, either by an earlier call or
/// because the fallback runtime has started.
pub fn set_fallback_threads(threads: usize) -> bool {
	let accepted = FALLBACK_THREADS.set(threads.max(1)).is_ok();
	if !accepted {
		tracing::debug!(requested = threads, current = fallback_threads(), "worker.fallback_threads.ignored");
	}
	accepted
}

/// Async worker count of the fallback runtime; defaults to the available
/// parallelism, capped at [`MAX_DEFAULT_THREADS`].
pub fn fallback_threads() -> usize {
	*FALLBACK_THREADS.get_or_init(|| std::thread::available_parallelism().map_or(2, |n| n.get().min(MAX_DEFAULT_THREADS)))
}

/// Returns the ambient tokio handle, or the fallback runtime's when the caller is
/// not inside one (plain threads, synchronous hosts).
pub(crate) fn runtime_handle() -> Handle {
	if let Ok(handle) = Handle::try_current() {
		return handle;
	}

	FALLBACK_RUNTIME
		.get_or_init(|| {
			let threads = fallback_threads();
			tracing::debug!(threads, "worker.fallback_runtime.start");
			Builder::new_multi_thread()
				.enable_all()
				.worker_threads(threads)
				.thread_name_fn(|| {
					static NEXT: AtomicUsize = AtomicUsize::new(0);
					format!("hotsplice-run-{}", NEXT.fetch_add(1, Ordering::Relaxed))
				})
				.build()
				.expect("failed to build the hotsplice fallback runtime")
		})
		.handle()
		.clone()
}

/// Spawns a pipeline task tagged with its worker class.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Runs a blocking stage body (compiler, linker, file IO) off the async workers.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}
