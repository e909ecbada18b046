/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Async orchestration work that mostly waits on other tasks.
	Background,
	/// Blocking I/O work: artifact writes, module copies, library loading.
	IoBlocking,
	/// CPU-intensive blocking work: compiler and linker invocations.
	CpuBlocking,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Background => "background",
			Self::IoBlocking => "io_blocking",
			Self::CpuBlocking => "cpu_blocking",
		}
	}
}
