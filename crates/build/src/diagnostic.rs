//! Compiler diagnostics.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
	Error,
	Warning,
}

impl Severity {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Error => "error",
			Self::Warning => "warning",
		}
	}
}

/// One error or warning reported by the compiler, with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub severity: Severity,
	pub file: String,
	pub line: u32,
	pub column: u32,
	pub message: String,
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}: {}: {}", self.file, self.line, self.column, self.severity.as_str(), self.message)
	}
}

/// GCC/Clang style: `file:line:col: error: message`.
static GNU_STYLE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?m)^(?P<file>[^\n]+?):(?P<line>\d+):(?P<col>\d+): (?P<sev>fatal error|error|warning): (?P<msg>[^\n]*?)\r?$")
		.expect("diagnostic pattern is valid")
});

/// MSVC/clang-cl style: `file(line,col): error C2143: message`.
static MSVC_STYLE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?m)^(?P<file>[^\n]+?)\((?P<line>\d+),(?P<col>\d+)\): ?(?P<sev>fatal error|error|warning)(?: [A-Z]+\d+)?: (?P<msg>[^\n]*?)\r?$")
		.expect("diagnostic pattern is valid")
});

/// Extracts errors and warnings from compiler output, in output order.
///
/// Notes, caret lines and anything else unrecognised are skipped.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
	let mut found: Vec<(usize, Diagnostic)> = [&*GNU_STYLE, &*MSVC_STYLE]
		.into_iter()
		.flat_map(|re| re.captures_iter(output))
		.filter_map(|caps| {
			let start = caps.get(0)?.start();
			let severity = match &caps["sev"] {
				"warning" => Severity::Warning,
				_ => Severity::Error,
			};
			Some((
				start,
				Diagnostic {
					severity,
					file: caps["file"].to_string(),
					line: caps["line"].parse().ok()?,
					column: caps["col"].parse().ok()?,
					message: caps["msg"].trim().to_string(),
				},
			))
		})
		.collect();
	found.sort_by_key(|(start, _)| *start);
	found.into_iter().map(|(_, d)| d).collect()
}
