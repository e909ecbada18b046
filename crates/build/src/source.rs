use std::fs;
use std::path::PathBuf;

use crate::error::CompileError;

/// Text encoding of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceEncoding {
	#[default]
	Utf8,
	Latin1,
}

impl SourceEncoding {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Utf8 => "UTF-8",
			Self::Latin1 => "ISO-8859-1",
		}
	}

	/// Parses common encoding labels, case-insensitively.
	pub fn from_label(label: &str) -> Option<Self> {
		match label.to_ascii_lowercase().as_str() {
			"utf-8" | "utf8" => Some(Self::Utf8),
			"latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Some(Self::Latin1),
			_ => None,
		}
	}
}

/// Where a unit's source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
	Text(String),
	File { path: PathBuf, encoding: SourceEncoding },
}

impl SourceInput {
	/// Returns the source as text, decoding files with their declared encoding.
	pub fn read_text(&self) -> Result<String, CompileError> {
		match self {
			Self::Text(text) => Ok(text.clone()),
			Self::File { path, encoding } => {
				let bytes = fs::read(path)?;
				let decode_err = || CompileError::Decode {
					path: path.clone(),
					encoding: encoding.as_str(),
				};
				match encoding {
					SourceEncoding::Utf8 => {
						let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
						String::from_utf8(bytes.to_vec()).map_err(|_| decode_err())
					}
					SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
				}
			}
		}
	}
}

/// One named unit handed to a [`crate::SourceCompiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
	pub name: String,
	pub source: SourceInput,
}

/// A compiled unit held in memory until the write stage persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeUnit {
	pub name: String,
	pub bytes: Vec<u8>,
}
