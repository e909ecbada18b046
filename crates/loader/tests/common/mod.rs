#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hotsplice_loader::{ElementRef, LoadError, LoadedModule, ModuleElement, ModuleIdentity, ModuleOpener, SymbolAddress, SymbolName};

/// Element answering a fixed set of exported names.
#[derive(Debug)]
pub struct FakeElement {
	pub identity: Option<ModuleIdentity>,
	pub symbols: HashMap<String, usize>,
}

impl ModuleElement for FakeElement {
	fn identity(&self) -> Option<&ModuleIdentity> {
		self.identity.as_ref()
	}

	fn find(&self, symbol: &SymbolName) -> Option<SymbolAddress> {
		self.symbols.get(symbol.exported()).and_then(|&addr| SymbolAddress::new(addr as *const c_void))
	}
}

/// Writes a fake module file listing `name=address` lines.
pub fn write_module(dir: &Path, file: &str, symbols: &[(&str, usize)]) -> PathBuf {
	let path = dir.join(file);
	let body: String = symbols.iter().map(|(name, addr)| format!("{name}={addr}\n")).collect();
	fs::write(&path, body).unwrap();
	path
}

/// Builds one element per module file.
pub fn element(path: &Path, symbols: &[(&str, usize)]) -> ElementRef {
	Arc::new(FakeElement {
		identity: Some(ModuleIdentity::of(path).unwrap()),
		symbols: symbols.iter().map(|(n, a)| (n.to_string(), *a)).collect(),
	})
}

pub fn anonymous(symbols: &[(&str, usize)]) -> ElementRef {
	Arc::new(FakeElement {
		identity: None,
		symbols: symbols.iter().map(|(n, a)| (n.to_string(), *a)).collect(),
	})
}

/// Opener reading files written by [`write_module`].
#[derive(Debug, Default)]
pub struct FakeOpener {
	pub opens: AtomicUsize,
}

impl FakeOpener {
	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}
}

impl ModuleOpener for FakeOpener {
	fn open(&self, module_file: &Path, _scratch_dir: &Path) -> Result<LoadedModule, LoadError> {
		self.opens.fetch_add(1, Ordering::SeqCst);
		let text = fs::read_to_string(module_file).map_err(|_| LoadError::ModuleMissing(module_file.to_path_buf()))?;
		let symbols = text
			.lines()
			.filter_map(|line| line.split_once('='))
			.filter_map(|(name, addr)| Some((name.to_string(), addr.parse().ok()?)))
			.collect();
		let identity = ModuleIdentity::of(module_file)?;
		let element = Arc::new(FakeElement {
			identity: Some(identity.clone()),
			symbols,
		});
		Ok(LoadedModule::new(identity, vec![element]))
	}
}

pub fn names(names: &[&str]) -> Vec<SymbolName> {
	names.iter().map(|n| SymbolName::parse(n).unwrap()).collect()
}
