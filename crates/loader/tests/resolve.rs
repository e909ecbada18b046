#![allow(unused_crate_dependencies)]

mod common;

use std::fs;
use std::sync::Arc;

use common::{FakeOpener, element, names, write_module};
use hotsplice_loader::{HostLoader, LoadError, ResolveVia, SymbolLoader, SymbolRegistry, merge_into};

fn loader(scratch: &std::path::Path) -> (SymbolLoader, Arc<FakeOpener>, Arc<SymbolRegistry>) {
	let opener = Arc::new(FakeOpener::default());
	let registry = Arc::new(SymbolRegistry::new());
	let loader = SymbolLoader::new(opener.clone(), scratch, Arc::clone(&registry));
	(loader, opener, registry)
}

#[test]
fn partial_batch_keeps_successes() {
	let dir = tempfile::tempdir().unwrap();
	let module = write_module(dir.path(), "libgreeter.so", &[("a_One", 1), ("a_Two", 2), ("a_Three", 3)]);
	let (loader, _, registry) = loader(dir.path());

	let batch = loader
		.resolve(&names(&["a.One", "a.Two", "a.Missing", "a.Three"]), ResolveVia::Module(&module))
		.unwrap();

	assert_eq!(batch.resolved.len(), 3);
	assert_eq!(batch.failures.len(), 1);
	assert!(!batch.is_complete());
	assert_eq!(batch.failures[0].symbol(), Some("a.Missing"));
	assert_eq!(batch.resolved.keys().collect::<Vec<_>>(), ["a.One", "a.Two", "a.Three"]);
	assert_eq!(registry.names(), ["a.One", "a.Three", "a.Two"]);
	assert!(!registry.contains("a.Missing"));
}

#[test]
fn module_loader_is_reused_for_unchanged_file() {
	let dir = tempfile::tempdir().unwrap();
	let module = write_module(dir.path(), "libgreeter.so", &[("greet", 7)]);
	let (loader, opener, registry) = loader(dir.path());

	let first = loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();
	let second = loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();

	assert_eq!(opener.opens(), 1);
	assert_eq!(loader.cached_modules(), 1);
	assert_eq!(first.get("greet"), second.get("greet"));
	assert_eq!(registry.get("greet").as_ref(), second.get("greet"));
	assert_eq!(registry.len(), 1);
}

#[cfg(unix)]
#[test]
fn rebuilt_module_is_reopened() {
	let dir = tempfile::tempdir().unwrap();
	let module = write_module(dir.path(), "libgreeter.so", &[("greet", 7)]);
	let (loader, opener, registry) = loader(dir.path());
	loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();

	fs::rename(&module, dir.path().join("old.so")).unwrap();
	write_module(dir.path(), "libgreeter.so", &[("greet", 9)]);
	let batch = loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();

	assert_eq!(opener.opens(), 2);
	assert_eq!(batch.get("greet").unwrap().address().as_ptr() as usize, 9);
	assert_eq!(registry.get("greet").unwrap().address().as_ptr() as usize, 9);
}

#[cfg(unix)]
#[test]
fn rebuilds_keep_one_loader_per_path() {
	let dir = tempfile::tempdir().unwrap();
	let module = write_module(dir.path(), "libgreeter.so", &[("greet", 1)]);
	let (loader, opener, _) = loader(dir.path());
	loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();
	let other = write_module(dir.path(), "libother.so", &[("other", 2)]);
	loader.resolve(&names(&["other"]), ResolveVia::Module(&other)).unwrap();

	let mut held = Vec::new();
	for version in 2..=5 {
		let keep = dir.path().join(format!("old{version}.so"));
		fs::rename(&module, &keep).unwrap();
		held.push(keep);
		write_module(dir.path(), "libgreeter.so", &[("greet", version)]);
		let batch = loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();
		assert_eq!(batch.get("greet").unwrap().address().as_ptr() as usize, version);
		assert_eq!(loader.cached_modules(), 2);
	}

	assert_eq!(opener.opens(), 6);
	loader.resolve(&names(&["other"]), ResolveVia::Module(&other)).unwrap();
	assert_eq!(opener.opens(), 6);
}

#[test]
fn missing_module_fails_the_batch() {
	let dir = tempfile::tempdir().unwrap();
	let (loader, opener, _) = loader(dir.path());

	let err = loader
		.resolve(&names(&["greet"]), ResolveVia::Module(&dir.path().join("libabsent.so")))
		.unwrap_err();
	assert!(matches!(err, LoadError::ModuleMissing(_)));
	assert_eq!(opener.opens(), 0);
}

#[test]
fn host_resolution_sees_merged_module_only() {
	let dir = tempfile::tempdir().unwrap();
	let module = write_module(dir.path(), "libgreeter.so", &[("com_example_Greeter", 42)]);
	let (loader, _, registry) = loader(dir.path());
	let host = HostLoader::new();

	let before = loader.resolve(&names(&["com.example.Greeter"]), ResolveVia::Host(&host)).unwrap();
	assert!(before.resolved.is_empty());
	assert!(matches!(before.failures[0], LoadError::SymbolNotFound { .. }));

	let opened = loader.open(&module).unwrap();
	merge_into(&host, opened.elements()).unwrap();

	let after = loader.resolve(&names(&["com.example.Greeter"]), ResolveVia::Host(&host)).unwrap();
	assert!(after.is_complete());
	assert_eq!(registry.get("com.example.Greeter").unwrap().address().as_ptr() as usize, 42);
}

#[test]
fn module_scope_is_isolated_from_host() {
	let dir = tempfile::tempdir().unwrap();
	let host_file = write_module(dir.path(), "libhost.so", &[]);
	let module = write_module(dir.path(), "libgreeter.so", &[("greet", 1)]);
	let (loader, _, _) = loader(dir.path());
	let host = HostLoader::from_elements(vec![element(&host_file, &[("host_only", 5)])]);

	let batch = loader.resolve(&names(&["greet", "host_only"]), ResolveVia::Module(&module)).unwrap();
	assert!(batch.get("greet").is_some());
	assert_eq!(batch.failures[0].symbol(), Some("host_only"));
	assert!(host.resolve(&names(&["greet"])[0]).is_none());
}

#[test]
fn registry_reinsert_is_idempotent() {
	let dir = tempfile::tempdir().unwrap();
	let module = write_module(dir.path(), "libgreeter.so", &[("greet", 3)]);
	let (loader, _, registry) = loader(dir.path());
	let batch = loader.resolve(&names(&["greet"]), ResolveVia::Module(&module)).unwrap();

	let handle = batch.get("greet").unwrap().clone();
	let previous = registry.insert(handle.clone());
	assert_eq!(previous.as_ref(), Some(&handle));
	assert_eq!(registry.get("greet"), Some(handle));
	assert_eq!(registry.len(), 1);
}
