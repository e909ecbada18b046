//! Drives the real C toolchain. Each test returns early when no compiler is found.

#![allow(unused_crate_dependencies)]

use hotsplice_build::{
	AssembleOptions, CcCompiler, CompileError, Diagnostic, LinkAssembler, Severity, SourceCompiler, SourceInput, SourceUnit, assemble_module,
	find_c_compiler, library_extension, persist,
};

fn compiler() -> Option<CcCompiler> {
	find_c_compiler().map(CcCompiler::new)
}

fn unit(name: &str, text: &str) -> SourceUnit {
	SourceUnit {
		name: name.into(),
		source: SourceInput::Text(text.into()),
	}
}

#[test]
fn compiles_persists_and_links() {
	let Some(cc) = compiler() else { return };
	let dir = tempfile::tempdir().unwrap();

	let units = cc
		.compile(&unit("Greeter", "int com_example_Greeter(void) { return 42; }\n"), None)
		.unwrap();
	assert_eq!(units.len(), 1);
	assert_eq!(units[0].name, "Greeter");
	assert!(!units[0].bytes.is_empty());

	let object = persist(&units, "Greeter", &dir.path().join("artifacts"), "Greeter.o").unwrap();
	let module = dir.path().join("modules").join(format!("Greeter.{}", library_extension()));
	let linker = LinkAssembler::new(cc.program());
	assemble_module(&linker, &[object.clone()], &module, &AssembleOptions::default()).unwrap();

	assert!(module.is_file());
	assert!(!object.exists());
}

#[test]
fn syntax_error_is_located() {
	let Some(cc) = compiler() else { return };
	let mut seen: Vec<Diagnostic> = Vec::new();
	let mut sink = |d: Diagnostic| seen.push(d);

	let err = cc
		.compile(&unit("Broken", "int broken(void) {\n  return 1\n}\n"), Some(&mut sink))
		.unwrap_err();

	let CompileError::Rejected { file, line, .. } = err else {
		panic!("expected a source rejection, got {err:?}");
	};
	assert_eq!(file.as_deref(), Some("Broken.c"));
	assert!(line.is_some_and(|l| (2..=3).contains(&l)));
	assert!(seen.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn warnings_do_not_fail() {
	let Some(cc) = compiler() else { return };
	let cc = cc.flag("-Wall");
	let mut seen = Vec::new();
	let mut sink = |d: Diagnostic| seen.push(d);

	let source = "int warn(void) { int unused; return 0; }\n";
	let units = cc.compile(&unit("Warn", source), Some(&mut sink)).unwrap();

	assert_eq!(units.len(), 1);
	assert!(seen.iter().all(|d| d.severity == Severity::Warning));
	assert!(!seen.is_empty());
}
