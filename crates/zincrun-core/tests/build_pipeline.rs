//! Integration tests for the full build pipeline.
//!
//! A shell script installed as `<sdk>/bin/java` stands in for the JVM. It
//! echoes the runner arguments and the contents of the argument file, so the
//! tests can check exactly what the compiler would have received.

#![cfg(unix)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use zincrun_core::{
    BuildCollaborator, BuildOutcome, CompilationUnit, CompileDriver, Diagnostic, DirtyFile,
    DriverConfig, DriverError, ExitStatusPolicy, Library, LibraryScope, OutputMode, Severity,
    ToolchainSettings,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// Host backed by in-memory maps that records every diagnostic.
#[derive(Default)]
struct TestHost {
    dirty: Vec<DirtyFile>,
    settings: HashMap<String, ToolchainSettings>,
    libraries: HashMap<LibraryScope, Vec<Library>>,
    classpath: Vec<PathBuf>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl BuildCollaborator for TestHost {
    fn dirty_files(&self, _unit: &CompilationUnit) -> std::io::Result<Vec<DirtyFile>> {
        Ok(self.dirty.clone())
    }

    fn toolchain_settings(&self, module: &str) -> Option<ToolchainSettings> {
        self.settings.get(module).cloned()
    }

    fn libraries(&self, scope: LibraryScope, _module: &str) -> Vec<Library> {
        self.libraries.get(&scope).cloned().unwrap_or_default()
    }

    fn compilation_classpath(&self, _unit: &CompilationUnit, _include_tests: bool) -> Vec<PathBuf> {
        self.classpath.clone()
    }

    fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

impl TestHost {
    fn messages(&self) -> Vec<String> {
        self.diagnostics
            .borrow()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    /// Lines the fake compiler echoed with the given prefix, prefix removed.
    fn echoed(&self, prefix: &str) -> Vec<String> {
        self.messages()
            .iter()
            .filter_map(|m| m.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// A project on disk: Zinc directory, fake JDK, sources and args directory.
struct TestProject {
    temp: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path();

        fs::create_dir_all(root.join("zinc")).unwrap();
        for jar in ["sbt-interface.jar", "compiler-interface-sources.jar", "zinc.jar"] {
            fs::write(root.join("zinc").join(jar), b"jar").unwrap();
        }

        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/scala-compiler.jar"), b"jar").unwrap();
        fs::write(root.join("lib/scala-library.jar"), b"jar").unwrap();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/A.scala"), "object A").unwrap();
        fs::write(root.join("src/B.java"), "class B {}").unwrap();

        fs::create_dir_all(root.join("args")).unwrap();

        let project = Self { temp };
        project.install_java("exit 0");
        project
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Install a fake `java` that echoes its inputs and then runs `tail`.
    fn install_java(&self, tail: &str) {
        let bin = self.root().join("jdk/bin");
        fs::create_dir_all(&bin).unwrap();
        let script = format!(
            "#!/bin/sh\n\
             echo \"heap:$1\"\n\
             echo \"main:$5\"\n\
             echo \"entry:$6\"\n\
             echo \"argsfile:$7\"\n\
             while IFS= read -r line || [ -n \"$line\" ]; do echo \"arg:$line\"; done < \"$7\"\n\
             {tail}\n"
        );
        let java = bin.join("java");
        fs::write(&java, script).unwrap();
        fs::set_permissions(&java, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn config(&self) -> DriverConfig {
        DriverConfig {
            args_dir: Some(self.root().join("args")),
            ..DriverConfig::with_toolchain_root(self.root().join("zinc"))
        }
    }

    fn unit(&self) -> CompilationUnit {
        CompilationUnit {
            output_dir: Some(self.root().join("out")),
            sdk_home: Some(self.root().join("jdk")),
            ..CompilationUnit::new("M", vec!["M".to_string()])
        }
    }

    fn host(&self) -> TestHost {
        let mut host = TestHost {
            dirty: vec![
                DirtyFile::new("M", self.root().join("src/A.scala"), self.root().join("src")),
                DirtyFile::new("M", self.root().join("src/B.java"), self.root().join("src")),
            ],
            classpath: vec![self.root().join("lib/scala-library.jar")],
            ..Default::default()
        };
        host.settings.insert(
            "M".to_string(),
            ToolchainSettings {
                compiler_library_scope: Some("Project".to_string()),
                compiler_library_name: Some("scala-compiler".to_string()),
            },
        );
        host.libraries.insert(
            LibraryScope::Project,
            vec![Library::new(
                "scala-compiler",
                vec![
                    self.root().join("lib/scala-library.jar"),
                    self.root().join("lib/scala-compiler.jar"),
                ],
            )],
        );
        host
    }

    fn leftover_args_files(&self) -> usize {
        fs::read_dir(self.root().join("args")).unwrap().count()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_successful_build_streams_output() {
    let project = TestProject::new();
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    let report = driver.build(&project.unit(), &host).unwrap();

    assert_eq!(report.outcome, BuildOutcome::Ok);
    assert_eq!(report.sources, 1);
    assert_eq!(report.exit_code, Some(0));

    assert_eq!(host.echoed("heap:"), vec!["-Xmx384m"]);
    assert_eq!(host.echoed("entry:"), vec!["com.typesafe.zinc.Main"]);
    assert!(
        host.diagnostics
            .borrow()
            .iter()
            .all(|d| d.severity == Severity::Warning && d.source == "scala")
    );
}

#[test]
fn test_args_file_contents() {
    let project = TestProject::new();
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    driver.build(&project.unit(), &host).unwrap();

    let args = host.echoed("arg:");
    assert_eq!(args.len(), 11 + 1);
    assert_eq!(args[0], "-debug");
    assert_eq!(args[1], "-scala-path");
    assert_eq!(args[3], "-sbt-interface");
    assert!(args[4].ends_with("sbt-interface.jar"));
    assert_eq!(args[5], "-compiler-interface");
    assert!(args[6].ends_with("compiler-interface-sources.jar"));
    assert_eq!(args[7], "-d");
    assert!(Path::new(&args[8]).ends_with("out"));
    assert_eq!(args[9], "-cp");

    let source = fs::canonicalize(project.root().join("src/A.scala")).unwrap();
    assert_eq!(args[11], source.to_string_lossy());
}

#[test]
fn test_args_file_removed_after_success() {
    let project = TestProject::new();
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    driver.build(&project.unit(), &host).unwrap();

    let args_file = host.echoed("argsfile:");
    assert_eq!(args_file.len(), 1);
    assert!(!Path::new(&args_file[0]).exists());
    assert_eq!(project.leftover_args_files(), 0);
}

#[test]
fn test_nonzero_exit_is_still_ok_by_default() {
    let project = TestProject::new();
    project.install_java("echo done\nexit 2");
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    let report = driver.build(&project.unit(), &host).unwrap();

    assert_eq!(report.outcome, BuildOutcome::Ok);
    assert_eq!(report.exit_code, Some(2));
    assert!(
        host.diagnostics
            .borrow()
            .iter()
            .all(|d| d.severity != Severity::Error)
    );
}

#[test]
fn test_nonzero_exit_aborts_when_enforced() {
    let project = TestProject::new();
    project.install_java("exit 2");
    let host = project.host();
    let config = DriverConfig {
        exit_status: ExitStatusPolicy::Fail,
        ..project.config()
    };

    let report = CompileDriver::new(config).build(&project.unit(), &host).unwrap();

    assert_eq!(report.outcome, BuildOutcome::Abort);
    let last = host.diagnostics.borrow().last().cloned().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert_eq!(last.message, "compiler exited with status 2");
    assert_eq!(project.leftover_args_files(), 0);
}

#[test]
fn test_structured_output_mode() {
    let project = TestProject::new();
    project.install_java("echo \"/work/A.scala:3: error: type mismatch\" 1>&2");
    let host = project.host();
    let config = DriverConfig {
        output_mode: OutputMode::Structured,
        ..project.config()
    };

    CompileDriver::new(config).build(&project.unit(), &host).unwrap();

    let diagnostics = host.diagnostics.borrow();
    let error = diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
        .expect("error diagnostic");
    assert_eq!(error.message, "type mismatch");
    let location = error.location.as_ref().unwrap();
    assert_eq!(location.file, PathBuf::from("/work/A.scala"));
    assert_eq!(location.line, 3);
    assert!(diagnostics.iter().any(|d| d.severity == Severity::Info));
}

#[test]
fn test_launch_failure_propagates_and_cleans_up() {
    let project = TestProject::new();
    let host = project.host();
    let driver = CompileDriver::new(project.config());
    let unit = CompilationUnit {
        sdk_home: Some(project.root().join("no-such-jdk")),
        ..project.unit()
    };

    let err = driver.build(&unit, &host).unwrap_err();

    assert!(matches!(err, DriverError::Launch { .. }));
    assert!(err.to_string().contains("no-such-jdk"));
    assert_eq!(project.leftover_args_files(), 0);
}

#[test]
fn test_args_file_write_failure_is_io_error() {
    let project = TestProject::new();
    let blocker = project.root().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();
    let host = project.host();
    let config = DriverConfig {
        args_dir: Some(blocker.join("args")),
        ..project.config()
    };

    let err = CompileDriver::new(config).build(&project.unit(), &host).unwrap_err();

    assert!(matches!(err, DriverError::Io(_)));
    assert!(host.messages().is_empty());
    assert_eq!(project.leftover_args_files(), 0);
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "file");
}

#[test]
fn test_missing_artifact_aborts_without_spawning() {
    let project = TestProject::new();
    fs::remove_file(project.root().join("zinc/sbt-interface.jar")).unwrap();
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    let report = driver.build(&project.unit(), &host).unwrap();

    assert_eq!(report.outcome, BuildOutcome::Abort);
    let messages = host.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("sbt-interface.jar"));
    assert_eq!(project.leftover_args_files(), 0);
}

#[test]
fn test_empty_dirty_set_touches_nothing() {
    let project = TestProject::new();
    let mut host = project.host();
    host.dirty.clear();
    // A broken toolchain proves resolution is never attempted.
    let config = DriverConfig {
        toolchain_root: None,
        ..project.config()
    };

    let report = CompileDriver::new(config).build(&project.unit(), &host).unwrap();

    assert_eq!(report.outcome, BuildOutcome::NothingDone);
    assert!(host.messages().is_empty());
    assert_eq!(project.leftover_args_files(), 0);
}

#[test]
fn test_cancellation_kills_compiler() {
    let project = TestProject::new();
    project.install_java("exec sleep 30");
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    let abort = driver.abort_handle();
    let killer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        abort.abort();
    });

    let err = driver.build(&project.unit(), &host).unwrap_err();
    killer.join().unwrap();

    assert!(matches!(err, DriverError::Cancelled));
    assert_eq!(project.leftover_args_files(), 0);
}

#[test]
fn test_cancellation_with_forking_launcher() {
    let project = TestProject::new();
    // The shell stays the parent of `sleep`, which keeps the pipes open.
    project.install_java("sleep 5\necho late");
    let host = project.host();
    let driver = CompileDriver::new(project.config());

    let abort = driver.abort_handle();
    let killer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        abort.abort();
    });

    let start = std::time::Instant::now();
    let err = driver.build(&project.unit(), &host).unwrap_err();
    killer.join().unwrap();

    assert!(matches!(err, DriverError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(4));
    assert!(host.echoed("late").is_empty());
    assert_eq!(project.leftover_args_files(), 0);
}
