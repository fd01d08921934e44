//! Build driver for one compilation unit.
//!
//! Runs the pipeline dirty files → settings → argument file → compiler
//! process and maps the result onto a [`BuildOutcome`].

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::compile::{
    ArgsFile, CompilerSettings, SettingsResolver, build_arguments, canonical_path,
    filter_dirty_files, find_java,
};
use crate::config::{DriverConfig, ExitStatusPolicy};
use crate::diagnostics::{Diagnostic, OutputParser};
use crate::error::Result;
use crate::execute::{AbortHandle, CompilerProcess, JavaCommand};
use crate::host::{BuildCollaborator, CompilationUnit};

/// Tag attached to every diagnostic the driver emits.
pub const BUILDER_NAME: &str = "scala";

/// Result of building one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// No dirty files of the handled kind.
    NothingDone,
    /// The compiler ran to completion.
    Ok,
    /// The unit was not compiled; the reason was emitted as an error.
    Abort,
}

/// Outcome of a build plus what is known about the compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub outcome: BuildOutcome,

    /// Number of source files passed to the compiler
    pub sources: usize,

    /// Exit code of the compiler, if it ran and exited normally
    pub exit_code: Option<i32>,
}

impl BuildReport {
    fn nothing_done() -> Self {
        Self {
            outcome: BuildOutcome::NothingDone,
            sources: 0,
            exit_code: None,
        }
    }

    fn aborted(sources: usize, exit_code: Option<i32>) -> Self {
        Self {
            outcome: BuildOutcome::Abort,
            sources,
            exit_code,
        }
    }
}

/// Compiles units by running the external compiler.
///
/// One driver can serve several units concurrently; each call to
/// [`CompileDriver::build`] owns its settings, argument file and process.
#[derive(Debug, Clone)]
pub struct CompileDriver {
    config: DriverConfig,
    abort: AbortHandle,
}

impl CompileDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            abort: AbortHandle::new(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Handle that cancels running compilations of this driver.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Build one unit.
    ///
    /// Configuration problems are reported through the host and yield
    /// [`BuildOutcome::Abort`]. Launch failures, IO errors and cancellation
    /// are returned as errors.
    pub fn build(&self, unit: &CompilationUnit, host: &dyn BuildCollaborator) -> Result<BuildReport> {
        let dirty = host.dirty_files(unit)?;
        let sources = filter_dirty_files(&dirty, &self.config.source_suffix);

        if sources.is_empty() {
            tracing::debug!("Nothing to compile in unit {}", unit.name);
            return Ok(BuildReport::nothing_done());
        }

        let resolver =
            SettingsResolver::new(self.config.toolchain_root.as_deref(), self.config.backend);
        let settings = match resolver.resolve(unit, host) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!("Configuration error in unit {}: {}", unit.name, e);
                host.emit(Diagnostic::error(BUILDER_NAME, e.to_string()));
                return Ok(BuildReport::aborted(sources.len(), None));
            }
        };
        tracing::debug!("Resolved compiler settings for unit {}: {:?}", unit.name, settings);

        let java = find_java(unit.sdk_home.as_deref(), self.config.java_home.as_deref())?;

        let args = build_arguments(&settings, &sources);
        let args_file = ArgsFile::create(&self.config.args_dir(), &args)?;

        let command = self.java_command(java, &settings, args_file.path());
        tracing::info!(
            "Compiling {} source(s) in unit {} with {}",
            sources.len(),
            unit.name,
            command.java.display()
        );
        tracing::debug!("Compiler command: {:?}", command.argv());

        let result = self.run(&command, host);
        args_file.remove();
        let status = result?;

        Ok(self.map_exit_status(status, sources.len(), host))
    }

    /// Assemble the JVM command line for the runner.
    pub fn java_command(&self, java: PathBuf, settings: &CompilerSettings, args_file: &Path) -> JavaCommand {
        let mut classpath: Vec<String> = settings
            .toolchain_artifacts
            .iter()
            .map(|artifact| canonical_path(artifact))
            .collect();
        if let Some(jar) = &self.config.runner_jar {
            classpath.push(canonical_path(jar));
        }

        JavaCommand {
            java,
            jvm_options: vec![
                format!("-Xmx{}", self.config.max_heap),
                format!("-Dfile.encoding={}", self.config.file_encoding),
            ],
            classpath,
            main_class: self.config.runner_main_class.clone(),
            args: vec![
                self.config.backend.entry_point().to_string(),
                args_file.to_string_lossy().into_owned(),
            ],
        }
    }

    /// Spawn the compiler and forward its output until it exits.
    fn run(&self, command: &JavaCommand, host: &dyn BuildCollaborator) -> Result<ExitStatus> {
        let parser = OutputParser::new(BUILDER_NAME, self.config.output_mode);
        let process = CompilerProcess::spawn(command)?;

        process.wait_with_output(&self.abort, |line| {
            if let Some(diagnostic) = parser.parse_line(&line.text) {
                host.emit(diagnostic);
            }
        })
    }

    fn map_exit_status(
        &self,
        status: ExitStatus,
        sources: usize,
        host: &dyn BuildCollaborator,
    ) -> BuildReport {
        let exit_code = status.code();

        if status.success() || self.config.exit_status == ExitStatusPolicy::Ignore {
            if !status.success() {
                tracing::debug!("Ignoring compiler exit status {}", status);
            }
            return BuildReport {
                outcome: BuildOutcome::Ok,
                sources,
                exit_code,
            };
        }

        let message = match exit_code {
            Some(code) => format!("compiler exited with status {code}"),
            None => "compiler terminated by a signal".to_string(),
        };
        host.emit(Diagnostic::error(BUILDER_NAME, message));
        BuildReport::aborted(sources, exit_code)
    }
}
