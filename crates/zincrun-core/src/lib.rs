//! Core engine for the zincrun compilation driver.
//!
//! This crate provides:
//! - Compiler settings resolution from the host's module/library model
//! - Dirty file filtering and argument file construction
//! - External compiler process execution with streamed diagnostics
//! - Build outcome mapping for the host's build scheduler

pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod execute;
pub mod host;

pub use compile::{
    ArgsFile, CompilerBackend, CompilerSettings, SettingsResolver, build_arguments,
    filter_dirty_files,
};
pub use config::{DriverConfig, DriverConfigFile, ExitStatusPolicy, OutputMode};
pub use diagnostics::{Diagnostic, OutputParser, Severity, SourceLocation};
pub use driver::{BUILDER_NAME, BuildOutcome, BuildReport, CompileDriver};
pub use error::{ConfigurationError, DriverError, Result};
pub use execute::{AbortHandle, CompilerProcess, JavaCommand, OutputLine, StreamKind};
pub use host::{
    BuildCollaborator, CompilationUnit, DirtyFile, Library, LibraryScope, ToolchainSettings,
};
