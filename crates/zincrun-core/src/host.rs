//! The build host as seen by the driver.
//!
//! The driver never depends on a concrete build framework. Everything it
//! reads from the host (dirty files, module and library model, classpath)
//! and everything it reports back (diagnostics) goes through
//! [`BuildCollaborator`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::error::ConfigurationError;

/// A set of modules compiled together, typically because of cyclic
/// dependencies between them.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    /// Display name of the unit
    pub name: String,

    /// Module names; the first one is the representative module
    pub modules: Vec<String>,

    /// Directory that receives compiled classes
    pub output_dir: Option<PathBuf>,

    /// Home directory of the JDK configured for the unit
    pub sdk_home: Option<PathBuf>,

    /// Whether the unit contains test targets
    pub contains_tests: bool,
}

impl CompilationUnit {
    /// Create a unit with the given modules and no other settings.
    pub fn new(name: impl Into<String>, modules: Vec<String>) -> Self {
        Self {
            name: name.into(),
            modules,
            ..Default::default()
        }
    }

    /// The module whose configuration stands for the whole unit.
    pub fn representative_module(&self) -> Option<&str> {
        self.modules.first().map(String::as_str)
    }
}

/// A source file the host has flagged as changed since the last build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyFile {
    /// Build target (module) the file belongs to
    pub target: String,

    /// Path of the changed file
    pub file: PathBuf,

    /// Source root containing the file
    pub source_root: PathBuf,
}

impl DirtyFile {
    pub fn new(target: impl Into<String>, file: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            file: file.into(),
            source_root: source_root.into(),
        }
    }
}

/// Collection a compiler library is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryScope {
    Module,
    Project,
    Global,
}

impl fmt::Display for LibraryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Module => "Module",
            Self::Project => "Project",
            Self::Global => "Global",
        };
        f.write_str(name)
    }
}

impl FromStr for LibraryScope {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "module" => Ok(Self::Module),
            "project" => Ok(Self::Project),
            "global" => Ok(Self::Global),
            _ => Err(ConfigurationError::UnknownLibraryScope(s.to_string())),
        }
    }
}

/// A named library and its compiled artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,

    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl Library {
    pub fn new(name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// Per-module toolchain configuration.
///
/// Values are kept as the host stores them; the scope is parsed during
/// resolution so that an unrecognised value surfaces as a configuration
/// error for the unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainSettings {
    #[serde(default)]
    pub compiler_library_scope: Option<String>,

    #[serde(default)]
    pub compiler_library_name: Option<String>,
}

/// Everything the driver needs from the build host.
pub trait BuildCollaborator {
    /// Changed files of the unit, in the host's enumeration order.
    fn dirty_files(&self, unit: &CompilationUnit) -> std::io::Result<Vec<DirtyFile>>;

    /// Toolchain configuration attached to a module, if any.
    fn toolchain_settings(&self, module: &str) -> Option<ToolchainSettings>;

    /// Libraries visible in `scope`. For [`LibraryScope::Module`] this is the
    /// collection of `module`; other scopes ignore it.
    fn libraries(&self, scope: LibraryScope, module: &str) -> Vec<Library>;

    /// Full compilation classpath of the unit.
    fn compilation_classpath(&self, unit: &CompilationUnit, include_tests: bool) -> Vec<PathBuf>;

    /// Deliver a diagnostic to the host's message sink.
    fn emit(&self, diagnostic: Diagnostic);
}
