//! Compiler settings resolution.
//!
//! Turns a compilation unit's configuration into a complete
//! [`CompilerSettings`] snapshot, or a single [`ConfigurationError`].

use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;
use crate::host::{BuildCollaborator, CompilationUnit, Library, LibraryScope};

use super::toolchain::{CompilerBackend, Toolchain};

type Resolution<T> = std::result::Result<T, ConfigurationError>;

/// Everything the compiler needs for one invocation.
///
/// Created once per build, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Compiled artifacts of the Scala compiler library
    pub compiler_library: Vec<PathBuf>,

    /// Path to the sbt interface jar
    pub sbt_interface: PathBuf,

    /// Path to the compiler interface sources jar
    pub compiler_interface: PathBuf,

    /// Output directory of the unit
    pub output_dir: PathBuf,

    /// Compilation classpath of the unit
    pub classpath: Vec<PathBuf>,

    /// All artifacts of the toolchain directory (runner classpath)
    pub toolchain_artifacts: Vec<PathBuf>,
}

/// Resolves [`CompilerSettings`] against the host's module/library model.
pub struct SettingsResolver<'a> {
    toolchain_root: Option<&'a Path>,
    backend: CompilerBackend,
}

impl<'a> SettingsResolver<'a> {
    /// Create a resolver for the given toolchain directory and backend.
    pub fn new(toolchain_root: Option<&'a Path>, backend: CompilerBackend) -> Self {
        Self {
            toolchain_root,
            backend,
        }
    }

    /// Resolve the settings of `unit`.
    ///
    /// Any failing step aborts the whole resolution.
    pub fn resolve(
        &self,
        unit: &CompilationUnit,
        host: &dyn BuildCollaborator,
    ) -> Resolution<CompilerSettings> {
        let module = unit
            .representative_module()
            .ok_or_else(|| ConfigurationError::EmptyUnit(unit.name.clone()))?;

        let library = self.compiler_library(module, host)?;

        if library.files.is_empty() {
            return Err(ConfigurationError::EmptyLibrary(library.name));
        }

        let root = self.toolchain_root.ok_or(ConfigurationError::NoToolchainRoot)?;
        let toolchain = Toolchain::discover(root)?;

        let sbt_interface = toolchain.find(self.backend.sbt_interface_jar())?;
        let compiler_interface = toolchain.find(self.backend.compiler_interface_jar())?;

        let output_dir = unit
            .output_dir
            .clone()
            .ok_or_else(|| ConfigurationError::NoOutputDirectory(module.to_string()))?;

        let classpath = host.compilation_classpath(unit, unit.contains_tests);

        Ok(CompilerSettings {
            compiler_library: library.files,
            sbt_interface,
            compiler_interface,
            output_dir,
            classpath,
            toolchain_artifacts: toolchain.artifacts,
        })
    }

    /// Find the compiler library named by the module's toolchain configuration.
    fn compiler_library(&self, module: &str, host: &dyn BuildCollaborator) -> Resolution<Library> {
        let settings = host
            .toolchain_settings(module)
            .ok_or_else(|| ConfigurationError::NoToolchainConfiguration(module.to_string()))?;

        let raw_scope = settings
            .compiler_library_scope
            .ok_or_else(|| ConfigurationError::NoLibraryScope(module.to_string()))?;

        let name = settings
            .compiler_library_name
            .ok_or_else(|| ConfigurationError::NoLibraryName(module.to_string()))?;

        let scope: LibraryScope = raw_scope.parse()?;

        host.libraries(scope, module)
            .into_iter()
            .find(|library| library.name == name)
            .ok_or(ConfigurationError::LibraryNotFound {
                module: module.to_string(),
                scope,
                library: name,
            })
    }
}
