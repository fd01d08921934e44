//! Error types for zincrun-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::LibraryScope;

/// Result type for zincrun-core operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// A compilation unit's toolchain configuration could not be resolved.
///
/// These errors are local to one unit: the driver reports them as an error
/// diagnostic and aborts that unit without spawning anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The unit lists no modules.
    #[error("compilation unit {0} has no modules")]
    EmptyUnit(String),

    /// The representative module carries no toolchain configuration.
    #[error("no toolchain configuration in module {0}")]
    NoToolchainConfiguration(String),

    /// The toolchain configuration does not name a library scope.
    #[error("no compiler library scope set in module {0}")]
    NoLibraryScope(String),

    /// The toolchain configuration does not name a library.
    #[error("no compiler library name set in module {0}")]
    NoLibraryName(String),

    /// The configured scope is none of module, project or global.
    #[error("unknown library scope: {0}")]
    UnknownLibraryScope(String),

    /// The named library is not part of the selected collection.
    #[error("compiler library for module {module} not found: {scope} / {library}")]
    LibraryNotFound {
        module: String,
        scope: LibraryScope,
        library: String,
    },

    /// The library resolved but holds no compiled artifacts.
    #[error("compiler library is empty: {0}")]
    EmptyLibrary(String),

    /// No toolchain root was configured for the driver.
    #[error("toolchain root is not configured")]
    NoToolchainRoot,

    /// The toolchain directory is missing, unreadable or empty.
    #[error("no toolchain artifacts found in {}", .0.display())]
    NoToolchainArtifacts(PathBuf),

    /// A required auxiliary artifact is absent from the toolchain directory.
    #[error("no {file} found in {}", dir.display())]
    MissingArtifact { file: String, dir: PathBuf },

    /// The unit has no output directory.
    #[error("output directory not specified for module {0}")]
    NoOutputDirectory(String),
}

/// Errors that abort the driver itself and propagate to the host.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The compiler process could not be started.
    #[error("failed to launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No Java executable could be located for the unit.
    #[error("no Java executable found: configure an SDK for the unit, set java_home, or put java on PATH")]
    JavaNotFound,

    /// The build was cancelled and the compiler process killed.
    #[error("compilation cancelled")]
    Cancelled,

    /// A driver configuration file could not be parsed.
    #[error("invalid driver configuration: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
