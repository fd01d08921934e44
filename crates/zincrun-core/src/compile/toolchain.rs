//! Toolchain discovery for the external compiler.
//!
//! Locates the compiler backend's auxiliary artifacts in the configured
//! toolchain directory and the Java executable used to run it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, DriverError, Result};

/// Compiler backends the runner can delegate to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerBackend {
    /// Typesafe Zinc incremental Scala compiler.
    #[default]
    Zinc,
}

impl CompilerBackend {
    /// Main class the runner invokes.
    pub fn entry_point(&self) -> &'static str {
        match self {
            Self::Zinc => "com.typesafe.zinc.Main",
        }
    }

    /// File name of the sbt interface jar.
    pub fn sbt_interface_jar(&self) -> &'static str {
        match self {
            Self::Zinc => "sbt-interface.jar",
        }
    }

    /// File name of the compiler interface sources jar.
    pub fn compiler_interface_jar(&self) -> &'static str {
        match self {
            Self::Zinc => "compiler-interface-sources.jar",
        }
    }
}

/// Listing of the toolchain directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// The toolchain directory itself
    pub root: PathBuf,

    /// Files found in it, sorted by file name
    pub artifacts: Vec<PathBuf>,
}

impl Toolchain {
    /// List the artifacts in `root`.
    ///
    /// A missing, unreadable or empty directory is a configuration error.
    pub fn discover(root: &Path) -> std::result::Result<Self, ConfigurationError> {
        let no_artifacts = || ConfigurationError::NoToolchainArtifacts(root.to_path_buf());

        let entries = std::fs::read_dir(root).map_err(|e| {
            tracing::debug!("Cannot read toolchain directory {}: {}", root.display(), e);
            no_artifacts()
        })?;

        let mut artifacts: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();

        if artifacts.is_empty() {
            return Err(no_artifacts());
        }

        artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self {
            root: root.to_path_buf(),
            artifacts,
        })
    }

    /// Find an artifact by exact file name.
    pub fn find(&self, file_name: &str) -> std::result::Result<PathBuf, ConfigurationError> {
        self.artifacts
            .iter()
            .find(|path| path.file_name().is_some_and(|name| name == file_name))
            .cloned()
            .ok_or_else(|| ConfigurationError::MissingArtifact {
                file: file_name.to_string(),
                dir: self.root.clone(),
            })
    }
}

/// Platform-specific name of the Java launcher.
pub fn java_binary_name() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "java.exe"
    }
    #[cfg(not(target_os = "windows"))]
    {
        "java"
    }
}

/// Java launcher inside a JDK home directory.
pub fn java_in_home(home: &Path) -> PathBuf {
    home.join("bin").join(java_binary_name())
}

/// Locate the Java executable for a unit.
///
/// Order: the unit's SDK, the configured `java_home`, `JAVA_HOME`, then
/// `java` on `PATH`. The SDK path is returned without checking that the
/// launcher exists; a broken SDK shows up as a launch failure.
pub fn find_java(sdk_home: Option<&Path>, java_home: Option<&Path>) -> Result<PathBuf> {
    if let Some(sdk) = sdk_home {
        return Ok(java_in_home(sdk));
    }

    if let Some(home) = java_home {
        return Ok(java_in_home(home));
    }

    if let Ok(home) = std::env::var("JAVA_HOME") {
        let java = java_in_home(Path::new(&home));
        if java.exists() {
            return Ok(java);
        }
    }

    which::which("java").map_err(|_| DriverError::JavaNotFound)
}
