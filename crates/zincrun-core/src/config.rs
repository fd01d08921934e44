//! Driver configuration.
//!
//! [`DriverConfig`] is the resolved configuration used by the driver.
//! [`DriverConfigFile`] is the on-disk form: every field optional, so that
//! several files (user config, project manifest) can be layered over the
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compile::CompilerBackend;
use crate::error::{DriverError, Result};

/// Main class of the runner shipped in the driver's deployment jar.
pub const DEFAULT_RUNNER_MAIN_CLASS: &str = "org.jetbrains.jps.incremental.scala.ClassRunner";

/// How compiler output lines are turned into diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every line is a warning.
    #[default]
    Plain,
    /// Lines matching `<file>:<line>:<severity>:<message>` keep their severity.
    Structured,
}

/// Whether the compiler's exit status affects the build outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatusPolicy {
    /// The unit succeeds once the process has run, whatever its status.
    #[default]
    Ignore,
    /// A non-zero exit status aborts the unit.
    Fail,
}

/// Resolved driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory holding the compiler's auxiliary artifacts (Zinc jars)
    pub toolchain_root: Option<PathBuf>,

    /// Jar containing the runner main class, added to the runner classpath
    pub runner_jar: Option<PathBuf>,

    /// Main class the JVM starts
    pub runner_main_class: String,

    /// Compiler backend the runner delegates to
    pub backend: CompilerBackend,

    /// JDK used when the unit has no SDK configured
    pub java_home: Option<PathBuf>,

    /// JVM heap cap, passed as `-Xmx<value>`
    pub max_heap: String,

    /// Value of `-Dfile.encoding`
    pub file_encoding: String,

    /// Suffix identifying source files handled by this compiler
    pub source_suffix: String,

    /// Directory for argument files (system temp dir if unset)
    pub args_dir: Option<PathBuf>,

    /// Output classification mode
    pub output_mode: OutputMode,

    /// Exit status handling
    pub exit_status: ExitStatusPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            toolchain_root: None,
            runner_jar: None,
            runner_main_class: DEFAULT_RUNNER_MAIN_CLASS.to_string(),
            backend: CompilerBackend::Zinc,
            java_home: None,
            max_heap: "384m".to_string(),
            file_encoding: "UTF-8".to_string(),
            source_suffix: ".scala".to_string(),
            args_dir: None,
            output_mode: OutputMode::Plain,
            exit_status: ExitStatusPolicy::Ignore,
        }
    }
}

impl DriverConfig {
    /// Create a config with the given toolchain root and defaults elsewhere.
    pub fn with_toolchain_root(root: impl Into<PathBuf>) -> Self {
        Self {
            toolchain_root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Overlay the values present in `file`.
    pub fn apply(&mut self, file: DriverConfigFile) {
        if let Some(root) = file.toolchain_root {
            self.toolchain_root = Some(root);
        }
        if let Some(jar) = file.runner_jar {
            self.runner_jar = Some(jar);
        }
        if let Some(main) = file.runner_main_class {
            self.runner_main_class = main;
        }
        if let Some(backend) = file.backend {
            self.backend = backend;
        }
        if let Some(home) = file.java_home {
            self.java_home = Some(home);
        }
        if let Some(heap) = file.max_heap {
            self.max_heap = heap;
        }
        if let Some(encoding) = file.file_encoding {
            self.file_encoding = encoding;
        }
        if let Some(suffix) = file.source_suffix {
            self.source_suffix = suffix;
        }
        if let Some(dir) = file.args_dir {
            self.args_dir = Some(dir);
        }
        if let Some(mode) = file.output_mode {
            self.output_mode = mode;
        }
        if let Some(policy) = file.exit_status {
            self.exit_status = policy;
        }
    }

    /// Defaults overlaid with each layer in order; later layers win.
    pub fn layered(layers: impl IntoIterator<Item = DriverConfigFile>) -> Self {
        let mut config = Self::default();
        for layer in layers {
            config.apply(layer);
        }
        config
    }

    /// Directory argument files are created in.
    pub fn args_dir(&self) -> PathBuf {
        self.args_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// On-disk driver configuration, a `[driver]`-style TOML table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfigFile {
    pub toolchain_root: Option<PathBuf>,
    pub runner_jar: Option<PathBuf>,
    pub runner_main_class: Option<String>,
    pub backend: Option<CompilerBackend>,
    pub java_home: Option<PathBuf>,
    pub max_heap: Option<String>,
    pub file_encoding: Option<String>,
    pub source_suffix: Option<String>,
    pub args_dir: Option<PathBuf>,
    pub output_mode: Option<OutputMode>,
    pub exit_status: Option<ExitStatusPolicy>,
}

impl DriverConfigFile {
    /// Load a config file. A missing file is an empty layer.
    ///
    /// Relative paths in the file are taken relative to its directory.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let base = path.parent().unwrap_or(Path::new("."));
                Ok(Self::from_toml(&content)?.rebased(base))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse a config layer from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DriverError::InvalidConfig(e.to_string()))
    }

    /// Resolve relative paths against `base`.
    pub fn rebased(mut self, base: &Path) -> Self {
        for path in [
            &mut self.toolchain_root,
            &mut self.runner_jar,
            &mut self.java_home,
            &mut self.args_dir,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.max_heap, "384m");
        assert_eq!(config.file_encoding, "UTF-8");
        assert_eq!(config.source_suffix, ".scala");
        assert_eq!(config.output_mode, OutputMode::Plain);
        assert_eq!(config.exit_status, ExitStatusPolicy::Ignore);
        assert!(config.toolchain_root.is_none());
    }

    #[test]
    fn test_parse_layer() {
        let layer = DriverConfigFile::from_toml(
            r#"
toolchain_root = "/opt/zinc/lib"
max_heap = "1g"
output_mode = "structured"
exit_status = "fail"
"#,
        )
        .unwrap();
        assert_eq!(layer.toolchain_root, Some(PathBuf::from("/opt/zinc/lib")));
        assert_eq!(layer.max_heap.as_deref(), Some("1g"));
        assert_eq!(layer.output_mode, Some(OutputMode::Structured));
        assert_eq!(layer.exit_status, Some(ExitStatusPolicy::Fail));
        assert!(layer.java_home.is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = DriverConfigFile::from_toml("toolchain_dir = \"/x\"").unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(_)));
    }

    #[test]
    fn test_later_layers_win() {
        let user = DriverConfigFile {
            toolchain_root: Some(PathBuf::from("/home/user/zinc")),
            max_heap: Some("512m".to_string()),
            ..Default::default()
        };
        let project = DriverConfigFile {
            toolchain_root: Some(PathBuf::from("/project/zinc")),
            ..Default::default()
        };

        let config = DriverConfig::layered([user, project]);
        assert_eq!(config.toolchain_root, Some(PathBuf::from("/project/zinc")));
        assert_eq!(config.max_heap, "512m");
        assert_eq!(config.file_encoding, "UTF-8");
    }

    #[test]
    fn test_missing_file_is_empty_layer() {
        let temp = tempfile::TempDir::new().unwrap();
        let layer = DriverConfigFile::load(&temp.path().join("config.toml")).unwrap();
        assert_eq!(layer, DriverConfigFile::default());
    }

    #[test]
    fn test_load_resolves_paths_against_file_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "toolchain_root = \"zinc\"\njava_home = \"/usr/lib/jvm/17\"\nargs_dir = \"../args\"\n",
        )
        .unwrap();

        let layer = DriverConfigFile::load(&path).unwrap();
        assert_eq!(layer.toolchain_root, Some(temp.path().join("zinc")));
        assert_eq!(layer.java_home, Some(PathBuf::from("/usr/lib/jvm/17")));
        assert_eq!(layer.args_dir, Some(temp.path().join("../args")));
        assert!(layer.runner_jar.is_none());
    }
}
