//! Compiler argument construction and the transient argument file.
//!
//! Arguments are passed to the runner through a file, one per line, to stay
//! clear of command-line length limits.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tempfile::TempPath;

use super::settings::CompilerSettings;

/// Build the compiler argument sequence.
///
/// Layout: six flag/value pairs (`-debug` has no value) followed by one
/// canonical path per source file, in the given order.
pub fn build_arguments(settings: &CompilerSettings, sources: &[PathBuf]) -> Vec<String> {
    let mut args = Vec::with_capacity(11 + sources.len());

    args.push("-debug".to_string());

    args.push("-scala-path".to_string());
    args.push(join_paths(&settings.compiler_library));

    args.push("-sbt-interface".to_string());
    args.push(canonical_path(&settings.sbt_interface));

    args.push("-compiler-interface".to_string());
    args.push(canonical_path(&settings.compiler_interface));

    args.push("-d".to_string());
    args.push(canonical_path(&settings.output_dir));

    args.push("-cp".to_string());
    args.push(join_paths(&settings.classpath));

    args.extend(sources.iter().map(|source| canonical_path(source)));

    args
}

/// Absolute, normalized form of `path`.
///
/// Existing paths are fully resolved (symlinks included); paths that do not
/// exist yet, such as a fresh output directory, are made absolute and
/// normalized lexically.
pub fn canonical_path(path: &Path) -> String {
    let resolved = match fs::canonicalize(path) {
        Ok(real) => strip_verbatim(real),
        Err(_) => {
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
            normalize_lexically(&absolute)
        }
    };
    resolved.to_string_lossy().into_owned()
}

/// Join canonical paths with the platform path-list separator.
pub fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| canonical_path(path))
        .collect::<Vec<_>>()
        .join(path_list_separator())
}

/// Platform-specific path-list separator.
pub fn path_list_separator() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        ";"
    }
    #[cfg(not(target_os = "windows"))]
    {
        ":"
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `fs::canonicalize` yields `\\?\C:\...` on Windows; the JVM expects `C:\...`.
#[cfg(target_os = "windows")]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    let stripped = path
        .to_str()
        .and_then(|text| text.strip_prefix(r"\\?\"))
        .filter(|rest| rest.as_bytes().get(1) == Some(&b':'))
        .map(PathBuf::from);
    stripped.unwrap_or(path)
}

#[cfg(not(target_os = "windows"))]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    path
}

/// Argument file owned by one invocation.
///
/// The file is deleted when the handle is dropped, so every exit path
/// (including errors and unwinding) releases it.
#[derive(Debug)]
pub struct ArgsFile {
    path: TempPath,
}

impl ArgsFile {
    /// Write `args` one per line to a new file in `dir`.
    pub fn create(dir: &Path, args: &[String]) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;

        let mut file = tempfile::Builder::new()
            .prefix("zincrun-args-")
            .suffix(".txt")
            .tempfile_in(dir)?;

        file.write_all(args.join("\n").as_bytes())?;
        file.flush()?;

        // Close the handle before the compiler opens the file.
        let path = file.into_temp_path();
        tracing::debug!("Wrote {} compiler arguments to {}", args.len(), path.display());

        Ok(Self { path })
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, logging instead of failing.
    pub fn remove(self) {
        let shown = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            tracing::warn!("Failed to delete argument file {}: {}", shown, e);
        }
    }
}

/// Read an argument file back into its argument list.
pub fn read_args_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    if content.is_empty() {
        return Ok(Vec::new());
    }
    Ok(content.split('\n').map(str::to_string).collect())
}
