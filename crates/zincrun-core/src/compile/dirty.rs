//! Selection of the dirty files handled by this compiler.

use std::path::PathBuf;

use crate::host::DirtyFile;

/// Keep the files whose path ends with `suffix`, in the host's order.
///
/// The match is a case-sensitive suffix match on the whole path.
pub fn filter_dirty_files(dirty: &[DirtyFile], suffix: &str) -> Vec<PathBuf> {
    dirty
        .iter()
        .filter(|entry| entry.file.to_string_lossy().ends_with(suffix))
        .map(|entry| entry.file.clone())
        .collect()
}
