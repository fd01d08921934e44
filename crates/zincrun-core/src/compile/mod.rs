//! Compilation pipeline up to the process boundary.
//!
//! This module provides:
//! - Dirty file filtering (which changed files this compiler handles)
//! - Toolchain discovery (Zinc artifacts, Java executable)
//! - Settings resolution (module/library model → `CompilerSettings`)
//! - Argument construction and the transient argument file
//!
//! # Architecture
//!
//! ```text
//! Dirty files ──► filter_dirty_files ──► (empty? NOTHING_DONE)
//!                                              │
//! Host model ──► SettingsResolver ──► CompilerSettings
//!                                              │
//!                        build_arguments ──► ArgsFile ──► execute::CompilerProcess
//! ```

mod arguments;
mod dirty;
mod settings;
mod toolchain;

pub use arguments::{
    ArgsFile, build_arguments, canonical_path, join_paths, path_list_separator, read_args_file,
};
pub use dirty::filter_dirty_files;
pub use settings::{CompilerSettings, SettingsResolver};
pub use toolchain::{CompilerBackend, Toolchain, find_java, java_binary_name, java_in_home};
