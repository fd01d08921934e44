//! Execution of the external compiler.
//!
//! # Architecture
//!
//! ```text
//! CompileDriver (host worker thread)
//!     │
//!     └── CompilerProcess (child JVM)
//!             │
//!             ├── stdout reader ──┐
//!             ├── stderr reader ──┴── channel ──► OutputParser ──► BuildCollaborator::emit
//!             │
//!             └── try_wait / kill on AbortHandle
//! ```
//!
//! # Module Structure
//!
//! - `context` - Cancellation handle
//! - `process` - JVM command line and child process handle

mod context;
mod process;

pub use context::AbortHandle;
pub use process::{CompilerProcess, JavaCommand, OutputLine, StreamKind};
