//! zincrun CLI - Drive the Zinc Scala compiler over a project manifest.

mod build;
mod manifest;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::render::Format;

#[derive(Parser)]
#[command(name = "zincrun")]
#[command(about = "Compile Scala sources with the Zinc incremental compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the units described by a manifest
    Build {
        /// Path to the project manifest
        #[arg(short, long, default_value = manifest::MANIFEST_NAME)]
        manifest: PathBuf,

        /// Output format for diagnostics and unit summaries
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,

        /// Directory holding the Zinc toolchain jars
        #[arg(long)]
        toolchain_root: Option<PathBuf>,

        /// JDK used when a unit has no SDK of its own
        #[arg(long)]
        java_home: Option<PathBuf>,

        /// Parse compiler output into located diagnostics
        #[arg(long)]
        structured: bool,

        /// Fail a unit when the compiler exits with a non-zero status
        #[arg(long)]
        fail_on_exit_status: bool,

        /// Compile only these files instead of every manifest source
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Build {
            manifest,
            format,
            toolchain_root,
            java_home,
            structured,
            fail_on_exit_status,
            files,
        } => {
            let options = build::BuildOptions {
                manifest,
                format,
                toolchain_root,
                java_home,
                structured,
                fail_on_exit_status,
                files,
            };
            let success = build::execute(options)?;
            Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
