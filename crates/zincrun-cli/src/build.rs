//! Build command implementation for zincrun CLI.
//!
//! Loads the manifest, layers the driver configuration and compiles every
//! unit in parallel.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use rayon::prelude::*;
use zincrun_core::{
    BuildOutcome, CompileDriver, DriverConfig, DriverConfigFile, ExitStatusPolicy, OutputMode,
};

use crate::manifest::{Manifest, ManifestHost};
use crate::render::{self, Format, Renderer};

/// Overrides the location of the user configuration file.
pub const CONFIG_ENV: &str = "ZINCRUN_CONFIG";

/// Options of the `build` subcommand.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub manifest: PathBuf,
    pub format: Format,
    pub toolchain_root: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub structured: bool,
    pub fail_on_exit_status: bool,
    pub files: Vec<PathBuf>,
}

impl BuildOptions {
    /// Configuration layer made of command-line flags.
    fn config_layer(&self) -> DriverConfigFile {
        DriverConfigFile {
            toolchain_root: self.toolchain_root.clone(),
            java_home: self.java_home.clone(),
            output_mode: self.structured.then_some(OutputMode::Structured),
            exit_status: self.fail_on_exit_status.then_some(ExitStatusPolicy::Fail),
            ..DriverConfigFile::default()
        }
    }
}

/// Path of the per-user configuration file.
fn user_config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => Some(PathBuf::from(path)),
        None => dirs::config_dir().map(|dir| dir.join("zincrun").join("config.toml")),
    }
}

/// Execute the build. Returns `false` if any unit failed.
pub fn execute(options: BuildOptions) -> anyhow::Result<bool> {
    let start = Instant::now();

    let manifest = Manifest::load(&options.manifest)?;

    let mut layers = Vec::new();
    if let Some(path) = user_config_path() {
        tracing::debug!("Loading user configuration from {}", path.display());
        let layer = DriverConfigFile::load(&path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?;
        layers.push(layer);
    }
    layers.push(manifest.driver.clone());
    layers.push(options.config_layer());
    let config = DriverConfig::layered(layers);

    let units = manifest.compilation_units();
    if units.is_empty() {
        tracing::warn!("Manifest {} declares no modules", options.manifest.display());
        return Ok(true);
    }

    let renderer = Renderer::new(options.format);
    let only = (!options.files.is_empty()).then(|| options.files.clone());
    let host = ManifestHost::new(&manifest, only, &renderer);
    let driver = CompileDriver::new(config);
    tracing::debug!("Driver configuration: {:?}", driver.config());

    let failures: usize = units
        .par_iter()
        .map(|unit| match driver.build(unit, &host) {
            Ok(report) => {
                renderer.unit_report(&unit.name, &report);
                usize::from(report.outcome == BuildOutcome::Abort)
            }
            Err(e) => {
                tracing::debug!("Unit {} failed: {:?}", unit.name, e);
                renderer.unit_error(&unit.name, &e);
                1
            }
        })
        .sum();

    if options.format == Format::Human {
        let elapsed = start.elapsed().as_secs_f64();
        if failures == 0 {
            eprintln!(
                "{}Finished{} {} unit(s) in {:.2}s",
                render::GREEN,
                render::RESET,
                units.len(),
                elapsed
            );
        } else {
            eprintln!(
                "{}Failed{} {} of {} unit(s) in {:.2}s",
                render::RED,
                render::RESET,
                failures,
                units.len(),
                elapsed
            );
        }
    }

    Ok(failures == 0)
}
