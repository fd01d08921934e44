//! Project manifest (`zincrun.toml`) and the build host serving it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use zincrun_core::{
    BuildCollaborator, CompilationUnit, Diagnostic, DirtyFile, DriverConfigFile, Library,
    LibraryScope, ToolchainSettings,
};

use crate::render::Renderer;

/// Default manifest file name.
pub const MANIFEST_NAME: &str = "zincrun.toml";

/// Parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Driver settings for this project
    #[serde(default)]
    pub driver: DriverConfigFile,

    /// Project and global libraries
    #[serde(default, rename = "library")]
    pub libraries: Vec<ScopedLibrary>,

    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,

    /// Compilation units; one per module when omitted
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopedLibrary {
    pub name: String,
    pub scope: LibraryScope,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    pub name: String,
    pub output_dir: Option<PathBuf>,
    pub sdk_home: Option<PathBuf>,
    #[serde(default)]
    pub contains_tests: bool,
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    #[serde(default)]
    pub test_classpath: Vec<PathBuf>,
    pub toolchain: Option<ToolchainSettings>,
    /// Module-level libraries
    #[serde(default, rename = "library")]
    pub libraries: Vec<Library>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitSpec {
    pub name: String,
    pub modules: Vec<String>,
}

impl Manifest {
    /// Load a manifest, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = Self::from_toml(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new("."));
        Ok(manifest.rebased(base))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Make every relative path absolute with respect to `base`.
    fn rebased(mut self, base: &Path) -> Self {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        let rebase_opt = |path: &mut Option<PathBuf>| {
            if let Some(path) = path {
                rebase(path);
            }
        };

        self.driver = self.driver.rebased(base);

        for library in &mut self.libraries {
            library.files.iter_mut().for_each(rebase);
        }

        for module in &mut self.modules {
            rebase_opt(&mut module.output_dir);
            rebase_opt(&mut module.sdk_home);
            rebase_opt(&mut module.source_root);
            module.sources.iter_mut().for_each(rebase);
            module.classpath.iter_mut().for_each(rebase);
            module.test_classpath.iter_mut().for_each(rebase);
            for library in &mut module.libraries {
                library.files.iter_mut().for_each(rebase);
            }
        }

        self
    }

    pub fn module(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// Compilation units described by the manifest.
    ///
    /// Output directory, SDK and test flag come from the representative
    /// module.
    pub fn compilation_units(&self) -> Vec<CompilationUnit> {
        let specs: Vec<UnitSpec> = if self.units.is_empty() {
            self.modules
                .iter()
                .map(|module| UnitSpec {
                    name: module.name.clone(),
                    modules: vec![module.name.clone()],
                })
                .collect()
        } else {
            self.units.clone()
        };

        specs
            .into_iter()
            .map(|spec| {
                let representative = spec.modules.first().and_then(|name| self.module(name));
                let contains_tests = spec
                    .modules
                    .iter()
                    .filter_map(|name| self.module(name))
                    .any(|module| module.contains_tests);
                CompilationUnit {
                    output_dir: representative.and_then(|m| m.output_dir.clone()),
                    sdk_home: representative.and_then(|m| m.sdk_home.clone()),
                    contains_tests,
                    ..CompilationUnit::new(spec.name, spec.modules)
                }
            })
            .collect()
    }
}

/// Build host backed by a [`Manifest`].
pub struct ManifestHost<'a> {
    manifest: &'a Manifest,
    /// Restrict the dirty set to these files
    only: Option<HashSet<PathBuf>>,
    renderer: &'a Renderer,
}

impl<'a> ManifestHost<'a> {
    pub fn new(manifest: &'a Manifest, only: Option<Vec<PathBuf>>, renderer: &'a Renderer) -> Self {
        Self {
            manifest,
            only: only.map(|files| files.into_iter().map(absolute).collect()),
            renderer,
        }
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

impl BuildCollaborator for ManifestHost<'_> {
    fn dirty_files(&self, unit: &CompilationUnit) -> std::io::Result<Vec<DirtyFile>> {
        let mut dirty = Vec::new();
        for module in unit.modules.iter().filter_map(|name| self.manifest.module(name)) {
            let root = module.source_root.clone().unwrap_or_default();
            for source in &module.sources {
                let selected = self
                    .only
                    .as_ref()
                    .is_none_or(|only| only.contains(&absolute(source.clone())));
                if selected {
                    dirty.push(DirtyFile::new(&module.name, source.clone(), root.clone()));
                }
            }
        }
        Ok(dirty)
    }

    fn toolchain_settings(&self, module: &str) -> Option<ToolchainSettings> {
        self.manifest.module(module).and_then(|m| m.toolchain.clone())
    }

    fn libraries(&self, scope: LibraryScope, module: &str) -> Vec<Library> {
        match scope {
            LibraryScope::Module => self
                .manifest
                .module(module)
                .map(|m| m.libraries.clone())
                .unwrap_or_default(),
            LibraryScope::Project | LibraryScope::Global => self
                .manifest
                .libraries
                .iter()
                .filter(|library| library.scope == scope)
                .map(|library| Library::new(library.name.clone(), library.files.clone()))
                .collect(),
        }
    }

    fn compilation_classpath(&self, unit: &CompilationUnit, include_tests: bool) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut classpath = Vec::new();
        for module in unit.modules.iter().filter_map(|name| self.manifest.module(name)) {
            let tests = include_tests.then_some(&module.test_classpath);
            for entry in module.classpath.iter().chain(tests.into_iter().flatten()) {
                if seen.insert(entry.clone()) {
                    classpath.push(entry.clone());
                }
            }
        }
        classpath
    }

    fn emit(&self, diagnostic: Diagnostic) {
        self.renderer.diagnostic(&diagnostic);
    }
}
