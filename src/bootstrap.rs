//! One-call startup: assemble the environment, then resolve modules.
//!
//! # Example
//!
//! ```
//! use autowire::bootstrap::{Bootstrap, BootstrapSettings};
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let meta_inf = temp.path().join("resources").join("META-INF");
//! fs::create_dir_all(&meta_inf).unwrap();
//! fs::write(meta_inf.join("autowire.factories"), "autowire.modules=web.Server,core.Config\n").unwrap();
//! fs::write(
//!     meta_inf.join("autowire-metadata.properties"),
//!     "web.Server=\nweb.Server.AutoConfigureAfter=core.Config\ncore.Config=\n",
//! )
//! .unwrap();
//!
//! let settings = BootstrapSettings::for_project(temp.path());
//! let result = Bootstrap::new(settings).run().unwrap();
//! assert_eq!(result.selection.modules, vec!["core.Config", "web.Server"]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::autoconfigure::{
    ApplicationKind, CapabilityRegistry, ConditionEvaluationReport, FilterPipeline, ImportListener,
    ManifestMetadataSource, ModuleCatalog, ModuleMetadataCache, ModuleSelection, ModuleSelector,
    OnApplicationKindCondition, OnCapabilityCondition, StaticCapabilities, CATALOG_LOCATION,
    METADATA_LOCATION,
};
use crate::config::keys::{ACTIVE_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY};
use crate::config::{
    Environment, EnvironmentAssembler, FileSystemResourceLoader, PropertySource, ResourceLoader,
    COMMAND_LINE_ARGS,
};
use crate::error::{AutowireError, Result};

/// Directory under the project used as the classpath root when none is
/// configured.
pub const DEFAULT_CLASSPATH_ROOT: &str = "resources";

/// Everything needed to start an application.
///
/// Settings can be built in code, read from a YAML file, or filled in from
/// the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Working directory for `file:` locations.
    pub project_dir: PathBuf,

    /// Directories backing `classpath:` locations, searched in order.
    pub classpath_roots: Vec<PathBuf>,

    /// Comma-separated search locations; defaults apply when unset.
    pub search_locations: Option<String>,

    /// Comma-separated config file base names; defaults apply when unset.
    pub search_names: Option<String>,

    pub active_profiles: Vec<String>,
    pub include_profiles: Vec<String>,

    /// Highest-precedence properties.
    pub properties: IndexMap<String, String>,

    /// Modules to exclude.
    pub exclusions: Vec<String>,

    /// Capabilities known to be present.
    pub capabilities: Vec<String>,

    /// File listing present capabilities.
    pub capability_file: Option<PathBuf>,

    /// Extra catalog files, merged after the classpath catalog.
    pub catalog_files: Vec<PathBuf>,

    /// Extra metadata side-tables, merged after the classpath one.
    pub metadata_files: Vec<PathBuf>,

    /// YAML module manifest.
    pub manifest: Option<PathBuf>,

    pub application_kind: ApplicationKind,
}

impl BootstrapSettings {
    /// Default settings for the project rooted at `dir`.
    pub fn for_project(dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Read settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| AutowireError::ConfigLoad {
            location: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// `path` made absolute against the project directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    fn effective_classpath_roots(&self) -> Vec<PathBuf> {
        if self.classpath_roots.is_empty() {
            vec![self.project_dir.join(DEFAULT_CLASSPATH_ROOT)]
        } else {
            self.classpath_roots
                .iter()
                .map(|root| self.resolve_path(root))
                .collect()
        }
    }

    fn command_line_source(&self) -> PropertySource {
        let mut source = PropertySource::new(COMMAND_LINE_ARGS);
        for (key, value) in &self.properties {
            source.set(key.clone(), value.clone());
        }
        if !self.active_profiles.is_empty() {
            source.set(ACTIVE_PROFILES_PROPERTY, self.active_profiles.join(","));
        }
        if !self.include_profiles.is_empty() {
            source.set(INCLUDE_PROFILES_PROPERTY, self.include_profiles.join(","));
        }
        source
    }
}

/// What a bootstrap run produced.
#[derive(Debug)]
pub struct BootstrapResult {
    pub environment: Environment,
    pub selection: ModuleSelection,
    pub report: ConditionEvaluationReport,
}

/// Wires the assembler, catalog, metadata, capabilities, filters and
/// sorter together.
pub struct Bootstrap {
    settings: BootstrapSettings,
    resource_loader: Arc<dyn ResourceLoader>,
    capabilities: Option<Arc<dyn CapabilityRegistry>>,
    listeners: Vec<Box<dyn ImportListener>>,
}

impl Bootstrap {
    /// Create a bootstrap reading resources from the file system.
    pub fn new(settings: BootstrapSettings) -> Self {
        let mut loader = FileSystemResourceLoader::new(settings.project_dir.clone());
        for root in settings.effective_classpath_roots() {
            loader = loader.with_classpath_root(root);
        }
        Self {
            settings,
            resource_loader: Arc::new(loader),
            capabilities: None,
            listeners: Vec::new(),
        }
    }

    /// Read resources through `loader` instead.
    pub fn with_resource_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.resource_loader = loader;
        self
    }

    /// Answer capability checks with `registry` instead of the configured list.
    pub fn with_capabilities(mut self, registry: Arc<dyn CapabilityRegistry>) -> Self {
        self.capabilities = Some(registry);
        self
    }

    /// Register an import listener.
    pub fn with_listener(mut self, listener: impl ImportListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    /// Assemble the environment only.
    pub fn assemble_environment(&self) -> Result<Environment> {
        let mut environment = Environment::new();
        let args = self.settings.command_line_source();
        if !args.is_empty() {
            environment.add_first(args);
        }

        let mut assembler = EnvironmentAssembler::from_shared(Arc::clone(&self.resource_loader));
        if let Some(locations) = &self.settings.search_locations {
            assembler = assembler.with_search_locations(locations.clone());
        }
        if let Some(names) = &self.settings.search_names {
            assembler = assembler.with_search_names(names.clone());
        }
        assembler.assemble(&mut environment)?;

        debug!(
            "Assembled environment with {} property sources, active profiles {:?}",
            environment.property_sources().len(),
            environment.active_profiles()
        );
        Ok(environment)
    }

    /// Assemble the environment and resolve the modules to activate.
    pub fn run(self) -> Result<BootstrapResult> {
        let environment = self.assemble_environment()?;

        let manifest = self.load_manifest()?;
        let catalog = self.load_catalog(manifest.as_ref())?;
        let metadata = self.load_metadata(manifest)?;
        let registry = self.capability_registry()?;

        let pipeline = FilterPipeline::new()
            .with_filter(OnCapabilityCondition::new(registry))
            .with_filter(OnApplicationKindCondition::new(self.settings.application_kind));
        let mut selector = ModuleSelector::new(catalog, pipeline);
        for listener in self.listeners {
            selector = selector.with_boxed_listener(listener);
        }

        let mut report = ConditionEvaluationReport::new();
        let selection = selector.select(
            &environment,
            &metadata,
            &self.settings.exclusions,
            &mut report,
        )?;
        info!(
            "Activating {} modules ({} excluded)",
            selection.modules.len(),
            selection.exclusions.len()
        );

        Ok(BootstrapResult {
            environment,
            selection,
            report,
        })
    }

    fn load_manifest(&self) -> Result<Option<ManifestMetadataSource>> {
        self.settings
            .manifest
            .as_ref()
            .map(|path| ManifestMetadataSource::load(&self.settings.resolve_path(path)))
            .transpose()
    }

    fn load_catalog(&self, manifest: Option<&ManifestMetadataSource>) -> Result<ModuleCatalog> {
        let mut locations = vec![CATALOG_LOCATION.to_string()];
        locations.extend(self.file_locations(&self.settings.catalog_files));
        let mut catalog = ModuleCatalog::load(self.resource_loader.as_ref(), &locations)?;
        if let Some(manifest) = manifest {
            catalog.extend(manifest.module_ids());
        }
        debug!("Module catalog lists {} candidates", catalog.len());
        Ok(catalog)
    }

    fn load_metadata(&self, manifest: Option<ManifestMetadataSource>) -> Result<ModuleMetadataCache> {
        let mut locations = vec![METADATA_LOCATION.to_string()];
        locations.extend(self.file_locations(&self.settings.metadata_files));
        let cache = ModuleMetadataCache::load(self.resource_loader.as_ref(), &locations)?;
        Ok(match manifest {
            Some(manifest) => cache.with_fallback(Arc::new(manifest)),
            None => cache,
        })
    }

    fn capability_registry(&self) -> Result<Arc<dyn CapabilityRegistry>> {
        if let Some(registry) = &self.capabilities {
            return Ok(Arc::clone(registry));
        }
        let mut capabilities = StaticCapabilities::from_names(self.settings.capabilities.iter().cloned());
        if let Some(path) = &self.settings.capability_file {
            capabilities.extend(StaticCapabilities::load(&self.settings.resolve_path(path))?);
        }
        Ok(Arc::new(capabilities))
    }

    fn file_locations(&self, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|path| format!("file:{}", self.settings.resolve_path(path).display()))
            .collect()
    }
}
