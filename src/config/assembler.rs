//! Assembling the environment from configuration files.
//!
//! The assembler walks a queue of profiles. For each profile it probes
//! every search location and name for `<location><name>[-<profile>].<ext>`,
//! keeps the documents that apply, and follows any profiles those
//! documents activate or include. Once the queue drains, the collected
//! sources are spliced into the environment so that later profiles take
//! precedence over earlier ones and all of them sit above
//! `defaultProperties`.
//!
//! # Example
//!
//! ```
//! use autowire::config::{Environment, EnvironmentAssembler, InMemoryResourceLoader};
//!
//! let resources = InMemoryResourceLoader::new()
//!     .with("classpath:/application.properties", "server.port=8080\nautowire.profiles.active=dev")
//!     .with("classpath:/application-dev.properties", "server.port=9090");
//!
//! let mut env = Environment::new();
//! EnvironmentAssembler::new(resources).assemble(&mut env).unwrap();
//!
//! assert_eq!(env.get_property("server.port"), Some("9090"));
//! assert_eq!(env.active_profiles(), &["dev".to_string()]);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::config::document::{Document, DocumentFilter, FilterKind};
use crate::config::environment::Environment;
use crate::config::keys::{
    ACTIVE_PROFILES_PROPERTY, CONFIG_ADDITIONAL_LOCATION_PROPERTY, CONFIG_LOCATION_PROPERTY,
    CONFIG_NAME_PROPERTY, DEFAULT_NAMES, DEFAULT_PROPERTIES, DEFAULT_SEARCH_LOCATIONS,
    INCLUDE_PROFILES_PROPERTY,
};
use crate::config::loader::{default_loaders, loader_for, PropertySourceLoader};
use crate::config::profile::{Profile, ProfileSet};
use crate::config::property_source::{split_comma_list, PropertySource, PropertySources};
use crate::config::resource::{
    filename_extension, Resource, ResourceLoader, CLASSPATH_PREFIX, FILE_PREFIX,
};
use crate::error::{AutowireError, Result};

/// Name of the source holding profiles requested by the caller.
pub const COMMAND_LINE_ARGS: &str = "commandLineArgs";

/// Builds the profile-aware environment from configuration files.
pub struct EnvironmentAssembler {
    resource_loader: Arc<dyn ResourceLoader>,
    loaders: Vec<Box<dyn PropertySourceLoader>>,
    search_locations: Option<String>,
    search_names: Option<String>,
}

impl EnvironmentAssembler {
    /// Create an assembler with the built-in loaders and default search paths.
    pub fn new(resource_loader: impl ResourceLoader + 'static) -> Self {
        Self::from_shared(Arc::new(resource_loader))
    }

    /// Create an assembler over a shared resource loader.
    pub fn from_shared(resource_loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            resource_loader,
            loaders: default_loaders(),
            search_locations: None,
            search_names: None,
        }
    }

    /// Replace the property source loaders.
    pub fn with_loaders(mut self, loaders: Vec<Box<dyn PropertySourceLoader>>) -> Self {
        self.loaders = loaders;
        self
    }

    /// Comma-separated search locations, least specific first.
    pub fn with_search_locations(mut self, locations: impl Into<String>) -> Self {
        self.search_locations = Some(locations.into());
        self
    }

    /// Comma-separated configuration file base names.
    pub fn with_search_names(mut self, names: impl Into<String>) -> Self {
        self.search_names = Some(names.into());
        self
    }

    /// Load configuration files into `environment` and settle its active
    /// profiles.
    ///
    /// While loading, the profile keys of `defaultProperties` are hidden;
    /// the source is restored afterwards, even on error, and then moved
    /// to the end of the source list.
    ///
    /// # Errors
    ///
    /// - `ConfigLoad` when an existing resource cannot be parsed
    /// - `UnknownExtension` when a file location has no usable loader
    /// - `UnresolvablePlaceholder` when a search path cannot be resolved
    pub fn assemble(&self, environment: &mut Environment) -> Result<()> {
        let original_defaults = hide_profile_keys(environment);

        let result = AssemblyRun::new(self, environment).run(original_defaults.as_ref());

        let sources = environment.property_sources_mut();
        if let Some(original) = original_defaults {
            sources.replace(DEFAULT_PROPERTIES, original);
        }
        result?;

        if let Some(defaults) = sources.remove(DEFAULT_PROPERTIES) {
            sources.add_last(defaults);
        }
        Ok(())
    }
}

/// Assemble a fresh environment in one call.
///
/// Requested profiles are recorded in a `commandLineArgs` source, so they
/// take precedence over anything a configuration file activates.
pub fn assemble_environment(
    resource_loader: Arc<dyn ResourceLoader>,
    search_locations: &str,
    search_names: &str,
    loaders: Vec<Box<dyn PropertySourceLoader>>,
    active_profiles: &[String],
    include_profiles: &[String],
) -> Result<Environment> {
    let mut environment = Environment::new();

    let mut args = PropertySource::new(COMMAND_LINE_ARGS);
    if !active_profiles.is_empty() {
        args.set(ACTIVE_PROFILES_PROPERTY, active_profiles.join(","));
    }
    if !include_profiles.is_empty() {
        args.set(INCLUDE_PROFILES_PROPERTY, include_profiles.join(","));
    }
    if !args.is_empty() {
        environment.add_first(args);
    }

    EnvironmentAssembler::from_shared(resource_loader)
        .with_loaders(loaders)
        .with_search_locations(search_locations)
        .with_search_names(search_names)
        .assemble(&mut environment)?;

    Ok(environment)
}

fn is_profile_key(key: &str) -> bool {
    [ACTIVE_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY]
        .iter()
        .any(|k| key == *k || key.strip_prefix(k).is_some_and(|rest| rest.starts_with('[')))
}

/// Swap `defaultProperties` for a copy without profile keys; return the original.
fn hide_profile_keys(environment: &mut Environment) -> Option<PropertySource> {
    let original = environment
        .property_sources()
        .get(DEFAULT_PROPERTIES)?
        .clone();

    let mut filtered = PropertySource::new(DEFAULT_PROPERTIES);
    for (key, value) in original.iter().filter(|(k, _)| !is_profile_key(k)) {
        filtered.set(key, value);
    }
    environment
        .property_sources_mut()
        .replace(DEFAULT_PROPERTIES, filtered);

    Some(original)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddMode {
    /// Append to the profile's list.
    Last,
    /// Prepend, unless any profile already loaded a source of that name.
    FirstIfNew,
}

/// State of a single assembly.
struct AssemblyRun<'a> {
    assembler: &'a EnvironmentAssembler,
    environment: &'a mut Environment,
    profiles: VecDeque<Option<Profile>>,
    processed: Vec<Option<Profile>>,
    current: Option<String>,
    activated: bool,
    loaded: IndexMap<Option<String>, PropertySources>,
    documents: HashMap<(usize, String), Rc<Vec<Document>>>,
}

impl<'a> AssemblyRun<'a> {
    fn new(assembler: &'a EnvironmentAssembler, environment: &'a mut Environment) -> Self {
        Self {
            assembler,
            environment,
            profiles: VecDeque::new(),
            processed: Vec::new(),
            current: None,
            activated: false,
            loaded: IndexMap::new(),
            documents: HashMap::new(),
        }
    }

    fn run(mut self, defaults: Option<&PropertySource>) -> Result<()> {
        self.initialize_profiles()?;

        while let Some(profile) = self.profiles.pop_front() {
            if let Some(p) = profile.as_ref().filter(|p| is_non_default(p)) {
                self.environment.add_active_profile(p.name());
            }
            self.current = profile.as_ref().map(|p| p.name().to_string());
            self.load_pass(profile.as_ref(), FilterKind::Positive, AddMode::Last)?;
            self.current = None;
            self.processed.push(profile);
        }
        self.load_pass(None, FilterKind::Negative, AddMode::FirstIfNew)?;

        self.add_loaded_property_sources();
        self.apply_active_profiles(defaults)
    }

    fn initialize_profiles(&mut self) -> Result<()> {
        self.profiles.push_back(None);

        let activated_via_property = self.profiles_from_property(ACTIVE_PROFILES_PROPERTY)?;
        let included_via_property = self.profiles_from_property(INCLUDE_PROFILES_PROPERTY)?;

        let other_active: Vec<String> = self
            .environment
            .active_profiles()
            .iter()
            .filter(|p| !activated_via_property.contains(p) && !included_via_property.contains(p))
            .cloned()
            .collect();

        for name in other_active.iter().chain(&included_via_property) {
            self.enqueue(Profile::new(name.clone()));
        }
        self.add_active_profiles(&activated_via_property);

        if self.profiles.len() == 1 {
            for name in self.environment.default_profiles().to_vec() {
                self.profiles.push_back(Some(Profile::default_profile(name)));
            }
        }
        Ok(())
    }

    fn profiles_from_property(&self, key: &str) -> Result<Vec<String>> {
        self.environment
            .get_list(key)
            .unwrap_or_default()
            .iter()
            .map(|p| self.environment.resolve_placeholders_lenient(p))
            .collect()
    }

    fn is_queued_or_processed(&self, name: &str) -> bool {
        self.current.as_deref() == Some(name)
            || self
                .profiles
                .iter()
                .chain(self.processed.iter())
                .flatten()
                .any(|p| p.name() == name)
    }

    fn enqueue(&mut self, profile: Profile) {
        if !self.is_queued_or_processed(profile.name()) {
            self.profiles.push_back(Some(profile));
        }
    }

    fn add_active_profiles(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        if self.activated {
            debug!(
                "Profiles already activated, '{}' will not be applied",
                ProfileSet::from_names(names.iter().cloned())
            );
            return;
        }
        for name in names {
            self.enqueue(Profile::new(name.clone()));
        }
        debug!(
            "Activated profiles {}",
            ProfileSet::from_names(names.iter().cloned())
        );
        self.activated = true;
        self.remove_unprocessed_default_profiles();
    }

    fn add_included_profiles(&mut self, names: &[String]) {
        for name in names {
            self.enqueue(Profile::new(name.clone()));
        }
    }

    fn remove_unprocessed_default_profiles(&mut self) {
        self.profiles
            .retain(|p| !p.as_ref().is_some_and(Profile::is_default));
    }

    fn load_pass(&mut self, profile: Option<&Profile>, kind: FilterKind, mode: AddMode) -> Result<()> {
        for location in self.search_locations()? {
            if location.ends_with('/') {
                for name in self.search_names()? {
                    self.load_directory(&location, &name, profile, kind, mode)?;
                }
            } else {
                self.load_file(&location, profile, kind, mode)?;
            }
        }
        Ok(())
    }

    fn load_file(
        &mut self,
        location: &str,
        profile: Option<&Profile>,
        kind: FilterKind,
        mode: AddMode,
    ) -> Result<()> {
        let loader =
            filename_extension(location).and_then(|ext| loader_for(&self.assembler.loaders, ext));

        match loader {
            Some(index) => {
                let filter = DocumentFilter::new(kind, profile.map(Profile::name));
                self.load_resource(index, location, profile, &filter, mode)
            }
            None => Err(AutowireError::UnknownExtension {
                location: location.to_string(),
            }),
        }
    }

    fn load_directory(
        &mut self,
        location: &str,
        name: &str,
        profile: Option<&Profile>,
        kind: FilterKind,
        mode: AddMode,
    ) -> Result<()> {
        let assembler = self.assembler;
        let prefix = format!("{}{}", location, name);
        let mut seen = HashSet::new();

        for (index, loader) in assembler.loaders.iter().enumerate() {
            for ext in loader.file_extensions() {
                if seen.insert(ext.to_ascii_lowercase()) {
                    self.load_for_extension(index, &prefix, ext, profile, kind, mode)?;
                }
            }
        }
        Ok(())
    }

    fn load_for_extension(
        &mut self,
        loader: usize,
        prefix: &str,
        ext: &str,
        profile: Option<&Profile>,
        kind: FilterKind,
        mode: AddMode,
    ) -> Result<()> {
        let default_filter = DocumentFilter::new(kind, None);
        let profile_filter = DocumentFilter::new(kind, profile.map(Profile::name));

        if let Some(profile) = profile {
            let specific = format!("{}-{}.{}", prefix, profile.name(), ext);
            self.load_resource(loader, &specific, Some(profile), &default_filter, mode)?;
            self.load_resource(loader, &specific, Some(profile), &profile_filter, mode)?;

            // Files of earlier profiles may hold sections for this one
            let previous: Vec<String> = self
                .processed
                .iter()
                .flatten()
                .map(|p| p.name().to_string())
                .collect();
            for name in previous {
                let location = format!("{}-{}.{}", prefix, name, ext);
                self.load_resource(loader, &location, Some(profile), &profile_filter, mode)?;
            }
        }

        let base = format!("{}.{}", prefix, ext);
        self.load_resource(loader, &base, profile, &profile_filter, mode)
    }

    fn load_resource(
        &mut self,
        loader: usize,
        location: &str,
        profile: Option<&Profile>,
        filter: &DocumentFilter,
        mode: AddMode,
    ) -> Result<()> {
        let describe = || match profile {
            Some(p) => format!("'{}' for profile {}", location, p),
            None => format!("'{}'", location),
        };

        let resource = match self.assembler.resource_loader.get_resource(location) {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                trace!("Skipped missing config {}", describe());
                return Ok(());
            }
            Err(e) => {
                return Err(AutowireError::ConfigLoad {
                    location: location.to_string(),
                    message: e.to_string(),
                })
            }
        };

        if resource.extension().is_none() {
            trace!("Skipped empty config extension {}", describe());
            return Ok(());
        }

        let name = format!("applicationConfig: [{}]", location);
        let documents = self.load_documents(loader, &name, &resource)?;
        if documents.is_empty() {
            trace!("Skipped unloaded config {}", describe());
            return Ok(());
        }

        let mut matched = Vec::new();
        for document in documents.iter() {
            if filter.matches(document, &*self.environment) {
                self.add_active_profiles(document.active_profiles());
                self.add_included_profiles(document.include_profiles());
                matched.push(document);
            }
        }

        // Later sections of a file take precedence
        matched.reverse();
        if !matched.is_empty() {
            for document in matched {
                self.add_to_loaded(profile, document, mode);
            }
            debug!("Loaded config file '{}' (location {})", resource.description, describe());
        }
        Ok(())
    }

    fn load_documents(
        &mut self,
        loader: usize,
        name: &str,
        resource: &Resource,
    ) -> Result<Rc<Vec<Document>>> {
        let key = (loader, resource.location.clone());
        if let Some(documents) = self.documents.get(&key) {
            return Ok(Rc::clone(documents));
        }

        let environment = &*self.environment;
        let documents = self.assembler.loaders[loader]
            .load(name, resource)?
            .into_iter()
            .map(|source| Document::from_source(source, environment))
            .collect::<Result<Vec<_>>>()?;
        let documents = Rc::new(documents);
        self.documents.insert(key, Rc::clone(&documents));
        Ok(documents)
    }

    fn add_to_loaded(&mut self, profile: Option<&Profile>, document: &Document, mode: AddMode) {
        let source = document.property_source();
        if mode == AddMode::FirstIfNew
            && self.loaded.values().any(|merged| merged.contains(source.name()))
        {
            return;
        }

        let merged = self
            .loaded
            .entry(profile.map(|p| p.name().to_string()))
            .or_default();
        match mode {
            AddMode::Last => merged.add_last(source.clone()),
            AddMode::FirstIfNew => merged.add_first(source.clone()),
        }
    }

    fn add_loaded_property_sources(&mut self) {
        let destination = self.environment.property_sources_mut();
        let mut last_added: Option<String> = None;
        let mut added = HashSet::new();

        for sources in self.loaded.values().rev() {
            for source in sources {
                if !added.insert(source.name().to_string()) {
                    continue;
                }
                match &last_added {
                    Some(previous) => destination.add_after(previous, source.clone()),
                    None if destination.contains(DEFAULT_PROPERTIES) => {
                        destination.add_before(DEFAULT_PROPERTIES, source.clone())
                    }
                    None => destination.add_last(source.clone()),
                }
                last_added = Some(source.name().to_string());
            }
        }
    }

    fn apply_active_profiles(&mut self, defaults: Option<&PropertySource>) -> Result<()> {
        let mut active = Vec::new();

        if let Some(defaults) = defaults {
            active.extend(self.resolved_list(defaults, INCLUDE_PROFILES_PROPERTY)?);
            if !self.activated {
                active.extend(self.resolved_list(defaults, ACTIVE_PROFILES_PROPERTY)?);
            }
        }

        active.extend(
            self.processed
                .iter()
                .flatten()
                .filter(|p| is_non_default(p))
                .map(|p| p.name().to_string()),
        );

        self.environment.set_active_profiles(active);
        Ok(())
    }

    fn resolved_list(&self, source: &PropertySource, key: &str) -> Result<Vec<String>> {
        source
            .get_list(key)
            .unwrap_or_default()
            .iter()
            .map(|value| self.environment.resolve_placeholders_lenient(value))
            .collect()
    }

    fn search_locations(&self) -> Result<Vec<String>> {
        let mut locations = self.locations_from_property(CONFIG_ADDITIONAL_LOCATION_PROPERTY)?;

        if self.environment.contains_property(CONFIG_LOCATION_PROPERTY) {
            locations.extend(self.locations_from_property(CONFIG_LOCATION_PROPERTY)?);
        } else {
            let configured = self
                .assembler
                .search_locations
                .as_deref()
                .unwrap_or(DEFAULT_SEARCH_LOCATIONS);
            locations.extend(self.resolved_set(configured)?);
        }

        Ok(locations.into_iter().collect())
    }

    fn locations_from_property(&self, key: &str) -> Result<IndexSet<String>> {
        let Some(value) = self.environment.get_property(key) else {
            return Ok(IndexSet::new());
        };

        Ok(self
            .resolved_set(value)?
            .into_iter()
            .map(|path| {
                if path.contains('$') || is_url(&path) {
                    path
                } else {
                    format!("{}{}", FILE_PREFIX, path)
                }
            })
            .collect())
    }

    fn search_names(&self) -> Result<Vec<String>> {
        let names = match self.environment.get_property(CONFIG_NAME_PROPERTY) {
            Some(value) => self.resolved_set(value)?,
            None => self.resolved_set(
                self.assembler
                    .search_names
                    .as_deref()
                    .unwrap_or(DEFAULT_NAMES),
            )?,
        };
        Ok(names.into_iter().collect())
    }

    /// Resolve placeholders, split on commas, and reverse so the most
    /// specific entry is searched first.
    fn resolved_set(&self, value: &str) -> Result<IndexSet<String>> {
        let resolved = self.environment.resolve_placeholders(value)?;
        Ok(split_comma_list(&resolved).into_iter().rev().collect())
    }
}

/// A profile that was requested rather than used as a fallback.
fn is_non_default(profile: &Profile) -> bool {
    !profile.is_default()
}

fn is_url(path: &str) -> bool {
    path.starts_with(CLASSPATH_PREFIX) || path.starts_with(FILE_PREFIX) || path.contains("://")
}
