//! The catalog of candidate modules.

use crate::config::properties::PropertiesPropertySourceLoader;
use crate::config::property_source::PropertySource;
use crate::config::resource::ResourceLoader;
use crate::error::Result;

/// Default location of the catalog file.
pub const CATALOG_LOCATION: &str = "classpath:/META-INF/autowire.factories";

/// Catalog key listing module ids.
pub const MODULES_PROPERTY: &str = "autowire.modules";

/// Ordered, duplicate-free list of candidate module ids.
///
/// # Example
///
/// ```
/// use autowire::autoconfigure::ModuleCatalog;
///
/// let mut catalog = ModuleCatalog::parse("autowire.modules=web.Server,\\\n  data.Pool\n");
/// catalog.add_properties("autowire.modules=data.Pool,cache.Redis\n");
///
/// assert_eq!(catalog.modules(), &["web.Server", "data.Pool", "cache.Redis"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: Vec<String>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from ids directly.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        catalog.extend(ids);
        catalog
    }

    /// Parse one catalog file.
    pub fn parse(content: &str) -> Self {
        let mut catalog = Self::new();
        catalog.add_properties(content);
        catalog
    }

    /// Append the modules of another catalog file.
    pub fn add_properties(&mut self, content: &str) {
        let source =
            PropertySource::from_properties("catalog", PropertiesPropertySourceLoader::parse(content));
        self.extend(source.get_list(MODULES_PROPERTY).unwrap_or_default());
    }

    /// Append ids, skipping known ones.
    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.modules.contains(&id) {
                self.modules.push(id);
            }
        }
    }

    /// Load and merge every catalog found at `locations`.
    pub fn load(resource_loader: &dyn ResourceLoader, locations: &[String]) -> Result<Self> {
        let mut catalog = Self::new();
        for location in locations {
            if let Some(resource) = resource_loader.get_resource(location)? {
                tracing::debug!("Loaded module catalog from {}", resource.description);
                catalog.add_properties(&resource.content);
            }
        }
        Ok(catalog)
    }

    /// Candidate ids in catalog order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
