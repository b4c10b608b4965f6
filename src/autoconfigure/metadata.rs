//! Module metadata: the precomputed side-table of facts about each module.
//!
//! The side-table is a flat properties file. A bare `<module>=` line marks
//! a module as processed; `<module>.<Attribute>=<value>` lines hold facts:
//!
//! ```properties
//! web.ServerModule=
//! web.ServerModule.ConditionalOnCapability=http.Runtime,tls
//! web.ServerModule.AutoConfigureOrder=-10
//! web.ServerModule.AutoConfigureAfter=core.ConfigModule
//! ```

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::config::properties::PropertiesPropertySourceLoader;
use crate::config::property_source::split_comma_list;
use crate::config::resource::ResourceLoader;
use crate::error::{AutowireError, Result};

/// Default location of the metadata side-table.
pub const METADATA_LOCATION: &str = "classpath:/META-INF/autowire-metadata.properties";

/// Capabilities a module needs, comma-separated.
pub const CONDITIONAL_ON_CAPABILITY: &str = "ConditionalOnCapability";

/// Application kind a module needs: `any`, `servlet` or `reactive`.
pub const CONDITIONAL_ON_APPLICATION_KIND: &str = "ConditionalOnApplicationKind";

/// Integer priority; lower sorts first.
pub const AUTO_CONFIGURE_ORDER: &str = "AutoConfigureOrder";

/// Modules this one must precede.
pub const AUTO_CONFIGURE_BEFORE: &str = "AutoConfigureBefore";

/// Modules this one must follow.
pub const AUTO_CONFIGURE_AFTER: &str = "AutoConfigureAfter";

/// Read access to module facts.
pub trait MetadataSource: Send + Sync {
    /// Whether the source knows anything about `module`.
    fn was_processed(&self, module: &str) -> bool;

    /// Raw value of `attribute` for `module`.
    fn read(&self, module: &str, attribute: &str) -> Option<String>;

    /// Comma-separated value as an ordered set.
    fn read_set(&self, module: &str, attribute: &str) -> Option<Vec<String>> {
        self.read(module, attribute).map(|value| {
            split_comma_list(&value)
                .into_iter()
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect()
        })
    }

    /// Integer value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadata` when the value is not an integer.
    fn read_int(&self, module: &str, attribute: &str) -> Result<Option<i32>> {
        self.read(module, attribute)
            .map(|value| {
                value
                    .trim()
                    .parse::<i32>()
                    .map_err(|e| AutowireError::InvalidMetadata {
                        module: module.to_string(),
                        attribute: attribute.to_string(),
                        message: format!("'{}' is not an integer: {}", value, e),
                    })
            })
            .transpose()
    }
}

/// The side-table, loaded once and shared read-only during resolution.
///
/// A fallback source, when set, answers for modules the table never
/// processed.
///
/// # Example
///
/// ```
/// use autowire::autoconfigure::{MetadataSource, ModuleMetadataCache};
///
/// let cache = ModuleMetadataCache::from_properties(
///     "web.Server=\nweb.Server.AutoConfigureOrder=5\nweb.Server.AutoConfigureAfter=core.Config, core.Log\n",
/// );
///
/// assert!(cache.was_processed("web.Server"));
/// assert_eq!(cache.read_int("web.Server", "AutoConfigureOrder").unwrap(), Some(5));
/// assert_eq!(
///     cache.read_set("web.Server", "AutoConfigureAfter"),
///     Some(vec!["core.Config".to_string(), "core.Log".to_string()])
/// );
/// assert!(!cache.was_processed("data.Pool"));
/// ```
#[derive(Clone, Default)]
pub struct ModuleMetadataCache {
    properties: IndexMap<String, String>,
    fallback: Option<Arc<dyn MetadataSource>>,
}

impl std::fmt::Debug for ModuleMetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleMetadataCache")
            .field("properties", &self.properties.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ModuleMetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a side-table.
    pub fn from_properties(content: &str) -> Self {
        let mut cache = Self::new();
        cache.merge_properties(content);
        cache
    }

    /// Merge another side-table; its values win.
    pub fn merge_properties(&mut self, content: &str) {
        self.properties
            .extend(PropertiesPropertySourceLoader::parse(content));
    }

    /// Load and merge every side-table found at `locations`, in order.
    ///
    /// Missing locations are skipped.
    pub fn load(resource_loader: &dyn ResourceLoader, locations: &[String]) -> Result<Self> {
        let mut cache = Self::new();
        for location in locations {
            if let Some(resource) = resource_loader.get_resource(location)? {
                tracing::debug!("Loaded module metadata from {}", resource.description);
                cache.merge_properties(&resource.content);
            }
        }
        Ok(cache)
    }

    /// Consult `fallback` for modules the table does not know.
    pub fn with_fallback(mut self, fallback: Arc<dyn MetadataSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Number of raw entries in the table.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the table is empty and there is no fallback.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.fallback.is_none()
    }
}

impl MetadataSource for ModuleMetadataCache {
    fn was_processed(&self, module: &str) -> bool {
        self.properties.contains_key(module)
            || self
                .fallback
                .as_ref()
                .is_some_and(|fallback| fallback.was_processed(module))
    }

    fn read(&self, module: &str, attribute: &str) -> Option<String> {
        if self.properties.contains_key(module) {
            return self
                .properties
                .get(&format!("{}.{}", module, attribute))
                .cloned();
        }
        self.fallback
            .as_ref()
            .and_then(|fallback| fallback.read(module, attribute))
    }
}
