//! Property source loaders.
//!
//! A [`PropertySourceLoader`] turns the content of one resource into zero
//! or more property sources. The assembler picks a loader by file
//! extension; the first loader registered for an extension wins.

use crate::config::properties::PropertiesPropertySourceLoader;
use crate::config::property_source::PropertySource;
use crate::config::resource::Resource;
use crate::config::yaml::YamlPropertySourceLoader;
use crate::error::Result;

/// Parses resources of particular file extensions into property sources.
pub trait PropertySourceLoader: Send + Sync {
    /// Extensions this loader handles, without the leading dot.
    fn file_extensions(&self) -> &[&str];

    /// Parse `resource` into sources named after `name`.
    ///
    /// Returns an empty list when the resource holds no properties.
    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>>;
}

/// The built-in loaders: properties first, then YAML.
pub fn default_loaders() -> Vec<Box<dyn PropertySourceLoader>> {
    vec![
        Box::new(PropertiesPropertySourceLoader),
        Box::new(YamlPropertySourceLoader),
    ]
}

/// Index of the first loader that claims `extension`, ignoring ASCII case.
pub fn loader_for(loaders: &[Box<dyn PropertySourceLoader>], extension: &str) -> Option<usize> {
    loaders.iter().position(|loader| {
        loader
            .file_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    })
}
