//! Named property sources and their ordered container.
//!
//! A [`PropertySource`] is a named, ordered key/value layer. A
//! [`PropertySources`] list holds layers from highest to lowest precedence:
//! lookups scan front-to-back and the first source holding a key wins.

use indexmap::IndexMap;

/// A named layer of properties.
///
/// # Example
///
/// ```
/// use autowire::config::PropertySource;
///
/// let mut source = PropertySource::new("applicationConfig: [classpath:/application.yml]");
/// source.set("server.port", "8080");
/// source.set("autowire.profiles.include", "metrics, tracing");
///
/// assert_eq!(source.get("server.port"), Some("8080"));
/// assert_eq!(
///     source.get_list("autowire.profiles.include"),
///     Some(vec!["metrics".to_string(), "tracing".to_string()])
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySource {
    name: String,
    properties: IndexMap<String, String>,
}

impl PropertySource {
    /// Create an empty source with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: IndexMap::new(),
        }
    }

    /// Create a source from existing properties, keeping their order.
    pub fn from_properties(name: impl Into<String>, properties: IndexMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Name of this source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename this source, returning it.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set a property, replacing any previous value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Remove a property, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.properties.shift_remove(key)
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Check whether this source holds `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Bind a list-valued property.
    ///
    /// Accepts either a comma-separated value under `key` or indexed keys
    /// `key[0]`, `key[1]`, ... Blank entries are dropped. Returns `None`
    /// when neither form is present.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        if let Some(value) = self.get(key) {
            return Some(split_comma_list(value));
        }

        let mut items = Vec::new();
        while let Some(value) = self.get(&format!("{}[{}]", key, items.len())) {
            items.push(value.trim().to_string());
        }

        if items.is_empty() {
            None
        } else {
            items.retain(|item| !item.is_empty());
            Some(items)
        }
    }

    /// Iterate over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the source holds no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Split a comma-delimited list, trimming entries and dropping blanks.
pub fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Ordered list of property sources, highest precedence first.
///
/// Source names are unique: adding a source whose name is already present
/// removes the old entry first.
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
    sources: Vec<PropertySource>,
}

impl PropertySources {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source with the highest precedence.
    pub fn add_first(&mut self, source: PropertySource) {
        self.remove(source.name());
        self.sources.insert(0, source);
    }

    /// Add a source with the lowest precedence.
    pub fn add_last(&mut self, source: PropertySource) {
        self.remove(source.name());
        self.sources.push(source);
    }

    /// Add a source immediately before `relative`.
    ///
    /// Falls back to [`add_last`](Self::add_last) when `relative` is absent.
    pub fn add_before(&mut self, relative: &str, source: PropertySource) {
        self.remove(source.name());
        match self.position(relative) {
            Some(index) => self.sources.insert(index, source),
            None => self.sources.push(source),
        }
    }

    /// Add a source immediately after `relative`.
    ///
    /// Falls back to [`add_last`](Self::add_last) when `relative` is absent.
    pub fn add_after(&mut self, relative: &str, source: PropertySource) {
        self.remove(source.name());
        match self.position(relative) {
            Some(index) => self.sources.insert(index + 1, source),
            None => self.sources.push(source),
        }
    }

    /// Swap the source called `name` for `source`, keeping its position.
    ///
    /// Returns the previous source, or `None` (and changes nothing) when no
    /// source with that name exists.
    pub fn replace(&mut self, name: &str, source: PropertySource) -> Option<PropertySource> {
        let index = self.position(name)?;
        Some(std::mem::replace(&mut self.sources[index], source))
    }

    /// Remove and return the source called `name`.
    pub fn remove(&mut self, name: &str) -> Option<PropertySource> {
        let index = self.position(name)?;
        Some(self.sources.remove(index))
    }

    /// Get a source by name.
    pub fn get(&self, name: &str) -> Option<&PropertySource> {
        self.sources.iter().find(|s| s.name() == name)
    }

    /// Check whether a source with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Resolve `key` against all sources, first match wins.
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    /// Name of the source that supplies the effective value of `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.contains(key))
            .map(PropertySource::name)
    }

    /// Bind a list-valued property from the first source that defines it.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.sources.iter().find_map(|s| s.get_list(key))
    }

    /// Source names in precedence order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(PropertySource::name).collect()
    }

    /// Iterate over sources in precedence order.
    pub fn iter(&self) -> std::slice::Iter<'_, PropertySource> {
        self.sources.iter()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if there are no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name() == name)
    }
}

impl<'a> IntoIterator for &'a PropertySources {
    type Item = &'a PropertySource;
    type IntoIter = std::slice::Iter<'a, PropertySource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
