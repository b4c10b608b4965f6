//! Resolving location strings to resource content.
//!
//! Locations use two prefixes:
//! - `classpath:` - looked up in each classpath root, in order
//! - `file:` (or no prefix) - relative to the working directory
//!
//! A missing resource is not an error; it resolves to `None`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Prefix for locations resolved against the classpath roots.
pub const CLASSPATH_PREFIX: &str = "classpath:";

/// Prefix for locations resolved against the working directory.
pub const FILE_PREFIX: &str = "file:";

/// A resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The location string the resource was requested with.
    pub location: String,
    /// Where it was actually found (path or other description).
    pub description: String,
    /// Raw text content.
    pub content: String,
}

impl Resource {
    /// File extension of the location, if any.
    pub fn extension(&self) -> Option<&str> {
        filename_extension(&self.location)
    }
}

/// Extension of the last path segment of `location`, if non-empty.
pub fn filename_extension(location: &str) -> Option<&str> {
    let filename = location.rsplit(['/', '\\']).next().unwrap_or(location);
    let filename = filename.rsplit(':').next().unwrap_or(filename);
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Resolves location strings to resources.
pub trait ResourceLoader: Send + Sync {
    /// Load the resource at `location`, or `None` if it does not exist.
    fn get_resource(&self, location: &str) -> Result<Option<Resource>>;
}

/// Loads resources from the file system.
///
/// # Example
///
/// ```no_run
/// use autowire::config::{FileSystemResourceLoader, ResourceLoader};
///
/// let loader = FileSystemResourceLoader::new("/srv/app")
///     .with_classpath_root("/srv/app/resources");
///
/// if let Some(resource) = loader.get_resource("classpath:/application.yml").unwrap() {
///     println!("found {}", resource.description);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemResourceLoader {
    working_dir: PathBuf,
    classpath_roots: Vec<PathBuf>,
}

impl FileSystemResourceLoader {
    /// Create a loader resolving `file:` locations against `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            classpath_roots: Vec::new(),
        }
    }

    /// Add a classpath root; roots are searched in the order added.
    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.classpath_roots.push(root.into());
        self
    }

    /// The working directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Classpath roots in search order.
    pub fn classpath_roots(&self) -> &[PathBuf] {
        &self.classpath_roots
    }

    fn candidates(&self, location: &str) -> Vec<PathBuf> {
        if let Some(rest) = location.strip_prefix(CLASSPATH_PREFIX) {
            let relative = rest.trim_start_matches('/');
            return self
                .classpath_roots
                .iter()
                .map(|root| root.join(relative))
                .collect();
        }

        let path = location.strip_prefix(FILE_PREFIX).unwrap_or(location);
        let path = Path::new(path);
        if path.is_absolute() {
            vec![path.to_path_buf()]
        } else {
            vec![self.working_dir.join(path)]
        }
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn get_resource(&self, location: &str) -> Result<Option<Resource>> {
        for path in self.candidates(location) {
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            return Ok(Some(Resource {
                location: location.to_string(),
                description: path.display().to_string(),
                content,
            }));
        }
        Ok(None)
    }
}

/// Serves resources from memory, keyed by exact location string.
///
/// # Example
///
/// ```
/// use autowire::config::{InMemoryResourceLoader, ResourceLoader};
///
/// let loader = InMemoryResourceLoader::new()
///     .with("classpath:/application.properties", "server.port=8080");
///
/// let resource = loader.get_resource("classpath:/application.properties").unwrap().unwrap();
/// assert_eq!(resource.content, "server.port=8080");
/// assert!(loader.get_resource("classpath:/missing.yml").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceLoader {
    resources: HashMap<String, String>,
}

impl InMemoryResourceLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    pub fn with(mut self, location: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(location, content);
        self
    }

    /// Add a resource in place.
    pub fn insert(&mut self, location: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(location.into(), content.into());
    }
}

impl ResourceLoader for InMemoryResourceLoader {
    fn get_resource(&self, location: &str) -> Result<Option<Resource>> {
        Ok(self.resources.get(location).map(|content| Resource {
            location: location.to_string(),
            description: format!("memory:{}", location),
            content: content.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extension_of_location() {
        assert_eq!(filename_extension("classpath:/application.yml"), Some("yml"));
        assert_eq!(filename_extension("file:./config/app.properties"), Some("properties"));
        assert_eq!(filename_extension("file:./config/"), None);
        assert_eq!(filename_extension("file:./v1.2/app"), None);
        assert_eq!(filename_extension("classpath:app."), None);
        assert_eq!(filename_extension("classpath:app.yaml"), Some("yaml"));
    }

    #[test]
    fn classpath_roots_searched_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("app.yml"), "from: second").unwrap();

        let loader = FileSystemResourceLoader::new(first.path())
            .with_classpath_root(first.path())
            .with_classpath_root(second.path());

        let resource = loader.get_resource("classpath:/app.yml").unwrap().unwrap();
        assert_eq!(resource.content, "from: second");

        fs::write(first.path().join("app.yml"), "from: first").unwrap();
        let resource = loader.get_resource("classpath:/app.yml").unwrap().unwrap();
        assert_eq!(resource.content, "from: first");
    }

    #[test]
    fn file_locations_are_relative_to_working_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("config")).unwrap();
        fs::write(temp.path().join("config").join("app.properties"), "a=1").unwrap();

        let loader = FileSystemResourceLoader::new(temp.path());
        let resource = loader
            .get_resource("file:./config/app.properties")
            .unwrap()
            .unwrap();
        assert_eq!(resource.content, "a=1");
        assert_eq!(resource.extension(), Some("properties"));
    }

    #[test]
    fn missing_resource_is_none() {
        let temp = TempDir::new().unwrap();
        let loader = FileSystemResourceLoader::new(temp.path()).with_classpath_root(temp.path());
        assert!(loader.get_resource("classpath:/nope.yml").unwrap().is_none());
        assert!(loader.get_resource("file:./nope.yml").unwrap().is_none());
    }

    #[test]
    fn directories_are_not_resources() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("app.yml")).unwrap();
        let loader = FileSystemResourceLoader::new(temp.path());
        assert!(loader.get_resource("file:./app.yml").unwrap().is_none());
    }
}
