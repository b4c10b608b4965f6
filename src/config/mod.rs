//! Layered, profile-aware configuration.
//!
//! This module handles all aspects of building the environment:
//! - Property sources and their precedence in [`property_source`]
//! - Profiles and profile expressions in [`profile`]
//! - Resource lookup in [`resource`]
//! - `.properties` and YAML parsing in [`properties`] and [`yaml`]
//! - Document filtering in [`document`]
//! - The profile queue and merge in [`assembler`]
//! - Placeholder resolution in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use autowire::config::{Environment, EnvironmentAssembler, FileSystemResourceLoader};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::create_dir_all(temp.path().join("config")).unwrap();
//! fs::write(temp.path().join("config").join("application.yml"), "server:\n  port: 8080\n").unwrap();
//!
//! let mut env = Environment::new();
//! EnvironmentAssembler::new(FileSystemResourceLoader::new(temp.path()))
//!     .assemble(&mut env)
//!     .unwrap();
//! assert_eq!(env.get_property("server.port"), Some("8080"));
//! ```
//!
//! # Search Order
//!
//! Locations are listed least specific first and searched in reverse, so
//! with the defaults a file in `./config/` overrides one in `./`, which
//! overrides the classpath copies.

pub mod assembler;
pub mod document;
pub mod environment;
pub mod interpolation;
pub mod keys;
pub mod loader;
pub mod profile;
pub mod properties;
pub mod property_source;
pub mod resource;
pub mod yaml;

// Assembler re-exports
pub use assembler::{assemble_environment, EnvironmentAssembler, COMMAND_LINE_ARGS};

// Document re-exports
pub use document::{Document, DocumentFilter, FilterKind};

// Environment re-exports
pub use environment::Environment;

// Interpolation re-exports
pub use interpolation::{
    has_placeholders, parse_placeholders, resolve_placeholders, resolve_placeholders_lenient, Segment,
};

// Loader re-exports
pub use loader::{default_loaders, loader_for, PropertySourceLoader};
pub use properties::PropertiesPropertySourceLoader;
pub use yaml::YamlPropertySourceLoader;

// Profile re-exports
pub use profile::{Profile, ProfileExpression, ProfileSet, Profiles};

// Property source re-exports
pub use property_source::{split_comma_list, PropertySource, PropertySources};

// Resource re-exports
pub use resource::{
    filename_extension, FileSystemResourceLoader, InMemoryResourceLoader, Resource, ResourceLoader,
};

