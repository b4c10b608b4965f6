//! Autowire - Profile-aware configuration and module resolution.
//!
//! Autowire assembles an application's environment from layered
//! configuration files and decides which optional modules to activate,
//! and in what order.
//!
//! # Modules
//!
//! - [`autoconfigure`] - Module catalog, metadata, filters and ordering
//! - [`bootstrap`] - One-call startup facade
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Property sources, profiles and environment assembly
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use autowire::config::{Environment, EnvironmentAssembler, InMemoryResourceLoader};
//!
//! let resources = InMemoryResourceLoader::new().with(
//!     "classpath:/application.yml",
//!     "greeting: hello\n---\nautowire.config.activate.on-profile: dev\ngreeting: hi\n",
//! );
//!
//! let mut env = Environment::new();
//! env.add_active_profile("dev");
//! EnvironmentAssembler::new(resources).assemble(&mut env).unwrap();
//! assert_eq!(env.get_property("greeting"), Some("hi"));
//! ```
//!
//! For file-based startup, see [`bootstrap::Bootstrap`] and the integration tests.

pub mod autoconfigure;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;

pub use bootstrap::{Bootstrap, BootstrapResult, BootstrapSettings};
pub use error::{AutowireError, Result};
