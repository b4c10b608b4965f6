//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::autoconfigure::ApplicationKind;
use crate::bootstrap::BootstrapSettings;

/// Autowire - Profile-aware configuration and module resolution.
#[derive(Debug, Parser)]
#[command(name = "autowire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true, env = "AUTOWIRE_PROJECT")]
    pub project: Option<PathBuf>,

    /// YAML file with bootstrap settings; flags override its values
    #[arg(short, long, global = true, env = "AUTOWIRE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Assemble and print the environment
    Env(EnvArgs),

    /// Resolve the modules to activate
    Resolve(ResolveArgs),
}

/// Inputs shared by every command that bootstraps.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BootstrapArgs {
    /// Directories backing classpath: locations (comma-separated)
    #[arg(long, value_delimiter = ',', env = "AUTOWIRE_CLASSPATH")]
    pub classpath: Vec<PathBuf>,

    /// Config search locations, least specific first
    #[arg(long, env = "AUTOWIRE_CONFIG_LOCATION")]
    pub locations: Option<String>,

    /// Config file base names
    #[arg(long, env = "AUTOWIRE_CONFIG_NAME")]
    pub names: Option<String>,

    /// Profiles to activate (comma-separated)
    #[arg(long = "profiles", value_delimiter = ',', env = "AUTOWIRE_PROFILES_ACTIVE")]
    pub active_profiles: Vec<String>,

    /// Profiles to include (comma-separated)
    #[arg(long = "include-profiles", value_delimiter = ',', env = "AUTOWIRE_PROFILES_INCLUDE")]
    pub include_profiles: Vec<String>,

    /// Highest-precedence property, KEY=VALUE (repeatable)
    #[arg(short = 'D', long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Modules to exclude (comma-separated)
    #[arg(long, value_delimiter = ',', env = "AUTOWIRE_EXCLUDE")]
    pub exclude: Vec<String>,

    /// Capabilities present at runtime (comma-separated)
    #[arg(long = "capability", value_delimiter = ',', env = "AUTOWIRE_CAPABILITIES")]
    pub capabilities: Vec<String>,

    /// File listing present capabilities
    #[arg(long, env = "AUTOWIRE_CAPABILITY_FILE")]
    pub capability_file: Option<PathBuf>,

    /// Extra module catalog files (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub catalog: Vec<PathBuf>,

    /// Extra module metadata files (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub metadata: Vec<PathBuf>,

    /// YAML module manifest
    #[arg(long, env = "AUTOWIRE_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Application kind: none, servlet or reactive
    #[arg(long, env = "AUTOWIRE_APPLICATION_KIND")]
    pub application_kind: Option<ApplicationKind>,
}

impl BootstrapArgs {
    /// Overlay the given flags on `settings`.
    ///
    /// List flags replace the settings' lists only when given; properties
    /// are merged key by key.
    pub fn apply(&self, settings: &mut BootstrapSettings) {
        if !self.classpath.is_empty() {
            settings.classpath_roots = self.classpath.clone();
        }
        if let Some(locations) = &self.locations {
            settings.search_locations = Some(locations.clone());
        }
        if let Some(names) = &self.names {
            settings.search_names = Some(names.clone());
        }
        if !self.active_profiles.is_empty() {
            settings.active_profiles = self.active_profiles.clone();
        }
        if !self.include_profiles.is_empty() {
            settings.include_profiles = self.include_profiles.clone();
        }
        for (key, value) in &self.properties {
            settings.properties.insert(key.clone(), value.clone());
        }
        if !self.exclude.is_empty() {
            settings.exclusions = self.exclude.clone();
        }
        if !self.capabilities.is_empty() {
            settings.capabilities = self.capabilities.clone();
        }
        if let Some(file) = &self.capability_file {
            settings.capability_file = Some(file.clone());
        }
        if !self.catalog.is_empty() {
            settings.catalog_files = self.catalog.clone();
        }
        if !self.metadata.is_empty() {
            settings.metadata_files = self.metadata.clone();
        }
        if let Some(manifest) = &self.manifest {
            settings.manifest = Some(manifest.clone());
        }
        if let Some(kind) = self.application_kind {
            settings.application_kind = kind;
        }
    }
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid property '{}': expected KEY=VALUE", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid property '{}': empty key", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Arguments for the `env` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvArgs {
    #[command(flatten)]
    pub bootstrap: BootstrapArgs,

    /// Print only this property, with placeholders resolved
    pub key: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub bootstrap: BootstrapArgs,

    /// Include the condition evaluation report
    #[arg(long)]
    pub report: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
