//! The mutable, process-wide configuration environment.
//!
//! An [`Environment`] is an ordered list of property sources plus the set
//! of active profiles and the set of default profiles used when nothing is
//! active.

use crate::config::interpolation::{resolve_placeholders, resolve_placeholders_lenient};
use crate::config::keys::DEFAULT_PROFILE;
use crate::config::profile::Profiles;
use crate::config::property_source::{PropertySource, PropertySources};
use crate::error::Result;

/// Layered, profile-aware configuration.
///
/// # Example
///
/// ```
/// use autowire::config::{Environment, PropertySource};
///
/// let mut env = Environment::new();
/// let mut args = PropertySource::new("commandLineArgs");
/// args.set("server.port", "9000");
/// env.property_sources_mut().add_first(args);
///
/// assert_eq!(env.get_property("server.port"), Some("9000"));
/// assert!(env.is_profile_active("default"));
///
/// env.add_active_profile("dev");
/// assert!(env.is_profile_active("dev"));
/// assert!(!env.is_profile_active("default"));
/// ```
#[derive(Debug, Clone)]
pub struct Environment {
    sources: PropertySources,
    active_profiles: Vec<String>,
    default_profiles: Vec<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create an environment with no sources and the `default` profile.
    pub fn new() -> Self {
        Self {
            sources: PropertySources::new(),
            active_profiles: Vec::new(),
            default_profiles: vec![DEFAULT_PROFILE.to_string()],
        }
    }

    /// Property sources in precedence order.
    pub fn property_sources(&self) -> &PropertySources {
        &self.sources
    }

    /// Mutable access to the property sources.
    pub fn property_sources_mut(&mut self) -> &mut PropertySources {
        &mut self.sources
    }

    /// Add a source with the highest precedence.
    pub fn add_first(&mut self, source: PropertySource) {
        self.sources.add_first(source);
    }

    /// Add a source with the lowest precedence.
    pub fn add_last(&mut self, source: PropertySource) {
        self.sources.add_last(source);
    }

    /// Raw value of `key`, first source wins.
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.sources.get_property(key)
    }

    /// Value of `key` with placeholders resolved.
    pub fn get_resolved(&self, key: &str) -> Result<Option<String>> {
        self.get_property(key)
            .map(|raw| self.resolve_placeholders(raw))
            .transpose()
    }

    /// Check whether any source defines `key`.
    pub fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// Bind a list-valued property.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.sources.get_list(key)
    }

    /// Parse a boolean property, falling back to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_property(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            _ => default,
        }
    }

    /// Resolve `${...}` placeholders against this environment.
    pub fn resolve_placeholders(&self, text: &str) -> Result<String> {
        resolve_placeholders(text, &|key| self.get_property(key).map(String::from))
    }

    /// Resolve placeholders, leaving undefined ones as written.
    pub fn resolve_placeholders_lenient(&self, text: &str) -> Result<String> {
        resolve_placeholders_lenient(text, &|key| self.get_property(key).map(String::from))
    }

    /// Explicitly active profiles, in activation order.
    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    /// Activate a profile; activating it twice has no effect.
    pub fn add_active_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if !self.active_profiles.contains(&profile) {
            self.active_profiles.push(profile);
        }
    }

    /// Replace the active profiles, dropping duplicates.
    pub fn set_active_profiles<I, S>(&mut self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles.clear();
        for profile in profiles {
            self.add_active_profile(profile);
        }
    }

    /// Profiles considered active when no profile is explicitly active.
    pub fn default_profiles(&self) -> &[String] {
        &self.default_profiles
    }

    /// Replace the default profiles.
    pub fn set_default_profiles<I, S>(&mut self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_profiles.clear();
        for profile in profiles {
            let profile = profile.into();
            if !self.default_profiles.contains(&profile) {
                self.default_profiles.push(profile);
            }
        }
    }

    /// Whether a single profile name is currently active.
    ///
    /// Default profiles count only while no profile is explicitly active.
    pub fn is_profile_active(&self, name: &str) -> bool {
        if self.active_profiles.is_empty() {
            self.default_profiles.iter().any(|p| p == name)
        } else {
            self.active_profiles.iter().any(|p| p == name)
        }
    }

    /// Whether the environment accepts any of the given profile expressions.
    pub fn accepts_profiles(&self, profiles: &Profiles) -> bool {
        profiles.matches(&|name| self.is_profile_active(name))
    }
}
