//! Loaded documents and the filters that decide whether they apply.

use crate::config::environment::Environment;
use crate::config::keys::{ACTIVE_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY, ON_PROFILE_PROPERTY};
use crate::config::profile::Profiles;
use crate::config::property_source::PropertySource;
use crate::error::Result;

/// One property source read from a resource, plus its profile facts.
#[derive(Debug, Clone)]
pub struct Document {
    source: PropertySource,
    profiles: Vec<String>,
    scope: Option<Profiles>,
    active_profiles: Vec<String>,
    include_profiles: Vec<String>,
}

impl Document {
    /// Read profile scope and activation keys out of `source`.
    ///
    /// Placeholders in those keys are resolved against `environment`;
    /// undefined ones are kept as written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProfileExpression` if a scope entry is malformed,
    /// or `UnresolvablePlaceholder` for a circular reference.
    pub fn from_source(source: PropertySource, environment: &Environment) -> Result<Self> {
        let profiles = profile_list(&source, ON_PROFILE_PROPERTY, environment)?;
        let scope = if profiles.is_empty() {
            None
        } else {
            Some(Profiles::of(&profiles)?)
        };
        let active_profiles = profile_list(&source, ACTIVE_PROFILES_PROPERTY, environment)?;
        let include_profiles = profile_list(&source, INCLUDE_PROFILES_PROPERTY, environment)?;

        Ok(Self {
            source,
            profiles,
            scope,
            active_profiles,
            include_profiles,
        })
    }

    pub fn property_source(&self) -> &PropertySource {
        &self.source
    }

    /// Raw profile scope entries; empty means profile-agnostic.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    pub fn include_profiles(&self) -> &[String] {
        &self.include_profiles
    }

    fn accepted_by(&self, environment: &Environment) -> bool {
        self.scope
            .as_ref()
            .is_some_and(|scope| environment.accepts_profiles(scope))
    }
}

fn profile_list(
    source: &PropertySource,
    key: &str,
    environment: &Environment,
) -> Result<Vec<String>> {
    source
        .get_list(key)
        .unwrap_or_default()
        .iter()
        .map(|value| environment.resolve_placeholders_lenient(value))
        .collect()
}

/// Whether a pass keeps documents for its profile or catches leftovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Documents that belong to the profile being processed.
    Positive,
    /// Profile-scoped documents that ended up accepted but were never loaded.
    Negative,
}

/// Decides whether a document applies to a profile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
    kind: FilterKind,
    profile: Option<String>,
}

impl DocumentFilter {
    pub fn new(kind: FilterKind, profile: Option<&str>) -> Self {
        Self {
            kind,
            profile: profile.map(String::from),
        }
    }

    /// Check `document` against this filter.
    ///
    /// - positive, no profile: the document has no scope
    /// - positive, profile `p`: the scope names `p` and the environment
    ///   accepts the scope
    /// - negative: no profile, a non-empty scope, and the environment
    ///   accepts it
    pub fn matches(&self, document: &Document, environment: &Environment) -> bool {
        match (self.kind, self.profile.as_deref()) {
            (FilterKind::Positive, None) => document.profiles.is_empty(),
            (FilterKind::Positive, Some(profile)) => {
                document.profiles.iter().any(|p| p == profile) && document.accepted_by(environment)
            }
            (FilterKind::Negative, None) => {
                !document.profiles.is_empty() && document.accepted_by(environment)
            }
            (FilterKind::Negative, Some(_)) => false,
        }
    }
}
