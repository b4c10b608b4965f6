//! Capability presence checks.
//!
//! A capability is anything a module may need at runtime: a library, a
//! driver, a feature flag. The registry only answers "is it present?".

use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;

/// Answers whether a capability is present in the running process.
///
/// Implementations must be safe to query from two threads at once.
pub trait CapabilityRegistry: Send + Sync {
    /// `false` when the capability is absent or cannot be confirmed.
    fn has(&self, capability: &str) -> bool;
}

impl<F> CapabilityRegistry for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn has(&self, capability: &str) -> bool {
        self(capability)
    }
}

/// A fixed set of capabilities.
///
/// # Example
///
/// ```
/// use autowire::autoconfigure::{CapabilityRegistry, StaticCapabilities};
///
/// let caps = StaticCapabilities::parse("# runtime\nhttp.Runtime, tls\njdbc\n");
/// assert!(caps.has("tls"));
/// assert!(caps.has("jdbc"));
/// assert!(!caps.has("grpc"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCapabilities {
    capabilities: HashSet<String>,
}

impl StaticCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from capability names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a capability list: one or more comma-separated names per
    /// line, `#` starts a comment.
    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty());
        Self::from_names(names)
    }

    /// Read a capability list from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Add a capability.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.capabilities.insert(name.into())
    }

    /// Add every capability of `other`.
    pub fn extend(&mut self, other: StaticCapabilities) {
        self.capabilities.extend(other.capabilities);
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl CapabilityRegistry for StaticCapabilities {
    fn has(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}
