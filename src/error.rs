//! Error types for autowire operations.
//!
//! This module defines [`AutowireError`], the error type shared by the
//! environment assembler and the module resolution engine, and a [`Result`]
//! type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Per-resource problems (missing file, unknown extension while scanning a
//!   directory location) are not errors; they are logged at trace level
//! - Systemic problems (parse failure, ordering cycle, invalid exclusion)
//!   abort the whole run with a single `AutowireError`
//! - Use `anyhow::Error` (via `AutowireError::Other`) for unexpected errors

use thiserror::Error;

/// Core error type for autowire operations.
#[derive(Debug, Error)]
pub enum AutowireError {
    /// A resource exists but could not be parsed into property sources.
    #[error("Failed to load property source from location '{location}': {message}")]
    ConfigLoad { location: String, message: String },

    /// A file location names an extension no loader understands.
    #[error(
        "File extension of config file location '{location}' is not known to any property source loader. \
         If the location is meant to reference a directory, it must end in '/'"
    )]
    UnknownExtension { location: String },

    /// A `${...}` placeholder could not be resolved.
    #[error("Could not resolve placeholder '{placeholder}' in value \"{value}\"")]
    UnresolvablePlaceholder { placeholder: String, value: String },

    /// A profile expression in a document scope is malformed.
    #[error("Malformed profile expression '{expression}': {message}")]
    InvalidProfileExpression { expression: String, message: String },

    /// Exclusions that name known modules which are not candidates.
    #[error(
        "The following modules could not be excluded because they are not auto-configuration candidates:\n{}",
        .modules.iter().map(|m| format!("\t- {}", m)).collect::<Vec<_>>().join("\n")
    )]
    InvalidExclusions { modules: Vec<String> },

    /// Before/after constraints form a cycle.
    #[error("AutoConfigure cycle detected between {first} and {second}")]
    CycleDetected { first: String, second: String },

    /// The module metadata side-table holds an unusable value.
    #[error("Invalid metadata for '{module}.{attribute}': {message}")]
    InvalidMetadata {
        module: String,
        attribute: String,
        message: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for autowire operations.
pub type Result<T> = std::result::Result<T, AutowireError>;
