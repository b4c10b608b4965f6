//! Well-known property keys and defaults.

/// Profiles to activate.
pub const ACTIVE_PROFILES_PROPERTY: &str = "autowire.profiles.active";

/// Profiles to include regardless of activation.
pub const INCLUDE_PROFILES_PROPERTY: &str = "autowire.profiles.include";

/// Profile scope of a document.
pub const ON_PROFILE_PROPERTY: &str = "autowire.config.activate.on-profile";

/// Overrides the search names.
pub const CONFIG_NAME_PROPERTY: &str = "autowire.config.name";

/// Replaces the search locations.
pub const CONFIG_LOCATION_PROPERTY: &str = "autowire.config.location";

/// Locations searched in addition to the defaults.
pub const CONFIG_ADDITIONAL_LOCATION_PROPERTY: &str = "autowire.config.additional-location";

/// Set to `false` to turn module resolution off.
pub const AUTOCONFIGURE_ENABLED_PROPERTY: &str = "autowire.autoconfigure.enabled";

/// Modules to exclude from resolution.
pub const AUTOCONFIGURE_EXCLUDE_PROPERTY: &str = "autowire.autoconfigure.exclude";

/// Name of the lowest-precedence source holding application defaults.
pub const DEFAULT_PROPERTIES: &str = "defaultProperties";

/// Search locations, least specific first (last one wins).
pub const DEFAULT_SEARCH_LOCATIONS: &str = "classpath:/,classpath:/config/,file:./,file:./config/";

/// Base name of configuration files.
pub const DEFAULT_NAMES: &str = "application";

/// Profile used when nothing else is active.
pub const DEFAULT_PROFILE: &str = "default";
