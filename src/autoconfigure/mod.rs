//! Module resolution.
//!
//! Resolution turns a catalog of candidate module ids into the ordered
//! list of modules to activate:
//! - Candidates come from catalog files in [`catalog`]
//! - Facts about each module come from [`metadata`] or a [`manifest`]
//! - Filters in [`filter`] drop modules whose conditions fail
//! - [`sorter`] orders the survivors by priority and before/after hints
//! - [`selector`] runs the whole flow and applies exclusions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use autowire::autoconfigure::{
//!     ConditionEvaluationReport, FilterPipeline, ModuleCatalog, ModuleMetadataCache,
//!     ModuleSelector, OnCapabilityCondition, StaticCapabilities,
//! };
//! use autowire::config::Environment;
//!
//! let metadata = ModuleMetadataCache::from_properties(
//!     "a=\nb=\nb.AutoConfigureBefore=a\nc=\nc.ConditionalOnCapability=gpu\n",
//! );
//! let selector = ModuleSelector::new(
//!     ModuleCatalog::from_ids(["a", "b", "c"]),
//!     FilterPipeline::new()
//!         .with_filter(OnCapabilityCondition::new(Arc::new(StaticCapabilities::new()))),
//! );
//!
//! let mut report = ConditionEvaluationReport::new();
//! let selection = selector
//!     .select(&Environment::new(), &metadata, &[], &mut report)
//!     .unwrap();
//! assert_eq!(selection.modules, vec!["b", "a"]);
//! ```

pub mod capability;
pub mod catalog;
pub mod condition;
pub mod filter;
pub mod manifest;
pub mod metadata;
pub mod on_application_kind;
pub mod on_capability;
pub mod selector;
pub mod sorter;

pub use capability::{CapabilityRegistry, StaticCapabilities};
pub use catalog::{ModuleCatalog, CATALOG_LOCATION, MODULES_PROPERTY};
pub use condition::{ConditionEvaluationReport, ConditionOutcome, ModuleFilter, RecordedOutcome};
pub use filter::FilterPipeline;
pub use manifest::{ManifestMetadataSource, ModuleEntry};
pub use metadata::{
    MetadataSource, ModuleMetadataCache, AUTO_CONFIGURE_AFTER, AUTO_CONFIGURE_BEFORE,
    AUTO_CONFIGURE_ORDER, CONDITIONAL_ON_APPLICATION_KIND, CONDITIONAL_ON_CAPABILITY,
    METADATA_LOCATION,
};
pub use on_application_kind::{ApplicationKind, OnApplicationKindCondition};
pub use on_capability::OnCapabilityCondition;
pub use selector::{ImportListener, ModuleSelection, ModuleSelector};
pub use sorter::{PrioritySorter, DEFAULT_ORDER};
