//! Module selection: catalog, exclusions, filters, listeners, ordering.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::autoconfigure::catalog::ModuleCatalog;
use crate::autoconfigure::condition::ConditionEvaluationReport;
use crate::autoconfigure::filter::FilterPipeline;
use crate::autoconfigure::metadata::MetadataSource;
use crate::autoconfigure::sorter::PrioritySorter;
use crate::config::environment::Environment;
use crate::config::keys::{AUTOCONFIGURE_ENABLED_PROPERTY, AUTOCONFIGURE_EXCLUDE_PROPERTY};
use crate::error::{AutowireError, Result};

/// The outcome of module resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleSelection {
    /// Modules to activate, in activation order.
    pub modules: Vec<String>,
    /// Modules removed by exclusion.
    pub exclusions: Vec<String>,
}

impl ModuleSelection {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Notified with the filtered modules and the exclusions, before sorting.
pub trait ImportListener: Send + Sync {
    fn on_import(&self, modules: &[String], exclusions: &[String]);
}

impl<F> ImportListener for F
where
    F: Fn(&[String], &[String]) + Send + Sync,
{
    fn on_import(&self, modules: &[String], exclusions: &[String]) {
        self(modules, exclusions)
    }
}

/// Turns the module catalog into the ordered list of modules to activate.
#[derive(Default)]
pub struct ModuleSelector {
    catalog: ModuleCatalog,
    pipeline: FilterPipeline,
    listeners: Vec<Box<dyn ImportListener>>,
}

impl ModuleSelector {
    pub fn new(catalog: ModuleCatalog, pipeline: FilterPipeline) -> Self {
        Self {
            catalog,
            pipeline,
            listeners: Vec::new(),
        }
    }

    /// Register an import listener.
    pub fn with_listener(mut self, listener: impl ImportListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Register an already boxed import listener.
    pub fn with_boxed_listener(mut self, listener: Box<dyn ImportListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Select modules.
    ///
    /// `exclusions` are merged with the `autowire.autoconfigure.exclude`
    /// property. Resolution is skipped entirely when
    /// `autowire.autoconfigure.enabled` is `false`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExclusions` when an exclusion names a module the
    /// metadata knows but the catalog does not list, and `CycleDetected`
    /// when ordering constraints loop.
    pub fn select(
        &self,
        environment: &Environment,
        metadata: &dyn MetadataSource,
        exclusions: &[String],
        report: &mut ConditionEvaluationReport,
    ) -> Result<ModuleSelection> {
        if !environment.get_bool(AUTOCONFIGURE_ENABLED_PROPERTY, true) {
            debug!("Module resolution disabled by {}", AUTOCONFIGURE_ENABLED_PROPERTY);
            return Ok(ModuleSelection::default());
        }

        let candidates: IndexSet<String> = self.catalog.modules().iter().cloned().collect();
        let exclusions = self.exclusions(environment, exclusions)?;
        Self::check_excluded_modules(&candidates, &exclusions, metadata)?;

        let remaining: Vec<String> = candidates
            .into_iter()
            .filter(|module| !exclusions.contains(module))
            .collect();
        let filtered = self.pipeline.filter(remaining, metadata, report);

        let exclusions: Vec<String> = exclusions.into_iter().collect();
        report.record_candidates(filtered.iter().cloned());
        report.record_exclusions(exclusions.iter().cloned());
        for listener in &self.listeners {
            listener.on_import(&filtered, &exclusions);
        }

        let modules = PrioritySorter::new(metadata).sort(&filtered)?;
        debug!("Selected {} modules", modules.len());
        Ok(ModuleSelection {
            modules,
            exclusions,
        })
    }

    fn exclusions(&self, environment: &Environment, explicit: &[String]) -> Result<IndexSet<String>> {
        let mut exclusions: IndexSet<String> = explicit
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        for excluded in environment
            .get_list(AUTOCONFIGURE_EXCLUDE_PROPERTY)
            .unwrap_or_default()
        {
            let excluded = environment.resolve_placeholders(&excluded)?;
            let excluded = excluded.trim();
            if !excluded.is_empty() {
                exclusions.insert(excluded.to_string());
            }
        }
        Ok(exclusions)
    }

    fn check_excluded_modules(
        candidates: &IndexSet<String>,
        exclusions: &IndexSet<String>,
        metadata: &dyn MetadataSource,
    ) -> Result<()> {
        let invalid: Vec<String> = exclusions
            .iter()
            .filter(|e| metadata.was_processed(e) && !candidates.contains(*e))
            .cloned()
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(AutowireError::InvalidExclusions { modules: invalid })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfigure::capability::StaticCapabilities;
    use crate::autoconfigure::metadata::ModuleMetadataCache;
    use crate::autoconfigure::on_capability::OnCapabilityCondition;
    use crate::config::property_source::PropertySource;
    use std::sync::{Arc, Mutex};

    const METADATA: &str = "\
a=
b=
b.AutoConfigureBefore=a
c=
c.ConditionalOnCapability=missing
d=
elsewhere=
";

    fn selector() -> ModuleSelector {
        let pipeline = FilterPipeline::new()
            .with_filter(OnCapabilityCondition::new(Arc::new(StaticCapabilities::new())));
        ModuleSelector::new(ModuleCatalog::from_ids(["a", "b", "c", "d", "a"]), pipeline)
    }

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        let mut source = PropertySource::new("test");
        for (k, v) in pairs {
            source.set(*k, *v);
        }
        let mut env = Environment::new();
        env.add_last(source);
        env
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filters_and_sorts() {
        let metadata = ModuleMetadataCache::from_properties(METADATA);
        let mut report = ConditionEvaluationReport::new();
        let selection = selector()
            .select(&Environment::new(), &metadata, &[], &mut report)
            .unwrap();

        assert_eq!(selection.modules, ids(&["b", "a", "d"]));
        assert!(selection.exclusions.is_empty());
        assert!(!report.is_full_match("c"));
    }

    #[test]
    fn explicit_and_property_exclusions() {
        let metadata = ModuleMetadataCache::from_properties(METADATA);
        let env = env_with(&[("autowire.autoconfigure.exclude", "${skip:d}")]);
        let mut report = ConditionEvaluationReport::new();
        let selection = selector()
            .select(&env, &metadata, &ids(&["b"]), &mut report)
            .unwrap();

        assert_eq!(selection.modules, ids(&["a"]));
        assert_eq!(selection.exclusions, ids(&["b", "d"]));
        assert_eq!(report.exclusions(), ids(&["b", "d"]).as_slice());
    }

    #[test]
    fn excluding_known_non_candidate_fails() {
        let metadata = ModuleMetadataCache::from_properties(METADATA);
        let mut report = ConditionEvaluationReport::new();
        let err = selector()
            .select(
                &Environment::new(),
                &metadata,
                &ids(&["elsewhere", "unknown.Module"]),
                &mut report,
            )
            .unwrap_err();

        match err {
            AutowireError::InvalidExclusions { modules } => assert_eq!(modules, ids(&["elsewhere"])),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn disabled_resolution_selects_nothing() {
        let metadata = ModuleMetadataCache::from_properties(METADATA);
        let env = env_with(&[("autowire.autoconfigure.enabled", "false")]);
        let mut report = ConditionEvaluationReport::new();
        let selection = selector().select(&env, &metadata, &[], &mut report).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn listeners_see_filtered_unsorted_modules() {
        let seen: Arc<Mutex<Vec<(Vec<String>, Vec<String>)>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let selector = selector().with_listener(move |modules: &[String], exclusions: &[String]| {
            recorder
                .lock()
                .unwrap()
                .push((modules.to_vec(), exclusions.to_vec()));
        });

        let metadata = ModuleMetadataCache::from_properties(METADATA);
        let mut report = ConditionEvaluationReport::new();
        selector
            .select(&Environment::new(), &metadata, &ids(&["d"]), &mut report)
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ids(&["a", "b"]));
        assert_eq!(seen[0].1, ids(&["d"]));
    }

    #[test]
    fn cycle_aborts_selection() {
        let metadata = ModuleMetadataCache::from_properties(
            "a=\na.AutoConfigureAfter=b\nb=\nb.AutoConfigureAfter=a\n",
        );
        let selector = ModuleSelector::new(ModuleCatalog::from_ids(["a", "b"]), FilterPipeline::new());
        let mut report = ConditionEvaluationReport::new();
        let err = selector
            .select(&Environment::new(), &metadata, &[], &mut report)
            .unwrap_err();
        assert!(matches!(err, AutowireError::CycleDetected { .. }));
    }
}
