//! The capability-presence filter.
//!
//! A module whose metadata lists `ConditionalOnCapability` is kept only if
//! the registry confirms every listed capability. When the machine has
//! more than one execution unit, the candidate array is cut in half: the
//! first half is checked on one extra scoped thread while the second half
//! is checked on the calling thread.

use std::sync::Arc;
use std::thread;

use crate::autoconfigure::capability::CapabilityRegistry;
use crate::autoconfigure::condition::{ConditionOutcome, ModuleFilter};
use crate::autoconfigure::metadata::{MetadataSource, CONDITIONAL_ON_CAPABILITY};
use crate::config::property_source::split_comma_list;

/// Filters modules by the capabilities they require.
pub struct OnCapabilityCondition {
    registry: Arc<dyn CapabilityRegistry>,
    parallelism: Option<usize>,
}

impl OnCapabilityCondition {
    pub fn new(registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            registry,
            parallelism: None,
        }
    }

    /// Override the detected number of execution units.
    pub fn with_parallelism(mut self, units: usize) -> Self {
        self.parallelism = Some(units);
        self
    }

    fn execution_units(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    fn resolve_threaded(
        &self,
        modules: &[Option<String>],
        metadata: &dyn MetadataSource,
    ) -> Vec<Option<ConditionOutcome>> {
        let split = modules.len() / 2;
        let (first_half, second_half) = modules.split_at(split);

        thread::scope(|scope| {
            let worker = scope.spawn(|| self.resolve(first_half, metadata));
            let second = self.resolve(second_half, metadata);
            let mut outcomes = match worker.join() {
                Ok(outcomes) => outcomes,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            outcomes.extend(second);
            outcomes
        })
    }

    fn resolve(
        &self,
        modules: &[Option<String>],
        metadata: &dyn MetadataSource,
    ) -> Vec<Option<ConditionOutcome>> {
        modules
            .iter()
            .map(|module| {
                let module = module.as_deref()?;
                let required = metadata.read(module, CONDITIONAL_ON_CAPABILITY)?;
                self.outcome(&required)
            })
            .collect()
    }

    fn outcome(&self, required: &str) -> Option<ConditionOutcome> {
        split_comma_list(required)
            .into_iter()
            .find(|capability| !self.registry.has(capability))
            .map(|missing| {
                ConditionOutcome::no_match(format!(
                    "@ConditionalOnCapability did not find required capability '{}'",
                    missing
                ))
            })
    }
}

impl ModuleFilter for OnCapabilityCondition {
    fn name(&self) -> &str {
        "OnCapabilityCondition"
    }

    fn get_outcomes(
        &self,
        modules: &[Option<String>],
        metadata: &dyn MetadataSource,
    ) -> Vec<Option<ConditionOutcome>> {
        if modules.len() > 1 && self.execution_units() > 1 {
            self.resolve_threaded(modules, metadata)
        } else {
            self.resolve(modules, metadata)
        }
    }
}
