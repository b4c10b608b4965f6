//! The candidate filter pipeline.

use std::time::Instant;

use tracing::debug;

use crate::autoconfigure::condition::{ConditionEvaluationReport, ModuleFilter};
use crate::autoconfigure::metadata::MetadataSource;

/// Runs module filters in registration order over a candidate list.
///
/// Each filter sees the same positional array; a rejected candidate
/// leaves an empty slot that later filters skip.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use autowire::autoconfigure::{
///     ConditionEvaluationReport, FilterPipeline, ModuleMetadataCache, OnCapabilityCondition,
///     StaticCapabilities,
/// };
///
/// let metadata = ModuleMetadataCache::from_properties(
///     "x=\ny=\ny.ConditionalOnCapability=gpu\nz=\n",
/// );
/// let pipeline = FilterPipeline::new()
///     .with_filter(OnCapabilityCondition::new(Arc::new(StaticCapabilities::new())));
///
/// let mut report = ConditionEvaluationReport::new();
/// let kept = pipeline.filter(
///     vec!["x".to_string(), "y".to_string(), "z".to_string()],
///     &metadata,
///     &mut report,
/// );
/// assert_eq!(kept, vec!["x", "z"]);
/// ```
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn ModuleFilter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    pub fn with_filter(mut self, filter: impl ModuleFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append an already boxed filter.
    pub fn push(&mut self, filter: Box<dyn ModuleFilter>) {
        self.filters.push(filter);
    }

    /// Keep the candidates every filter accepts, in input order.
    pub fn filter(
        &self,
        candidates: Vec<String>,
        metadata: &dyn MetadataSource,
        report: &mut ConditionEvaluationReport,
    ) -> Vec<String> {
        let start = Instant::now();
        let total = candidates.len();
        let mut slots: Vec<Option<String>> = candidates.into_iter().map(Some).collect();
        let mut skipped = false;

        for filter in &self.filters {
            let matches = filter.matches(&slots, metadata, report);
            for (slot, matched) in slots.iter_mut().zip(matches) {
                if !matched && slot.is_some() {
                    *slot = None;
                    skipped = true;
                }
            }
        }

        let result: Vec<String> = slots.into_iter().flatten().collect();
        if skipped {
            debug!(
                "Filtered {} module candidates in {} ms",
                total - result.len(),
                start.elapsed().as_millis()
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfigure::condition::ConditionOutcome;
    use crate::autoconfigure::metadata::ModuleMetadataCache;
    use std::sync::Mutex;

    /// Rejects listed ids and remembers what it was shown.
    struct Reject {
        ids: Vec<&'static str>,
        seen: Mutex<Vec<Option<String>>>,
    }

    impl Reject {
        fn new(ids: &[&'static str]) -> Self {
            Self {
                ids: ids.to_vec(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ModuleFilter for Reject {
        fn name(&self) -> &str {
            "Reject"
        }

        fn get_outcomes(
            &self,
            modules: &[Option<String>],
            _metadata: &dyn MetadataSource,
        ) -> Vec<Option<ConditionOutcome>> {
            *self.seen.lock().unwrap() = modules.to_vec();
            modules
                .iter()
                .map(|m| {
                    m.as_deref()
                        .filter(|m| self.ids.iter().any(|id| id == m))
                        .map(|_| ConditionOutcome::no_match("rejected"))
                })
                .collect()
        }
    }

    /// Claims to match everything, including empty slots.
    struct AcceptAll;

    impl ModuleFilter for AcceptAll {
        fn name(&self) -> &str {
            "AcceptAll"
        }

        fn get_outcomes(
            &self,
            modules: &[Option<String>],
            _metadata: &dyn MetadataSource,
        ) -> Vec<Option<ConditionOutcome>> {
            modules
                .iter()
                .map(|_| Some(ConditionOutcome::matched("ok")))
                .collect()
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_pipeline_keeps_everything() {
        let mut report = ConditionEvaluationReport::new();
        let kept = FilterPipeline::new().filter(ids(&["a", "b"]), &ModuleMetadataCache::new(), &mut report);
        assert_eq!(kept, ids(&["a", "b"]));
    }

    #[test]
    fn later_filters_see_holes() {
        let mut pipeline = FilterPipeline::new().with_filter(Reject::new(&["b"]));
        pipeline.push(Box::new(Reject::new(&[])));
        let mut report = ConditionEvaluationReport::new();
        let kept = pipeline.filter(ids(&["a", "b", "c"]), &ModuleMetadataCache::new(), &mut report);

        assert_eq!(kept, ids(&["a", "c"]));
    }

    #[test]
    fn rejected_candidate_is_never_readmitted() {
        let pipeline = FilterPipeline::new()
            .with_filter(Reject::new(&["a"]))
            .with_filter(AcceptAll);
        let mut report = ConditionEvaluationReport::new();
        let kept = pipeline.filter(ids(&["a", "b"]), &ModuleMetadataCache::new(), &mut report);

        assert_eq!(kept, ids(&["b"]));
    }

    #[test]
    fn second_filter_gets_positional_array() {
        let second = Reject::new(&["c"]);
        let pipeline = FilterPipeline::new().with_filter(Reject::new(&["a"]));
        let mut report = ConditionEvaluationReport::new();
        let metadata = ModuleMetadataCache::new();

        let first_pass = pipeline.filter(ids(&["a", "b", "c"]), &metadata, &mut report);
        assert_eq!(first_pass, ids(&["b", "c"]));

        let slots = vec![None, Some("b".to_string()), Some("c".to_string())];
        let matches = second.matches(&slots, &metadata, &mut report);
        assert_eq!(matches, vec![true, true, false]);
        assert_eq!(*second.seen.lock().unwrap(), slots);
    }
}
