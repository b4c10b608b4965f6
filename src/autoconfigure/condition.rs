//! Condition outcomes, the filter seam, and the evaluation report.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::autoconfigure::metadata::MetadataSource;

/// The result of evaluating one condition for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionOutcome {
    matched: bool,
    message: String,
}

impl ConditionOutcome {
    /// A matching outcome.
    pub fn matched(message: impl Into<String>) -> Self {
        Self {
            matched: true,
            message: message.into(),
        }
    }

    /// A non-matching outcome.
    pub fn no_match(message: impl Into<String>) -> Self {
        Self {
            matched: false,
            message: message.into(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A condition that can be checked for many modules at once, from
/// metadata alone.
///
/// Candidates arrive as a slice aligned with the pipeline's working array;
/// `None` marks a slot an earlier filter already removed.
pub trait ModuleFilter: Send + Sync {
    /// Name used in logs and the report.
    fn name(&self) -> &str;

    /// One outcome per slot; `None` means the condition has nothing to say.
    fn get_outcomes(
        &self,
        modules: &[Option<String>],
        metadata: &dyn MetadataSource,
    ) -> Vec<Option<ConditionOutcome>>;

    /// Evaluate and record outcomes; `false` removes the candidate.
    fn matches(
        &self,
        modules: &[Option<String>],
        metadata: &dyn MetadataSource,
        report: &mut ConditionEvaluationReport,
    ) -> Vec<bool> {
        let outcomes = self.get_outcomes(modules, metadata);
        let mut result = vec![true; outcomes.len()];

        for (i, outcome) in outcomes.into_iter().enumerate() {
            let (Some(outcome), Some(Some(module))) = (outcome, modules.get(i)) else {
                continue;
            };
            result[i] = outcome.is_match();
            if outcome.is_match() {
                trace!("{} matched {}: {}", self.name(), module, outcome.message());
            } else {
                debug!("{} did not match {}: {}", self.name(), module, outcome.message());
            }
            report.record_evaluation(module, self.name(), outcome);
        }

        result
    }
}

/// One recorded condition evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedOutcome {
    pub condition: String,
    pub outcome: ConditionOutcome,
}

/// Diagnostics collected during module resolution.
///
/// # Example
///
/// ```
/// use autowire::autoconfigure::{ConditionEvaluationReport, ConditionOutcome};
///
/// let mut report = ConditionEvaluationReport::new();
/// report.record_candidates(["web.Server", "core.Config"]);
/// report.record_evaluation("web.Server", "OnCapabilityCondition", ConditionOutcome::no_match("no http"));
///
/// assert!(!report.is_full_match("web.Server"));
/// assert_eq!(report.unconditional(), vec!["core.Config"]);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConditionEvaluationReport {
    outcomes: IndexMap<String, Vec<RecordedOutcome>>,
    candidates: Vec<String>,
    exclusions: Vec<String>,
}

impl ConditionEvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an evaluation of `condition` for `module`.
    pub fn record_evaluation(&mut self, module: &str, condition: &str, outcome: ConditionOutcome) {
        self.outcomes
            .entry(module.to_string())
            .or_default()
            .push(RecordedOutcome {
                condition: condition.to_string(),
                outcome,
            });
    }

    /// Record the candidates that survived filtering.
    pub fn record_candidates<I, S>(&mut self, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for module in modules {
            let module = module.into();
            if !self.candidates.contains(&module) {
                self.candidates.push(module);
            }
        }
    }

    /// Record excluded modules.
    pub fn record_exclusions<I, S>(&mut self, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for module in modules {
            let module = module.into();
            if !self.exclusions.contains(&module) {
                self.exclusions.push(module);
            }
        }
    }

    /// Outcomes recorded for `module`, in evaluation order.
    pub fn outcomes_for(&self, module: &str) -> &[RecordedOutcome] {
        self.outcomes.get(module).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every module with at least one recorded outcome.
    pub fn evaluated(&self) -> impl Iterator<Item = (&str, &[RecordedOutcome])> {
        self.outcomes.iter().map(|(m, o)| (m.as_str(), o.as_slice()))
    }

    /// Non-matching outcomes as `(module, recorded)` pairs.
    pub fn non_matching(&self) -> impl Iterator<Item = (&str, &RecordedOutcome)> {
        self.outcomes.iter().flat_map(|(module, recorded)| {
            recorded
                .iter()
                .filter(|r| !r.outcome.is_match())
                .map(move |r| (module.as_str(), r))
        })
    }

    /// Whether every recorded outcome for `module` matched.
    pub fn is_full_match(&self, module: &str) -> bool {
        self.outcomes_for(module).iter().all(|r| r.outcome.is_match())
    }

    /// Excluded modules.
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Candidates that no condition evaluated and nothing excluded.
    pub fn unconditional(&self) -> Vec<&str> {
        self.candidates
            .iter()
            .filter(|m| !self.outcomes.contains_key(*m) && !self.exclusions.contains(*m))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfigure::metadata::ModuleMetadataCache;

    struct RejectNamed(&'static str);

    impl ModuleFilter for RejectNamed {
        fn name(&self) -> &str {
            "RejectNamed"
        }

        fn get_outcomes(
            &self,
            modules: &[Option<String>],
            _metadata: &dyn MetadataSource,
        ) -> Vec<Option<ConditionOutcome>> {
            modules
                .iter()
                .map(|m| match m.as_deref() {
                    Some(m) if m == self.0 => Some(ConditionOutcome::no_match("rejected")),
                    Some(_) => Some(ConditionOutcome::matched("fine")),
                    None => None,
                })
                .collect()
        }
    }

    fn slots(ids: &[Option<&str>]) -> Vec<Option<String>> {
        ids.iter().map(|m| m.map(String::from)).collect()
    }

    #[test]
    fn matches_aligns_with_input_and_records() {
        let metadata = ModuleMetadataCache::new();
        let mut report = ConditionEvaluationReport::new();
        let result = RejectNamed("b").matches(&slots(&[Some("a"), Some("b"), None]), &metadata, &mut report);

        assert_eq!(result, vec![true, false, true]);
        assert!(report.is_full_match("a"));
        assert!(!report.is_full_match("b"));
        let misses: Vec<_> = report.non_matching().map(|(m, r)| (m, r.condition.as_str())).collect();
        assert_eq!(misses, vec![("b", "RejectNamed")]);
    }

    #[test]
    fn unconditional_excludes_evaluated_and_excluded() {
        let mut report = ConditionEvaluationReport::new();
        report.record_candidates(["a", "b", "c", "a"]);
        report.record_exclusions(["c"]);
        report.record_evaluation("b", "X", ConditionOutcome::matched("ok"));

        assert_eq!(report.unconditional(), vec!["a"]);
        assert_eq!(report.exclusions(), &["c".to_string()]);
        assert_eq!(report.outcomes_for("b").len(), 1);
        assert!(report.outcomes_for("zzz").is_empty());
    }
}
