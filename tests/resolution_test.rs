//! Integration tests for module resolution.

use std::sync::Arc;

use autowire::autoconfigure::{
    ConditionEvaluationReport, FilterPipeline, ModuleCatalog, ModuleMetadataCache, ModuleSelector,
    OnCapabilityCondition, PrioritySorter, StaticCapabilities,
};
use autowire::config::Environment;
use autowire::AutowireError;

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn select(catalog: &[&str], metadata: &str, capabilities: &[&str]) -> autowire::Result<Vec<String>> {
    let metadata = ModuleMetadataCache::from_properties(metadata);
    let registry = Arc::new(StaticCapabilities::from_names(capabilities.iter().copied()));
    let selector = ModuleSelector::new(
        ModuleCatalog::from_ids(catalog.iter().copied()),
        FilterPipeline::new().with_filter(OnCapabilityCondition::new(registry)),
    );
    let mut report = ConditionEvaluationReport::new();
    selector
        .select(&Environment::new(), &metadata, &[], &mut report)
        .map(|selection| selection.modules)
}

#[test]
fn module_requiring_absent_capability_is_dropped() {
    let metadata = "X=\nX.ConditionalOnCapability=Q\nY=\nZ=\n";
    let modules = select(&["X", "Y", "Z"], metadata, &[]).unwrap();
    assert_eq!(modules, ids(&["Y", "Z"]));
}

#[test]
fn module_with_present_capability_is_kept() {
    let metadata = "X=\nX.ConditionalOnCapability=Q\nY=\nZ=\n";
    let modules = select(&["X", "Y", "Z"], metadata, &["Q"]).unwrap();
    assert_eq!(modules, ids(&["X", "Y", "Z"]));
}

#[test]
fn before_constraint_orders_modules() {
    let metadata = "A=\nB=\nB.AutoConfigureBefore=A\nC=\n";
    let modules = select(&["A", "B", "C"], metadata, &[]).unwrap();
    assert_eq!(modules, ids(&["B", "A", "C"]));
}

#[test]
fn mutual_after_is_a_cycle() {
    let metadata = "A=\nA.AutoConfigureAfter=B\nB=\nB.AutoConfigureAfter=A\n";
    let err = select(&["A", "B"], metadata, &[]).unwrap_err();
    assert!(matches!(err, AutowireError::CycleDetected { .. }));
    assert!(err.to_string().contains("cycle detected"));
}

#[test]
fn priority_respected_without_constraints() {
    let metadata = "A=\nA.AutoConfigureOrder=5\nB=\nB.AutoConfigureOrder=-5\nC=\n";
    let modules = select(&["A", "B", "C"], metadata, &[]).unwrap();
    assert_eq!(modules, ids(&["B", "C", "A"]));
}

#[test]
fn sorter_is_deterministic_across_input_orders() {
    let metadata = ModuleMetadataCache::from_properties(
        "A=\nA.AutoConfigureAfter=C\nB=\nB.AutoConfigureOrder=1\nC=\nD=\nD.AutoConfigureBefore=C\n",
    );
    let sorter = PrioritySorter::new(&metadata);
    let first = sorter.sort(&ids(&["A", "B", "C", "D"])).unwrap();
    let second = sorter.sort(&ids(&["D", "C", "B", "A"])).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, ids(&["D", "C", "A", "B"]));
}
