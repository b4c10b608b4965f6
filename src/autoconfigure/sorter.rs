//! Priority ordering of surviving modules.
//!
//! Ordering happens in three passes: alphabetical, then by the integer
//! `AutoConfigureOrder` priority, then a depth-first walk that honors
//! `AutoConfigureBefore` and `AutoConfigureAfter`. Modules referenced only
//! through before/after still shape the order when metadata knows them,
//! but never appear in the output.

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::autoconfigure::metadata::{
    MetadataSource, AUTO_CONFIGURE_AFTER, AUTO_CONFIGURE_BEFORE, AUTO_CONFIGURE_ORDER,
};
use crate::error::{AutowireError, Result};

/// Priority used when a module declares none.
pub const DEFAULT_ORDER: i32 = 0;

/// Ordering facts for one module.
#[derive(Debug, Clone, Default)]
struct ModuleNode {
    before: Vec<String>,
    after: Vec<String>,
}

/// The ordering graph: every input module plus every known module
/// reachable through before/after references.
#[derive(Debug, Default)]
struct OrderingGraph {
    nodes: IndexMap<String, ModuleNode>,
}

impl OrderingGraph {
    fn build(metadata: &dyn MetadataSource, modules: &[String]) -> Self {
        let mut graph = Self::default();
        graph.add(metadata, modules, true);
        graph
    }

    fn add(&mut self, metadata: &dyn MetadataSource, names: &[String], required: bool) {
        for name in names {
            if self.nodes.contains_key(name) {
                continue;
            }
            let available = metadata.was_processed(name);
            if !required && !available {
                continue;
            }

            let node = ModuleNode {
                before: metadata
                    .read_set(name, AUTO_CONFIGURE_BEFORE)
                    .unwrap_or_default(),
                after: metadata
                    .read_set(name, AUTO_CONFIGURE_AFTER)
                    .unwrap_or_default(),
            };
            let (before, after) = (node.before.clone(), node.after.clone());
            self.nodes.insert(name.clone(), node);

            if available {
                self.add(metadata, &before, false);
                self.add(metadata, &after, false);
            }
        }
    }

    /// Modules that `module` must follow: its own `after` list plus every
    /// node that names it in `before`.
    fn requested_after(&self, module: &str) -> IndexSet<String> {
        let mut after: IndexSet<String> = self
            .nodes
            .get(module)
            .map(|node| node.after.iter().cloned().collect())
            .unwrap_or_default();
        for (name, node) in &self.nodes {
            if node.before.iter().any(|b| b == module) {
                after.insert(name.clone());
            }
        }
        after
    }
}

/// Orders module ids by priority and before/after constraints.
///
/// # Example
///
/// ```
/// use autowire::autoconfigure::{ModuleMetadataCache, PrioritySorter};
///
/// let metadata = ModuleMetadataCache::from_properties(
///     "a=\nb=\nb.AutoConfigureBefore=a\nc=\nc.AutoConfigureOrder=-1\n",
/// );
/// let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
///
/// let sorted = PrioritySorter::new(&metadata).sort(&ids).unwrap();
/// assert_eq!(sorted, vec!["c", "b", "a"]);
/// ```
pub struct PrioritySorter<'a> {
    metadata: &'a dyn MetadataSource,
}

impl<'a> PrioritySorter<'a> {
    pub fn new(metadata: &'a dyn MetadataSource) -> Self {
        Self { metadata }
    }

    /// Sort `modules`.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected` when before/after constraints loop, and
    /// `InvalidMetadata` when a priority is not an integer.
    pub fn sort(&self, modules: &[String]) -> Result<Vec<String>> {
        let mut ordered: Vec<String> = modules.to_vec();
        ordered.sort();

        let mut priorities = Vec::with_capacity(ordered.len());
        for module in &ordered {
            let order = self
                .metadata
                .read_int(module, AUTO_CONFIGURE_ORDER)?
                .unwrap_or(DEFAULT_ORDER);
            priorities.push((order, module.clone()));
        }
        priorities.sort_by_key(|(order, _)| *order);
        let ordered: Vec<String> = priorities.into_iter().map(|(_, m)| m).collect();

        let graph = OrderingGraph::build(self.metadata, &ordered);
        let sorted = Self::sort_by_annotation(&graph, &ordered)?;

        let inputs: IndexSet<&str> = modules.iter().map(String::as_str).collect();
        Ok(sorted
            .into_iter()
            .filter(|module| inputs.contains(module.as_str()))
            .collect())
    }

    fn sort_by_annotation(graph: &OrderingGraph, ordered: &[String]) -> Result<Vec<String>> {
        let mut to_sort: IndexSet<String> = ordered.iter().cloned().collect();
        to_sort.extend(graph.nodes.keys().cloned());
        let mut sorted = IndexSet::new();
        let mut processing = IndexSet::new();

        while let Some(current) = to_sort.first().cloned() {
            Self::visit(graph, &mut to_sort, &mut sorted, &mut processing, &current)?;
        }
        Ok(sorted.into_iter().collect())
    }

    fn visit(
        graph: &OrderingGraph,
        to_sort: &mut IndexSet<String>,
        sorted: &mut IndexSet<String>,
        processing: &mut IndexSet<String>,
        current: &str,
    ) -> Result<()> {
        processing.insert(current.to_string());

        for after in graph.requested_after(current) {
            if processing.contains(&after) {
                return Err(AutowireError::CycleDetected {
                    first: current.to_string(),
                    second: after,
                });
            }
            if !sorted.contains(&after) && to_sort.contains(&after) {
                trace!("Ordering {} after {}", current, after);
                Self::visit(graph, to_sort, sorted, processing, &after)?;
            }
        }

        processing.shift_remove(current);
        to_sort.shift_remove(current);
        sorted.insert(current.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfigure::metadata::ModuleMetadataCache;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sort(metadata: &str, modules: &[&str]) -> Result<Vec<String>> {
        let metadata = ModuleMetadataCache::from_properties(metadata);
        PrioritySorter::new(&metadata).sort(&ids(modules))
    }

    #[test]
    fn alphabetical_without_constraints() {
        let sorted = sort("", &["c", "a", "b"]).unwrap();
        assert_eq!(sorted, ids(&["a", "b", "c"]));
    }

    #[test]
    fn priority_beats_name() {
        let metadata = "a=\na.AutoConfigureOrder=10\nb=\nc=\nc.AutoConfigureOrder=-5\n";
        assert_eq!(sort(metadata, &["a", "b", "c"]).unwrap(), ids(&["c", "b", "a"]));
    }

    #[test]
    fn equal_priorities_stay_alphabetical() {
        let metadata = "b=\nb.AutoConfigureOrder=1\na=\na.AutoConfigureOrder=1\n";
        assert_eq!(sort(metadata, &["b", "a"]).unwrap(), ids(&["a", "b"]));
    }

    #[test]
    fn after_moves_module_later() {
        let metadata = "a=\na.AutoConfigureAfter=c\nb=\nc=\n";
        assert_eq!(sort(metadata, &["a", "b", "c"]).unwrap(), ids(&["c", "a", "b"]));
    }

    #[test]
    fn before_moves_module_earlier() {
        let metadata = "a=\nb=\nb.AutoConfigureBefore=a\nc=\n";
        assert_eq!(sort(metadata, &["a", "b", "c"]).unwrap(), ids(&["b", "a", "c"]));
    }

    #[test]
    fn constraints_beat_priority() {
        let metadata = "a=\na.AutoConfigureOrder=-100\na.AutoConfigureAfter=b\nb=\n";
        assert_eq!(sort(metadata, &["a", "b"]).unwrap(), ids(&["b", "a"]));
    }

    #[test]
    fn cycle_is_reported() {
        let metadata = "a=\na.AutoConfigureAfter=b\nb=\nb.AutoConfigureAfter=a\n";
        let err = sort(metadata, &["a", "b"]).unwrap_err();
        match err {
            AutowireError::CycleDetected { first, second } => {
                assert_eq!(first, "b");
                assert_eq!(second, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cycle_through_before_is_reported() {
        let metadata = "a=\na.AutoConfigureBefore=b\nb=\nb.AutoConfigureBefore=a\n";
        assert!(matches!(
            sort(metadata, &["a", "b"]),
            Err(AutowireError::CycleDetected { .. })
        ));
    }

    #[test]
    fn referenced_known_module_shapes_order_but_is_dropped() {
        // x is known but not a candidate; a must follow x, x must follow b.
        let metadata = "a=\na.AutoConfigureAfter=x\nb=\nx=\nx.AutoConfigureAfter=b\n";
        let sorted = sort(metadata, &["a", "b"]).unwrap();
        assert_eq!(sorted, ids(&["b", "a"]));
        assert!(!sorted.contains(&"x".to_string()));
    }

    #[test]
    fn unknown_references_are_ignored() {
        let metadata = "a=\na.AutoConfigureAfter=missing.Module\nb=\n";
        assert_eq!(sort(metadata, &["b", "a"]).unwrap(), ids(&["a", "b"]));
    }

    #[test]
    fn output_is_a_permutation_of_input() {
        let metadata = "a=\na.AutoConfigureAfter=d\nb=\nb.AutoConfigureBefore=c\nc=\nd=\nd.AutoConfigureOrder=3\n";
        let mut sorted = sort(metadata, &["d", "c", "b", "a"]).unwrap();
        let d = sorted.iter().position(|m| m == "d").unwrap();
        let a = sorted.iter().position(|m| m == "a").unwrap();
        let b = sorted.iter().position(|m| m == "b").unwrap();
        let c = sorted.iter().position(|m| m == "c").unwrap();
        assert!(d < a);
        assert!(b < c);
        sorted.sort();
        assert_eq!(sorted, ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn sorting_is_deterministic() {
        let metadata = "a=\na.AutoConfigureAfter=c\nb=\nc=\nc.AutoConfigureOrder=2\n";
        let first = sort(metadata, &["c", "b", "a"]).unwrap();
        let second = sort(metadata, &["a", "c", "b"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_priority_is_an_error() {
        let err = sort("a=\na.AutoConfigureOrder=soon\n", &["a"]).unwrap_err();
        assert!(matches!(err, AutowireError::InvalidMetadata { .. }));
    }

    #[test]
    fn empty_input() {
        assert!(sort("", &[]).unwrap().is_empty());
    }
}
