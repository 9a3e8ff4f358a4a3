//! Recalculation ordering and circular dependency detection.
//!
//! When a cell changes, it and everything downstream of it must be recomputed,
//! dependees before dependents. This module walks the [`DependencyGraph`]
//! forward from the changed cell with an explicit stack (so long chains cannot
//! overflow the call stack), producing a topological order. Reaching the
//! starting cell again means the edit introduced a cycle.

use std::collections::HashSet;

use thiserror::Error;

use super::graph::DependencyGraph;

/// The starting cell can reach itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("circular dependency through cell {cell}")]
pub struct CycleError {
    pub cell: String,
}

struct Frame<'g> {
    name: &'g str,
    pending: Vec<&'g str>,
}

/// Return `start` and every name transitively depending on it, ordered so
/// that each name comes after all of its dependees within the set.
///
/// Fails if `start` is reachable from itself. The graph is assumed to be
/// acyclic apart from cycles passing through `start`.
pub fn cells_to_recalculate<'g>(
    graph: &'g DependencyGraph,
    start: &'g str,
) -> Result<Vec<&'g str>, CycleError> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut finished: Vec<&str> = Vec::new();

    visited.insert(start);
    let mut stack = vec![Frame {
        name: start,
        pending: graph.dependents(start).collect(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(next) = frame.pending.pop() else {
            finished.push(frame.name);
            stack.pop();
            continue;
        };

        if next == start {
            return Err(CycleError {
                cell: start.to_string(),
            });
        }
        if visited.insert(next) {
            stack.push(Frame {
                name: next,
                pending: graph.dependents(next).collect(),
            });
        }
    }

    // Reverse post-order is a topological order.
    finished.reverse();
    Ok(finished)
}

/// True if `start` can reach itself through the graph.
pub fn detect_cycle(graph: &DependencyGraph, start: &str) -> bool {
    cells_to_recalculate(graph, start).is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn position(order: &[&str], name: &str) -> usize {
        order.iter().position(|n| *n == name).unwrap()
    }

    #[test]
    fn test_isolated_cell() {
        let g = DependencyGraph::new();
        assert_eq!(cells_to_recalculate(&g, "A1"), Ok(vec!["A1"]));
    }

    #[test]
    fn test_chain_order() {
        let mut g = DependencyGraph::new();
        g.add_edge("A1", "A2");
        g.add_edge("A2", "A3");
        assert_eq!(cells_to_recalculate(&g, "A1"), Ok(vec!["A1", "A2", "A3"]));
        assert_eq!(cells_to_recalculate(&g, "A2"), Ok(vec!["A2", "A3"]));
    }

    #[test]
    fn test_diamond_respects_dependencies() {
        // B1 and C1 read A1; D1 reads both.
        let mut g = DependencyGraph::new();
        g.add_edge("A1", "B1");
        g.add_edge("A1", "C1");
        g.add_edge("B1", "D1");
        g.add_edge("C1", "D1");
        g.add_edge("A1", "D1");
        let order = cells_to_recalculate(&g, "A1").unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], "A1");
        assert!(position(&order, "B1") < position(&order, "D1"));
        assert!(position(&order, "C1") < position(&order, "D1"));
    }

    #[test]
    fn test_self_cycle() {
        let mut g = DependencyGraph::new();
        g.add_edge("A1", "A1");
        assert_eq!(
            cells_to_recalculate(&g, "A1"),
            Err(CycleError {
                cell: "A1".to_string()
            })
        );
        assert!(detect_cycle(&g, "A1"));
    }

    #[test]
    fn test_indirect_cycle() {
        let mut g = DependencyGraph::new();
        g.add_edge("A1", "B1");
        g.add_edge("B1", "C1");
        g.add_edge("C1", "A1");
        assert!(detect_cycle(&g, "A1"));
        assert!(detect_cycle(&g, "B1"));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut g = DependencyGraph::new();
        let names: Vec<String> = (1..=20_000).map(|i| format!("A{}", i)).collect();
        for pair in names.windows(2) {
            g.add_edge(&pair[0], &pair[1]);
        }
        let order = cells_to_recalculate(&g, "A1").unwrap();
        assert_eq!(order.len(), 20_000);
        assert_eq!(order.last(), Some(&"A20000"));
    }
}
