//! Dependency graph between cell names.
//!
//! # Edge Direction
//!
//! ```text
//! s → t  means  "t depends on s"  (t is a dependent of s, s is a dependee of t)
//! ```
//!
//! so "what must be recomputed if s changes?" is a walk along outgoing edges.
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** t ∈ dependents(s) iff s ∈ dependees(t).
//! 2. **No dangling entries:** a node whose both sets are empty is removed.
//! 3. **No duplicate edges:** set semantics; `size` counts each pair once.

use std::collections::{HashMap, HashSet};

#[derive(Default, Debug, Clone, PartialEq)]
struct Node {
    dependents: HashSet<String>,
    dependees: HashSet<String>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.dependents.is_empty() && self.dependees.is_empty()
    }
}

/// Sparse, bidirectional set of `(dependee, dependent)` pairs.
///
/// Cloning produces a fully independent graph.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct DependencyGraph {
    nodes: HashMap<String, Node>,
    edges: usize,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `(s, t)` pairs in the graph.
    pub fn size(&self) -> usize {
        self.edges
    }

    /// Number of names that take part in at least one edge.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges == 0
    }

    pub fn has_dependents(&self, s: &str) -> bool {
        self.nodes.get(s).is_some_and(|n| !n.dependents.is_empty())
    }

    pub fn has_dependees(&self, t: &str) -> bool {
        self.nodes.get(t).is_some_and(|n| !n.dependees.is_empty())
    }

    /// Names that depend directly on `s`.
    pub fn dependents<'a>(&'a self, s: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.nodes
            .get(s)
            .into_iter()
            .flat_map(|n| n.dependents.iter().map(String::as_str))
    }

    /// Names that `t` depends on directly.
    pub fn dependees<'a>(&'a self, t: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.nodes
            .get(t)
            .into_iter()
            .flat_map(|n| n.dependees.iter().map(String::as_str))
    }

    /// Add the pair `(s, t)`: `t` depends on `s`. No-op if already present.
    pub fn add_edge(&mut self, s: &str, t: &str) {
        let inserted = self
            .nodes
            .entry(s.to_string())
            .or_default()
            .dependents
            .insert(t.to_string());
        if inserted {
            self.nodes
                .entry(t.to_string())
                .or_default()
                .dependees
                .insert(s.to_string());
            self.edges += 1;
        }
    }

    /// Remove the pair `(s, t)` if present, pruning nodes left without edges.
    pub fn remove_edge(&mut self, s: &str, t: &str) {
        let removed = self
            .nodes
            .get_mut(s)
            .is_some_and(|n| n.dependents.remove(t));
        if !removed {
            return;
        }
        if let Some(node) = self.nodes.get_mut(t) {
            node.dependees.remove(s);
        }
        self.edges -= 1;
        self.prune(s);
        self.prune(t);
    }

    /// Replace every `(s, r)` with `(s, t)` for each `t` in `new_dependents`.
    pub fn replace_dependents<I, S>(&mut self, s: &str, new_dependents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let old: Vec<String> = self.dependents(s).map(str::to_string).collect();
        for t in &old {
            self.remove_edge(s, t);
        }
        for t in new_dependents {
            self.add_edge(s, t.as_ref());
        }
    }

    /// Replace every `(r, t)` with `(s, t)` for each `s` in `new_dependees`.
    pub fn replace_dependees<I, S>(&mut self, t: &str, new_dependees: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let old: Vec<String> = self.dependees(t).map(str::to_string).collect();
        for s in &old {
            self.remove_edge(s, t);
        }
        for s in new_dependees {
            self.add_edge(s.as_ref(), t);
        }
    }

    fn prune(&mut self, name: &str) {
        if self.nodes.get(name).is_some_and(Node::is_empty) {
            self.nodes.remove(name);
        }
    }
}
