//! Explicit adjacency-list dependency graph over operators.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::Write as _;

use indexmap::IndexSet;

/// Directed graph whose nodes are operator indices `0..n`.
///
/// An edge `from → to` means `from` must run before `to` within a tick.
/// Successor sets keep insertion order so iteration and DOT output are
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    labels: Vec<String>,
    successors: Vec<IndexSet<usize>>,
}

impl DependencyGraph {
    /// An edgeless graph with one node per label.
    pub fn new(labels: Vec<String>) -> Self {
        let successors = vec![IndexSet::new(); labels.len()];
        Self { labels, successors }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(IndexSet::len).sum()
    }

    /// Label of a node.
    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    /// Add `from → to`. Self-edges and duplicates are ignored; returns
    /// whether a new edge was inserted.
    ///
    /// # Panics
    ///
    /// Panics if either node is out of range.
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        assert!(
            to < self.labels.len(),
            "edge target {to} out of range for {} nodes",
            self.labels.len()
        );
        from != to && self.successors[from].insert(to)
    }

    /// Whether `from → to` is present.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.successors
            .get(from)
            .is_some_and(|set| set.contains(&to))
    }

    /// Direct successors of a node, in insertion order.
    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors
            .get(node)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All edges as `(from, to)` pairs, grouped by source node.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, set)| set.iter().map(move |&to| (from, to)))
    }

    /// Kahn's algorithm with a min-heap of ready nodes, so ties resolve to
    /// the lowest (earliest inserted) index.
    ///
    /// On a cycle, returns the nodes that could not be ordered, ascending.
    pub fn toposort(&self) -> Result<Vec<usize>, Vec<usize>> {
        let n = self.labels.len();
        let mut in_degree = vec![0usize; n];
        for (_, to) in self.edges() {
            in_degree[to] += 1;
        }
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for next in self.successors[node].iter().copied() {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        if order.len() == n {
            Ok(order)
        } else {
            Err((0..n).filter(|&i| in_degree[i] > 0).collect())
        }
    }

    /// Render in Graphviz DOT, one node per operator labelled with its name.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph schedule {\n");
        for (i, label) in self.labels.iter().enumerate() {
            let escaped = label.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "    op{i} [label=\"{escaped}\"];");
        }
        for (from, to) in self.edges() {
            let _ = writeln!(out, "    op{from} -> op{to};");
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize) -> DependencyGraph {
        DependencyGraph::new((0..n).map(|i| format!("op{i}")).collect())
    }

    #[test]
    fn edgeless_graph_keeps_insertion_order() {
        assert_eq!(graph(4).toposort().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn edges_override_insertion_order() {
        let mut g = graph(3);
        assert!(g.add_edge(2, 0));
        assert!(g.add_edge(1, 0));
        assert_eq!(g.toposort().unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn self_and_duplicate_edges_are_ignored() {
        let mut g = graph(2);
        assert!(!g.add_edge(0, 0));
        assert!(g.add_edge(0, 1));
        assert!(!g.add_edge(0, 1));
        assert_eq!(g.edge_count(), 1);
        assert!(g.has_edge(0, 1));
        assert!(!g.has_edge(1, 0));
    }

    #[test]
    fn cycle_reports_remaining_nodes() {
        let mut g = graph(4);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(2, 1);
        g.add_edge(2, 3);
        assert_eq!(g.toposort().unwrap_err(), vec![1, 2, 3]);
    }

    #[test]
    fn dot_lists_nodes_and_edges() {
        let mut g = DependencyGraph::new(vec!["reset \"s\"".into(), "inc".into()]);
        g.add_edge(0, 1);
        let dot = g.to_dot();
        assert!(dot.starts_with("digraph schedule {"));
        assert!(dot.contains("op0 [label=\"reset \\\"s\\\"\"];"));
        assert!(dot.contains("op0 -> op1;"));
        assert_eq!(g.successors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn forward_edges_always_sort(
                n in 1usize..12,
                raw in prop::collection::vec((0usize..12, 0usize..12), 0..30),
            ) {
                let mut g = graph(n);
                for (a, b) in raw {
                    let (a, b) = (a % n, b % n);
                    // Only low → high edges, so the graph is acyclic.
                    if a < b {
                        g.add_edge(a, b);
                    }
                }
                let order = g.toposort().unwrap();
                prop_assert_eq!(order.len(), n);
                let mut pos = vec![0; n];
                for (i, &node) in order.iter().enumerate() {
                    pos[node] = i;
                }
                for (from, to) in g.edges() {
                    prop_assert!(pos[from] < pos[to]);
                }
            }
        }
    }
}
