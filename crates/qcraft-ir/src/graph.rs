//! Undirected qubit connectivity graph.
//!
//! Used both for hardware connectivity and for the code-space adjacency of a
//! QEC patch. Qubit ids are canonical `u32` values and every iteration is in
//! ascending id order, so downstream passes are deterministic.
//!
//! On the wire the graph is an adjacency mapping `{"0": [1], "1": [0, 2], ...}`.
//! Deserialization rejects non-symmetric input.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::error::IrError;

/// Undirected graph over integer qubit ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, Vec<u32>>", into = "BTreeMap<u32, Vec<u32>>")]
pub struct QubitGraph {
    adjacency: BTreeMap<u32, BTreeSet<u32>>,
}

impl QubitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an edge list.
    pub fn from_edges(edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    /// A linear chain `0-1-2-...`.
    pub fn linear(n: u32) -> Self {
        let mut graph = Self::from_edges((1..n).map(|i| (i - 1, i)));
        if n == 1 {
            graph.add_node(0);
        }
        graph
    }

    /// A `rows x cols` square grid with row-major ids.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut graph = Self::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                graph.add_node(q);
                if c + 1 < cols {
                    graph.add_edge(q, q + 1);
                }
                if r + 1 < rows {
                    graph.add_edge(q, q + cols);
                }
            }
        }
        graph
    }

    /// A complete graph on `n` qubits.
    pub fn full(n: u32) -> Self {
        let mut graph = Self::new();
        for i in 0..n {
            graph.add_node(i);
            for j in (i + 1)..n {
                graph.add_edge(i, j);
            }
        }
        graph
    }

    /// Add an isolated node (no-op if present).
    pub fn add_node(&mut self, q: u32) {
        self.adjacency.entry(q).or_default();
    }

    /// Add an undirected edge. Self-loops are ignored.
    pub fn add_edge(&mut self, a: u32, b: u32) {
        if a == b {
            self.add_node(a);
            return;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.adjacency.keys().copied()
    }

    /// Check whether `q` is a node.
    pub fn contains(&self, q: u32) -> bool {
        self.adjacency.contains_key(&q)
    }

    /// Neighbors of `q` in ascending order.
    pub fn neighbors(&self, q: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&q)
            .into_iter()
            .flat_map(|n| n.iter().copied())
    }

    /// Degree of `q`.
    pub fn degree(&self, q: u32) -> usize {
        self.adjacency.get(&q).map_or(0, BTreeSet::len)
    }

    /// Check whether `a` and `b` share an edge.
    pub fn is_connected(&self, a: u32, b: u32) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Edges as `(low, high)` pairs in ascending order.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.adjacency
            .iter()
            .flat_map(|(&a, ns)| ns.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect()
    }

    /// Breadth-first hop distances from `source` to every reachable node.
    pub fn bfs_distances(&self, source: u32) -> BTreeMap<u32, u32> {
        let mut dist = BTreeMap::new();
        if !self.contains(source) {
            return dist;
        }
        dist.insert(source, 0);
        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            let d = dist[&current];
            for neighbor in self.neighbors(current) {
                if !dist.contains_key(&neighbor) {
                    dist.insert(neighbor, d + 1);
                    queue.push_back(neighbor);
                }
            }
        }
        dist
    }

    /// Shortest-path hop distance, or `None` if unreachable.
    pub fn distance(&self, a: u32, b: u32) -> Option<u32> {
        self.bfs_distances(a).get(&b).copied()
    }

    /// Subgraph induced by `keep`.
    pub fn induced_subgraph(&self, keep: &BTreeSet<u32>) -> Self {
        let adjacency = self
            .adjacency
            .iter()
            .filter(|(q, _)| keep.contains(q))
            .map(|(&q, ns)| (q, ns.intersection(keep).copied().collect()))
            .collect();
        Self { adjacency }
    }

    /// Relabel every node through `f`.
    pub fn relabel(&self, f: impl Fn(u32) -> u32) -> Self {
        let adjacency = self
            .adjacency
            .iter()
            .map(|(&q, ns)| (f(q), ns.iter().map(|&n| f(n)).collect()))
            .collect();
        Self { adjacency }
    }

    /// Merge another graph into this one.
    pub fn extend(&mut self, other: &QubitGraph) {
        for (&q, ns) in &other.adjacency {
            self.add_node(q);
            for &n in ns {
                self.add_edge(q, n);
            }
        }
    }

    /// Number of connected components.
    pub fn connected_components(&self) -> usize {
        let mut graph: UnGraphMap<u32, ()> = UnGraphMap::new();
        for q in self.nodes() {
            graph.add_node(q);
        }
        for (a, b) in self.edges() {
            graph.add_edge(a, b, ());
        }
        connected_components(&graph)
    }
}

impl TryFrom<BTreeMap<u32, Vec<u32>>> for QubitGraph {
    type Error = IrError;

    fn try_from(raw: BTreeMap<u32, Vec<u32>>) -> Result<Self, Self::Error> {
        for (&from, targets) in &raw {
            for &to in targets {
                if to == from {
                    continue;
                }
                let reverse = raw.get(&to).is_some_and(|back| back.contains(&from));
                if !reverse {
                    return Err(IrError::AsymmetricConnectivity { from, to });
                }
            }
        }
        let mut graph = Self::new();
        for (from, targets) in raw {
            graph.add_node(from);
            for to in targets {
                graph.add_edge(from, to);
            }
        }
        Ok(graph)
    }
}

impl From<QubitGraph> for BTreeMap<u32, Vec<u32>> {
    fn from(graph: QubitGraph) -> Self {
        graph
            .adjacency
            .into_iter()
            .map(|(q, ns)| (q, ns.into_iter().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_and_grid() {
        let line = QubitGraph::linear(4);
        assert_eq!(line.num_nodes(), 4);
        assert_eq!(line.num_edges(), 3);
        assert_eq!(line.distance(0, 3), Some(3));

        let grid = QubitGraph::grid(3, 3);
        assert_eq!(grid.num_nodes(), 9);
        assert_eq!(grid.num_edges(), 12);
        assert_eq!(grid.distance(0, 8), Some(4));
        assert_eq!(grid.degree(4), 4);
    }

    #[test]
    fn test_single_node_linear() {
        let g = QubitGraph::linear(1);
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn test_unreachable_distance() {
        let g = QubitGraph::from_edges([(0, 1), (2, 3)]);
        assert_eq!(g.distance(0, 3), None);
        assert_eq!(g.connected_components(), 2);
    }

    #[test]
    fn test_deserialize_symmetric() {
        let g: QubitGraph = serde_json::from_str(r#"{"0": [1], "1": [0, 2], "2": [1]}"#).unwrap();
        assert!(g.is_connected(1, 2));
        assert_eq!(g.edges(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_deserialize_rejects_asymmetric() {
        let result: Result<QubitGraph, _> = serde_json::from_str(r#"{"0": [1], "1": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let g = QubitGraph::grid(2, 2);
        let json = serde_json::to_string(&g).unwrap();
        let back: QubitGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(g, back);
    }

    #[test]
    fn test_induced_subgraph_and_relabel() {
        let g = QubitGraph::linear(5);
        let keep: BTreeSet<u32> = [1, 2, 4].into_iter().collect();
        let sub = g.induced_subgraph(&keep);
        assert_eq!(sub.num_nodes(), 3);
        assert_eq!(sub.edges(), vec![(1, 2)]);

        let shifted = sub.relabel(|q| q + 10);
        assert!(shifted.is_connected(11, 12));
        assert!(shifted.contains(14));
    }
}
