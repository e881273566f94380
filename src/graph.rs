//! Implementation of a simple, undirected graph over string-labeled nodes, with basic static and
//! dynamic functions. Nodes whose label starts with an uppercase letter are gateways.

use fxhash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::fmt;
use std::io::BufRead;
use tracing::debug;
use crate::cust_error::ImportError;

/// Returns `true` iff `label` is non-empty and starts with an uppercase letter.
pub fn is_gateway_label(label: &str) -> bool {
    label.chars().next().map_or(false, char::is_uppercase)
}

/// An edge incident to at least one gateway. For an edge between two gateways, `gateway` is the
/// one with the smaller label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GatewayEdge {
    pub gateway: usize,
    pub node: usize,
}

/// A severed edge in its textual form, `<Gateway>-<OtherNode>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cut {
    pub gateway: String,
    pub node: String,
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.gateway, self.node)
    }
}

/// A simple undirected graph datastructure that supports dynamic behaviour.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct Graph {
    adj_list: Vec<FxHashSet<usize>>,
    labels: Vec<String>,
    gateway: Vec<bool>,
    ids: FxHashMap<String, usize>,
}

// Static functions
impl Graph {

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an `Iterator` over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item=usize> + '_ {
        0..self.adj_list.len()
    }

    /// Returns the number of nodes of `self`.
    pub fn num_nodes(&self) -> usize {
        self.adj_list.len()
    }

    /// Returns the number of edges of `self`.
    pub fn num_edges(&self) -> usize {
        self.adj_list.iter().map(|adj| adj.len()).sum::<usize>() / 2
    }

    /// Returns the neighborhood of `node`, or `None` if `node` is unknown.
    pub fn neighbors(&self, node: usize) -> Option<&FxHashSet<usize>> {
        self.adj_list.get(node)
    }

    /// Returns the neighbors of `node` in ascending label order.
    pub fn sorted_neighbors(&self, node: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self.neighbors(node)
            .map(|neighs| neighs.iter().copied().collect())
            .unwrap_or_default();
        neighbors.sort_unstable_by(|a, b| self.cmp_labels(*a, *b));
        neighbors
    }

    /// Returns the label of `node`.
    pub fn label(&self, node: usize) -> &str {
        &self.labels[node]
    }

    /// Returns the id of the node labeled `label`, if it exists.
    pub fn node_id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Compares two nodes by their labels.
    pub fn cmp_labels(&self, a: usize, b: usize) -> Ordering {
        self.labels[a].cmp(&self.labels[b])
    }

    pub fn is_gateway(&self, node: usize) -> bool {
        self.gateway.get(node).copied().unwrap_or(false)
    }

    /// Returns all gateways in ascending label order.
    pub fn gateways(&self) -> Vec<usize> {
        let mut gateways: Vec<usize> = self.nodes().filter(|node| self.gateway[*node]).collect();
        gateways.sort_unstable_by(|a, b| self.cmp_labels(*a, *b));
        gateways
    }

    /// Returns the non-gateway node with the smallest label, or `None` if every node is a gateway.
    pub fn smallest_regular_node(&self) -> Option<usize> {
        self.nodes()
            .filter(|node| !self.gateway[*node])
            .min_by(|a, b| self.cmp_labels(*a, *b))
    }

    /// Returns the number of gateways adjacent to `node`.
    pub fn gateway_degree(&self, node: usize) -> usize {
        self.neighbors(node)
            .map(|neighs| neighs.iter().filter(|n| self.gateway[**n]).count())
            .unwrap_or(0)
    }

    /// Returns an iterator over all edges.
    pub fn edges(&self) -> impl Iterator<Item=(usize, usize)> + '_ {
        self.adj_list
            .iter()
            .enumerate()
            .flat_map(|(i, adj)| {
                adj.iter()
                    .filter_map(|neigh| if i < *neigh { Some((i, *neigh)) } else { None })
                    .collect::<Vec<(usize, usize)>>()
            })
    }

    /// Checks if `edge` exists.
    pub fn edge_exists(&self, edge: (usize, usize)) -> bool {
        self.neighbors(edge.0).map_or(false, |neighs| neighs.contains(&edge.1))
    }

    /// Returns the canonical gateway edge between `u` and `v`, or `None` if neither is a gateway.
    pub fn gateway_edge(&self, u: usize, v: usize) -> Option<GatewayEdge> {
        match (self.is_gateway(u), self.is_gateway(v)) {
            (true, true) => {
                if self.cmp_labels(u, v) == Ordering::Greater {
                    Some(GatewayEdge { gateway: v, node: u })
                } else {
                    Some(GatewayEdge { gateway: u, node: v })
                }
            },
            (true, false) => Some(GatewayEdge { gateway: u, node: v }),
            (false, true) => Some(GatewayEdge { gateway: v, node: u }),
            (false, false) => None,
        }
    }

    /// Returns all present edges incident to a gateway, ordered by gateway label and then by
    /// the label of the other endpoint.
    pub fn gateway_edges(&self) -> Vec<GatewayEdge> {
        let mut edges: Vec<GatewayEdge> = self.edges()
            .filter_map(|(u, v)| self.gateway_edge(u, v))
            .collect();
        edges.sort_unstable_by(|a, b| self.cmp_edges(a, b));
        edges
    }

    /// Orders gateway edges by gateway label, then by the other label.
    pub fn cmp_edges(&self, a: &GatewayEdge, b: &GatewayEdge) -> Ordering {
        self.cmp_labels(a.gateway, b.gateway).then_with(|| self.cmp_labels(a.node, b.node))
    }

    /// Returns the textual form of `edge`.
    pub fn cut_of(&self, edge: &GatewayEdge) -> Cut {
        Cut {
            gateway: self.labels[edge.gateway].clone(),
            node: self.labels[edge.node].clone(),
        }
    }

    /// Returns a set of all nodes reachable by `node`, including `node`.
    pub fn reachable(&self, node: usize) -> FxHashSet<usize> {
        let mut reached = FxHashSet::default();
        if node >= self.num_nodes() {
            return reached
        }
        let mut queue = vec![node];
        while let Some(next) = queue.pop() {
            if !reached.insert(next) {
                continue
            }
            queue.extend(self.adj_list[next].iter().filter(|n| !reached.contains(*n)));
        }
        reached
    }

    /// Checks if some gateway is reachable from `node`.
    pub fn reaches_gateway(&self, node: usize) -> bool {
        self.reachable(node).iter().any(|n| self.gateway[*n])
    }
}

// Dynamic functions
impl Graph {

    /// Returns the id of the node labeled `label`, inserting the node if it is new.
    pub fn add_node(&mut self, label: &str) -> usize {
        if let Some(id) = self.ids.get(label) {
            return *id
        }
        let id = self.adj_list.len();
        self.adj_list.push(FxHashSet::default());
        self.labels.push(label.to_owned());
        self.gateway.push(is_gateway_label(label));
        self.ids.insert(label.to_owned(), id);
        id
    }

    /// Adds the undirected edge `u`-`v`, creating unknown nodes.
    /// Returns `true` if the edge is new. Self-loops are not added.
    pub fn add_edge(&mut self, u: &str, v: &str) -> bool {
        let src = self.add_node(u);
        let trg = self.add_node(v);
        if src == trg {
            return false
        }
        self.adj_list[src].insert(trg);
        self.adj_list[trg].insert(src)
    }

    /// Removes the undirected edge `u`-`v` in both directions.
    /// Returns `true` if something was removed, unknown nodes and edges are a no-op.
    pub fn remove_edge(&mut self, u: usize, v: usize) -> bool {
        let mut removed = false;
        if let Some(neighs) = self.adj_list.get_mut(u) {
            removed |= neighs.remove(&v);
        }
        if let Some(neighs) = self.adj_list.get_mut(v) {
            removed |= neighs.remove(&u);
        }
        removed
    }
}

impl Graph {

    /// Reads lines of the form `<u>-<v>` and creates a `Graph`.
    /// Blank lines are skipped, as are malformed lines (not exactly one `-`, or an empty endpoint).
    pub fn read_edges<R: BufRead>(input: R) -> Result<Self, ImportError> {
        let mut graph = Graph::new();
        let mut skipped = 0;
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue
            }
            let mut s = line.split('-');
            match (s.next().map(str::trim), s.next().map(str::trim), s.next()) {
                (Some(u), Some(v), None) if !u.is_empty() && !v.is_empty() && u != v => {
                    graph.add_edge(u, v);
                },
                _ => {
                    debug!(line = %line, "skipping malformed edge line");
                    skipped += 1;
                },
            }
        }
        debug!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            skipped,
            "read edge list"
        );
        Ok(graph)
    }

    /// Creates a `Graph` from `(u, v)` label pairs.
    pub fn from_edges<'a, I: IntoIterator<Item=(&'a str, &'a str)>>(edges: I) -> Self {
        let mut graph = Graph::new();
        for (u, v) in edges {
            graph.add_edge(u, v);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_edges_test() {
        let input = Cursor::new("a-b\n\nb-C\nbroken\nx-\n-y\nu-v-w\n  c-D  \nb-C\n");
        let graph = Graph::read_edges(input);
        assert!(graph.is_ok());
        let graph = graph.unwrap();
        assert_eq!(graph.num_nodes(), 5);
        assert_eq!(graph.num_edges(), 3);
        assert!(graph.node_id("x").is_none());
        assert!(graph.node_id("u").is_none());
        let c = graph.node_id("c").unwrap();
        let d = graph.node_id("D").unwrap();
        assert!(graph.edge_exists((c, d)));
        assert!(graph.edge_exists((d, c)));
    }

    #[test]
    fn gateway_label_test() {
        assert!(is_gateway_label("A"));
        assert!(is_gateway_label("Gate7"));
        assert!(!is_gateway_label("a"));
        assert!(!is_gateway_label("7A"));
        assert!(!is_gateway_label(""));
    }

    #[test]
    fn remove_edge_test() {
        let mut graph = Graph::from_edges([("a", "b"), ("b", "C")]);
        let b = graph.node_id("b").unwrap();
        let c = graph.node_id("C").unwrap();
        assert!(graph.remove_edge(c, b));
        assert!(!graph.edge_exists((b, c)));
        assert!(!graph.edge_exists((c, b)));
        assert!(!graph.remove_edge(b, c));
        assert!(!graph.remove_edge(b, 42));
        assert_eq!(graph.num_edges(), 1);
        assert_eq!(graph.num_nodes(), 3);
    }

    #[test]
    fn gateway_edges_test() {
        let graph = Graph::from_edges([("b", "D"), ("a", "b"), ("D", "c"), ("B", "D"), ("a", "B")]);
        let cuts: Vec<String> = graph.gateway_edges()
            .iter()
            .map(|e| graph.cut_of(e).to_string())
            .collect();
        assert_eq!(cuts, vec!["B-D", "B-a", "D-b", "D-c"]);
        let b = graph.node_id("b").unwrap();
        let a = graph.node_id("a").unwrap();
        assert_eq!(graph.gateway_degree(b), 1);
        assert_eq!(graph.gateway_degree(a), 1);
        assert_eq!(graph.smallest_regular_node(), Some(a));
    }

    #[test]
    fn sorted_neighbors_test() {
        let graph = Graph::from_edges([("a", "d"), ("a", "B"), ("a", "c"), ("a", "b")]);
        let a = graph.node_id("a").unwrap();
        let labels: Vec<&str> = graph.sorted_neighbors(a).into_iter().map(|n| graph.label(n)).collect();
        assert_eq!(labels, vec!["B", "b", "c", "d"]);
    }

    #[test]
    fn reachable_test() {
        let graph = Graph::from_edges([("a", "b"), ("c", "D")]);
        let a = graph.node_id("a").unwrap();
        let c = graph.node_id("c").unwrap();
        assert_eq!(graph.reachable(a).len(), 2);
        assert!(!graph.reaches_gateway(a));
        assert!(graph.reaches_gateway(c));
    }
}
