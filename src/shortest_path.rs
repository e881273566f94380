//! Breadth-first search utilities over anything that exposes an adjacency.
//!
//! Neighbors are always expanded in ascending label order, so following the parent pointers of a
//! [`BfsTree`] back from a target yields the path whose steps are locally smallest at every BFS
//! expansion. Unreachable nodes carry no distance (`None`).

use std::collections::VecDeque;
use crate::graph::Graph;

/// Read access to an undirected graph whose nodes are the ids `0..num_reserved()`.
pub trait Adjacency {
    fn num_reserved(&self) -> usize;
    fn label(&self, node: usize) -> &str;
    fn is_gateway(&self, node: usize) -> bool;
    /// Neighbors of `node` in ascending label order.
    fn sorted_neighbors(&self, node: usize) -> Vec<usize>;

    /// All gateways in ascending label order.
    fn gateways(&self) -> Vec<usize> {
        let mut gateways: Vec<usize> = (0..self.num_reserved())
            .filter(|node| self.is_gateway(*node))
            .collect();
        gateways.sort_unstable_by(|a, b| self.label(*a).cmp(self.label(*b)));
        gateways
    }
}

impl Adjacency for Graph {
    fn num_reserved(&self) -> usize {
        self.num_nodes()
    }

    fn label(&self, node: usize) -> &str {
        Graph::label(self, node)
    }

    fn is_gateway(&self, node: usize) -> bool {
        Graph::is_gateway(self, node)
    }

    fn sorted_neighbors(&self, node: usize) -> Vec<usize> {
        Graph::sorted_neighbors(self, node)
    }

    fn gateways(&self) -> Vec<usize> {
        Graph::gateways(self)
    }
}

/// Distances and parent pointers of a single-source BFS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsTree {
    source: usize,
    dist: Vec<Option<usize>>,
    parent: Vec<Option<usize>>,
}

impl BfsTree {

    pub fn source(&self) -> usize {
        self.source
    }

    /// Returns the distance from the source to `node`, or `None` if `node` is unreachable.
    pub fn distance(&self, node: usize) -> Option<usize> {
        self.dist.get(node).copied().flatten()
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parent.get(node).copied().flatten()
    }

    /// Returns the path from the source to `target` (both included), following parent pointers.
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        self.distance(target)?;
        let mut path = vec![target];
        let mut current = target;
        while let Some(prev) = self.parent(current) {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Some(path)
    }

    /// Returns all reached nodes.
    pub fn reached(&self) -> impl Iterator<Item=usize> + '_ {
        self.dist
            .iter()
            .enumerate()
            .filter_map(|(node, dist)| dist.map(|_| node))
    }
}

/// Single-source BFS from `source`.
pub fn bfs_from<A: Adjacency + ?Sized>(source: usize, graph: &A) -> BfsTree {
    let n = graph.num_reserved();
    let mut dist = vec![None; n];
    let mut parent = vec![None; n];
    let mut queue = VecDeque::new();
    if source < n {
        dist[source] = Some(0);
        queue.push_back(source);
    }
    while let Some(node) = queue.pop_front() {
        let next_dist = dist[node].map(|d: usize| d + 1);
        for neigh in graph.sorted_neighbors(node) {
            if dist[neigh].is_none() {
                dist[neigh] = next_dist;
                parent[neigh] = Some(node);
                queue.push_back(neigh);
            }
        }
    }
    BfsTree {
        source,
        dist,
        parent,
    }
}

/// Multi-source BFS: for every node the distance to the closest of `sources`.
pub fn bfs_from_many<A: Adjacency + ?Sized>(sources: &[usize], graph: &A) -> Vec<Option<usize>> {
    let n = graph.num_reserved();
    let mut dist = vec![None; n];
    let mut queue = VecDeque::new();
    for source in sources.iter().filter(|s| **s < n) {
        if dist[*source].is_none() {
            dist[*source] = Some(0);
            queue.push_back(*source);
        }
    }
    while let Some(node) = queue.pop_front() {
        let next_dist = dist[node].map(|d: usize| d + 1);
        for neigh in graph.sorted_neighbors(node) {
            if dist[neigh].is_none() {
                dist[neigh] = next_dist;
                queue.push_back(neigh);
            }
        }
    }
    dist
}

/// Returns the reachable gateway minimizing `(distance, label)` together with its distance.
pub fn target_in<A: Adjacency + ?Sized>(tree: &BfsTree, graph: &A) -> Option<(usize, usize)> {
    graph.gateways()
        .into_iter()
        .filter_map(|gw| tree.distance(gw).map(|d| (gw, d)))
        .min_by(|(a, da), (b, db)| da.cmp(db).then_with(|| graph.label(*a).cmp(graph.label(*b))))
}

/// Returns the gateway the virus at `position` heads for and its distance, or `None` if no
/// gateway is reachable.
pub fn choose_target_gateway<A: Adjacency + ?Sized>(position: usize, graph: &A) -> Option<(usize, usize)> {
    target_in(&bfs_from(position, graph), graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn graph_of(input: &str) -> Graph {
        Graph::read_edges(Cursor::new(input.to_owned())).unwrap()
    }

    #[test]
    fn bfs_distances_test() {
        let graph = graph_of("a-b\nb-c\nc-d\nb-A\nc-B\nd-C\nx-y\n");
        let id = |l: &str| graph.node_id(l).unwrap();
        let tree = bfs_from(id("a"), &graph);
        assert_eq!(tree.distance(id("a")), Some(0));
        assert_eq!(tree.distance(id("A")), Some(2));
        assert_eq!(tree.distance(id("C")), Some(4));
        assert_eq!(tree.distance(id("x")), None);
        assert_eq!(tree.reached().count(), 7);
        assert!(tree.path_to(id("y")).is_none());
    }

    #[test]
    fn lexicographic_parent_test() {
        // Two shortest paths a-c-D and a-b-D; the one over `b` is expanded first.
        let graph = graph_of("a-c\na-b\nc-D\nb-D\n");
        let id = |l: &str| graph.node_id(l).unwrap();
        let tree = bfs_from(id("a"), &graph);
        assert_eq!(tree.parent(id("D")), Some(id("b")));
        assert_eq!(tree.path_to(id("D")), Some(vec![id("a"), id("b"), id("D")]));
    }

    #[test]
    fn multi_source_test() {
        let graph = graph_of("a-b\nb-c\nc-d\nb-A\nd-C\n");
        let id = |l: &str| graph.node_id(l).unwrap();
        let field = bfs_from_many(&graph.gateways(), &graph);
        assert_eq!(field[id("A")], Some(0));
        assert_eq!(field[id("a")], Some(2));
        assert_eq!(field[id("c")], Some(2));
        assert_eq!(field[id("d")], Some(1));
    }

    #[test]
    fn choose_target_test() {
        let graph = graph_of("a-b\nb-D\nb-C\na-e\n");
        let id = |l: &str| graph.node_id(l).unwrap();
        assert_eq!(choose_target_gateway(id("a"), &graph), Some((id("C"), 2)));
        let graph = graph_of("a-b\nc-D\n");
        assert_eq!(choose_target_gateway(graph.node_id("a").unwrap(), &graph), None);
    }
}
