//! Exact, memoized search deciding whether the defender can isolate the virus for good.
//!
//! A state is the virus position together with the set of gateway edges that are still present.
//! Edges between regular nodes are never cut, so they live in a fixed adjacency and do not take
//! part in the state. Contested edges are indexed once, and a state only carries a bitset over
//! those indices, so hypothetical cuts never touch the live graph.
//!
//! The number of states grows exponentially with the number of contested edges. This is fine for
//! puzzle sized instances, for everything else a state budget can be set, after which the search
//! gives up with `ProcessingError::BudgetExhausted`.

use fxhash::FxHashMap;
use tracing::{debug, trace};
use crate::cust_error::ProcessingError;
use crate::graph::{Graph, GatewayEdge};
use crate::shortest_path::{Adjacency, choose_target_gateway};
use crate::virus::{VirusModel, VirusStep};

/// A set of contested edge indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeSet {
    words: Vec<u64>,
}

impl EdgeSet {

    /// Returns an empty set able to hold the indices `0..capacity`.
    pub fn empty(capacity: usize) -> Self {
        EdgeSet {
            words: vec![0; (capacity + 63) / 64],
        }
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.words.get(idx / 64).map_or(false, |w| w & (1u64 << (idx % 64)) != 0)
    }

    pub fn insert(&mut self, idx: usize) {
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    pub fn remove(&mut self, idx: usize) {
        if let Some(w) = self.words.get_mut(idx / 64) {
            *w &= !(1u64 << (idx % 64));
        }
    }

    /// Returns a copy of `self` without `idx`.
    pub fn without(&self, idx: usize) -> Self {
        let mut clone = self.clone();
        clone.remove(idx);
        clone
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Returns the contained indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item=usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, w)| {
            (0..64usize).filter(move |bit| w & (1u64 << bit) != 0).map(move |bit| i * 64 + bit)
        })
    }
}

/// The part of the graph the search reasons over: the fixed edges between regular nodes and the
/// indexed contested edges.
#[derive(Debug, Clone)]
struct Board {
    labels: Vec<String>,
    gateway: Vec<bool>,
    /// Position of each node in ascending label order.
    rank: Vec<usize>,
    fixed: Vec<Vec<usize>>,
    contested: Vec<GatewayEdge>,
    /// `(edge index, other endpoint)` for every contested edge at a node.
    incident: Vec<Vec<(usize, usize)>>,
    index: FxHashMap<GatewayEdge, usize>,
}

impl Board {

    fn new(graph: &Graph) -> Self {
        let n = graph.num_nodes();
        let mut order: Vec<usize> = graph.nodes().collect();
        order.sort_unstable_by(|a, b| graph.cmp_labels(*a, *b));
        let mut rank = vec![0; n];
        for (pos, node) in order.into_iter().enumerate() {
            rank[node] = pos;
        }
        let contested = graph.gateway_edges();
        let mut incident = vec![Vec::new(); n];
        let mut index = FxHashMap::default();
        for (idx, edge) in contested.iter().enumerate() {
            incident[edge.gateway].push((idx, edge.node));
            incident[edge.node].push((idx, edge.gateway));
            index.insert(*edge, idx);
        }
        let fixed = graph.nodes()
            .map(|node| {
                graph.sorted_neighbors(node)
                    .into_iter()
                    .filter(|neigh| graph.gateway_edge(node, *neigh).is_none())
                    .collect::<Vec<usize>>()
            })
            .collect();
        Board {
            labels: graph.nodes().map(|node| graph.label(node).to_owned()).collect(),
            gateway: graph.nodes().map(|node| graph.is_gateway(node)).collect(),
            rank,
            fixed,
            contested,
            incident,
            index,
        }
    }

    fn view<'a>(&'a self, available: &'a EdgeSet) -> ContestedView<'a> {
        ContestedView {
            board: self,
            available,
        }
    }
}

/// The graph as seen in one search state: fixed edges plus the available contested edges.
pub struct ContestedView<'a> {
    board: &'a Board,
    available: &'a EdgeSet,
}

impl<'a> Adjacency for ContestedView<'a> {
    fn num_reserved(&self) -> usize {
        self.board.labels.len()
    }

    fn label(&self, node: usize) -> &str {
        &self.board.labels[node]
    }

    fn is_gateway(&self, node: usize) -> bool {
        self.board.gateway[node]
    }

    fn sorted_neighbors(&self, node: usize) -> Vec<usize> {
        let mut neighs = self.board.fixed[node].clone();
        neighs.extend(self.board.incident[node]
            .iter()
            .filter(|(idx, _)| self.available.contains(*idx))
            .map(|(_, other)| *other));
        neighs.sort_unstable_by_key(|neigh| self.board.rank[*neigh]);
        neighs
    }
}

/// Memoized game-tree search over `(virus position, available contested edges)`.
#[derive(Debug, Clone)]
pub struct StrategyOracle {
    board: Board,
    model: VirusModel,
    memo: FxHashMap<(usize, EdgeSet), bool>,
    max_states: Option<usize>,
    explored: usize,
}

impl StrategyOracle {

    /// Indexes the gateway edges of `graph`. Only edges present now can be contested later.
    pub fn new(graph: &Graph, model: VirusModel, max_states: Option<usize>) -> Self {
        let board = Board::new(graph);
        debug!(contested = board.contested.len(), ?model, "built strategy oracle");
        StrategyOracle {
            board,
            model,
            memo: FxHashMap::default(),
            max_states,
            explored: 0,
        }
    }

    /// Returns the number of contested edges.
    pub fn num_contested(&self) -> usize {
        self.board.contested.len()
    }

    /// Returns the contested edge with index `idx`.
    pub fn contested_edge(&self, idx: usize) -> GatewayEdge {
        self.board.contested[idx]
    }

    /// Returns the index of `edge`, or `None` if it was not a gateway edge when `self` was built.
    pub fn edge_index(&self, edge: &GatewayEdge) -> Option<usize> {
        self.board.index.get(edge).copied()
    }

    /// Returns the contested edges still present in `graph`.
    pub fn available_in(&self, graph: &Graph) -> EdgeSet {
        let mut available = EdgeSet::empty(self.num_contested());
        for (idx, edge) in self.board.contested.iter().enumerate() {
            if graph.edge_exists((edge.gateway, edge.node)) {
                available.insert(idx);
            }
        }
        available
    }

    /// Returns the number of states expanded so far.
    pub fn states_explored(&self) -> usize {
        self.explored
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Decides whether the defender, about to cut, can keep the virus at `position` away from every
    /// gateway forever, given the contested edges in `available`.
    pub fn winning_strategy_exists(&mut self, position: usize, available: &EdgeSet) -> Result<bool, ProcessingError> {
        if self.board.gateway[position] {
            return Ok(false)
        }
        if choose_target_gateway(position, &self.board.view(available)).is_none() {
            return Ok(true)
        }
        let key = (position, available.clone());
        if let Some(wins) = self.memo.get(&key) {
            return Ok(*wins)
        }
        self.charge()?;
        // Two open gateway edges at the virus: one of them survives the cut.
        let at_virus: Vec<usize> = self.board.incident[position]
            .iter()
            .filter(|(idx, _)| available.contains(*idx))
            .map(|(idx, _)| *idx)
            .collect();
        let choices: Vec<usize> = match at_virus.len() {
            0 => available.iter().collect(),
            1 => at_virus,
            _ => Vec::new(),
        };
        let mut wins = false;
        for idx in choices {
            if self.holds_after_cut(position, &available.without(idx))? {
                wins = true;
                break
            }
        }
        trace!(position, available = available.len(), wins, "solved state");
        self.memo.insert(key, wins);
        Ok(wins)
    }

    /// Decides whether the defender still wins after a cut left `available`, with the virus at
    /// `position` to move. Every virus move the model allows has to lead to a winning state.
    pub fn holds_after_cut(&mut self, position: usize, available: &EdgeSet) -> Result<bool, ProcessingError> {
        let steps = self.model.possible_steps(position, &self.board.view(available));
        for step in steps {
            match step {
                VirusStep::Stay => {},
                VirusStep::Breach(_) => return Ok(false),
                VirusStep::Advance(next) => {
                    if !self.winning_strategy_exists(next, available)? {
                        return Ok(false)
                    }
                },
            }
        }
        Ok(true)
    }

    fn charge(&mut self) -> Result<(), ProcessingError> {
        self.explored += 1;
        if let Some(max) = self.max_states {
            if self.explored > max {
                return Err(ProcessingError::BudgetExhausted(max))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn graph_of(input: &str) -> Graph {
        Graph::read_edges(Cursor::new(input.to_owned())).unwrap()
    }

    fn solvable(input: &str, model: VirusModel) -> bool {
        let graph = graph_of(input);
        let mut oracle = StrategyOracle::new(&graph, model, None);
        let available = oracle.available_in(&graph);
        let start = graph.node_id("a").unwrap();
        oracle.winning_strategy_exists(start, &available).unwrap()
    }

    #[test]
    fn edge_set_test() {
        let mut set = EdgeSet::empty(130);
        assert!(set.is_empty());
        set.insert(0);
        set.insert(64);
        set.insert(129);
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
        let smaller = set.without(64);
        assert!(!smaller.contains(64));
        assert!(set.contains(64));
        assert!(!set.contains(500));
        assert_ne!(smaller, set);
    }

    #[test]
    fn solvable_instances_test() {
        assert!(solvable("a-b\na-c\nb-D\nc-D\n", VirusModel::Deterministic));
        assert!(solvable("a-b\nb-c\nc-d\nb-A\nc-B\nd-C\n", VirusModel::Deterministic));
        assert!(solvable("a-B\n", VirusModel::Deterministic));
        assert!(solvable("a-b\nb-C\nb-D\n", VirusModel::Deterministic));
        assert!(solvable("a-b\nc-D\n", VirusModel::Deterministic));
    }

    #[test]
    fn unsolvable_instances_test() {
        // Two gateways right next to the start.
        assert!(!solvable("a-B\na-C\n", VirusModel::Deterministic));
        // Only two cuts happen before the virus stands on `c` next to four gateways.
        assert!(!solvable("a-b\nb-c\nc-D\nc-E\nc-F\nc-G\n", VirusModel::Deterministic));
    }

    #[test]
    fn idempotent_test() {
        let graph = graph_of("a-b\nb-c\nc-d\nc-e\nA-d\nA-e\nc-f\nc-g\nf-B\ng-B\n");
        let mut oracle = StrategyOracle::new(&graph, VirusModel::Deterministic, None);
        let available = oracle.available_in(&graph);
        let a = graph.node_id("a").unwrap();
        assert_eq!(oracle.num_contested(), 4);
        let first = oracle.winning_strategy_exists(a, &available).unwrap();
        let explored = oracle.states_explored();
        assert!(first);
        assert_eq!(oracle.winning_strategy_exists(a, &available).unwrap(), first);
        assert_eq!(oracle.states_explored(), explored);
        assert!(oracle.memo_len() > 0);
    }

    #[test]
    fn available_tracks_live_cuts_test() {
        let mut graph = graph_of("a-b\nb-C\nb-D\n");
        let oracle = StrategyOracle::new(&graph, VirusModel::Deterministic, None);
        assert_eq!(oracle.available_in(&graph).len(), 2);
        let b = graph.node_id("b").unwrap();
        let c = graph.node_id("C").unwrap();
        graph.remove_edge(c, b);
        let available = oracle.available_in(&graph);
        assert_eq!(available.len(), 1);
        let idx = oracle.edge_index(&GatewayEdge { gateway: c, node: b }).unwrap();
        assert!(!available.contains(idx));
        assert_eq!(oracle.contested_edge(idx), GatewayEdge { gateway: c, node: b });
    }

    #[test]
    fn cautious_model_test() {
        // Deterministically the virus heads for `D` over `b`, a cautious search also has to
        // cover the step to `c`, where three gateways wait.
        let input = "a-b\na-c\nb-D\nc-E\nc-F\nc-G\n";
        assert!(solvable(input, VirusModel::Deterministic));
        assert!(!solvable(input, VirusModel::AnyShortestStep));
    }

    #[test]
    fn budget_test() {
        let graph = graph_of("a-b\nb-c\nc-d\nc-e\nA-d\nA-e\nc-f\nc-g\nf-B\ng-B\n");
        let mut oracle = StrategyOracle::new(&graph, VirusModel::Deterministic, Some(1));
        let available = oracle.available_in(&graph);
        let a = graph.node_id("a").unwrap();
        assert_eq!(
            oracle.winning_strategy_exists(a, &available),
            Err(ProcessingError::BudgetExhausted(1))
        );
    }
}
