//! The round loop: the defender cuts, then the virus moves, until the virus is isolated.

use std::io::{self, Write};
use tracing::{debug, info, instrument, warn};
use crate::config::SolverConfig;
use crate::cust_error::ProcessingError;
use crate::cut_policy::{select_cut, CutChoice};
use crate::graph::{Cut, Graph, GatewayEdge};
use crate::shortest_path::bfs_from_many;
use crate::strategy::StrategyOracle;
use crate::virus::{next_virus_position, VirusStep};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The virus can no longer reach any gateway. Holds every cut in order.
    Isolated(Vec<Cut>),
    /// No winning strategy exists from the start, nothing was cut.
    NoStrategy,
    /// No safe cut was left partway through the game. Nothing is reported.
    Failed,
    /// The virus was about to reach a gateway. Holds the cuts made so far.
    Breached(Vec<Cut>),
    /// The search budget ran out before a decision.
    Undetermined,
}

impl Outcome {

    /// Returns the cuts to report.
    pub fn cuts(&self) -> &[Cut] {
        match self {
            Outcome::Isolated(cuts) | Outcome::Breached(cuts) => cuts.as_slice(),
            Outcome::NoStrategy | Outcome::Failed | Outcome::Undetermined => &[],
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, Outcome::Isolated(_))
    }
}

/// A running game: the live graph, the virus and the cuts made so far.
#[derive(Debug, Clone)]
pub struct Game {
    graph: Graph,
    oracle: StrategyOracle,
    virus: usize,
    cuts: Vec<GatewayEdge>,
    widen: bool,
}

impl Game {

    /// Sets up a game with the virus on `start`.
    pub fn new(graph: Graph, start: usize, config: &SolverConfig) -> Self {
        let oracle = StrategyOracle::new(&graph, config.virus_model, config.max_states);
        Game {
            graph,
            oracle,
            virus: start,
            cuts: Vec::new(),
            widen: config.widen_candidates,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn virus(&self) -> usize {
        self.virus
    }

    /// Returns the cuts made so far in their textual form.
    pub fn cuts(&self) -> Vec<Cut> {
        self.cuts.iter().map(|edge| self.graph.cut_of(edge)).collect()
    }

    /// Returns the distance from the virus to its nearest gateway, `None` once it is isolated.
    pub fn gateway_distance(&self) -> Option<usize> {
        let field = bfs_from_many(&self.graph.gateways(), &self.graph);
        field.get(self.virus).copied().flatten()
    }

    /// Checks whether the defender can still win from the current position.
    pub fn winnable(&mut self) -> Result<bool, ProcessingError> {
        let available = self.oracle.available_in(&self.graph);
        self.oracle.winning_strategy_exists(self.virus, &available)
    }

    /// Plays one round. Returns `Some(outcome)` once the game is over.
    pub fn play_round(&mut self) -> Result<Option<Outcome>, ProcessingError> {
        let edge = match select_cut(&self.graph, &mut self.oracle, self.virus, self.widen)? {
            CutChoice::Isolated => return Ok(Some(Outcome::Isolated(self.cuts()))),
            CutChoice::Stuck => {
                warn!(
                    virus = self.graph.label(self.virus),
                    cuts = self.cuts.len(),
                    "no safe cut left, dropping the partial sequence"
                );
                return Ok(Some(Outcome::Failed))
            },
            CutChoice::Cut(edge) => edge,
        };
        self.graph.remove_edge(edge.gateway, edge.node);
        self.cuts.push(edge);
        debug!(cut = %self.graph.cut_of(&edge), "cut edge");
        match next_virus_position(self.virus, &self.graph) {
            VirusStep::Stay => Ok(Some(Outcome::Isolated(self.cuts()))),
            VirusStep::Breach(gateway) => {
                warn!(gateway = self.graph.label(gateway), "virus reached a gateway");
                Ok(Some(Outcome::Breached(self.cuts())))
            },
            VirusStep::Advance(next) => {
                debug!(
                    from = self.graph.label(self.virus),
                    to = self.graph.label(next),
                    "virus moved"
                );
                self.virus = next;
                Ok(None)
            },
        }
    }

    /// Plays rounds until the game is over. Fails first if no winning strategy exists.
    #[instrument(skip(self), fields(virus = self.graph.label(self.virus)))]
    pub fn run(&mut self) -> Result<Outcome, ProcessingError> {
        if !self.winnable()? {
            info!("no winning strategy");
            return Ok(Outcome::NoStrategy)
        }
        loop {
            if let Some(outcome) = self.play_round()? {
                info!(
                    cuts = self.cuts.len(),
                    states = self.oracle.states_explored(),
                    isolated = outcome.is_isolated(),
                    "game over"
                );
                return Ok(outcome)
            }
        }
    }
}

/// Computes the defender's cut sequence for `graph` under `config`.
///
/// A graph without gateways, or without regular nodes, ends without a single round. A configured
/// start label the graph does not know is an isolated virus. An isolating sequence is replayed
/// with `validate_solution` before it is returned.
pub fn isolate(graph: Graph, config: &SolverConfig) -> Result<Outcome, ProcessingError> {
    if graph.gateways().is_empty() {
        debug!("no gateways");
        return Ok(Outcome::Isolated(Vec::new()))
    }
    if graph.smallest_regular_node().is_none() {
        debug!("no regular node to start from");
        return Ok(Outcome::NoStrategy)
    }
    let start = match config.resolve_start(&graph)? {
        Some(start) => start,
        None => return Ok(Outcome::Isolated(Vec::new())),
    };
    info!(
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        gateways = graph.gateways().len(),
        start = graph.label(start),
        "solving"
    );
    let mut game = Game::new(graph.clone(), start, config);
    let outcome = match game.run() {
        Err(ProcessingError::BudgetExhausted(max)) => {
            warn!(max, "search budget exhausted");
            return Ok(Outcome::Undetermined)
        },
        result => result?,
    };
    if outcome.is_isolated() && !validate_solution(&graph, start, outcome.cuts()) {
        warn!("cut sequence does not isolate the virus on replay");
    }
    Ok(outcome)
}

/// Replays `cuts` against the virus starting on `start` and checks that every cut exists, the
/// virus never reaches a gateway and ends up isolated.
pub fn validate_solution(graph: &Graph, start: usize, cuts: &[Cut]) -> bool {
    let mut graph = graph.clone();
    let mut virus = start;
    let mut isolated = !graph.reaches_gateway(virus);
    for cut in cuts {
        if isolated {
            return false
        }
        let (gateway, node) = match (graph.node_id(&cut.gateway), graph.node_id(&cut.node)) {
            (Some(gateway), Some(node)) => (gateway, node),
            _ => return false,
        };
        if !graph.is_gateway(gateway) || !graph.remove_edge(gateway, node) {
            return false
        }
        match next_virus_position(virus, &graph) {
            VirusStep::Stay => isolated = true,
            VirusStep::Breach(_) => return false,
            VirusStep::Advance(next) => virus = next,
        }
    }
    isolated
}

/// Writes the cuts to a `Write` type, one per line.
pub fn write_solution<W: Write>(cuts: &[Cut], mut out: W) -> Result<(), io::Error> {
    for cut in cuts {
        writeln!(out, "{}", cut)?;
    }
    Ok(())
}
