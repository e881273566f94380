//! Chooses the edge the defender cuts each round.
//!
//! Candidates are the gateway edges on shortest virus-to-gateway paths. Those whose removal would
//! hand the virus a won game are dropped with the help of the `StrategyOracle`, and of the rest the
//! edge at the junction with the most gateway neighbors is taken, ties broken by the cut string.

use std::cmp::Ordering;
use tracing::debug;
use crate::cust_error::ProcessingError;
use crate::graph::{Graph, GatewayEdge};
use crate::shortest_path::{bfs_from, target_in};
use crate::strategy::StrategyOracle;

/// The defender's decision for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutChoice {
    /// No gateway is reachable anymore, nothing left to cut.
    Isolated,
    Cut(GatewayEdge),
    /// Every candidate loses.
    Stuck,
}

/// Returns the distance from `position` to its nearest gateway together with every gateway edge
/// `(G, p)` on a shortest path of that length, or `None` if no gateway is reachable.
pub fn shortest_path_candidates(graph: &Graph, position: usize) -> Option<(usize, Vec<GatewayEdge>)> {
    let tree = bfs_from(position, graph);
    let (_, best_len) = target_in(&tree, graph)?;
    let mut candidates: Vec<GatewayEdge> = if best_len <= 1 {
        graph.sorted_neighbors(position)
            .into_iter()
            .filter_map(|neigh| graph.gateway_edge(position, neigh))
            .collect()
    } else {
        graph.gateways()
            .into_iter()
            .filter(|gw| tree.distance(*gw) == Some(best_len))
            .flat_map(|gw| {
                graph.sorted_neighbors(gw)
                    .into_iter()
                    .filter(|p| tree.distance(*p) == Some(best_len - 1))
                    .filter_map(|p| graph.gateway_edge(gw, p))
                    .collect::<Vec<_>>()
            })
            .collect()
    };
    candidates.sort_unstable_by(|a, b| graph.cmp_edges(a, b));
    candidates.dedup();
    Some((best_len, candidates))
}

/// Keeps the candidates after whose removal the defender still has a winning strategy against the
/// virus at `position`.
pub fn safe_candidates(
    graph: &Graph,
    oracle: &mut StrategyOracle,
    position: usize,
    candidates: &[GatewayEdge],
) -> Result<Vec<GatewayEdge>, ProcessingError> {
    let available = oracle.available_in(graph);
    let mut safe = Vec::new();
    for edge in candidates {
        let idx = match oracle.edge_index(edge) {
            Some(idx) if available.contains(idx) => idx,
            _ => continue,
        };
        if oracle.holds_after_cut(position, &available.without(idx))? {
            safe.push(*edge);
        }
    }
    Ok(safe)
}

/// Bytes of the textual form `<Gateway>-<Other>` of `edge`.
fn cut_bytes<'a>(graph: &'a Graph, edge: &GatewayEdge) -> impl Iterator<Item=u8> + 'a {
    graph.label(edge.gateway)
        .bytes()
        .chain(std::iter::once(b'-'))
        .chain(graph.label(edge.node).bytes())
}

/// Orders cuts by preference: more gateway neighbors at the non-gateway endpoint first, then the
/// smaller cut string.
pub fn cmp_preference(graph: &Graph, a: &GatewayEdge, b: &GatewayEdge) -> Ordering {
    graph.gateway_degree(b.node)
        .cmp(&graph.gateway_degree(a.node))
        .then_with(|| cut_bytes(graph, a).cmp(cut_bytes(graph, b)))
}

/// Returns the most preferred of `candidates`.
pub fn preferred_cut(graph: &Graph, candidates: &[GatewayEdge]) -> Option<GatewayEdge> {
    candidates.iter().copied().min_by(|a, b| cmp_preference(graph, a, b))
}

/// Picks this round's cut for the virus at `position`.
///
/// If no shortest-path candidate is safe and `widen` is set, every remaining gateway edge is
/// considered before giving up.
pub fn select_cut(
    graph: &Graph,
    oracle: &mut StrategyOracle,
    position: usize,
    widen: bool,
) -> Result<CutChoice, ProcessingError> {
    let (best_len, candidates) = match shortest_path_candidates(graph, position) {
        Some(found) => found,
        None => return Ok(CutChoice::Isolated),
    };
    let mut safe = safe_candidates(graph, oracle, position, &candidates)?;
    debug!(best_len, candidates = candidates.len(), safe = safe.len(), "filtered candidates");
    if safe.is_empty() && widen {
        let rest: Vec<GatewayEdge> = graph.gateway_edges()
            .into_iter()
            .filter(|edge| !candidates.contains(edge))
            .collect();
        safe = safe_candidates(graph, oracle, position, &rest)?;
        debug!(widened = rest.len(), safe = safe.len(), "widened candidates");
    }
    Ok(preferred_cut(graph, &safe).map_or(CutChoice::Stuck, CutChoice::Cut))
}
