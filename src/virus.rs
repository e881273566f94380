//! The virus' movement: one step per round toward the nearest reachable gateway.

use crate::shortest_path::{Adjacency, bfs_from, bfs_from_many, target_in};

/// The result of asking the virus to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirusStep {
    /// No gateway is reachable, the virus stays where it is.
    Stay,
    /// The virus moves to the given regular node.
    Advance(usize),
    /// The virus moves onto the given gateway.
    Breach(usize),
}

/// Computes the virus' next step from `position`.
///
/// The virus targets the reachable gateway minimizing `(distance, label)` and advances one hop
/// along the BFS path toward it, ties broken by the smaller label at every expansion.
pub fn next_virus_position<A: Adjacency + ?Sized>(position: usize, graph: &A) -> VirusStep {
    let tree = bfs_from(position, graph);
    let (target, dist) = match target_in(&tree, graph) {
        Some(target) => target,
        None => return VirusStep::Stay,
    };
    if dist <= 1 {
        return VirusStep::Breach(target)
    }
    match tree.path_to(target) {
        Some(path) if path.len() >= 2 => VirusStep::Advance(path[1]),
        _ => VirusStep::Stay,
    }
}

/// Which virus moves the strategy search has to defend against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VirusModel {
    /// Only the move `next_virus_position` prescribes.
    #[default]
    Deterministic,
    /// Any step along any shortest path toward some nearest gateway.
    AnyShortestStep,
}

impl VirusModel {

    /// Returns every move the virus at `position` may make under `self`.
    /// A single `VirusStep::Stay` means the virus is isolated.
    pub fn possible_steps<A: Adjacency + ?Sized>(&self, position: usize, graph: &A) -> Vec<VirusStep> {
        match self {
            VirusModel::Deterministic => vec![next_virus_position(position, graph)],
            VirusModel::AnyShortestStep => {
                let field = bfs_from_many(&graph.gateways(), graph);
                let dist = match field.get(position).copied().flatten() {
                    Some(dist) => dist,
                    None => return vec![VirusStep::Stay],
                };
                if dist == 0 {
                    return vec![VirusStep::Breach(position)]
                }
                graph.sorted_neighbors(position)
                    .into_iter()
                    .filter(|neigh| field[*neigh] == Some(dist - 1))
                    .map(|neigh| {
                        if graph.is_gateway(neigh) {
                            VirusStep::Breach(neigh)
                        } else {
                            VirusStep::Advance(neigh)
                        }
                    })
                    .collect()
            },
        }
    }
}
