//! Settings of a solver run. The defaults reproduce the reference behaviour.

use crate::cust_error::ProcessingError;
use crate::graph::Graph;
use crate::virus::VirusModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Label of the virus' start node. `None` picks the regular node with the smallest label.
    pub start: Option<String>,
    /// Which virus moves the strategy search defends against.
    pub virus_model: VirusModel,
    /// Upper bound on the number of search states, `None` for no bound.
    pub max_states: Option<usize>,
    /// Fall back to every gateway edge when no shortest-path candidate is safe.
    pub widen_candidates: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            start: None,
            virus_model: VirusModel::Deterministic,
            max_states: None,
            widen_candidates: true,
        }
    }
}

impl SolverConfig {

    pub fn with_start(mut self, label: &str) -> Self {
        self.start = Some(label.to_owned());
        self
    }

    pub fn with_virus_model(mut self, model: VirusModel) -> Self {
        self.virus_model = model;
        self
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    pub fn with_widen_candidates(mut self, widen: bool) -> Self {
        self.widen_candidates = widen;
        self
    }

    /// Resolves the virus' start node in `graph`.
    ///
    /// Returns `Ok(None)` if there is no node to start from: the configured label is unknown, or
    /// every node is a gateway. A configured gateway label is an error.
    pub fn resolve_start(&self, graph: &Graph) -> Result<Option<usize>, ProcessingError> {
        match &self.start {
            Some(label) => match graph.node_id(label) {
                Some(node) if graph.is_gateway(node) => Err(ProcessingError::InvalidParameter(
                    format!("start node `{}` is a gateway", label)
                )),
                node => Ok(node),
            },
            None => Ok(graph.smallest_regular_node()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_start_test() {
        let graph = Graph::from_edges([("b", "a"), ("a", "C")]);
        let config = SolverConfig::default();
        assert_eq!(config.resolve_start(&graph), Ok(graph.node_id("a")));
        let config = SolverConfig::default().with_start("b");
        assert_eq!(config.resolve_start(&graph), Ok(graph.node_id("b")));
        let config = SolverConfig::default().with_start("zz");
        assert_eq!(config.resolve_start(&graph), Ok(None));
        let config = SolverConfig::default().with_start("C");
        assert!(matches!(config.resolve_start(&graph), Err(ProcessingError::InvalidParameter(_))));
        let all_gateways = Graph::from_edges([("A", "B")]);
        assert_eq!(SolverConfig::default().resolve_start(&all_gateways), Ok(None));
    }
}
