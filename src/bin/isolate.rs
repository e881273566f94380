//! Binary that takes as standard in an edge list (`<u>-<v>` per line), computes the defender's
//! cut sequence isolating the virus and writes it to standard out, one cut per line.

use std::error;
use std::io;

use tracing_subscriber::EnvFilter;

use quarantine::{config::SolverConfig, graph::Graph, game::{isolate, write_solution}};

pub fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdin = stdin.lock();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let graph = Graph::read_edges(stdin)?;
    // Validates an isolating sequence by replay before returning it.
    let outcome = isolate(graph, &SolverConfig::default())?;
    write_solution(outcome.cuts(), &mut stdout)?;
    Ok(())
}
