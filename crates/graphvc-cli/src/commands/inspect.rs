//! Node inspection command.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use graphvc_core::graph::neighbors::connected_nodes;

use super::load_graph;
use crate::output;

#[derive(Args)]
pub struct InspectArgs {
    /// Graph JSON file (a graph or a saved generate response)
    pub graph: PathBuf,

    /// Node id, e.g. `paradigm-capital`
    pub node: String,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;

    let Some(node) = graph.node(&args.node) else {
        let known: Vec<&str> = graph.nodes.iter().take(10).map(|n| n.id.as_str()).collect();
        if known.is_empty() {
            bail!("Node not found: {} (the graph is empty)", args.node);
        }
        bail!("Node not found: {} (known ids include: {})", args.node, known.join(", "));
    };

    let connections = connected_nodes(&graph, &node.id);
    output::print_node(node, &connections);
    Ok(())
}
