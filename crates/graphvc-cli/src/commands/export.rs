//! JSON export command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use graphvc_core::export;
use graphvc_core::VCGraph;

use super::load_graph;

#[derive(Args)]
pub struct ExportArgs {
    /// Graph JSON file (a graph or a saved generate response)
    pub graph: PathBuf,

    /// Title for the filename; defaults to the first node labels
    #[arg(long)]
    pub title: Option<String>,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let path = export_to_dir(&graph, args.title.as_deref(), &args.dir)?;
    println!("{} {}", "Exported".green(), path.display());
    Ok(())
}

fn export_to_dir(graph: &VCGraph, title: Option<&str>, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export::generate_filename_today(graph, title, "json"));
    export::export_json(graph, &path).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
