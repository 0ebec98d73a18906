//! Graph history commands.

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::PathBuf;

use graphvc_core::api::client::ClientError;
use graphvc_core::export;

use super::ClientContext;
use crate::output;

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List saved graphs, newest first
    List,

    /// Download a saved graph by session id
    Show {
        session_id: String,

        /// Write the graph to this JSON file instead of summarizing it
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Rename a saved graph
    Rename { id: String, title: String },

    /// Delete a saved graph
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub async fn execute(cmd: HistoryCommands, ctx: &ClientContext) -> Result<()> {
    if !ctx.credentials.is_authenticated() {
        bail!("Graph history requires sign-in, pass --token or --user");
    }

    match cmd {
        HistoryCommands::List => {
            let records = ctx.client.list_graphs(&ctx.credentials).await.map_err(api_error)?;
            output::print_history_table(&records);
        }
        HistoryCommands::Show { session_id, out } => {
            let graph = ctx
                .client
                .get_graph(&session_id, &ctx.credentials)
                .await
                .map_err(api_error)?;
            match out {
                Some(path) => {
                    export::export_json(&graph, &path)?;
                    println!("{} {}", "Saved".green(), path.display());
                }
                None => {
                    println!(
                        "{} {} nodes, {} edges",
                        "Graph".cyan().bold(),
                        graph.node_count(),
                        graph.edge_count()
                    );
                    output::print_type_counts(&graph);
                }
            }
        }
        HistoryCommands::Rename { id, title } => {
            let record = ctx
                .client
                .rename_graph(&id, &title, &ctx.credentials)
                .await
                .map_err(api_error)?;
            println!("{} Renamed to {}", "✓".green(), record.title.bold());
        }
        HistoryCommands::Delete { id, yes } => {
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete graph {}?", id))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    return Ok(());
                }
            }
            ctx.client
                .delete_graph(&id, &ctx.credentials)
                .await
                .map_err(api_error)?;
            println!("{} Graph deleted", "✓".green());
        }
    }

    Ok(())
}

fn api_error(err: ClientError) -> anyhow::Error {
    match err.api() {
        Some(api) => anyhow::anyhow!(api.user_message()),
        None => err.into(),
    }
}
