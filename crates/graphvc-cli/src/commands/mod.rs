//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use graphvc_core::api::client::{Credentials, GraphApiClient};
use graphvc_core::storage::FileStore;
use graphvc_core::VCGraph;

pub mod export;
pub mod generate;
pub mod history;
pub mod inspect;
pub mod key;
pub mod serve;
pub mod trial;

const STATE_FILE: &str = "state.json";

/// GraphVC - crypto VC funding news as a knowledge graph
#[derive(Parser)]
#[command(name = "graphvc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Client state file (trial count, stored API key)
    #[arg(long, global = true, env = "GRAPHVC_STATE")]
    pub state: Option<PathBuf>,

    /// GraphVC API base URL
    #[arg(long, global = true, env = "GRAPHVC_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api: String,

    /// Bearer token for the authenticating proxy
    #[arg(long, global = true, env = "GRAPHVC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// User id, when talking to the API without a proxy
    #[arg(long, global = true, env = "GRAPHVC_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve(serve::ServeArgs),

    /// Generate a graph from an article URL or text
    Generate(generate::GenerateArgs),

    /// Show a node and its connections
    Inspect(inspect::InspectArgs),

    /// Export a graph as JSON with a generated filename
    Export(export::ExportArgs),

    /// Manage your own OpenAI API key
    #[command(subcommand)]
    Key(key::KeyCommands),

    /// Free trial status
    #[command(subcommand)]
    Trial(trial::TrialCommands),

    /// Saved graphs (requires sign-in)
    #[command(subcommand)]
    History(history::HistoryCommands),
}

/// What the client-side commands share.
pub struct ClientContext {
    pub store: FileStore,
    pub client: GraphApiClient,
    pub credentials: Credentials,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let Cli {
            state,
            api,
            token,
            user,
            command,
        } = self;

        let context = move || -> Result<ClientContext> {
            let state_path = match state {
                Some(path) => path,
                None => default_state_path()?,
            };
            Ok(ClientContext {
                store: FileStore::new(state_path),
                client: GraphApiClient::new(&api),
                credentials: Credentials {
                    token,
                    user,
                    api_key: None,
                },
            })
        };

        match command {
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Inspect(args) => inspect::execute(args),
            Commands::Export(args) => export::execute(args),
            Commands::Generate(args) => generate::execute(args, context()?).await,
            Commands::Key(cmd) => key::execute(cmd, &context()?),
            Commands::Trial(cmd) => trial::execute(cmd, &context()?).await,
            Commands::History(cmd) => history::execute(cmd, &context()?).await,
        }
    }
}

fn default_state_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine the config directory, pass --state")?;
    Ok(dir.join("graphvc").join(STATE_FILE))
}

/// Read a graph from a JSON file, either a bare graph or a generate response.
pub fn load_graph(path: &Path) -> Result<VCGraph> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let graph = match value.get("graph") {
        Some(inner) => inner.clone(),
        None => value,
    };
    serde_json::from_value(graph).with_context(|| format!("{} does not contain a graph", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_graph_accepts_both_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, r#"{"nodes": [], "edges": []}"#).unwrap();
        assert!(load_graph(&bare).unwrap().is_empty());

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(
            &wrapped,
            r#"{"graph": {"nodes": [{"id": "a", "label": "A", "type": "Investor", "properties": {}}], "edges": []},
                "meta": {"session_id": "s"}}"#,
        )
        .unwrap();
        assert_eq!(load_graph(&wrapped).unwrap().node_count(), 1);

        let junk = dir.path().join("junk.json");
        std::fs::write(&junk, "[1, 2]").unwrap();
        assert!(load_graph(&junk).is_err());
    }
}
