//! API server command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use graphvc_extract::{OpenAiConfig, OpenAiExtractor};
use graphvc_graph::{
    GraphClient, GraphConfig, GraphRepository, InMemoryGraphRepository, Neo4jGraphRepository, DEFAULT_MAX_SESSIONS,
};
use graphvc_web::{AppState, ServerConfig};

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server-side OpenAI key, used when a request brings none
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Extraction model
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Redis URL for the scrape cache and daily limits
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Neo4j bolt URI; graphs are kept in memory without it
    #[arg(long, env = "NEO4J_URI")]
    pub neo4j_uri: Option<String>,

    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    pub neo4j_user: String,

    #[arg(long, env = "NEO4J_PASSWORD", default_value = "", hide_env_values = true)]
    pub neo4j_password: String,

    /// SQLite file for graph history
    #[arg(long, env = "GRAPHVC_DB", default_value = "data/graphvc.db")]
    pub db: PathBuf,

    /// Also write logs to this file
    #[arg(long)]
    pub log: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let extractor = OpenAiExtractor::new(OpenAiConfig {
        api_key: args.openai_key.clone(),
        model: args.model.clone(),
        ..OpenAiConfig::default()
    })
    .context("Failed to build the extraction client")?;
    if args.openai_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, only requests with their own key will succeed");
    }

    let graphs = connect_graph_store(&args).await?;
    let history = graphvc_db::init_pool(&args.db)
        .with_context(|| format!("Failed to open history database {}", args.db.display()))?;

    let mut state = AppState::new(Arc::new(extractor), graphs).with_history(history);

    let redis_status = match &args.redis_url {
        Some(url) => match graphvc_redis::init_pool(url).await {
            Ok(pool) => {
                state = state.with_redis(pool);
                "connected".green()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, running without cache and limits");
                "unavailable".yellow()
            }
        },
        None => "disabled".dimmed(),
    };

    let config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
    };

    println!();
    println!("  {} {}", "GraphVC".cyan().bold(), "API Server".bold());
    println!();
    println!("  {}       http://{}:{}/api", "API".green(), config.host, config.port);
    println!("  {}    http://{}:{}/health", "Health".green(), config.host, config.port);
    println!("  {}     {}", "Model".green(), args.model);
    println!("  {}     {}", "Redis".green(), redis_status);
    println!("  {}   {}", "History".green(), args.db.display());
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    graphvc_web::run_server(state, &config).await
}

async fn connect_graph_store(args: &ServeArgs) -> Result<Arc<dyn GraphRepository>> {
    let Some(uri) = &args.neo4j_uri else {
        tracing::warn!(
            max_sessions = DEFAULT_MAX_SESSIONS,
            "NEO4J_URI is not set, graphs are kept in memory (development only, oldest evicted)"
        );
        return Ok(Arc::new(InMemoryGraphRepository::new()));
    };

    let config = GraphConfig {
        uri: uri.clone(),
        user: args.neo4j_user.clone(),
        password: args.neo4j_password.clone(),
        ..GraphConfig::default()
    };
    let client = GraphClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", uri))?;
    graphvc_graph::initialize_schema(&client).await?;

    Ok(Arc::new(Neo4jGraphRepository::new(client)))
}
