//! Graph generation command.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use graphvc_core::api::client::ClientError;
use graphvc_core::api::{GenerateRequest, GenerateResponse, GraphApiError};
use graphvc_core::apikey::ApiKeyStore;
use graphvc_core::export;
use graphvc_core::trial::{TrialGate, MAX_TRIALS};

use super::ClientContext;
use crate::output;

#[derive(Args)]
pub struct GenerateArgs {
    /// Article URL or funding announcement text; `-` reads stdin
    pub input: String,

    /// Scrape the URL again instead of using the cached copy
    #[arg(long)]
    pub refresh: bool,

    /// Write the graph as JSON to this file, or into this directory
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Title used for the generated filename
    #[arg(long)]
    pub title: Option<String>,
}

pub async fn execute(args: GenerateArgs, ctx: ClientContext) -> Result<()> {
    let input = read_input(&args.input)?;

    let mut credentials = ctx.credentials.clone();
    credentials.api_key = ApiKeyStore::new(&ctx.store).get();

    // Anonymous callers without their own key are on the free trial
    let on_trial = !credentials.is_authenticated() && credentials.api_key.is_none();
    let trial = TrialGate::new(&ctx.store);
    if on_trial && trial.is_exhausted()? {
        bail!(
            "Free trial used up ({} of {}). Sign in with --token, or set your own OpenAI key with `graphvc key set`.",
            MAX_TRIALS,
            MAX_TRIALS
        );
    }

    let request = GenerateRequest {
        input,
        force_refresh: args.refresh,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Building graph...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = tokio::select! {
        result = ctx.client.generate(&request, &credentials) => result,
        _ = tokio::signal::ctrl_c() => {
            spinner.finish_and_clear();
            println!("{}", "Cancelled.".dimmed());
            return Ok(());
        }
    };
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(ClientError::Api(e)) => return Err(describe_failure(&e)),
        Err(e) => return Err(e).with_context(|| format!("Could not reach {}", ctx.client.base_url())),
    };

    if on_trial {
        let used = trial.increment()?;
        println!(
            "{}",
            format!("Free trial: {} of {} used", used.min(MAX_TRIALS), MAX_TRIALS).dimmed()
        );
    }

    output::print_generate_summary(&response);

    if let Some(out) = &args.out {
        let path = write_graph(&response, out, args.title.as_deref())?;
        println!("{} {}", "Saved".green(), path.display());
    }

    Ok(())
}

fn read_input(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read input from stdin")?;
    Ok(buf)
}

fn describe_failure(err: &GraphApiError) -> anyhow::Error {
    if err.is_rate_limited() {
        if let Some(secs) = err.retry_after() {
            return anyhow::anyhow!("{} (try again in {})", err.user_message(), output::format_wait(secs));
        }
    }
    anyhow::anyhow!(err.user_message())
}

/// Write the graph to `out`; a directory gets a generated filename.
fn write_graph(response: &GenerateResponse, out: &Path, title: Option<&str>) -> Result<PathBuf> {
    let path = if out.is_dir() {
        out.join(export::generate_filename_today(&response.graph, title, "json"))
    } else {
        out.to_path_buf()
    };
    export::export_json(&response.graph, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
