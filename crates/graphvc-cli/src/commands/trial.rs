//! Free trial commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use graphvc_core::apikey::ApiKeyStore;
use graphvc_core::trial::{TrialGate, MAX_TRIALS};

use super::ClientContext;
use crate::output;

#[derive(Subcommand)]
pub enum TrialCommands {
    /// Show remaining free generations
    Status,

    /// Reset the local trial counter
    Reset,
}

pub async fn execute(cmd: TrialCommands, ctx: &ClientContext) -> Result<()> {
    let trial = TrialGate::new(&ctx.store);

    match cmd {
        TrialCommands::Status => {
            if ApiKeyStore::new(&ctx.store).get().is_some() {
                println!("{}", "Using your own OpenAI key, no trial limits apply.".green());
            } else if ctx.credentials.is_authenticated() {
                println!("{}", "Signed in, the free trial does not apply.".green());
            } else {
                let remaining = trial.remaining()?;
                let count = format!("{} of {}", remaining, MAX_TRIALS);
                let count = if remaining == 0 { count.red() } else { count.green() };
                println!("  {}: {} free generations left", "Trial".bold(), count);
            }

            match ctx.client.usage(&ctx.credentials).await {
                Ok(usage) => output::print_usage(&usage),
                Err(e) => tracing::debug!(error = %e, "Usage lookup failed"),
            }
        }
        TrialCommands::Reset => {
            trial.reset()?;
            println!("{} Trial counter reset", "✓".green());
        }
    }

    Ok(())
}
