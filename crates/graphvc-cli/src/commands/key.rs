//! OpenAI key commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Password;

use graphvc_core::apikey::ApiKeyStore;

use super::ClientContext;

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Store your own OpenAI key; generations with it skip the trial and daily limits
    Set {
        /// The key; prompted for when omitted
        key: Option<String>,
    },

    /// Show the stored key, masked
    Show,

    /// Remove the stored key
    Clear,
}

pub fn execute(cmd: KeyCommands, ctx: &ClientContext) -> Result<()> {
    let keys = ApiKeyStore::new(&ctx.store);

    match cmd {
        KeyCommands::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => Password::new()
                    .with_prompt("OpenAI API key")
                    .interact()
                    .context("Failed to read the key")?,
            };
            keys.set(&key)?;
            println!("{} Key saved to {}", "✓".green(), ctx.store.path().display());
        }
        KeyCommands::Show => match keys.masked() {
            Some(masked) => println!("{}", masked),
            None => println!("{}", "No key stored.".dimmed()),
        },
        KeyCommands::Clear => {
            keys.clear()?;
            println!("{} Key removed", "✓".green());
        }
    }

    Ok(())
}
