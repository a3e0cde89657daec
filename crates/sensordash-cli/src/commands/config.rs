//! Config command implementation.

use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;

use crate::cli::ConfigAction;
use crate::config::Config;

const REDACTED: &str = "********";

pub fn cmd_config(action: ConfigAction, path: &Path, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", show(config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force && !confirm_overwrite(path)? {
                bail!(
                    "Config file already exists: {}\nUse --force to overwrite it.",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}

/// The effective configuration as TOML, with secrets masked.
fn show(config: &Config) -> Result<String> {
    let mut shown = config.clone();
    if shown.store.auth.is_some() {
        shown.store.auth = Some(REDACTED.to_string());
    }
    if shown.email.access_token.is_some() {
        shown.email.access_token = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown).context("Failed to serialize config")
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    Confirm::new()
        .with_prompt(format!("Overwrite {}?", path.display()))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}
