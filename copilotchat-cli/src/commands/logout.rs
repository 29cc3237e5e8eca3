//! Logout command.

use anyhow::Result;
use serde_json::json;

use super::build_client;
use crate::{Cli, OutputFormat};

/// Runs the logout command.
pub async fn run(cli: &Cli) -> Result<()> {
    let client = build_client(cli)?;
    client.logout().await?;

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Copilot credentials removed from the keyring.");
            }
        }
        OutputFormat::Json => cli.print_json(&json!({ "logged_out": true }))?,
    }

    Ok(())
}
