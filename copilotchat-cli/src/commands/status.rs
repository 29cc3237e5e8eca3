//! Status command - show cached credential state.

use anyhow::Result;
use copilotchat_client::ClientConfig;
use serde_json::json;

use super::build_client;
use crate::{Cli, OutputFormat};

/// Runs the status command. Never touches the network.
pub async fn run(cli: &Cli) -> Result<()> {
    let client = build_client(cli)?;
    let state = client.restore().await?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ClientConfig::default_path);

    match cli.format {
        OutputFormat::Text => {
            println!("Copilot: {state}");
            if cli.verbose {
                println!("Config file: {}", config_path.display());
            }
        }
        OutputFormat::Json => cli.print_json(&json!({
            "auth": state,
            "config_path": config_path.display().to_string(),
        }))?,
    }

    Ok(())
}
