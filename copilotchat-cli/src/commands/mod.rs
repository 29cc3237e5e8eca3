//! CLI command implementations.

pub mod chat;
pub mod login;
pub mod logout;
pub mod status;

use anyhow::Result;
use copilotchat_client::CopilotChat;

use crate::Cli;

/// Builds a client over the OS keychain from the CLI's configuration.
pub fn build_client(cli: &Cli) -> Result<CopilotChat> {
    let config = cli.client_config()?;
    Ok(CopilotChat::with_system_keychain(config)?)
}
