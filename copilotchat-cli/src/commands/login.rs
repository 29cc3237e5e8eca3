//! Login command - run the device flow.

use anyhow::Result;
use copilotchat_client::CopilotChat;
use copilotchat_core::AuthState;
use serde_json::json;
use tracing::{info, warn};

use super::build_client;
use crate::{Cli, OutputFormat};

/// Runs the login command.
///
/// Reuses cached credentials when they are still usable, so logging in
/// twice does not prompt twice.
pub async fn run(cli: &Cli) -> Result<()> {
    let client = build_client(cli)?;
    let (before, state) = sign_in(&client).await?;

    match cli.format {
        OutputFormat::Text => {
            if before.is_authenticated() {
                println!("Already authenticated.");
            }
            if let AuthState::Authenticated { expires_at } = state {
                println!("API token valid until {}", expires_at.to_rfc3339());
            }
        }
        OutputFormat::Json => cli.print_json(&json!({ "auth": state }))?,
    }

    Ok(())
}

/// Returns the cached state and the state after authenticating.
///
/// An unreadable keyring counts as nothing cached.
async fn sign_in(client: &CopilotChat) -> Result<(AuthState, AuthState)> {
    let before = match client.restore().await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Failed to load credentials from keyring");
            AuthState::NeedsAuthorization
        }
    };
    info!(state = %before, "Cached credential state");

    let state = client.authenticate().await?;
    Ok((before, state))
}
