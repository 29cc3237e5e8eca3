//! Chat command - send one prompt.

use anyhow::Result;
use clap::Args;
use copilotchat_core::{ChatRequest, Model};
use serde_json::json;
use tracing::debug;

use super::build_client;
use crate::{Cli, OutputFormat};

/// Prompt used when none is given.
pub const DEFAULT_PROMPT: &str = "Describe what is Lazygit in one sentence";

/// Arguments for the chat command.
#[derive(Args)]
pub struct ChatArgs {
    /// Prompt to send.
    pub prompt: Option<String>,

    /// Model id.
    #[arg(long, short, default_value = "gpt-4o-2024-05-13")]
    pub model: String,

    /// Sampling temperature.
    #[arg(long, short, default_value_t = ChatRequest::DEFAULT_TEMPERATURE)]
    pub temperature: f32,
}

impl Default for ChatArgs {
    fn default() -> Self {
        Self {
            prompt: None,
            model: Model::default().to_string(),
            temperature: ChatRequest::DEFAULT_TEMPERATURE,
        }
    }
}

/// Runs the chat command.
pub async fn run(args: &ChatArgs, cli: &Cli) -> Result<()> {
    let client = build_client(cli)?;

    let model = Model::from(args.model.as_str());
    let prompt = args.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
    debug!(model = %model, max_tokens = model.max_token_count(), "Sending prompt");

    let request = ChatRequest::from_prompt(model.clone(), prompt).with_temperature(args.temperature);
    let answer = client.chat(request).await?;

    match cli.format {
        OutputFormat::Text => println!("{answer}"),
        OutputFormat::Json => cli.print_json(&json!({
            "model": model,
            "prompt": prompt,
            "response": answer,
        }))?,
    }

    Ok(())
}
