// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! copilotchat CLI - GitHub Copilot chat from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Sign in with the GitHub device flow
//! copilotchat login
//!
//! # Ask a question (authenticates first if needed)
//! copilotchat chat "Describe what is Lazygit in one sentence"
//!
//! # Pick a model
//! copilotchat chat --model gpt-4 "Explain git rebase"
//!
//! # Show cached credential state as JSON
//! copilotchat status --format json --pretty
//!
//! # Forget cached credentials
//! copilotchat logout
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use copilotchat_client::{ClientConfig, CopilotError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{chat, login, logout, status};

// ============================================================================
// CLI Definition
// ============================================================================

/// copilotchat CLI - GitHub Copilot chat.
#[derive(Parser)]
#[command(name = "copilotchat")]
#[command(about = "GitHub Copilot chat CLI")]
#[command(long_about = r#"
copilotchat signs in to GitHub Copilot with the OAuth device flow and sends
chat completion requests.

Credentials are cached in the OS keyring (service "lazygit", account
"github-copilot") and refreshed automatically when the API token expires.

Examples:
  copilotchat login                  # Sign in
  copilotchat chat "Hello"           # Ask a question
  copilotchat status                 # Show credential state
  copilotchat logout                 # Forget credentials
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'chat' with the default prompt.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the configuration file.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with the GitHub device flow.
    Login,

    /// Send a prompt and print the answer.
    #[command(visible_alias = "c")]
    Chat(chat::ChatArgs),

    /// Show the cached credential state without network access.
    #[command(visible_alias = "s")]
    Status,

    /// Delete cached credentials.
    Logout,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Configuration could not be loaded.
    ConfigError = 2,
    /// Upstream API refused the request.
    ApiError = 3,
    /// Timeout.
    Timeout = 4,
}

impl Cli {
    /// Loads the client configuration from `--config` or the default path.
    pub fn client_config(&self) -> Result<ClientConfig, CopilotError> {
        match &self.config {
            Some(path) => ClientConfig::load_from(path),
            None => ClientConfig::load(),
        }
    }

    /// Prints `value` as JSON honoring `--pretty`.
    pub fn print_json(&self, value: &serde_json::Value) -> Result<()> {
        let output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{output}");
        Ok(())
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("copilotchat=debug,info")
    } else {
        EnvFilter::new("copilotchat=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Maps a failure to the process exit code and user message.
fn classify(err: &anyhow::Error) -> (ExitCode, String) {
    match err.downcast_ref::<CopilotError>() {
        Some(e) if e.is_timeout() => (
            ExitCode::Timeout,
            "Authentication process timed out. Please try again later.".to_string(),
        ),
        Some(e) if e.is_request_timeout() => (ExitCode::Timeout, e.to_string()),
        Some(e @ (CopilotError::Config(_) | CopilotError::Io(_))) => {
            (ExitCode::ConfigError, e.to_string())
        }
        Some(
            e @ (CopilotError::Api { .. }
            | CopilotError::ApiError(_)
            | CopilotError::TokenRejected(_)),
        ) => (ExitCode::ApiError, e.to_string()),
        _ => (ExitCode::Error, format!("{err:#}")),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Login) => login::run(&cli).await,
        Some(Commands::Chat(args)) => chat::run(args, &cli).await,
        Some(Commands::Status) => status::run(&cli).await,
        Some(Commands::Logout) => logout::run(&cli).await,
        None => chat::run(&chat::ChatArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        let (code, message) = classify(&e);
        if !cli.quiet {
            eprintln!("Error: {message}");
        }
        std::process::exit(code as i32);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_chat_args() {
        let cli = Cli::parse_from([
            "copilotchat",
            "chat",
            "--model",
            "gpt-4",
            "--temperature",
            "0.5",
            "hello there",
        ]);
        match cli.command {
            Some(Commands::Chat(args)) => {
                assert_eq!(args.model, "gpt-4");
                assert!((args.temperature - 0.5).abs() < f32::EPSILON);
                assert_eq!(args.prompt.as_deref(), Some("hello there"));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["copilotchat", "status", "--format", "json", "--pretty"]);
        assert!(matches!(cli.command, Some(Commands::Status)));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.pretty);
    }

    #[test]
    fn test_timeout_classification() {
        let err = anyhow::Error::new(CopilotError::AuthTimedOut(Duration::from_secs(300)));
        let (code, message) = classify(&err);
        assert_eq!(code as i32, 4);
        assert_eq!(
            message,
            "Authentication process timed out. Please try again later."
        );
    }

    #[test]
    fn test_api_error_classification() {
        let err = anyhow::Error::new(CopilotError::Api {
            context: "failed to get completion",
            status: 401,
            body: "bad token".to_string(),
        });
        let (code, message) = classify(&err);
        assert_eq!(code as i32, 3);
        assert!(message.contains("bad token"));
    }
}
