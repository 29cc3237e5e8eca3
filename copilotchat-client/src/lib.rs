// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # copilotchat Client
//!
//! GitHub Copilot authentication and chat completion.
//!
//! - GitHub Device Flow OAuth for the long-lived OAuth token
//! - Exchange of the OAuth token for a short-lived API token
//! - Both tokens cached as one JSON entry in the OS keyring
//! - Chat completion with automatic (re)authentication
//!
//! ## API Endpoints
//!
//! - `POST https://github.com/login/device/code` - Request device code
//! - `POST https://github.com/login/oauth/access_token` - Poll for OAuth token
//! - `GET https://api.github.com/copilot_internal/v2/token` - API token exchange
//! - `POST https://api.githubcopilot.com/chat/completions` - Chat completion

mod client;
mod completion;
mod config;
mod device_flow;
mod error;
mod prompt;
mod token_cache;
mod token_exchange;

// Re-exports
pub use client::CopilotChat;
pub use completion::CompletionClient;
pub use config::ClientConfig;
pub use device_flow::{
    DeviceCodeSession, DeviceFlow, DevicePollResult, DeviceTokenResponse, PollPolicy,
};
pub use error::CopilotError;
pub use prompt::{ConsolePrompt, DeviceCodePrompt, SilentPrompt};
pub use token_cache::{CachedCredentials, TokenCache};
pub use token_exchange::{ApiTokenResponse, TokenErrorDetails, TokenExchange};
