// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `copilotchat` Core
//!
//! Core types and models shared by the `copilotchat` crates.
//!
//! ## Key Types
//!
//! ### Credentials
//! - [`ApiToken`] - Short-lived Copilot bearer credential
//! - [`CacheRecord`] - Persisted credential blob stored in the OS keyring
//! - [`AuthState`] - Where a client stands in the authentication lifecycle
//!
//! ### Chat
//! - [`ChatRequest`] - Chat completion request body
//! - [`ChatResponse`] - Chat completion response body
//! - [`ChatMessage`], [`Role`], [`Model`]

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Credential types
    ApiToken,
    AuthState,
    CacheRecord,
    // Chat types
    ApiErrorBody,
    ChatMessage,
    ChatRequest,
    ChatResponse,
    ContentFilterResult,
    ContentFilterResults,
    Model,
    PromptFilterResult,
    ResponseChoice,
    ResponseMessage,
    Role,
    Usage,
};
