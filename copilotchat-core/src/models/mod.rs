//! Domain models for copilotchat.
//!
//! ## Submodules
//!
//! - [`token`] - Credential types (ApiToken, CacheRecord, AuthState)
//! - [`chat`] - Chat completion wire types (ChatRequest, ChatResponse, Model)

mod chat;
mod token;

pub use chat::{
    ApiErrorBody, ChatMessage, ChatRequest, ChatResponse, ContentFilterResult,
    ContentFilterResults, Model, PromptFilterResult, ResponseChoice, ResponseMessage, Role, Usage,
};
pub use token::{ApiToken, AuthState, CacheRecord};

#[cfg(test)]
mod serde_tests;
