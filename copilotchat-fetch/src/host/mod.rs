//! Host APIs for copilotchat.
//!
//! - [`keychain`] - Secure credential storage (system keychain)
//! - [`http`] - HTTP client carrying the fixed Copilot headers

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::HttpClient;
pub use keychain::{KeychainApi, MemoryKeychain, SystemKeychain};
