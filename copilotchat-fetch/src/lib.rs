// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # copilotchat Fetch
//!
//! Host APIs used by the Copilot client:
//!
//! - [`host::keychain`] - OS credential store behind the [`KeychainApi`] trait
//! - [`host::http`] - HTTP client that stamps every request with the
//!   Copilot client headers

pub mod error;
pub mod host;

// Errors
pub use error::{HttpError, KeychainError};

// Host APIs
pub use host::{
    http::{CopilotHeaders, HttpClient},
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain},
};
