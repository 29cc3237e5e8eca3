//! Client configuration.
//!
//! Every field has a default matching the stock Copilot setup, so an
//! absent or partial config file is fine. The file is JSON:
//!
//! ```json
//! {
//!   "poll_interval_secs": 10,
//!   "keyring_service": "my-tool"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use copilotchat_fetch::CopilotHeaders;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::device_flow::PollPolicy;
use crate::error::CopilotError;

// ============================================================================
// Defaults
// ============================================================================

/// GitHub Copilot's OAuth client ID.
pub const DEFAULT_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";

/// GitHub's OAuth device code endpoint.
pub const DEFAULT_DEVICE_CODE_URL: &str = "https://github.com/login/device/code";

/// GitHub's OAuth access token endpoint.
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Copilot API token issuance endpoint.
pub const DEFAULT_API_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";

/// Copilot chat completion endpoint.
pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.githubcopilot.com/chat/completions";

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_device_code_url() -> String {
    DEFAULT_DEVICE_CODE_URL.to_string()
}

fn default_access_token_url() -> String {
    DEFAULT_ACCESS_TOKEN_URL.to_string()
}

fn default_api_token_url() -> String {
    DEFAULT_API_TOKEN_URL.to_string()
}

fn default_chat_completions_url() -> String {
    DEFAULT_CHAT_COMPLETIONS_URL.to_string()
}

fn default_editor_version() -> String {
    "Lazygit/0.44.0".to_string()
}

fn default_integration_id() -> String {
    "vscode-chat".to_string()
}

fn default_keyring_service() -> String {
    "lazygit".to_string()
}

fn default_keyring_account() -> String {
    "github-copilot".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_max_auth_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    60
}

// ============================================================================
// Config
// ============================================================================

/// Copilot client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// OAuth application client ID.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Device code endpoint.
    #[serde(default = "default_device_code_url")]
    pub device_code_url: String,

    /// OAuth access token endpoint (device flow polling).
    #[serde(default = "default_access_token_url")]
    pub access_token_url: String,

    /// API token exchange endpoint.
    #[serde(default = "default_api_token_url")]
    pub api_token_url: String,

    /// Chat completion endpoint.
    #[serde(default = "default_chat_completions_url")]
    pub chat_completions_url: String,

    /// `Editor-Version` header.
    #[serde(default = "default_editor_version")]
    pub editor_version: String,

    /// `Copilot-Integration-Id` header.
    #[serde(default = "default_integration_id")]
    pub integration_id: String,

    /// Keyring service name of the credential entry.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring account name of the credential entry.
    #[serde(default = "default_keyring_account")]
    pub keyring_account: String,

    /// Seconds between device flow polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Use the server's `interval` when it is longer than `poll_interval_secs`.
    #[serde(default)]
    pub honor_server_interval: bool,

    /// Ceiling on the whole device flow, in seconds.
    #[serde(default = "default_max_auth_secs")]
    pub max_auth_secs: u64,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            device_code_url: default_device_code_url(),
            access_token_url: default_access_token_url(),
            api_token_url: default_api_token_url(),
            chat_completions_url: default_chat_completions_url(),
            editor_version: default_editor_version(),
            integration_id: default_integration_id(),
            keyring_service: default_keyring_service(),
            keyring_account: default_keyring_account(),
            poll_interval_secs: default_poll_interval_secs(),
            honor_server_interval: false,
            max_auth_secs: default_max_auth_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("copilotchat")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, CopilotError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self, CopilotError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&content)
            .map_err(|e| CopilotError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Checks URLs and intervals.
    ///
    /// # Errors
    ///
    /// Returns [`CopilotError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), CopilotError> {
        let urls = [
            ("device_code_url", &self.device_code_url),
            ("access_token_url", &self.access_token_url),
            ("api_token_url", &self.api_token_url),
            ("chat_completions_url", &self.chat_completions_url),
        ];
        for (name, value) in urls {
            Url::parse(value).map_err(|e| CopilotError::Config(format!("{name}: {e}")))?;
        }

        if self.client_id.is_empty() {
            return Err(CopilotError::Config("client_id must not be empty".into()));
        }
        if self.keyring_service.is_empty() || self.keyring_account.is_empty() {
            return Err(CopilotError::Config(
                "keyring_service and keyring_account must not be empty".into(),
            ));
        }
        if self.poll_interval_secs == 0 || self.max_auth_secs == 0 {
            return Err(CopilotError::Config(
                "poll_interval_secs and max_auth_secs must be positive".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CopilotError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Headers stamped on every request.
    pub fn headers(&self) -> CopilotHeaders {
        CopilotHeaders {
            editor_version: self.editor_version.clone(),
            integration_id: self.integration_id.clone(),
        }
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Device flow polling policy.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_duration: Duration::from_secs(self.max_auth_secs),
            honor_server_interval: self.honor_server_interval,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.client_id, "Iv1.b507a08c87ecfe98");
        assert_eq!(config.keyring_service, "lazygit");
        assert_eq!(config.keyring_account, "github-copilot");
        assert_eq!(config.editor_version, "Lazygit/0.44.0");
        assert_eq!(config.poll_policy().interval, Duration::from_secs(30));
        assert_eq!(config.poll_policy().max_duration, Duration::from_secs(300));
        assert!(!config.poll_policy().honor_server_interval);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_path() {
        let path = ClientConfig::default_path();
        assert!(path.ends_with("copilotchat/config.json"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_secs": 5, "keyring_service": "other"}}"#).unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.keyring_service, "other");
        assert_eq!(config.max_auth_secs, 300);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ClientConfig::load_from(file.path()),
            Err(CopilotError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig {
            api_token_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            poll_interval_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
