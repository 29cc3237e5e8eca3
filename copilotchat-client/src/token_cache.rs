//! Credential cache in the OS keyring.
//!
//! Both tokens live in one keyring entry as a JSON [`CacheRecord`] under a
//! fixed (service, account) pair.

use std::sync::Arc;

use chrono::Utc;
use copilotchat_core::{ApiToken, CacheRecord};
use copilotchat_fetch::{KeychainApi, KeychainError};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::CopilotError;

/// Credentials read from the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedCredentials {
    /// The OAuth token, if one was stored.
    pub oauth_token: Option<String>,
    /// The API token, only if it has not expired.
    pub api_token: Option<ApiToken>,
}

impl CachedCredentials {
    /// Returns true if nothing usable was cached.
    pub fn is_empty(&self) -> bool {
        self.oauth_token.is_none() && self.api_token.is_none()
    }
}

/// Keyring-backed token cache.
#[derive(Clone)]
pub struct TokenCache {
    keychain: Arc<dyn KeychainApi>,
    service: String,
    account: String,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("service", &self.service)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    /// Creates a cache over `keychain` using the configured entry.
    pub fn new(keychain: Arc<dyn KeychainApi>, config: &ClientConfig) -> Self {
        Self {
            keychain,
            service: config.keyring_service.clone(),
            account: config.keyring_account.clone(),
        }
    }

    /// Loads cached credentials.
    ///
    /// A missing entry yields empty credentials. The OAuth token is always
    /// returned when present; the API token only while unexpired.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring fails for any reason other than a
    /// missing entry, or the stored JSON is malformed.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<CachedCredentials, CopilotError> {
        let json = match self.keychain.get(&self.service, &self.account).await {
            Ok(Some(json)) => json,
            Ok(None) | Err(KeychainError::NotFound { .. }) => {
                debug!("No cached credentials");
                return Ok(CachedCredentials::default());
            }
            Err(e) => return Err(e.into()),
        };

        let record = CacheRecord::from_json(&json).map_err(CopilotError::Cache)?;
        let credentials = CachedCredentials {
            oauth_token: record.oauth_token().map(str::to_string),
            api_token: record.valid_api_token_at(Utc::now()),
        };

        debug!(
            has_oauth_token = credentials.oauth_token.is_some(),
            has_valid_api_token = credentials.api_token.is_some(),
            "Loaded cached credentials"
        );
        Ok(credentials)
    }

    /// Saves both tokens, overwriting any existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the keyring write fails.
    #[instrument(skip(self, oauth_token, api_token))]
    pub async fn save(
        &self,
        oauth_token: &str,
        api_token: Option<&ApiToken>,
    ) -> Result<(), CopilotError> {
        let json = CacheRecord::new(oauth_token, api_token)
            .to_json()
            .map_err(CopilotError::Cache)?;

        self.keychain.set(&self.service, &self.account, &json).await?;
        debug!("Credentials saved to keyring");
        Ok(())
    }

    /// Deletes the entry. Succeeds if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring delete fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CopilotError> {
        match self.keychain.delete(&self.service, &self.account).await {
            Ok(()) | Err(KeychainError::NotFound { .. }) => {
                debug!("Cached credentials cleared");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use copilotchat_fetch::MemoryKeychain;

    fn cache_with(keychain: Arc<MemoryKeychain>) -> TokenCache {
        TokenCache::new(keychain, &ClientConfig::default())
    }

    #[tokio::test]
    async fn test_load_missing_entry() {
        let cache = cache_with(Arc::new(MemoryKeychain::new()));
        let loaded = cache.load().await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let keychain = Arc::new(MemoryKeychain::new());
        let cache = cache_with(keychain.clone());
        let token = ApiToken::new("tid=abc", Utc::now() + Duration::minutes(25));

        cache.save("gho_abc", Some(&token)).await.unwrap();
        assert!(keychain.entry("lazygit", "github-copilot").is_some());

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.oauth_token.as_deref(), Some("gho_abc"));
        assert_eq!(loaded.api_token, Some(token));
    }

    #[tokio::test]
    async fn test_expired_api_token_dropped() {
        let keychain = Arc::new(MemoryKeychain::new());
        let cache = cache_with(keychain);
        let token = ApiToken::new("tid=old", Utc::now() - Duration::seconds(1));

        cache.save("gho_abc", Some(&token)).await.unwrap();
        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.oauth_token.as_deref(), Some("gho_abc"));
        assert!(loaded.api_token.is_none());
    }

    #[tokio::test]
    async fn test_empty_record_is_nothing_cached() {
        let keychain = Arc::new(MemoryKeychain::with_entry(
            "lazygit",
            "github-copilot",
            r#"{"oauth_token":"","api_key":""}"#,
        ));
        let loaded = cache_with(keychain).load().await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_record_is_error() {
        let keychain = Arc::new(MemoryKeychain::with_entry(
            "lazygit",
            "github-copilot",
            "{not json",
        ));
        let result = cache_with(keychain).load().await;
        assert!(matches!(result, Err(CopilotError::Cache(_))));
    }

    #[tokio::test]
    async fn test_clear() {
        let keychain = Arc::new(MemoryKeychain::new());
        let cache = cache_with(keychain.clone());

        cache.save("gho_abc", None).await.unwrap();
        cache.clear().await.unwrap();
        cache.clear().await.unwrap();
        assert!(keychain.entry("lazygit", "github-copilot").is_none());
    }
}
