//! Credential types.
//!
//! Two credentials are involved in talking to Copilot:
//!
//! 1. **OAuth token** - long-lived GitHub token with the `copilot` scope,
//!    obtained once through the device flow. Plain `String`, no expiry.
//! 2. **API token** - short-lived bearer credential for the completion
//!    endpoint, exchanged from the OAuth token whenever absent or expired.
//!
//! Both are persisted together as a [`CacheRecord`].

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// API Token
// ============================================================================

/// Short-lived Copilot API bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken {
    /// The bearer credential.
    pub api_key: String,
    /// When the credential stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl ApiToken {
    /// Creates a new API token.
    pub fn new(api_key: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            api_key: api_key.into(),
            expires_at,
        }
    }

    /// Creates an API token from a Unix epoch expiry (seconds).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidData`] if the timestamp is out of range.
    pub fn from_unix(api_key: impl Into<String>, expires_at: i64) -> Result<Self, CoreError> {
        let expires_at = Utc
            .timestamp_opt(expires_at, 0)
            .single()
            .ok_or_else(|| CoreError::InvalidData(format!("invalid expiry: {expires_at}")))?;
        Ok(Self::new(api_key, expires_at))
    }

    /// Returns true if the token expires strictly after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Returns true if the token has not expired yet.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiToken")
            .field("api_key", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// Cache Record
// ============================================================================

/// Credential blob persisted in the OS keyring.
///
/// Serialized as `{"oauth_token": ..., "api_key": ..., "expires_at": ...}`.
/// A record with both tokens empty means "nothing cached".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Long-lived GitHub OAuth token.
    #[serde(default)]
    pub oauth_token: String,

    /// Short-lived Copilot API key.
    #[serde(default)]
    pub api_key: String,

    /// Expiry of `api_key`. Required whenever `api_key` is non-empty.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    /// Builds a record from the in-memory credentials.
    pub fn new(oauth_token: impl Into<String>, api_token: Option<&ApiToken>) -> Self {
        Self {
            oauth_token: oauth_token.into(),
            api_key: api_token.map(|t| t.api_key.clone()).unwrap_or_default(),
            expires_at: api_token.map(|t| t.expires_at),
        }
    }

    /// Returns true if the record holds no credentials at all.
    pub fn is_empty(&self) -> bool {
        self.oauth_token.is_empty() && self.api_key.is_empty()
    }

    /// Returns the OAuth token if one is stored.
    pub fn oauth_token(&self) -> Option<&str> {
        Some(self.oauth_token.as_str()).filter(|t| !t.is_empty())
    }

    /// Returns the stored API token regardless of expiry.
    ///
    /// A key without an expiry is treated as absent.
    pub fn api_token(&self) -> Option<ApiToken> {
        if self.api_key.is_empty() {
            return None;
        }
        self.expires_at
            .map(|expires_at| ApiToken::new(self.api_key.clone(), expires_at))
    }

    /// Returns the stored API token only if it is still valid at `now`.
    pub fn valid_api_token_at(&self, now: DateTime<Utc>) -> Option<ApiToken> {
        self.api_token().filter(|t| t.is_valid_at(now))
    }

    /// Serializes the record to the JSON stored in the keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a record from keyring JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Debug for CacheRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRecord")
            .field("has_oauth_token", &!self.oauth_token.is_empty())
            .field("has_api_key", &!self.api_key.is_empty())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// Auth State
// ============================================================================

/// Authentication state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum AuthState {
    /// A valid API token is held.
    Authenticated {
        /// When the API token expires.
        expires_at: DateTime<Utc>,
    },

    /// No usable credentials; the interactive device flow is required.
    NeedsAuthorization,

    /// The API token is absent or expired but an OAuth token is held,
    /// so a token exchange (no human interaction) is enough.
    Expired,
}

impl AuthState {
    /// Derives the state from the credentials a client currently holds.
    pub fn from_credentials(
        oauth_token: Option<&str>,
        api_token: Option<&ApiToken>,
        now: DateTime<Utc>,
    ) -> Self {
        match api_token {
            Some(token) if token.is_valid_at(now) => AuthState::Authenticated {
                expires_at: token.expires_at,
            },
            _ if oauth_token.is_some_and(|t| !t.is_empty()) => AuthState::Expired,
            _ => AuthState::NeedsAuthorization,
        }
    }

    /// Returns true for [`AuthState::Authenticated`].
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Authenticated { expires_at } => {
                write!(f, "authenticated (API token expires {})", expires_at.to_rfc3339())
            }
            AuthState::NeedsAuthorization => write!(f, "needs authorization"),
            AuthState::Expired => write!(f, "API token expired"),
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

    #[test]
    fn test_api_token_validity_is_strict() {
        let now = Utc::now();
        let token = ApiToken::new("key", now);
        assert!(!token.is_valid_at(now));
        assert!(token.is_valid_at(now - Duration::seconds(1)));
        assert!(!token.is_valid_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_api_token_from_unix() {
        let token = ApiToken::from_unix("key", 1_700_000_000).unwrap();
        assert_eq!(token.expires_at.timestamp(), 1_700_000_000);
        assert!(ApiToken::from_unix("key", i64::MAX).is_err());
    }

    #[test]
    fn test_api_token_debug_redacts_key() {
        let token = ApiToken::new("tid=secret", Utc::now());
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_cache_record_empty() {
        assert!(CacheRecord::default().is_empty());
        assert!(CacheRecord::default().oauth_token().is_none());
        assert!(CacheRecord::default().api_token().is_none());
    }

    #[test]
    fn test_cache_record_key_without_expiry_is_absent() {
        let record = CacheRecord {
            oauth_token: String::new(),
            api_key: "key".to_string(),
            expires_at: None,
        };
        assert!(!record.is_empty());
        assert!(record.api_token().is_none());
    }

    #[test]
    fn test_cache_record_valid_api_token() {
        let now = Utc::now();
        let token = ApiToken::new("key", now + Duration::minutes(10));
        let record = CacheRecord::new("gho_x", Some(&token));

        assert_eq!(record.oauth_token(), Some("gho_x"));
        assert_eq!(record.valid_api_token_at(now), Some(token.clone()));
        assert_eq!(record.valid_api_token_at(now + Duration::minutes(11)), None);
        assert_eq!(record.api_token(), Some(token));
    }

    #[test]
    fn test_auth_state_from_credentials() {
        let now = Utc::now();
        let valid = ApiToken::new("key", now + Duration::minutes(5));
        let expired = ApiToken::new("key", now - Duration::minutes(5));

        assert_eq!(
            AuthState::from_credentials(None, Some(&valid), now),
            AuthState::Authenticated {
                expires_at: valid.expires_at
            }
        );
        assert_eq!(
            AuthState::from_credentials(Some("gho"), Some(&expired), now),
            AuthState::Expired
        );
        assert_eq!(
            AuthState::from_credentials(Some("gho"), None, now),
            AuthState::Expired
        );
        assert_eq!(
            AuthState::from_credentials(Some(""), None, now),
            AuthState::NeedsAuthorization
        );
        assert_eq!(
            AuthState::from_credentials(None, Some(&expired), now),
            AuthState::NeedsAuthorization
        );
    }
}
