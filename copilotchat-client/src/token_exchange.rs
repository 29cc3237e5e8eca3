//! Copilot API token exchange.
//!
//! Trades the long-lived GitHub OAuth token for a short-lived Copilot API
//! token:
//!
//! ```text
//! GET /copilot_internal/v2/token
//! Authorization: token <oauth>
//!
//! {"token": "tid=...", "expires_at": 1735000000, "refresh_in": 1500}
//! ```

use copilotchat_core::ApiToken;
use copilotchat_fetch::HttpClient;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::CopilotError;

// ============================================================================
// Response Types
// ============================================================================

/// Response from the token endpoint.
#[derive(Deserialize)]
pub struct ApiTokenResponse {
    /// The API key.
    #[serde(default)]
    pub token: Option<String>,

    /// Expiry as Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// Seconds until the server suggests refreshing.
    #[serde(default)]
    pub refresh_in: Option<i64>,

    /// Set when the account cannot use Copilot.
    #[serde(default)]
    pub error_details: Option<TokenErrorDetails>,
}

/// Explanation attached to a refused token request.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorDetails {
    /// Help URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Message.
    #[serde(default)]
    pub message: Option<String>,

    /// Title.
    #[serde(default)]
    pub title: Option<String>,

    /// Notification id.
    #[serde(default)]
    pub notification_id: Option<String>,
}

impl TokenErrorDetails {
    fn describe(&self) -> String {
        let text = self
            .message
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("no details");
        match &self.url {
            Some(url) => format!("{text} ({url})"),
            None => text.to_string(),
        }
    }
}

impl ApiTokenResponse {
    /// Converts the response into an [`ApiToken`].
    ///
    /// # Errors
    ///
    /// Returns an error if the server attached `error_details` or a
    /// required field is missing.
    pub fn into_api_token(self) -> Result<ApiToken, CopilotError> {
        if let Some(details) = self.error_details {
            return Err(CopilotError::TokenRejected(details.describe()));
        }

        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CopilotError::InvalidResponse("API token response missing `token`".into()))?;
        let expires_at = self.expires_at.ok_or_else(|| {
            CopilotError::InvalidResponse("API token response missing `expires_at`".into())
        })?;

        ApiToken::from_unix(token, expires_at)
            .map_err(|e| CopilotError::InvalidResponse(e.to_string()))
    }
}

// ============================================================================
// Exchange Client
// ============================================================================

/// Exchanges OAuth tokens for Copilot API tokens.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    http: HttpClient,
    url: String,
}

impl TokenExchange {
    /// Creates a new exchange client.
    pub fn new(http: HttpClient, config: &ClientConfig) -> Self {
        Self {
            http,
            url: config.api_token_url.clone(),
        }
    }

    /// Exchanges `oauth_token` for a fresh API token.
    ///
    /// The token is not validated locally; an empty one is sent as-is and
    /// the server's refusal becomes the error.
    #[instrument(skip(self, oauth_token))]
    pub async fn exchange(&self, oauth_token: &str) -> Result<ApiToken, CopilotError> {
        debug!("Fetching Copilot API token");

        let response = self
            .http
            .get_with_auth(&self.url, &format!("token {oauth_token}"))
            .await
            .map_err(|e| CopilotError::http("failed to get API token", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CopilotError::http("failed to read API token response", e))?;

        let parsed = serde_json::from_str::<ApiTokenResponse>(&body);

        // Refusals carry error_details regardless of status.
        if let Ok(ApiTokenResponse {
            error_details: Some(details),
            ..
        }) = &parsed
        {
            warn!(status = %status, "API token request rejected");
            return Err(CopilotError::TokenRejected(details.describe()));
        }

        if !status.is_success() {
            warn!(status = %status, "API token request failed");
            return Err(CopilotError::Api {
                context: "failed to get API token",
                status: status.as_u16(),
                body,
            });
        }

        let parsed =
            parsed.map_err(|e| CopilotError::decode("failed to decode API token response", e))?;
        if let Some(refresh_in) = parsed.refresh_in {
            debug!(refresh_in, "Server refresh hint");
        }

        let token = parsed.into_api_token()?;
        debug!(expires_at = %token.expires_at, "Got Copilot API token");
        Ok(token)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ApiTokenResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_api_token() {
        let token = parse(r#"{"token":"tid=abc","expires_at":1900000000,"refresh_in":1500}"#)
            .into_api_token()
            .unwrap();
        assert_eq!(token.api_key, "tid=abc");
        assert_eq!(token.expires_at.timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            parse(r#"{"expires_at":1900000000}"#).into_api_token(),
            Err(CopilotError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse(r#"{"token":"tid=abc"}"#).into_api_token(),
            Err(CopilotError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_details() {
        let result = parse(
            r#"{"error_details":{"message":"No Copilot subscription","url":"https://github.com/features/copilot"}}"#,
        )
        .into_api_token();

        match result {
            Err(CopilotError::TokenRejected(text)) => {
                assert!(text.contains("No Copilot subscription"));
                assert!(text.contains("https://github.com/features/copilot"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
