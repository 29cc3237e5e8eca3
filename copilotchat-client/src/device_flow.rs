//! GitHub Device Flow OAuth implementation.
//!
//! This module implements the OAuth 2.0 Device Authorization Grant
//! (RFC 8628) for GitHub, which Copilot uses to obtain its long-lived
//! OAuth token.
//!
//! ## Flow
//!
//! 1. **Request**: POST to `/login/device/code` to get device code and user code
//! 2. **Display**: Show the user the verification URL and user code
//! 3. **Poll**: POST to `/login/oauth/access_token` every interval until the
//!    user authorizes or the time ceiling is hit
//!
//! Every poll outcome other than an access token keeps the loop going; only
//! the ceiling ends it. Transport and decode failures abort immediately.

use std::fmt;
use std::time::Duration;

use copilotchat_fetch::HttpClient;
use serde::Deserialize;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::CopilotError;
use crate::prompt::DeviceCodePrompt;

/// OAuth scope required for Copilot.
const COPILOT_SCOPE: &str = "copilot";

/// Device flow grant type.
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

// ============================================================================
// Types
// ============================================================================

/// Device code response. Lives only for the duration of one flow.
#[derive(Clone, Deserialize)]
pub struct DeviceCodeSession {
    /// The device verification code (secret, sent back when polling).
    pub device_code: String,

    /// The user verification code to display.
    pub user_code: String,

    /// The verification URL.
    pub verification_uri: String,

    /// Seconds until the codes expire.
    #[serde(default)]
    pub expires_in: u64,

    /// Minimum polling interval in seconds advised by the server.
    #[serde(default)]
    pub interval: u64,
}

impl fmt::Debug for DeviceCodeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCodeSession")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Raw access token poll response.
#[derive(Deserialize)]
pub struct DeviceTokenResponse {
    /// The OAuth access token, empty until authorized.
    #[serde(default)]
    pub access_token: String,

    /// Token type (usually "bearer").
    #[serde(default)]
    pub token_type: String,

    /// Scopes granted.
    #[serde(default)]
    pub scope: String,

    /// OAuth error code, e.g. `authorization_pending`.
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable error description.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl DeviceTokenResponse {
    /// Classifies the response.
    pub fn into_result(self) -> DevicePollResult {
        match self.error.as_deref() {
            Some("authorization_pending") => DevicePollResult::Pending,
            Some("slow_down") => DevicePollResult::SlowDown,
            Some("expired_token") => DevicePollResult::Expired,
            Some("access_denied") => DevicePollResult::AccessDenied,
            Some(other) if !other.is_empty() => DevicePollResult::Other(other.to_string()),
            _ if !self.access_token.is_empty() => DevicePollResult::Authorized(self.access_token),
            _ => DevicePollResult::Other("response carried neither token nor error".to_string()),
        }
    }
}

/// Outcome of a single poll.
#[derive(Clone, PartialEq, Eq)]
pub enum DevicePollResult {
    /// User authorized - here's the OAuth token.
    Authorized(String),

    /// User has not yet authorized.
    Pending,

    /// Polling too fast.
    SlowDown,

    /// The device code expired.
    Expired,

    /// The user denied access.
    AccessDenied,

    /// Any other error code.
    Other(String),
}

impl fmt::Debug for DevicePollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePollResult::Authorized(_) => f.write_str("Authorized(<redacted>)"),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for DevicePollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePollResult::Authorized(_) => f.write_str("authorized"),
            DevicePollResult::Pending => f.write_str("authorization_pending"),
            DevicePollResult::SlowDown => f.write_str("slow_down"),
            DevicePollResult::Expired => f.write_str("expired_token"),
            DevicePollResult::AccessDenied => f.write_str("access_denied"),
            DevicePollResult::Other(error) => f.write_str(error),
        }
    }
}

/// How often and for how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep before each poll.
    pub interval: Duration,

    /// Ceiling on the whole flow, measured from the first poll sleep.
    pub max_duration: Duration,

    /// Stretch `interval` to the server-advised interval when that is longer.
    pub honor_server_interval: bool,
}

impl PollPolicy {
    /// Creates a policy that ignores the server interval.
    pub fn new(interval: Duration, max_duration: Duration) -> Self {
        Self {
            interval,
            max_duration,
            honor_server_interval: false,
        }
    }

    /// Effective sleep between polls for a session.
    pub fn interval_for(&self, session: &DeviceCodeSession) -> Duration {
        if self.honor_server_interval {
            self.interval.max(Duration::from_secs(session.interval))
        } else {
            self.interval
        }
    }
}

// ============================================================================
// Device Flow
// ============================================================================

/// GitHub Device Flow OAuth client for Copilot.
#[derive(Debug, Clone)]
pub struct DeviceFlow {
    http: HttpClient,
    client_id: String,
    device_code_url: String,
    access_token_url: String,
}

impl DeviceFlow {
    /// Creates a device flow handler.
    pub fn new(http: HttpClient, config: &ClientConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            device_code_url: config.device_code_url.clone(),
            access_token_url: config.access_token_url.clone(),
        }
    }

    /// Requests a device code and user code.
    #[instrument(skip(self))]
    pub async fn request_code(&self) -> Result<DeviceCodeSession, CopilotError> {
        debug!("Requesting device code");

        let form = [
            ("client_id", self.client_id.as_str()),
            ("scope", COPILOT_SCOPE),
        ];
        let response = self
            .http
            .post_form(&self.device_code_url, &form)
            .await
            .map_err(|e| CopilotError::http("failed to get device code", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CopilotError::http("failed to read device code response", e))?;

        if !status.is_success() {
            return Err(CopilotError::Api {
                context: "failed to get device code",
                status: status.as_u16(),
                body,
            });
        }

        let session: DeviceCodeSession = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse device code response");
            CopilotError::decode("failed to decode device code response", e)
        })?;

        debug!(
            user_code = %session.user_code,
            verification_uri = %session.verification_uri,
            expires_in = session.expires_in,
            interval = session.interval,
            "Device code issued"
        );

        Ok(session)
    }

    /// Polls once for authorization.
    #[instrument(skip(self, device_code))]
    pub async fn poll(&self, device_code: &str) -> Result<DevicePollResult, CopilotError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("device_code", device_code),
            ("grant_type", DEVICE_GRANT_TYPE),
        ];
        let response = self
            .http
            .post_form(&self.access_token_url, &form)
            .await
            .map_err(|e| CopilotError::http("failed to get access token", e))?;

        let body = response
            .text()
            .await
            .map_err(|e| CopilotError::http("failed to read access token response", e))?;

        let token_response: DeviceTokenResponse = serde_json::from_str(&body)
            .map_err(|e| CopilotError::decode("failed to decode token response", e))?;

        if let Some(description) = token_response.error_description.as_deref() {
            debug!(description = %description, "Poll returned error description");
        }

        let result = token_response.into_result();
        debug!(result = %result, "Poll result");
        Ok(result)
    }

    /// Runs the whole flow: request a code, show it, poll until authorized.
    ///
    /// Returns the OAuth token. Fails with [`CopilotError::AuthTimedOut`]
    /// once `policy.max_duration` has elapsed without authorization.
    #[instrument(skip(self, policy, prompt))]
    pub async fn run(
        &self,
        policy: &PollPolicy,
        prompt: &dyn DeviceCodePrompt,
    ) -> Result<String, CopilotError> {
        let session = self.request_code().await?;
        prompt.show_code(&session);

        let interval = policy.interval_for(&session);
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if started.elapsed() >= policy.max_duration {
                warn!(attempts, "Device flow timed out");
                return Err(CopilotError::AuthTimedOut(policy.max_duration));
            }

            sleep(interval).await;
            attempts += 1;
            prompt.polling(attempts);

            match self.poll(&session.device_code).await? {
                DevicePollResult::Authorized(token) => {
                    info!(attempts, "Device flow authorized");
                    return Ok(token);
                }
                DevicePollResult::Pending => {
                    prompt.not_yet(attempts, &DevicePollResult::Pending);
                }
                other => {
                    warn!(attempts, error = %other, "Device flow poll returned an error");
                    prompt.not_yet(attempts, &other);
                    if started.elapsed() >= policy.max_duration {
                        return Err(CopilotError::AuthTimedOut(policy.max_duration));
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
