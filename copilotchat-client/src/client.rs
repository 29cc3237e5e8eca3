//! The Copilot chat client.
//!
//! [`CopilotChat`] owns the in-memory credentials and serializes every
//! authentication and completion behind one async mutex. The decision
//! "is the API token valid, can it be refreshed, or is a human needed"
//! is made while holding that lock, so callers queued behind an in-flight
//! authentication reuse its result instead of starting another flow.
//!
//! ## Usage
//!
//! ```ignore
//! let chat = CopilotChat::with_system_keychain(ClientConfig::load()?)?
//!     .with_prompt(Arc::new(ConsolePrompt));
//!
//! chat.authenticate().await?;
//! let answer = chat
//!     .chat(ChatRequest::from_prompt(Model::Gpt4o, "Describe Lazygit"))
//!     .await?;
//! ```

use std::sync::Arc;

use chrono::Utc;
use copilotchat_core::{ApiToken, AuthState, ChatRequest, ChatResponse};
use copilotchat_fetch::{HttpClient, KeychainApi, SystemKeychain};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::completion::CompletionClient;
use crate::config::ClientConfig;
use crate::device_flow::{DeviceFlow, PollPolicy};
use crate::error::CopilotError;
use crate::prompt::{ConsolePrompt, DeviceCodePrompt};
use crate::token_cache::TokenCache;
use crate::token_exchange::TokenExchange;

/// Credentials held in memory.
#[derive(Debug, Default)]
struct AuthSession {
    oauth_token: Option<String>,
    api_token: Option<ApiToken>,
    cache_loaded: bool,
}

impl AuthSession {
    fn state(&self) -> AuthState {
        AuthState::from_credentials(
            self.oauth_token.as_deref(),
            self.api_token.as_ref(),
            Utc::now(),
        )
    }

    fn valid_api_key(&self) -> Option<String> {
        self.api_token
            .as_ref()
            .filter(|t| t.is_valid())
            .map(|t| t.api_key.clone())
    }
}

/// GitHub Copilot chat client.
pub struct CopilotChat {
    cache: TokenCache,
    device_flow: DeviceFlow,
    exchange: TokenExchange,
    completions: CompletionClient,
    policy: PollPolicy,
    prompt: Arc<dyn DeviceCodePrompt>,
    session: Mutex<AuthSession>,
}

impl std::fmt::Debug for CopilotChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopilotChat")
            .field("cache", &self.cache)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CopilotChat {
    /// Creates a client over the given keychain.
    ///
    /// No I/O happens here; cached credentials are read on first use or by
    /// [`CopilotChat::restore`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig, keychain: Arc<dyn KeychainApi>) -> Result<Self, CopilotError> {
        config.validate()?;

        let http = HttpClient::new(&config.headers(), config.request_timeout())
            .map_err(|e| CopilotError::http("failed to create HTTP client", e))?;

        Ok(Self {
            cache: TokenCache::new(keychain, &config),
            device_flow: DeviceFlow::new(http.clone(), &config),
            exchange: TokenExchange::new(http.clone(), &config),
            completions: CompletionClient::new(http, &config),
            policy: config.poll_policy(),
            prompt: Arc::new(ConsolePrompt),
            session: Mutex::new(AuthSession::default()),
        })
    }

    /// Creates a client over the OS keychain.
    ///
    /// # Errors
    ///
    /// See [`CopilotChat::new`].
    pub fn with_system_keychain(config: ClientConfig) -> Result<Self, CopilotError> {
        Self::new(config, Arc::new(SystemKeychain::new()))
    }

    /// Replaces the device flow prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn DeviceCodePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Replaces the polling policy from the configuration.
    #[must_use]
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reads cached credentials into memory without any network call.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring or the stored record is unreadable.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<AuthState, CopilotError> {
        let mut session = self.session.lock().await;
        self.load_cache(&mut session).await?;
        Ok(session.state())
    }

    /// Current state of the credentials.
    ///
    /// Reads the keyring on first use. Waits for any in-flight
    /// authentication or completion to finish.
    pub async fn auth_state(&self) -> AuthState {
        let mut session = self.session.lock().await;
        self.load_cache_once(&mut session).await;
        session.state()
    }

    /// Returns true if a valid API token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.auth_state().await.is_authenticated()
    }

    /// Makes sure a valid API token is held.
    ///
    /// In order: keep a valid in-memory token, use a valid cached token,
    /// exchange a known OAuth token, or run the interactive device flow.
    /// Dropping the future cancels the flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the device flow or token exchange fails, including
    /// [`CopilotError::AuthTimedOut`].
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<AuthState, CopilotError> {
        let mut session = self.session.lock().await;
        self.ensure_authenticated(&mut session).await?;
        Ok(session.state())
    }

    /// Sends a completion with the current API token, never authenticating.
    ///
    /// A token cached in the keyring counts; it is read on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CopilotError::NotAuthenticated`] without a valid API token,
    /// otherwise any completion error.
    #[instrument(skip(self, request))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, CopilotError> {
        let mut session = self.session.lock().await;
        self.load_cache_once(&mut session).await;
        let api_key = session
            .valid_api_key()
            .ok_or_else(|| CopilotError::NotAuthenticated(session.state()))?;

        self.completions.send(&api_key, request).await
    }

    /// Authenticates if needed, then returns the first choice's content.
    ///
    /// Holds the client lock for the whole call, so this may wait on (or
    /// itself run) an interactive device flow.
    ///
    /// # Errors
    ///
    /// Returns authentication errors or any completion error.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat(&self, request: ChatRequest) -> Result<String, CopilotError> {
        let mut session = self.session.lock().await;

        if session.valid_api_key().is_none() {
            info!("Not authenticated with Copilot, authenticating");
            self.ensure_authenticated(&mut session).await?;
        }

        let api_key = session
            .valid_api_key()
            .ok_or_else(|| CopilotError::NotAuthenticated(session.state()))?;

        let response = self.completions.send(&api_key, &request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(CopilotError::EmptyChoices)
    }

    /// Forgets all credentials, in memory and in the keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring entry cannot be deleted.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), CopilotError> {
        let mut session = self.session.lock().await;
        self.cache.clear().await?;
        *session = AuthSession {
            cache_loaded: true,
            ..AuthSession::default()
        };
        info!("Logged out of Copilot");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals (caller holds the session lock)
    // ------------------------------------------------------------------------

    async fn load_cache(&self, session: &mut AuthSession) -> Result<(), CopilotError> {
        let cached = self.cache.load().await?;
        session.cache_loaded = true;

        if let Some(oauth_token) = cached.oauth_token {
            session.oauth_token = Some(oauth_token);
        }
        if let Some(api_token) = cached.api_token {
            debug!(expires_at = %api_token.expires_at, "Loaded valid API token from keyring");
            session.api_token = Some(api_token);
        }
        Ok(())
    }

    /// Loads the keyring on first use. A failed read only warns and is not
    /// retried.
    async fn load_cache_once(&self, session: &mut AuthSession) {
        if session.cache_loaded {
            return;
        }
        if let Err(e) = self.load_cache(session).await {
            warn!(error = %e, "Failed to load credentials from keyring");
            session.cache_loaded = true;
        }
    }

    async fn ensure_authenticated(&self, session: &mut AuthSession) -> Result<(), CopilotError> {
        if session.valid_api_key().is_some() {
            return Ok(());
        }

        self.load_cache_once(session).await;
        if session.valid_api_key().is_some() {
            return Ok(());
        }

        if let Some(oauth_token) = session.oauth_token.clone() {
            info!("OAuth token found, fetching new API token");
            match self.exchange.exchange(&oauth_token).await {
                Ok(api_token) => {
                    session.api_token = Some(api_token);
                    self.persist(session).await;
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Stored OAuth token could not be exchanged, starting device flow");
                    session.oauth_token = None;
                }
            }
        }

        let oauth_token = self.device_flow.run(&self.policy, self.prompt.as_ref()).await?;
        session.oauth_token = Some(oauth_token.clone());

        let api_token = self.exchange.exchange(&oauth_token).await?;
        session.api_token = Some(api_token);
        self.prompt.authorized();

        self.persist(session).await;
        Ok(())
    }

    /// Writes the session to the keyring. Failures only warn: the in-memory
    /// credentials stay usable for this process.
    async fn persist(&self, session: &AuthSession) {
        let Some(oauth_token) = session.oauth_token.as_deref() else {
            return;
        };
        if let Err(e) = self.cache.save(oauth_token, session.api_token.as_ref()).await {
            warn!(error = %e, "Failed to save credentials to keyring");
        }
    }
}
