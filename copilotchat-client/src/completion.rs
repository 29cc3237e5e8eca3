//! Chat completion requests.

use copilotchat_core::{ChatRequest, ChatResponse};
use copilotchat_fetch::HttpClient;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::CopilotError;

/// Sends chat completion requests with a bearer API key.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: HttpClient,
    url: String,
}

impl CompletionClient {
    /// Creates a new completion client.
    pub fn new(http: HttpClient, config: &ClientConfig) -> Self {
        Self {
            http,
            url: config.chat_completions_url.clone(),
        }
    }

    /// Performs one request/response round trip.
    ///
    /// Anything but HTTP 200 fails with the raw body in the error. A 200
    /// response carrying an `error` object or no choices fails as well.
    #[instrument(skip(self, api_key, request), fields(model = %request.model, messages = request.messages.len()))]
    pub async fn send(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, CopilotError> {
        let response = self
            .http
            .post_json_with_auth(&self.url, &format!("Bearer {api_key}"), request)
            .await
            .map_err(|e| CopilotError::http("failed to send completion request", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CopilotError::http("failed to read completion response", e))?;

        if status != StatusCode::OK {
            warn!(status = %status, "Completion request failed");
            return Err(CopilotError::Api {
                context: "failed to get completion",
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CopilotError::decode("failed to decode completion response", e))?;

        if let Some(error) = &chat_response.error {
            return Err(CopilotError::ApiError(error.message.clone()));
        }
        if chat_response.choices.is_empty() {
            return Err(CopilotError::EmptyChoices);
        }

        debug!(
            id = %chat_response.id,
            choices = chat_response.choices.len(),
            total_tokens = chat_response.usage.total_tokens,
            "Completion received"
        );
        Ok(chat_response)
    }
}
