//! Chat completion wire types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Role & Model
// ============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End user.
    User,
    /// Model reply.
    Assistant,
    /// System instructions.
    System,
}

/// Model served by the Copilot completion endpoint.
///
/// Unknown ids round-trip through [`Model::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Model {
    /// GPT-4o (2024-05-13).
    #[default]
    Gpt4o,
    /// GPT-4.
    Gpt4,
    /// GPT-3.5 Turbo.
    Gpt35Turbo,
    /// o1 preview (2024-09-12).
    O1Preview,
    /// o1 mini (2024-09-12).
    O1Mini,
    /// Claude 3.5 Sonnet.
    Claude35Sonnet,
    /// Any other model id.
    Custom(String),
}

impl Model {
    /// All well-known models.
    pub const KNOWN: [Model; 6] = [
        Model::Gpt4o,
        Model::Gpt4,
        Model::Gpt35Turbo,
        Model::O1Preview,
        Model::O1Mini,
        Model::Claude35Sonnet,
    ];

    /// Returns the wire id of the model.
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt4o => "gpt-4o-2024-05-13",
            Model::Gpt4 => "gpt-4",
            Model::Gpt35Turbo => "gpt-3.5-turbo",
            Model::O1Preview => "o1-preview-2024-09-12",
            Model::O1Mini => "o1-mini-2024-09-12",
            Model::Claude35Sonnet => "claude-3.5-sonnet",
            Model::Custom(id) => id,
        }
    }

    /// Context window in tokens, or 0 when unknown.
    pub fn max_token_count(&self) -> u32 {
        match self {
            Model::Gpt4o => 64_000,
            Model::Gpt4 => 32_768,
            Model::Gpt35Turbo => 12_288,
            Model::O1Preview | Model::O1Mini => 20_000,
            Model::Claude35Sonnet => 200_000,
            Model::Custom(_) => 0,
        }
    }
}

impl From<String> for Model {
    fn from(id: String) -> Self {
        Model::KNOWN
            .into_iter()
            .find(|m| m.as_str() == id)
            .unwrap_or(Model::Custom(id))
    }
}

impl From<&str> for Model {
    fn from(id: &str) -> Self {
        Model::from(id.to_string())
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        match model {
            Model::Custom(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request
// ============================================================================

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    /// Creates a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Copilot intent flag.
    pub intent: bool,
    /// Number of choices to sample.
    pub n: u32,
    /// Streaming is never requested by this client, but the field is part
    /// of the wire format.
    pub stream: bool,
    /// Sampling temperature.
    pub temperature: f32,
    /// Target model.
    pub model: Model,
    /// Ordered conversation.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    /// Creates a non-streaming, single-choice request.
    pub fn new(model: Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            intent: true,
            n: 1,
            stream: false,
            temperature: Self::DEFAULT_TEMPERATURE,
            model,
            messages,
        }
    }

    /// Creates a request holding one user prompt.
    pub fn from_prompt(model: Model, prompt: impl Into<String>) -> Self {
        Self::new(model, vec![ChatMessage::user(prompt)])
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the number of choices.
    #[must_use]
    pub fn with_n(mut self, n: u32) -> Self {
        self.n = n;
        self
    }
}

// ============================================================================
// Response
// ============================================================================

/// Content filter verdict for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilterResult {
    /// Whether content was filtered.
    #[serde(default)]
    pub filtered: bool,
    /// Severity label.
    #[serde(default)]
    pub severity: String,
}

/// Content filter verdicts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilterResults {
    /// Hate speech.
    #[serde(default)]
    pub hate: ContentFilterResult,
    /// Self-harm.
    #[serde(default)]
    pub self_harm: ContentFilterResult,
    /// Sexual content.
    #[serde(default)]
    pub sexual: ContentFilterResult,
    /// Violence.
    #[serde(default)]
    pub violence: ContentFilterResult,
}

/// Filter verdicts for one prompt message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptFilterResult {
    /// Verdicts.
    #[serde(default)]
    pub content_filter_results: ContentFilterResults,
    /// Index of the prompt message.
    #[serde(default)]
    pub prompt_index: u32,
}

/// Reply message inside a choice.
///
/// Content-filtered choices carry `"content": null`; that and a missing
/// message both decode to empty content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Who wrote the message.
    #[serde(default)]
    pub role: Option<Role>,
    /// Message text.
    #[serde(default)]
    pub content: Option<String>,
}

impl ResponseMessage {
    /// Message text, empty when the backend sent none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

impl From<ChatMessage> for ResponseMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: Some(message.role),
            content: Some(message.content),
        }
    }
}

/// One sampled completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChoice {
    /// Filter verdicts.
    #[serde(default)]
    pub content_filter_results: ContentFilterResults,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// The reply.
    #[serde(default)]
    pub message: ResponseMessage,
}

/// Token usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the completion.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Sum of both.
    #[serde(default)]
    pub total_tokens: u64,
}

/// Error object some completion responses carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error type.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Error code (string or number depending on backend).
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// Chat completion response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Sampled completions.
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created: i64,
    /// Response id.
    #[serde(default)]
    pub id: String,
    /// Model that served the request.
    #[serde(default)]
    pub model: String,
    /// Backend fingerprint.
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    /// Prompt filter verdicts.
    #[serde(default)]
    pub prompt_filter_results: Vec<PromptFilterResult>,
    /// Token usage.
    #[serde(default)]
    pub usage: Usage,
    /// Error reported inside a successful HTTP response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl ChatResponse {
    /// Returns the content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.text())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids() {
        assert_eq!(Model::Gpt4o.as_str(), "gpt-4o-2024-05-13");
        assert_eq!(Model::from("claude-3.5-sonnet"), Model::Claude35Sonnet);
        assert_eq!(
            Model::from("gpt-5-preview"),
            Model::Custom("gpt-5-preview".to_string())
        );
    }

    #[test]
    fn test_model_max_token_count() {
        assert_eq!(Model::Gpt4o.max_token_count(), 64_000);
        assert_eq!(Model::Gpt4.max_token_count(), 32_768);
        assert_eq!(Model::Gpt35Turbo.max_token_count(), 12_288);
        assert_eq!(Model::O1Mini.max_token_count(), 20_000);
        assert_eq!(Model::O1Preview.max_token_count(), 20_000);
        assert_eq!(Model::Claude35Sonnet.max_token_count(), 200_000);
        assert_eq!(Model::Custom("x".into()).max_token_count(), 0);
    }

    #[test]
    fn test_request_defaults() {
        let request = ChatRequest::from_prompt(Model::Gpt4o, "hi");
        assert!(request.intent);
        assert!(!request.stream);
        assert_eq!(request.n, 1);
        assert_eq!(request.messages, vec![ChatMessage::user("hi")]);
    }

    #[test]
    fn test_first_content() {
        let mut response = ChatResponse::default();
        assert!(response.first_content().is_none());

        response.choices.push(ResponseChoice {
            content_filter_results: ContentFilterResults::default(),
            finish_reason: Some("stop".to_string()),
            index: 0,
            message: ChatMessage::new(Role::Assistant, "hello").into(),
        });
        assert_eq!(response.first_content(), Some("hello"));
    }

    #[test]
    fn test_null_content_is_empty() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"finish_reason":"content_filter","index":0,"message":{"role":"assistant","content":null}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_content(), Some(""));
        assert_eq!(response.choices[0].message.role, Some(Role::Assistant));

        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"index":0,"finish_reason":"length"}]}"#).unwrap();
        assert_eq!(response.first_content(), Some(""));
        assert!(response.choices[0].message.role.is_none());
    }
}
