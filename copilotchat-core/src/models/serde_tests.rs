//! Serde tests for the wire and keyring formats.
//!
//! These pin the exact JSON shapes the Copilot endpoints and the keyring
//! entry use.

use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::{ApiToken, AuthState, CacheRecord, ChatMessage, ChatRequest, ChatResponse, Model, Role};

// ============================================================================
// CacheRecord
// ============================================================================

#[test]
fn test_cache_record_json_shape() {
    let expires_at = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
    let token = ApiToken::new("tid=abc", expires_at);
    let record = CacheRecord::new("gho_abc", Some(&token));

    let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "oauth_token": "gho_abc",
            "api_key": "tid=abc",
            "expires_at": "2030-01-02T03:04:05Z"
        })
    );
}

#[test]
fn test_cache_record_accepts_zero_time() {
    // Records written without an API key carry the zero timestamp.
    let json = r#"{"oauth_token":"gho_abc","api_key":"","expires_at":"0001-01-01T00:00:00Z"}"#;
    let record = CacheRecord::from_json(json).unwrap();
    assert_eq!(record.oauth_token(), Some("gho_abc"));
    assert!(record.api_token().is_none());
}

#[test]
fn test_cache_record_missing_fields() {
    let record = CacheRecord::from_json("{}").unwrap();
    assert!(record.is_empty());
}

#[test]
fn test_cache_record_malformed() {
    assert!(CacheRecord::from_json("not json").is_err());
}

// ============================================================================
// Chat
// ============================================================================

#[test]
fn test_chat_request_json_shape() {
    let request = ChatRequest::new(
        Model::Gpt4o,
        vec![ChatMessage::user("Describe what is Lazygit in one sentence")],
    );

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["intent"], json!(true));
    assert_eq!(value["n"], json!(1));
    assert_eq!(value["stream"], json!(false));
    assert_eq!(value["model"], json!("gpt-4o-2024-05-13"));
    assert_eq!(value["messages"][0]["role"], json!("user"));
    assert_eq!(
        value["messages"][0]["content"],
        json!("Describe what is Lazygit in one sentence")
    );
    assert!((value["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
}

#[test]
fn test_custom_model_serializes_as_id() {
    let value = serde_json::to_value(Model::Custom("my-model".to_string())).unwrap();
    assert_eq!(value, json!("my-model"));

    let model: Model = serde_json::from_value(json!("gpt-4")).unwrap();
    assert_eq!(model, Model::Gpt4);
}

#[test]
fn test_role_lowercase() {
    assert_eq!(serde_json::to_value(Role::System).unwrap(), json!("system"));
    let role: Role = serde_json::from_value(json!("assistant")).unwrap();
    assert_eq!(role, Role::Assistant);
    assert!(serde_json::from_value::<Role>(json!("Admin")).is_err());
}

#[test]
fn test_chat_response_full() {
    let json = json!({
        "choices": [{
            "content_filter_results": {
                "hate": {"filtered": false, "severity": "safe"},
                "self_harm": {"filtered": false, "severity": "safe"},
                "sexual": {"filtered": false, "severity": "safe"},
                "violence": {"filtered": false, "severity": "safe"}
            },
            "finish_reason": "stop",
            "index": 0,
            "message": {"role": "assistant", "content": "Lazygit is a terminal UI for git."}
        }],
        "created": 1_727_000_000,
        "id": "chatcmpl-1",
        "model": "gpt-4o-2024-05-13",
        "system_fingerprint": "fp_1",
        "prompt_filter_results": [{
            "content_filter_results": {"hate": {"filtered": false, "severity": "safe"}},
            "prompt_index": 0
        }],
        "usage": {"completion_tokens": 9, "prompt_tokens": 15, "total_tokens": 24}
    });

    let response: ChatResponse = serde_json::from_value(json).unwrap();
    assert_eq!(
        response.first_content(),
        Some("Lazygit is a terminal UI for git.")
    );
    assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.choices[0].content_filter_results.hate.severity, "safe");
    assert_eq!(response.usage.total_tokens, 24);
    assert_eq!(response.prompt_filter_results.len(), 1);
    assert!(response.error.is_none());
}

#[test]
fn test_chat_response_with_error_object() {
    let json = json!({
        "error": {"message": "model not supported", "type": "invalid_request_error", "code": 400}
    });

    let response: ChatResponse = serde_json::from_value(json).unwrap();
    assert!(response.choices.is_empty());
    let error = response.error.unwrap();
    assert_eq!(error.message, "model not supported");
    assert_eq!(error.kind.as_deref(), Some("invalid_request_error"));
}

// ============================================================================
// AuthState
// ============================================================================

#[test]
fn test_auth_state_tagged() {
    let value = serde_json::to_value(AuthState::NeedsAuthorization).unwrap();
    assert_eq!(value, json!({"state": "needs_authorization"}));

    let expires_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let value = serde_json::to_value(AuthState::Authenticated { expires_at }).unwrap();
    assert_eq!(value["state"], json!("authenticated"));
    assert_eq!(value["expires_at"], json!("2030-01-01T00:00:00Z"));
}
