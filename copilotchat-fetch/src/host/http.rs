//! HTTP client stamped with the Copilot client headers.
//!
//! Every request carries `Accept: application/json`, `Editor-Version` and
//! `Copilot-Integration-Id`. Requests with a body get the matching
//! `Content-Type` from reqwest (`form` or `json`).

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::HttpError;

/// User agent string for copilotchat.
const USER_AGENT: &str = concat!("copilotchat/", env!("CARGO_PKG_VERSION"));

/// Editor version header name.
const EDITOR_VERSION: &str = "editor-version";

/// Integration id header name.
const COPILOT_INTEGRATION_ID: &str = "copilot-integration-id";

// ============================================================================
// Headers
// ============================================================================

/// Client identification sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopilotHeaders {
    /// `Editor-Version` value, e.g. `Lazygit/0.44.0`.
    pub editor_version: String,
    /// `Copilot-Integration-Id` value, e.g. `vscode-chat`.
    pub integration_id: String,
}

impl CopilotHeaders {
    /// Builds the header map.
    fn to_header_map(&self) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            EDITOR_VERSION,
            HeaderValue::from_str(&self.editor_version).map_err(|_| HttpError::InvalidHeader {
                name: "Editor-Version",
            })?,
        );
        headers.insert(
            COPILOT_INTEGRATION_ID,
            HeaderValue::from_str(&self.integration_id).map_err(|_| {
                HttpError::InvalidHeader {
                    name: "Copilot-Integration-Id",
                }
            })?,
        );
        Ok(headers)
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and fixed Copilot headers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value is not valid ASCII or the TLS
    /// backend cannot be initialized.
    pub fn new(headers: &CopilotHeaders, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers.to_header_map()?)
            .build()?;

        Ok(Self { inner: client })
    }

    /// Builds an `Authorization` header value without leaking it into errors.
    fn auth_value(auth_header: &str) -> Result<HeaderValue, HttpError> {
        let mut value = HeaderValue::from_str(auth_header).map_err(|_| HttpError::InvalidHeader {
            name: "Authorization",
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Performs a POST request with a url-encoded form body.
    #[instrument(skip(self, form), fields(url = %url))]
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<Response, HttpError> {
        debug!("POST request with form data");

        let response = self.inner.post(url).form(form).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request with an authorization header.
    #[instrument(skip(self, auth_header), fields(url = %url))]
    pub async fn get_with_auth(&self, url: &str, auth_header: &str) -> Result<Response, HttpError> {
        debug!("GET request with auth");

        let response = self
            .inner
            .get(url)
            .header(AUTHORIZATION, Self::auth_value(auth_header)?)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with a JSON body and an authorization header.
    #[instrument(skip(self, auth_header, body), fields(url = %url))]
    pub async fn post_json_with_auth<T: Serialize + ?Sized>(
        &self,
        url: &str,
        auth_header: &str,
        body: &T,
    ) -> Result<Response, HttpError> {
        debug!("POST request with JSON and auth");

        let response = self
            .inner
            .post(url)
            .header(AUTHORIZATION, Self::auth_value(auth_header)?)
            .json(body)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn headers() -> CopilotHeaders {
        CopilotHeaders {
            editor_version: "Lazygit/0.44.0".to_string(),
            integration_id: "vscode-chat".to_string(),
        }
    }

    fn client() -> HttpClient {
        HttpClient::new(&headers(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_invalid_header_rejected() {
        let bad = CopilotHeaders {
            editor_version: "bad\nvalue".to_string(),
            integration_id: "vscode-chat".to_string(),
        };
        let err = HttpClient::new(&bad, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader { name: "Editor-Version" }));
    }

    #[tokio::test]
    async fn test_post_form_sends_fixed_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/device/code"))
            .and(header("accept", "application/json"))
            .and(header("editor-version", "Lazygit/0.44.0"))
            .and(header("copilot-integration-id", "vscode-chat"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("client_id=abc&scope=copilot"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/login/device/code", server.uri());
        let response = client()
            .post_form(&url, &[("client_id", "abc"), ("scope", "copilot")])
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_post_json_with_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/chat/completions", server.uri());
        let body = serde_json::json!({"n": 1});
        let response = client()
            .post_json_with_auth(&url, "Bearer key", &body)
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_invalid_auth_header_rejected() {
        let err = client()
            .get_with_auth("http://127.0.0.1:1/", "token bad\nvalue")
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader { name: "Authorization" }));
    }
}
