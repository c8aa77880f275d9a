//! Remote query client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TransportError;

pub const DEFAULT_QUERY_PATH: &str = "/query";
pub const DEFAULT_THREAD_HEADER: &str = "threadid";
/// Sent in place of an empty utterance so the service can open a thread
pub const DEFAULT_GREETING: &str = "Hi";
/// Used when the service answers without reply text
pub const MISSING_REPLY_TEXT: &str = "Sorry, I couldn't process your request.";

/// Reply to a single query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReply {
    pub reply_text: String,
    /// `None` when the service did not name a thread
    pub continuity_token: Option<String>,
}

impl QueryReply {
    pub fn new(reply_text: impl Into<String>, continuity_token: Option<&str>) -> Self {
        Self {
            reply_text: reply_text.into(),
            continuity_token: continuity_token
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        }
    }
}

/// Sends one utterance to the query service.
///
/// Implementations issue exactly one call per invocation and never retry.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn query(
        &self,
        utterance: &str,
        continuity_token: Option<&str>,
    ) -> Result<QueryReply, TransportError>;
}

#[derive(Debug, Clone, Serialize)]
struct QueryRequest<'a> {
    user_input: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

/// HTTP client for the `/query` endpoint
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    client: Client,
    base_url: String,
    query_path: String,
    thread_header: String,
    greeting: String,
    timeout: Option<Duration>,
}

impl HttpQueryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            query_path: DEFAULT_QUERY_PATH.to_string(),
            thread_header: DEFAULT_THREAD_HEADER.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            timeout: None,
        }
    }

    pub fn with_query_path(mut self, path: impl Into<String>) -> Self {
        self.query_path = path.into();
        self
    }

    pub fn with_thread_header(mut self, header: impl Into<String>) -> Self {
        self.thread_header = header.into();
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Per-request timeout. Unset by default: a hung call stays in flight.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.query_path)
    }

    fn build_headers(&self, continuity_token: Option<&str>) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = continuity_token.filter(|t| !t.is_empty()) {
            let name = HeaderName::from_bytes(self.thread_header.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            let value = HeaderValue::from_str(token)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    fn user_input<'a>(&'a self, utterance: &'a str) -> &'a str {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            self.greeting.as_str()
        } else {
            trimmed
        }
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn query(
        &self,
        utterance: &str,
        continuity_token: Option<&str>,
    ) -> Result<QueryReply, TransportError> {
        let request = QueryRequest {
            user_input: self.user_input(utterance),
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers(continuity_token)?)
            .json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(
            endpoint = %self.endpoint(),
            has_token = continuity_token.is_some(),
            "Sending query"
        );

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: QueryResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::malformed(e.to_string()))?;

        Ok(QueryReply::new(
            parsed
                .response
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| MISSING_REPLY_TEXT.to_string()),
            parsed.thread_id.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_utterance_uses_greeting() {
        let client = HttpQueryClient::new("http://localhost:4000");
        assert_eq!(client.user_input(""), "Hi");
        assert_eq!(client.user_input("   "), "Hi");
        assert_eq!(client.user_input("  spa  "), "spa");

        let client = client.with_greeting("Hello");
        assert_eq!(client.user_input(""), "Hello");
    }

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let client = HttpQueryClient::new("http://localhost:4000/");
        assert_eq!(client.endpoint(), "http://localhost:4000/query");

        let client = client.with_query_path("/api/query");
        assert_eq!(client.endpoint(), "http://localhost:4000/api/query");
    }

    #[test]
    fn test_thread_header_only_when_token_held() {
        let client = HttpQueryClient::new("http://localhost:4000");

        let headers = client.build_headers(None).unwrap();
        assert!(headers.get("threadid").is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");

        let headers = client.build_headers(Some("")).unwrap();
        assert!(headers.get("threadid").is_none());

        let headers = client.build_headers(Some("thread_abc")).unwrap();
        assert_eq!(headers.get("threadid").unwrap(), "thread_abc");
    }

    #[test]
    fn test_invalid_token_is_a_transport_error() {
        let client = HttpQueryClient::new("http://localhost:4000");
        let result = client.build_headers(Some("bad\ntoken"));
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn test_reply_normalizes_empty_token() {
        let reply = QueryReply::new("hello", Some(""));
        assert!(reply.continuity_token.is_none());

        let reply = QueryReply::new("hello", Some("t-1"));
        assert_eq!(reply.continuity_token.as_deref(), Some("t-1"));
    }

    #[test]
    fn test_response_fields_are_optional() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.thread_id.is_none());
        assert!(parsed.response.is_none());

        let parsed: QueryResponse =
            serde_json::from_str(r#"{"thread_id": null, "response": "ok"}"#).unwrap();
        assert!(parsed.thread_id.is_none());
        assert_eq!(parsed.response.as_deref(), Some("ok"));
    }
}
