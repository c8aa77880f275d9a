use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use concierge_session::{
    ConciergeResponder, Connectivity, EngineOptions, HttpQueryClient, QueryClient, SessionEngine,
    TransportError, MISSING_REPLY_TEXT,
};

#[tokio::test]
async fn test_handshake_sends_greeting_without_thread_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .match_header("content-type", "application/json")
        .match_header("threadid", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "user_input": "Hi" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"thread_id": "thread_123", "response": "Hello!"}"#)
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url());
    let reply = client.query("", None).await.unwrap();

    assert_eq!(reply.reply_text, "Hello!");
    assert_eq!(reply.continuity_token.as_deref(), Some("thread_123"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_turn_carries_thread_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .match_header("threadid", "thread_123")
        .match_body(Matcher::Json(json!({ "user_input": "book a trip" })))
        .with_status(200)
        .with_body(r#"{"thread_id": "thread_123", "response": "Where to?"}"#)
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url());
    let reply = client.query("  book a trip ", Some("thread_123")).await.unwrap();

    assert_eq!(reply.reply_text, "Where to?");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_fields_are_tolerated() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url());
    let reply = client.query("spa", None).await.unwrap();

    assert_eq!(reply.reply_text, MISSING_REPLY_TEXT);
    assert!(reply.continuity_token.is_none());
}

#[tokio::test]
async fn test_empty_reply_text_is_replaced() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(200)
        .with_body(r#"{"thread_id": "t-1", "response": ""}"#)
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url());
    let reply = client.query("spa", None).await.unwrap();

    assert_eq!(reply.reply_text, MISSING_REPLY_TEXT);
    assert_eq!(reply.continuity_token.as_deref(), Some("t-1"));
}

#[tokio::test]
async fn test_error_status_is_transport_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url());
    let err = client.query("spa", None).await.unwrap_err();

    assert_eq!(
        err,
        TransportError::Status {
            status: 500,
            body: "internal error".to_string()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url());
    let err = client.query("spa", None).await.unwrap_err();

    assert!(matches!(err, TransportError::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let client = HttpQueryClient::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(5));
    let err = client.query("spa", None).await.unwrap_err();

    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn test_custom_path_and_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/ask")
        .match_header("x-thread", "abc")
        .with_status(200)
        .with_body(r#"{"response": "ok"}"#)
        .create_async()
        .await;

    let client = HttpQueryClient::new(server.url())
        .with_query_path("/api/ask")
        .with_thread_header("x-thread");
    let reply = client.query("spa", Some("abc")).await.unwrap();

    assert_eq!(reply.reply_text, "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_engine_over_http() {
    let mut server = Server::new_async().await;
    let handshake = server
        .mock("POST", "/query")
        .match_header("threadid", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"thread_id": "t-1", "response": "Hello!"}"#)
        .expect(1)
        .create_async()
        .await;
    let turn = server
        .mock("POST", "/query")
        .match_header("threadid", "t-1")
        .with_status(200)
        .with_body(r#"{"thread_id": "t-2", "response": "Let's plan your stay."}"#)
        .expect(1)
        .create_async()
        .await;

    let mut engine = SessionEngine::new(
        Arc::new(HttpQueryClient::new(server.url())),
        Arc::new(ConciergeResponder),
        EngineOptions::default(),
    );
    engine.open_and_handshake().await;
    let reply = engine.send("book a trip").await.unwrap();

    assert_eq!(reply.text, "Let's plan your stay.");
    assert!(!reply.degraded);
    assert_eq!(engine.continuity_token(), Some("t-1"));
    assert_eq!(engine.connectivity(), Connectivity::Connected);
    handshake.assert_async().await;
    turn.assert_async().await;
}
