//! # Concierge Session
//!
//! Conversation session engine for the concierge chat widget.
//!
//! ## Components
//!
//! - **Remote query client**: sends one utterance plus an optional continuity
//!   token to the query service ([`QueryClient`], [`HttpQueryClient`])
//! - **Local fallback responder**: canned, keyword-matched replies used when the
//!   query service is unreachable ([`FallbackResponder`], [`ConciergeResponder`])
//! - **Session engine**: owns the message log, continuity token, connectivity
//!   and request lifecycle ([`SessionEngine`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use concierge_session::{
//!     ConciergeResponder, EngineOptions, HttpQueryClient, SessionEngine,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(HttpQueryClient::new("http://127.0.0.1:4000"));
//!     let mut engine = SessionEngine::new(
//!         client,
//!         Arc::new(ConciergeResponder),
//!         EngineOptions::default(),
//!     );
//!
//!     engine.open_and_handshake().await;
//!     if let Some(reply) = engine.send("book a trip").await {
//!         println!("{} (degraded: {})", reply.text, reply.degraded);
//!     }
//! }
//! ```

pub mod client;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod types;

pub use client::{HttpQueryClient, QueryClient, QueryReply, DEFAULT_GREETING, DEFAULT_QUERY_PATH, DEFAULT_THREAD_HEADER, MISSING_REPLY_TEXT};
pub use engine::{EngineEvent, EngineOptions, Handshake, PendingTurn, SessionEngine, WELCOME_MESSAGE};
pub use error::{SessionError, SessionResult, TransportError};
pub use fallback::{ApologyResponder, ConciergeResponder, FallbackResponder, Topic, CONNECTIVITY_APOLOGY, GENERIC_REPLY};
pub use types::{Connectivity, Lifecycle, Message, Sender, Session};
