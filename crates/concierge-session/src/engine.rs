//! Session engine
//!
//! Drives the widget lifecycle:
//!
//! ```text
//! idle --open--> awaiting_init --handshake--> ready --submit--> sending
//!                                               ^                  |
//!                                               +----completion----+
//! ```
//!
//! Every remote call is split in two phases so an event-driven adapter can run
//! the call on another task: a guard that hands out a ticket ([`Handshake`],
//! [`PendingTurn`]) and [`SessionEngine::apply`], which checks the ticket still
//! belongs to the live session before touching the log.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{QueryClient, QueryReply};
use crate::error::{SessionError, SessionResult, TransportError};
use crate::fallback::FallbackResponder;
use crate::types::{Connectivity, Lifecycle, Message, Sender, Session};

/// Bot message seeded into every new session
pub const WELCOME_MESSAGE: &str = "Welcome to Four Seasons! I'm your personal concierge, ready to help you plan the perfect luxury experience. How may I assist you today?";

/// Presentation-agnostic engine options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub welcome_message: String,
    /// Hint for adapters: render bot markup instead of plain text
    pub rich_text: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            welcome_message: WELCOME_MESSAGE.to_string(),
            rich_text: true,
        }
    }
}

impl EngineOptions {
    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    pub fn with_rich_text(mut self, rich_text: bool) -> Self {
        self.rich_text = rich_text;
        self
    }
}

/// Ticket for the handshake of a freshly opened session
#[derive(Debug)]
pub struct Handshake {
    session_id: Uuid,
}

impl Handshake {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run the handshake query: empty utterance, no token.
    pub async fn dispatch(self, client: Arc<dyn QueryClient>) -> EngineEvent {
        let result = client.query("", None).await;
        EngineEvent::HandshakeCompleted {
            handshake: self,
            result,
        }
    }
}

/// Ticket for the single in-flight turn
#[derive(Debug)]
pub struct PendingTurn {
    session_id: Uuid,
    utterance: String,
    continuity_token: Option<String>,
}

impl PendingTurn {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    pub fn continuity_token(&self) -> Option<&str> {
        self.continuity_token.as_deref()
    }

    pub async fn dispatch(self, client: Arc<dyn QueryClient>) -> EngineEvent {
        let result = client
            .query(&self.utterance, self.continuity_token.as_deref())
            .await;
        EngineEvent::TurnCompleted { turn: self, result }
    }
}

/// Resolution of a remote call, fed back through [`SessionEngine::apply`]
#[derive(Debug)]
pub enum EngineEvent {
    HandshakeCompleted {
        handshake: Handshake,
        result: Result<QueryReply, TransportError>,
    },
    TurnCompleted {
        turn: PendingTurn,
        result: Result<QueryReply, TransportError>,
    },
}

/// Owns the session of one widget instance
pub struct SessionEngine {
    client: Arc<dyn QueryClient>,
    responder: Arc<dyn FallbackResponder>,
    options: EngineOptions,
    session: Option<Session>,
}

impl SessionEngine {
    pub fn new(
        client: Arc<dyn QueryClient>,
        responder: Arc<dyn FallbackResponder>,
        options: EngineOptions,
    ) -> Self {
        Self {
            client,
            responder,
            options,
            session: None,
        }
    }

    pub fn client(&self) -> Arc<dyn QueryClient> {
        Arc::clone(&self.client)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn messages(&self) -> &[Message] {
        self.session.as_ref().map(Session::messages).unwrap_or(&[])
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.session
            .as_ref()
            .map(Session::lifecycle)
            .unwrap_or(Lifecycle::Idle)
    }

    pub fn is_sending(&self) -> bool {
        self.lifecycle() == Lifecycle::Sending
    }

    /// Whether the adapter should accept input right now
    pub fn can_submit(&self) -> bool {
        self.lifecycle() == Lifecycle::Ready
    }

    pub fn is_initialized(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_initialized)
    }

    pub fn connectivity(&self) -> Connectivity {
        self.session
            .as_ref()
            .map(Session::connectivity)
            .unwrap_or(Connectivity::Connected)
    }

    pub fn continuity_token(&self) -> Option<&str> {
        self.session.as_ref().and_then(Session::continuity_token)
    }

    /// Open the widget.
    ///
    /// Returns `None` while a session is already open, so reopening never
    /// issues a second handshake for the same session.
    pub fn open(&mut self) -> Option<Handshake> {
        if let Some(session) = &self.session {
            debug!(session_id = %session.id(), "Widget already open, skipping handshake");
            return None;
        }

        let session = Session::new(&self.options.welcome_message);
        let session_id = session.id();
        self.session = Some(session);
        info!(session_id = %session_id, "Session opened");

        Some(Handshake { session_id })
    }

    /// Close the widget and discard the session.
    ///
    /// An in-flight call is not cancelled; its completion is dropped by [`apply`](Self::apply).
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                session_id = %session.id(),
                messages = session.messages().len(),
                "Session closed"
            );
        }
    }

    /// Start a turn.
    ///
    /// The text is trimmed once, and that trimmed form is both what the log
    /// shows and what goes over the wire.
    ///
    /// Appends the user message and enters `sending`. Returns `None` without
    /// touching state for blank text, a closed widget, or any lifecycle other
    /// than `ready` (at most one turn is ever in flight).
    pub fn submit(&mut self, text: &str) -> Option<PendingTurn> {
        let utterance = text.trim();
        if utterance.is_empty() {
            return None;
        }

        let session = self.session.as_mut()?;
        if session.lifecycle() != Lifecycle::Ready {
            debug!(
                session_id = %session.id(),
                lifecycle = %session.lifecycle(),
                "Submission rejected"
            );
            return None;
        }

        session.push(Sender::User, utterance, false);
        session.set_lifecycle(Lifecycle::Sending);

        Some(PendingTurn {
            session_id: session.id(),
            utterance: utterance.to_string(),
            continuity_token: session.continuity_token().map(str::to_string),
        })
    }

    /// Apply a completed remote call to the session it was issued for.
    pub fn apply(&mut self, event: EngineEvent) -> SessionResult<()> {
        match event {
            EngineEvent::HandshakeCompleted { handshake, result } => {
                self.complete_handshake(handshake, result)
            }
            EngineEvent::TurnCompleted { turn, result } => {
                self.complete_turn(turn, result).map(|_| ())
            }
        }
    }

    fn live_session(&mut self, id: Uuid, expected: Lifecycle) -> SessionResult<&mut Session> {
        let session = match self.session.as_mut() {
            Some(session) if session.id() == id => session,
            _ => return Err(SessionError::StaleSession { id }),
        };
        if session.lifecycle() != expected {
            return Err(SessionError::InvalidSessionState {
                id,
                current: session.lifecycle(),
                expected,
            });
        }
        Ok(session)
    }

    fn complete_handshake(
        &mut self,
        handshake: Handshake,
        result: Result<QueryReply, TransportError>,
    ) -> SessionResult<()> {
        let session = self.live_session(handshake.session_id, Lifecycle::AwaitingInit)?;

        // The handshake reply itself is never shown; the welcome message covers it.
        match result {
            Ok(reply) => {
                session.adopt_token(reply.continuity_token.as_deref());
                session.set_connectivity(Connectivity::Connected);
                info!(
                    session_id = %session.id(),
                    has_token = session.continuity_token().is_some(),
                    "Handshake completed"
                );
            }
            Err(e) => {
                session.set_connectivity(Connectivity::Disconnected);
                warn!(session_id = %session.id(), error = %e, "Handshake failed, continuing offline");
            }
        }

        session.mark_initialized();
        session.set_lifecycle(Lifecycle::Ready);
        Ok(())
    }

    fn complete_turn(
        &mut self,
        turn: PendingTurn,
        result: Result<QueryReply, TransportError>,
    ) -> SessionResult<&Message> {
        let responder = Arc::clone(&self.responder);
        let session = self.live_session(turn.session_id, Lifecycle::Sending)?;
        session.set_lifecycle(Lifecycle::Ready);

        match result {
            Ok(reply) => {
                if !session.adopt_token(reply.continuity_token.as_deref()) {
                    if let (Some(held), Some(offered)) =
                        (session.continuity_token(), reply.continuity_token.as_deref())
                    {
                        if held != offered {
                            debug!(
                                session_id = %session.id(),
                                held,
                                offered,
                                "Ignoring reissued continuity token"
                            );
                        }
                    }
                }
                session.set_connectivity(Connectivity::Connected);
                debug!(session_id = %session.id(), "Turn completed");
                Ok(session.push(Sender::Bot, reply.reply_text, false))
            }
            Err(e) => {
                session.set_connectivity(Connectivity::Disconnected);
                warn!(session_id = %session.id(), error = %e, "Query failed, answering offline");
                let text = responder.respond(&turn.utterance);
                Ok(session.push(Sender::Bot, text, true))
            }
        }
    }

    /// Open the widget and wait for the handshake.
    ///
    /// Returns `false` when the widget was already open.
    pub async fn open_and_handshake(&mut self) -> bool {
        let Some(handshake) = self.open() else {
            return false;
        };
        let event = handshake.dispatch(self.client()).await;
        if let Err(e) = self.apply(event) {
            warn!(error = %e, "Dropping handshake completion");
        }
        true
    }

    /// Run one full turn and return the bot reply.
    ///
    /// `None` when the submission was rejected.
    pub async fn send(&mut self, text: &str) -> Option<&Message> {
        let turn = self.submit(text)?;
        let event = turn.dispatch(self.client()).await;
        match self.apply(event) {
            Ok(()) => self.messages().last(),
            Err(e) => {
                warn!(error = %e, "Dropping turn completion");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::ConciergeResponder;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl QueryClient for Unreachable {
        async fn query(
            &self,
            _utterance: &str,
            _continuity_token: Option<&str>,
        ) -> Result<QueryReply, TransportError> {
            Err(TransportError::network("connection refused"))
        }
    }

    fn engine() -> SessionEngine {
        SessionEngine::new(
            Arc::new(Unreachable),
            Arc::new(ConciergeResponder),
            EngineOptions::default(),
        )
    }

    #[test]
    fn test_closed_engine_view() {
        let engine = engine();
        assert!(!engine.is_open());
        assert_eq!(engine.lifecycle(), Lifecycle::Idle);
        assert!(engine.messages().is_empty());
        assert!(!engine.can_submit());
        assert!(engine.continuity_token().is_none());
    }

    #[test]
    fn test_open_latches() {
        let mut engine = engine();
        let first = engine.open();
        assert!(first.is_some());
        assert_eq!(engine.lifecycle(), Lifecycle::AwaitingInit);
        assert!(engine.open().is_none());
        assert_eq!(engine.messages().len(), 1);
    }

    #[test]
    fn test_submit_rejected_before_handshake() {
        let mut engine = engine();
        let _handshake = engine.open();
        assert!(engine.submit("book a trip").is_none());
        assert_eq!(engine.messages().len(), 1);
    }

    #[test]
    fn test_turn_trims_user_text() {
        let mut engine = engine();
        let handshake = engine.open().unwrap();
        engine
            .apply(EngineEvent::HandshakeCompleted {
                handshake,
                result: Ok(QueryReply::new("hi", Some("t-1"))),
            })
            .unwrap();

        let turn = engine.submit("  book a trip \n").unwrap();
        assert_eq!(turn.utterance(), "book a trip");
        assert_eq!(turn.continuity_token(), Some("t-1"));
        assert_eq!(engine.messages()[1].text, "book a trip");
    }

    #[test]
    fn test_options_builder() {
        let options = EngineOptions::default()
            .with_welcome_message("Hello")
            .with_rich_text(false);
        assert_eq!(options.welcome_message, "Hello");
        assert!(!options.rich_text);
    }
}
