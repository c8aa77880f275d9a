use std::sync::Arc;

use concierge_observability::{create_session_span, create_turn_span};
use concierge_session::{
    EngineEvent, EngineOptions, FallbackResponder, Lifecycle, Message, QueryClient, SessionEngine,
};
use tokio::sync::mpsc;
use tracing::{warn, Instrument};

pub struct App {
    pub engine: SessionEngine,
    pub input: String,
    pub scroll_offset: usize,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl App {
    pub fn new(
        client: Arc<dyn QueryClient>,
        responder: Arc<dyn FallbackResponder>,
        options: EngineOptions,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(16);

        Self {
            engine: SessionEngine::new(client, responder, options),
            input: String::new(),
            scroll_offset: 0,
            event_tx,
            event_rx,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.engine.messages()
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }

    pub fn is_connecting(&self) -> bool {
        self.engine.lifecycle() == Lifecycle::AwaitingInit
    }

    pub fn rich_text(&self) -> bool {
        self.engine.options().rich_text
    }

    /// Open the widget and start the handshake in the background.
    pub fn open_widget(&mut self) {
        let Some(handshake) = self.engine.open() else {
            return;
        };
        self.scroll_offset = 0;

        let span = create_session_span(&handshake.session_id().to_string());
        let client = self.engine.client();
        let tx = self.event_tx.clone();
        tokio::spawn(
            async move {
                let event = handshake.dispatch(client).await;
                let _ = tx.send(event).await;
            }
            .instrument(span),
        );
    }

    /// Close the widget. A call still in flight is dropped when it lands.
    pub fn close_widget(&mut self) {
        self.engine.close();
        self.input.clear();
        self.scroll_offset = 0;
    }

    pub fn send_message(&mut self) {
        // input stays put until the engine can take it
        if !self.engine.can_submit() {
            return;
        }

        let text = std::mem::take(&mut self.input);
        let Some(turn) = self.engine.submit(&text) else {
            return;
        };
        self.scroll_to_bottom();

        let message_id = self
            .engine
            .messages()
            .last()
            .map(|m| m.id.clone())
            .unwrap_or_default();
        let span = create_turn_span(&turn.session_id().to_string(), &message_id);
        let client = self.engine.client();
        let tx = self.event_tx.clone();
        tokio::spawn(
            async move {
                let event = turn.dispatch(client).await;
                let _ = tx.send(event).await;
            }
            .instrument(span),
        );
    }

    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: EngineEvent) {
        match self.engine.apply(event) {
            Ok(()) => self.scroll_to_bottom(),
            Err(e) => warn!("Dropping completion: {}", e),
        }
    }

    pub fn on_tick(&mut self) {}

    pub fn push_input(&mut self, c: char) {
        if self.engine.can_submit() {
            self.input.push(c);
        }
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset += 1;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_offset += 10;
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(10);
    }

    /// `scroll_offset` counts lines up from the newest message.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    #[cfg(test)]
    async fn next_event(&mut self) {
        if let Some(event) = self.event_rx.recv().await {
            self.apply_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use concierge_session::{ConciergeResponder, Connectivity, QueryReply, TransportError};

    struct EchoClient;

    #[async_trait]
    impl QueryClient for EchoClient {
        async fn query(
            &self,
            utterance: &str,
            _continuity_token: Option<&str>,
        ) -> Result<QueryReply, TransportError> {
            if utterance == "offline" {
                return Err(TransportError::network("connection refused"));
            }
            Ok(QueryReply::new(format!("echo: {}", utterance), Some("t-1")))
        }
    }

    fn app() -> App {
        App::new(
            Arc::new(EchoClient),
            Arc::new(ConciergeResponder),
            EngineOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_open_then_chat() {
        let mut app = app();
        app.open_widget();
        assert!(app.is_connecting());

        // typing is ignored until the handshake lands
        app.push_input('x');
        assert!(app.input.is_empty());

        app.next_event().await;
        assert!(!app.is_connecting());
        assert_eq!(app.engine.continuity_token(), Some("t-1"));

        for c in "spa".chars() {
            app.push_input(c);
        }
        app.send_message();
        assert!(app.input.is_empty());
        assert!(app.engine.is_sending());

        app.next_event().await;
        let last = app.messages().last().unwrap();
        assert_eq!(last.text, "echo: spa");
        assert!(!last.degraded);
    }

    #[tokio::test]
    async fn test_offline_reply_is_marked() {
        let mut app = app();
        app.open_widget();
        app.next_event().await;

        app.input = "offline".to_string();
        app.send_message();
        app.next_event().await;

        let last = app.messages().last().unwrap();
        assert!(last.degraded);
        assert_eq!(app.engine.connectivity(), Connectivity::Disconnected);
    }

    #[tokio::test]
    async fn test_close_drops_inflight_reply() {
        let mut app = app();
        app.open_widget();
        app.next_event().await;

        app.input = "book a trip".to_string();
        app.send_message();
        app.close_widget();
        assert!(!app.is_open());

        app.next_event().await;
        assert!(app.messages().is_empty());

        app.open_widget();
        assert_eq!(app.messages().len(), 1);
        assert!(app.engine.continuity_token().is_none());
    }

    #[test]
    fn test_scrolling() {
        let mut app = app();
        app.scroll_page_up();
        app.scroll_up();
        assert_eq!(app.scroll_offset, 11);
        app.scroll_page_down();
        app.scroll_down();
        app.scroll_down();
        assert_eq!(app.scroll_offset, 0);
    }
}
