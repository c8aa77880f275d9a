use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use concierge_session::{
    ConciergeResponder, EngineOptions, QueryClient, QueryReply, SessionEngine, TransportError,
};

/// Query client that replays a fixed script and records every call
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<QueryReply, TransportError>>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str, token: Option<&str>) -> Self {
        self.push(Ok(QueryReply::new(text, token)))
    }

    pub fn fail(self) -> Self {
        self.push(Err(TransportError::network("connection refused")))
    }

    fn push(self, result: Result<QueryReply, TransportError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    /// Calls made so far as (utterance, continuity token)
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryClient for ScriptedClient {
    async fn query(
        &self,
        utterance: &str,
        continuity_token: Option<&str>,
    ) -> Result<QueryReply, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((utterance.to_string(), continuity_token.map(str::to_string)));

        // An exhausted script behaves like an unreachable service
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("script exhausted")))
    }
}

#[allow(dead_code)]
pub fn engine_with(client: Arc<ScriptedClient>) -> SessionEngine {
    SessionEngine::new(
        client,
        Arc::new(ConciergeResponder),
        EngineOptions::default(),
    )
}
