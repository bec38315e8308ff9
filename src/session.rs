//! Session lifecycle
//!
//! A session owns one transport and the conversation context that accumulates
//! across turns. It runs one turn at a time: [`Session::run`] opens a turn,
//! the caller drains its events, then folds the outcome back in with
//! [`Session::record_turn`] before the next run. Nothing a session holds
//! survives the process.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::llm::{GeminiTransport, Message, TokenUsage, Transport, TransportError};
use crate::tools::ToolRegistry;
use crate::turn::{Turn, TurnEvent};

/// Errors from session lifecycle operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session is closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A conversation with the model over one transport
pub struct Session {
    transport: Box<dyn Transport>,
    model: String,
    usage: TokenUsage,
    closed: bool,
}

impl Session {
    /// Create a session over an existing transport
    pub fn new(model: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            model: model.into(),
            usage: TokenUsage::default(),
            closed: false,
        }
    }

    /// Create a session with the production transport
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let transport = GeminiTransport::from_config(&config.llm)?;
        Ok(Self::new(config.llm.model.clone(), Box::new(transport)))
    }

    /// Create a session that advertises the registry's tools to the model
    pub fn from_config_with_tools(config: &Config, registry: &ToolRegistry) -> Result<Self, SessionError> {
        let mut transport = GeminiTransport::from_config(&config.llm)?;
        transport.set_function_declarations(registry.function_declarations());
        Ok(Self::new(config.llm.model.clone(), Box::new(transport)))
    }

    /// Open a turn for one outbound message
    ///
    /// If the cancellation signal is already raised, no transport call is
    /// made and the returned turn yields a single `Cancelled` event.
    pub fn run(&mut self, prompt: &str, cancel: &CancellationToken) -> Result<Turn, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        if cancel.is_cancelled() {
            debug!("session: run requested with cancellation already raised");
            return Ok(Turn::terminal(TurnEvent::Cancelled));
        }

        let chunks = self.transport.send(&self.model, prompt, cancel);
        Ok(Turn::new(chunks, cancel.clone()))
    }

    /// Fold a drained turn back into the session
    ///
    /// Appends the aggregated reply to the transport history and adds the
    /// turn's token usage to the session total.
    pub fn record_turn(&mut self, turn: &Turn) {
        if !turn.response_text().is_empty() {
            self.transport.record_reply(turn.response_text());
        }
        self.usage.add(&turn.usage());
    }

    /// The conversation history held by the transport
    pub fn history(&self) -> &[Message] {
        self.transport.history()
    }

    /// Token usage accumulated over all recorded turns
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Close the session, dropping held context
    ///
    /// Idempotent; any later `run` fails with [`SessionError::Closed`].
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        debug!(total_tokens = self.usage.total(), "session: closed");
        self.transport.clear_history();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChunkStream, FinishReason, ModelChunk, Part, RawChunk};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockTransport {
        scripts: VecDeque<Vec<Result<RawChunk, TransportError>>>,
        history: Vec<Message>,
        sends: Arc<AtomicUsize>,
    }

    impl MockTransport {
        fn new(scripts: Vec<Vec<Result<RawChunk, TransportError>>>) -> (Self, Arc<AtomicUsize>) {
            let sends = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    scripts: scripts.into(),
                    history: Vec::new(),
                    sends: sends.clone(),
                },
                sends,
            )
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, _model: &str, prompt: &str, _cancel: &CancellationToken) -> ChunkStream {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.history.push(Message::user(prompt));
            let script = self.scripts.pop_front().unwrap_or_default();
            Box::pin(futures::stream::iter(script))
        }

        fn history(&self) -> &[Message] {
            &self.history
        }

        fn record_reply(&mut self, text: &str) {
            self.history.push(Message::model(text));
        }

        fn clear_history(&mut self) {
            self.history.clear();
        }
    }

    fn stop_script(text: &str) -> Vec<Result<RawChunk, TransportError>> {
        vec![
            Ok(RawChunk::Model(ModelChunk {
                parts: vec![Part::Text(text.to_string())],
                ..Default::default()
            })),
            Ok(RawChunk::Model(ModelChunk {
                finish_reason: Some(FinishReason::Stop),
                usage: Some(TokenUsage {
                    prompt_tokens: 7,
                    response_tokens: 3,
                    thought_tokens: 0,
                }),
                ..Default::default()
            })),
        ]
    }

    async fn drain(turn: &mut Turn) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        while let Some(event) = turn.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_run_yields_events_and_records_reply() {
        let (transport, _) = MockTransport::new(vec![stop_script("hello")]);
        let mut session = Session::new("test-model", Box::new(transport));

        let mut turn = session.run("hi", &CancellationToken::new()).unwrap();
        let events = drain(&mut turn).await;
        assert!(matches!(&events[0], TurnEvent::Content(t) if t == "hello"));
        assert!(events.last().unwrap().is_terminal());

        session.record_turn(&turn);
        let roles_and_text: Vec<(crate::llm::Role, &str)> = session
            .history()
            .iter()
            .map(|m| (m.role, m.text.as_str()))
            .collect();
        assert_eq!(roles_and_text.len(), 2);
        assert_eq!(roles_and_text[1].1, "hello");
    }

    #[tokio::test]
    async fn test_usage_accumulates_across_turns() {
        let (transport, _) = MockTransport::new(vec![stop_script("one"), stop_script("two")]);
        let mut session = Session::new("test-model", Box::new(transport));

        for prompt in ["a", "b"] {
            let mut turn = session.run(prompt, &CancellationToken::new()).unwrap();
            drain(&mut turn).await;
            session.record_turn(&turn);
        }

        assert_eq!(session.usage().prompt_tokens, 14);
        assert_eq!(session.usage().response_tokens, 6);
    }

    #[tokio::test]
    async fn test_pre_raised_cancellation_skips_transport() {
        let (transport, sends) = MockTransport::new(vec![stop_script("never")]);
        let mut session = Session::new("test-model", Box::new(transport));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut turn = session.run("hi", &cancel).unwrap();
        let events = drain(&mut turn).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TurnEvent::Cancelled));
        assert_eq!(sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_after_close_fails() {
        let (transport, _) = MockTransport::new(vec![]);
        let mut session = Session::new("test-model", Box::new(transport));

        session.close();
        let result = session.run("hi", &CancellationToken::new());
        assert!(matches!(result, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_drops_history() {
        let (transport, _) = MockTransport::new(vec![stop_script("hello")]);
        let mut session = Session::new("test-model", Box::new(transport));

        let mut turn = session.run("hi", &CancellationToken::new()).unwrap();
        drain(&mut turn).await;
        session.record_turn(&turn);
        assert!(!session.history().is_empty());

        session.close();
        assert!(session.is_closed());
        assert!(session.history().is_empty());

        session.close();
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_empty_reply_not_recorded() {
        let script = vec![Ok(RawChunk::Model(ModelChunk {
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }))];
        let (transport, _) = MockTransport::new(vec![script]);
        let mut session = Session::new("test-model", Box::new(transport));

        let mut turn = session.run("hi", &CancellationToken::new()).unwrap();
        drain(&mut turn).await;
        session.record_turn(&turn);

        // Only the user message; no empty model entry
        assert_eq!(session.history().len(), 1);
    }
}
