//! Request/response bridge between a chat turn and the model backend.
//!
//! The relay is stateless: it validates the request, sends the whole
//! transcript in one non-streaming call, and times the round trip. It never
//! touches the metrics catalog or the transcript; callers decide what to do
//! with the reply. There is no retry: a failed attempt is returned as is.

use std::time::Instant;

use tracing::debug;

use crate::backend::{ChatBackend, ModelInfo};
use crate::transcript::{Role, Turn};

mod error;

pub use error::{RelayError, RelayErrorKind};

/// A completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReply {
    pub content: String,
    /// Wall-clock seconds from sending the request to receiving the full
    /// response.
    pub elapsed_secs: f64,
}

pub struct ConversationRelay<B> {
    backend: B,
}

impl<B: ChatBackend> ConversationRelay<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn fetch_models(&self) -> Result<Vec<ModelInfo>, RelayError> {
        self.backend.list_models()
    }

    /// Send `transcript` to `model` and return the assistant's reply.
    ///
    /// `model` must be non-empty and `transcript` must end with a user turn.
    pub fn send_turn(&self, model: &str, transcript: &[Turn]) -> Result<RelayReply, RelayError> {
        validate(model, transcript)?;

        let start = Instant::now();
        let result = self.backend.chat(model, transcript);
        let elapsed_secs = start.elapsed().as_secs_f64();

        match &result {
            Ok(_) => debug!(model, elapsed_secs, "relay round trip complete"),
            Err(e) => debug!(model, elapsed_secs, error = %e, "relay round trip failed"),
        }

        result.map(|content| RelayReply {
            content,
            elapsed_secs,
        })
    }
}

fn validate(model: &str, transcript: &[Turn]) -> Result<(), RelayError> {
    if model.trim().is_empty() {
        return Err(RelayError::InvalidRequest("model is required".to_string()));
    }
    match transcript.last() {
        None => Err(RelayError::InvalidRequest("messages are required".to_string())),
        Some(turn) if turn.role != Role::User => Err(RelayError::InvalidRequest(
            "transcript must end with a user turn".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Echo {
        calls: Cell<usize>,
    }

    impl ChatBackend for Echo {
        fn list_models(&self) -> Result<Vec<ModelInfo>, RelayError> {
            Ok(Vec::new())
        }

        fn chat(&self, _model: &str, messages: &[Turn]) -> Result<String, RelayError> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("echo {}", messages.len()))
        }
    }

    fn relay() -> ConversationRelay<Echo> {
        ConversationRelay::new(Echo {
            calls: Cell::new(0),
        })
    }

    #[test]
    fn empty_model_is_rejected_without_a_call() {
        let relay = relay();
        let err = relay.send_turn("  ", &[Turn::user("hi")]).unwrap_err();
        assert_eq!(err.kind(), RelayErrorKind::InvalidRequest);
        assert_eq!(relay.backend().calls.get(), 0);
    }

    #[test]
    fn transcript_must_end_with_user_turn() {
        let relay = relay();
        assert!(relay.send_turn("m", &[]).is_err());
        let err = relay
            .send_turn("m", &[Turn::user("hi"), Turn::assistant("yo", None)])
            .unwrap_err();
        assert_eq!(err.kind(), RelayErrorKind::InvalidRequest);
        assert_eq!(relay.backend().calls.get(), 0);
    }

    #[test]
    fn full_transcript_is_sent_and_timed() {
        let relay = relay();
        let transcript = [
            Turn::user("a"),
            Turn::assistant("b", Some("m")),
            Turn::user("c"),
        ];
        let reply = relay.send_turn("m", &transcript).unwrap();
        assert_eq!(reply.content, "echo 3");
        assert!(reply.elapsed_secs >= 0.0);
        assert_eq!(relay.backend().calls.get(), 1);
    }
}
