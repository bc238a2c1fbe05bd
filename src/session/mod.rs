//! One user's chat session: transcript, relay, and metrics wired together.
//!
//! A submission runs in two halves around the relay call. [`ChatSession::begin`]
//! appends the user turn and captures a [`TurnTicket`];
//! [`ChatSession::complete`] takes the relay result and either records it or
//! throws it away. Results whose ticket no longer matches the active session
//! (the user switched models while the call was in flight) are discarded
//! without touching the transcript or the metrics. A failed call records no
//! metrics and removes the pending user turn again.

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{ChatBackend, ModelInfo};
use crate::metrics::{DisplayStats, MetricsAggregator};
use crate::relay::{ConversationRelay, RelayError, RelayReply};
use crate::transcript::{TranscriptController, TurnTicket};
use crate::utils::token_counter::count_tokens;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no model selected")]
    NoModelSelected,

    #[error("message is empty")]
    EmptyInput,

    /// The session changed while the request was in flight.
    #[error("response for '{0}' arrived after the session changed")]
    Superseded(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl SessionError {
    /// Short text shown inline in place of the assistant turn.
    pub fn display_message(&self) -> String {
        match self {
            Self::Relay(e) => e.display_message(),
            other => format!("[Error: {other}]"),
        }
    }
}

/// A user turn that has been appended and is waiting for its reply.
#[derive(Debug)]
pub struct PendingTurn {
    ticket: TurnTicket,
}

impl PendingTurn {
    pub fn model(&self) -> &str {
        &self.ticket.model
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub model: String,
    pub content: String,
    pub elapsed_secs: f64,
    pub tokens: usize,
    pub stats: DisplayStats,
}

pub struct ChatSession<B> {
    relay: ConversationRelay<B>,
    metrics: MetricsAggregator,
    transcript: TranscriptController,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(relay: ConversationRelay<B>, metrics: MetricsAggregator) -> Self {
        Self {
            relay,
            metrics,
            transcript: TranscriptController::new(),
        }
    }

    /// Start a fresh transcript for `model`.
    pub fn select_model(&mut self, model: &str) {
        info!(model, "model selected");
        self.transcript.switch_model(model);
    }

    /// Fetch the backend's model list and refresh the recorded sizes.
    pub fn refresh_models(&mut self) -> Result<Vec<ModelInfo>, RelayError> {
        let models = self.relay.fetch_models()?;
        self.metrics.record_model_sizes(&models);
        Ok(models)
    }

    /// Append the user's message and return the ticket for its reply.
    pub fn begin(&mut self, text: &str) -> Result<PendingTurn, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let ticket = self.transcript.ticket().ok_or(SessionError::NoModelSelected)?;
        self.transcript.append_user(text);
        Ok(PendingTurn { ticket })
    }

    /// Apply the relay result for `pending`.
    pub fn complete(
        &mut self,
        pending: PendingTurn,
        result: Result<RelayReply, RelayError>,
    ) -> Result<TurnOutcome, SessionError> {
        let model = pending.ticket.model.clone();

        if !self.transcript.is_current(&pending.ticket) {
            warn!(model, "discarding response for a superseded session");
            return Err(SessionError::Superseded(model));
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                self.transcript.abandon_pending_user();
                return Err(e.into());
            }
        };

        let tokens = match self.metrics.record_turn(&model, &reply.content, reply.elapsed_secs) {
            Some(sample) => sample.tokens,
            None => count_tokens(&reply.content),
        };
        self.transcript.append_assistant(reply.content.clone(), Some(&model));

        Ok(TurnOutcome {
            stats: self.metrics.summarize(&model),
            model,
            content: reply.content,
            elapsed_secs: reply.elapsed_secs,
            tokens,
        })
    }

    /// Run one full turn: append, relay, record.
    pub fn submit(&mut self, text: &str) -> Result<TurnOutcome, SessionError> {
        let pending = self.begin(text)?;
        let result = self
            .relay
            .send_turn(pending.model(), self.transcript.current());
        self.complete(pending, result)
    }

    /// Record a vote for `model` and return its refreshed summary.
    pub fn vote(&mut self, model: &str, good: bool) -> DisplayStats {
        self.metrics.record_vote(model, good);
        self.metrics.summarize(model)
    }

    pub fn reset_metrics(&mut self) {
        info!("metrics reset");
        self.metrics.reset();
    }

    pub fn transcript(&self) -> &TranscriptController {
        &self.transcript
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    pub fn relay(&self) -> &ConversationRelay<B> {
        &self.relay
    }
}
