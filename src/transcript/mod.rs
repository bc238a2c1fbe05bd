//! In-memory transcript for the active model session.
//!
//! The controller is a thin ordered buffer: it never validates role
//! alternation, callers append a user turn, wait for the relay, then append
//! the assistant turn. Switching models discards the buffer unconditionally.
//! Nothing here is persisted; only the metrics catalog survives a restart.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Model that produced an assistant turn. The UI attaches rating controls
    /// to turns that carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            origin: None,
        }
    }

    pub fn assistant(content: impl Into<String>, origin: Option<&str>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            origin: origin.map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Where the session is in its request/response loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NoModelSelected,
    ModelSelected,
    AwaitingResponse,
}

/// Identifies the session an in-flight request was issued for.
///
/// The epoch changes on every [`TranscriptController::switch_model`], so a
/// ticket taken before A→B→A is no longer current even though the model name
/// matches again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTicket {
    pub model: String,
    epoch: u64,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TranscriptController {
    model: Option<String>,
    turns: Vec<Turn>,
    epoch: u64,
}

impl TranscriptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the current transcript and start an empty one for `model`.
    pub fn switch_model(&mut self, model: impl Into<String>) {
        self.model = Some(model.into());
        self.turns.clear();
        self.epoch += 1;
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Append an assistant turn, optionally tagged with the model that
    /// produced it.
    pub fn append_assistant(&mut self, content: impl Into<String>, origin: Option<&str>) {
        self.turns.push(Turn::assistant(content, origin));
    }

    /// Remove a trailing user turn whose response never arrived.
    pub fn abandon_pending_user(&mut self) -> Option<Turn> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => self.turns.pop(),
            _ => None,
        }
    }

    pub fn current(&self) -> &[Turn] {
        &self.turns
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn state(&self) -> SessionState {
        match (&self.model, self.turns.last()) {
            (None, _) => SessionState::NoModelSelected,
            (Some(_), Some(turn)) if turn.role == Role::User => SessionState::AwaitingResponse,
            (Some(_), _) => SessionState::ModelSelected,
        }
    }

    /// Capture the session identity for a request about to be issued.
    pub fn ticket(&self) -> Option<TurnTicket> {
        self.model.as_ref().map(|model| TurnTicket {
            model: model.clone(),
            epoch: self.epoch,
        })
    }

    /// Whether a result issued under `ticket` still belongs to this session.
    pub fn is_current(&self, ticket: &TurnTicket) -> bool {
        self.epoch == ticket.epoch && self.model.as_deref() == Some(ticket.model.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_controller_has_no_model() {
        let t = TranscriptController::new();
        assert_eq!(t.state(), SessionState::NoModelSelected);
        assert!(t.current().is_empty());
        assert!(t.ticket().is_none());
    }

    #[test]
    fn state_follows_turn_loop() {
        let mut t = TranscriptController::new();
        t.switch_model("llama3");
        assert_eq!(t.state(), SessionState::ModelSelected);

        t.append_user("hi");
        assert_eq!(t.state(), SessionState::AwaitingResponse);

        t.append_assistant("hello", Some("llama3"));
        assert_eq!(t.state(), SessionState::ModelSelected);
        assert_eq!(t.current().len(), 2);
        assert_eq!(t.current()[1].origin.as_deref(), Some("llama3"));
    }

    #[test]
    fn switching_back_does_not_restore_transcript() {
        let mut t = TranscriptController::new();
        t.switch_model("a");
        t.append_user("one");
        t.append_assistant("two", Some("a"));

        t.switch_model("b");
        t.switch_model("a");
        assert!(t.current().is_empty());
        assert_eq!(t.model(), Some("a"));
    }

    #[test]
    fn ticket_is_invalidated_by_round_trip_switch() {
        let mut t = TranscriptController::new();
        t.switch_model("a");
        let ticket = t.ticket().unwrap();
        assert!(t.is_current(&ticket));

        t.switch_model("b");
        assert!(!t.is_current(&ticket));
        t.switch_model("a");
        assert!(!t.is_current(&ticket));
    }

    #[test]
    fn abandon_only_removes_trailing_user_turn() {
        let mut t = TranscriptController::new();
        t.switch_model("a");
        assert!(t.abandon_pending_user().is_none());

        t.append_user("q");
        t.append_assistant("r", None);
        assert!(t.abandon_pending_user().is_none());
        assert_eq!(t.current().len(), 2);

        t.append_user("q2");
        let removed = t.abandon_pending_user().unwrap();
        assert_eq!(removed.content, "q2");
        assert_eq!(t.current().len(), 2);
    }

    #[test]
    fn turn_serializes_lowercase_role_without_empty_origin() {
        let json = serde_json::to_string(&Turn::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
