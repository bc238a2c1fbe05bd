//! Model-serving backends.
//!
//! The relay talks to a backend through [`ChatBackend`], so the pipeline can
//! run against the Ollama HTTP API in production and an in-process fake in
//! tests.

use serde::{Deserialize, Serialize};

use crate::relay::RelayError;
use crate::transcript::Turn;

pub mod ollama;

pub use ollama::OllamaClient;

/// A model advertised by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    /// Artifact size in bytes, when the backend reports it.
    #[serde(default)]
    pub size: Option<u64>,
}

pub trait ChatBackend {
    /// List the models available for chat.
    fn list_models(&self) -> Result<Vec<ModelInfo>, RelayError>;

    /// Run one non-streaming chat completion over the full transcript and
    /// return the assistant's reply.
    fn chat(&self, model: &str, messages: &[Turn]) -> Result<String, RelayError>;

    /// Cheap reachability probe.
    fn is_healthy(&self) -> bool {
        self.list_models().is_ok()
    }
}

impl<B: ChatBackend + ?Sized> ChatBackend for &B {
    fn list_models(&self) -> Result<Vec<ModelInfo>, RelayError> {
        (**self).list_models()
    }

    fn chat(&self, model: &str, messages: &[Turn]) -> Result<String, RelayError> {
        (**self).chat(model, messages)
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}
