//! ola: a local chat front end for Ollama with per-model metrics.
//!
//! The binary wires these modules into a web server and a handful of CLI
//! commands; integration tests drive the same pipeline with fake backends.

pub mod backend;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod relay;
pub mod session;
pub mod transcript;
pub mod utils;
pub mod web;
