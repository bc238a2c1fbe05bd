/// Configuration schema and defaults for ola.
///
/// Defines the TOML-serializable configuration structure with the
/// `[server]`, `[backend]`, `[metrics]`, and `[logging]` sections. Every field
/// has a built-in default, so a config file only needs the values it changes.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metrics::DEFAULT_WINDOW;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level ola configuration.
///
/// Maps directly to `~/.ola/config.toml` and `.ola.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlaConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `ola serve`.
    pub addr: String,
    /// Open the UI in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Model-serving backend (Ollama) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Ollama HTTP base URL.
    pub ollama_url: String,
    /// Timeout for list and chat requests (milliseconds). Local models can
    /// take a long time on first load.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://127.0.0.1:11434".to_string(),
            timeout_ms: 120_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [metrics]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Number of recent turns averaged per model.
    pub window: usize,
    /// Metrics file. Empty means `~/.ola/metrics.json`; `~` is expanded.
    pub store_path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            store_path: String::new(),
        }
    }
}

impl MetricsConfig {
    /// Resolve `store_path`, or `None` to use the default location.
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        let raw = self.store_path.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return Some(home.join(rest));
        }
        Some(PathBuf::from(raw))
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset: `"error"`, `"warn"`,
    /// `"info"`, `"debug"`, `"trace"`, or a full filter directive.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl OlaConfig {
    /// The commented default config written by `ola config init`.
    pub fn default_toml() -> String {
        r#"# ola configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (OLA_*)
#   2. Project config (.ola.toml in current directory)
#   3. User global config (~/.ola/config.toml)
#   4. Built-in defaults

[server]
addr = "127.0.0.1:3000"
open_browser = true

[backend]
ollama_url = "http://127.0.0.1:11434"
timeout_ms = 120000                   # Whole chat round trip, non-streaming

[metrics]
window = 10                           # Recent turns averaged per model
store_path = ""                       # Empty -> ~/.ola/metrics.json

[logging]
level = "info"                        # Overridden by RUST_LOG
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
