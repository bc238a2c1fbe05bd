/// Configuration system for ola.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::OlaConfig::default()`]
/// 2. **User global config**: `~/.ola/config.toml`
/// 3. **Project local config**: `.ola.toml` in the current working directory
/// 4. **Environment variables**: `OLA_*` overrides (highest precedence)
///
/// Malformed files are skipped, never fatal.
///
/// # Usage
///
/// ```rust,ignore
/// let cfg = ola::config::load();
/// let client = OllamaClient::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::OlaConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> OlaConfig {
    load_from(
        global_config_path().as_deref(),
        project_config_path().as_deref(),
        |key| std::env::var(key).ok(),
    )
}

/// Resolve the configuration from explicit file locations and an env lookup.
///
/// Files are merged key by key, so a project file that sets one value keeps
/// everything else the global file set.
pub fn load_from(
    global: Option<&Path>,
    project: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> OlaConfig {
    let mut merged = toml::Table::new();
    for layer in [global, project].into_iter().flatten() {
        if let Some(table) = load_toml_file(layer) {
            merge_tables(&mut merged, table);
        }
    }

    let mut config: OlaConfig = toml::Value::Table(merged).try_into().unwrap_or_default();
    apply_env_overrides(&mut config, env);
    config
}

/// Read one config file as a raw TOML table.
///
/// Returns `None` if the file doesn't exist, isn't TOML, or doesn't fit the
/// schema.
fn load_toml_file(path: &Path) -> Option<toml::Table> {
    let content = fs::read_to_string(path).ok()?;
    let table: toml::Table = toml::from_str(&content).ok()?;
    toml::Value::Table(table.clone()).try_into::<OlaConfig>().ok()?;
    Some(table)
}

/// Deep-merge `overlay` into `base`. Nested tables merge recursively; any
/// other value in the overlay replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => {
                if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                    merge_tables(base_table, overlay_table);
                } else {
                    base.insert(key, toml::Value::Table(overlay_table));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ola").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".ola.toml"))
}

/// Path to the global config file, for display and init.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `OLA_ADDR`: server listen address
/// - `OLA_OPEN_BROWSER`: open the UI on start (`1`/`true`/`yes`/`on`)
/// - `OLA_OLLAMA_URL`: Ollama endpoint URL
/// - `OLA_TIMEOUT_MS`: backend request timeout
/// - `OLA_METRICS_WINDOW`: rolling window length (must be at least 1)
/// - `OLA_METRICS_PATH`: metrics file
/// - `OLA_LOG`: default log filter
fn apply_env_overrides(config: &mut OlaConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(val) = env("OLA_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Some(val) = env("OLA_OPEN_BROWSER") {
        config.server.open_browser = is_truthy(&val);
    }

    if let Some(val) = env("OLA_OLLAMA_URL")
        && !val.is_empty()
    {
        config.backend.ollama_url = val;
    }
    if let Some(val) = env("OLA_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }

    if let Some(val) = env("OLA_METRICS_WINDOW")
        && let Ok(window) = val.parse::<usize>()
        && window >= 1
    {
        config.metrics.window = window;
    }
    if let Some(val) = env("OLA_METRICS_PATH")
        && !val.is_empty()
    {
        config.metrics.store_path = val;
    }

    if let Some(val) = env("OLA_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.ola/config.toml`.
///
/// Returns an error if the file already exists and `force` is not set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.ola/ directory")?;
    }

    fs::write(&path, OlaConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    render_config(&load())
}

fn render_config(config: &OlaConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
