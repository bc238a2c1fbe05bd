//! CLI command implementations for ola.
//!
//! Provides subcommand handlers for:
//! - `ola serve` : run the chat UI and JSON API
//! - `ola models` : list the backend's models
//! - `ola chat --model M "prompt"` : one-shot turn with metrics recorded
//! - `ola vote <model> [--bad]` : rate a model
//! - `ola stats` : per-model metrics table
//! - `ola reset` : clear all metrics
//! - `ola health` : check config, Ollama, and the metrics store
//! - `ola config show|init` : configuration management

use anyhow::{Context, Result};
use colored::Colorize;

use crate::backend::{ChatBackend, OllamaClient};
use crate::config::{self, OlaConfig};
use crate::metrics::{DisplayStats, MetricsAggregator, StatsStore, display::format_size};
use crate::relay::ConversationRelay;
use crate::session::ChatSession;
use crate::web;

/// Output format for the stats command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Build the metrics aggregator from the resolved config.
fn open_metrics(cfg: &OlaConfig) -> MetricsAggregator {
    MetricsAggregator::load(StatsStore::from_config(&cfg.metrics), cfg.metrics.window)
}

/// Build a full session against the configured Ollama endpoint.
fn open_session(cfg: &OlaConfig) -> ChatSession<OllamaClient> {
    let relay = ConversationRelay::new(OllamaClient::from_config(&cfg.backend));
    ChatSession::new(relay, open_metrics(cfg))
}

// ---------------------------------------------------------------------------
// ola serve
// ---------------------------------------------------------------------------

/// Run the web server until the process is stopped.
pub fn run_serve(cfg: &OlaConfig, addr: Option<String>, no_browser: bool) -> Result<()> {
    let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
    let open_browser = cfg.server.open_browser && !no_browser;
    let mut session = open_session(cfg);
    web::serve(&addr, open_browser, &mut session)
}

// ---------------------------------------------------------------------------
// ola models
// ---------------------------------------------------------------------------

/// List the models the backend has installed.
pub fn run_models(cfg: &OlaConfig) -> Result<()> {
    let mut session = open_session(cfg);
    let models = session
        .refresh_models()
        .with_context(|| format!("failed to list models from {}", cfg.backend.ollama_url))?;

    if models.is_empty() {
        println!("{}", "No models installed. Try `ollama pull llama3.2`.".yellow());
        return Ok(());
    }

    println!("{}", "Available Models".bold().cyan());
    println!("{}", "=".repeat(50));
    for m in &models {
        let size = m.size.map(format_size).unwrap_or_else(|| "-".to_string());
        println!("  {:<36} {:>10}", truncate(&m.name, 36), size.dimmed());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ola chat
// ---------------------------------------------------------------------------

/// Send one prompt to `model` and print the reply with its refreshed stats.
pub fn run_chat(cfg: &OlaConfig, model: &str, prompt: &str) -> Result<()> {
    let mut session = open_session(cfg);
    session.select_model(model);

    match session.submit(prompt) {
        Ok(outcome) => {
            println!("{}", outcome.content);
            println!();
            println!(
                "  {} {:.2}s, {} tokens",
                "Turn:".dimmed(),
                outcome.elapsed_secs,
                outcome.tokens
            );
            print_summary_line(model, &outcome.stats);
            Ok(())
        }
        Err(e) => anyhow::bail!("{}", e.display_message()),
    }
}

// ---------------------------------------------------------------------------
// ola vote
// ---------------------------------------------------------------------------

/// Record a thumbs up (or down with `bad`) for `model`.
pub fn run_vote(cfg: &OlaConfig, model: &str, bad: bool) -> Result<()> {
    let mut metrics = open_metrics(cfg);
    metrics.record_vote(model, !bad);
    println!(
        "{} Recorded {} vote for {}",
        "✓".green().bold(),
        if bad { "bad".red() } else { "good".green() },
        model.bold()
    );
    print_summary_line(model, &metrics.summarize(model));
    Ok(())
}

// ---------------------------------------------------------------------------
// ola stats
// ---------------------------------------------------------------------------

/// Show the per-model metrics table.
pub fn run_stats(cfg: &OlaConfig, format: OutputFormat) -> Result<()> {
    let rows = open_metrics(cfg).summarize_all();

    if rows.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No data yet. Chat with a model to collect metrics.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_stats_json(&rows)?,
        OutputFormat::Csv => print_stats_csv(&rows),
        OutputFormat::Table => print_stats_table(&rows),
    }
    Ok(())
}

fn print_stats_table(rows: &[(String, DisplayStats)]) {
    println!("{}", "Model Metrics".bold().cyan());
    println!("{}", "=".repeat(94));
    println!(
        "  {:<28} {:>10} {:>12} {:>10} {:>7} {:>21}",
        "Model", "Size", "Avg latency", "Tokens/s", "Rating", "Last used"
    );
    println!("  {}", "-".repeat(92));

    for (i, (model, s)) in rows.iter().enumerate() {
        let line = format!(
            "  {:<28} {:>10} {:>12} {:>10} {:>7} {:>21}",
            truncate(model, 28),
            s.size,
            s.avg_latency,
            s.avg_throughput,
            s.rating,
            s.last_used,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_stats_json(rows: &[(String, DisplayStats)]) -> Result<()> {
    let value: Vec<_> = rows
        .iter()
        .map(|(model, s)| {
            serde_json::json!({
                "model": model,
                "size": s.size,
                "avg_latency": s.avg_latency,
                "avg_throughput": s.avg_throughput,
                "rating": s.rating,
                "last_used": s.last_used,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_stats_csv(rows: &[(String, DisplayStats)]) {
    println!("model,size,avg_latency,avg_throughput,rating,last_used");
    for (model, s) in rows {
        println!(
            "{},{},{},{},{},{}",
            csv_field(model),
            s.size,
            s.avg_latency,
            s.avg_throughput,
            s.rating,
            s.last_used
        );
    }
}

// ---------------------------------------------------------------------------
// ola reset
// ---------------------------------------------------------------------------

/// Clear every model's metrics.
pub fn run_reset(cfg: &OlaConfig) -> Result<()> {
    let mut metrics = open_metrics(cfg);
    let cleared = metrics.catalog().len();
    metrics.reset();

    if metrics.store().is_degraded() {
        println!(
            "{} Metrics cleared in memory but the store could not be written",
            "✗".red().bold()
        );
    } else {
        println!(
            "{} Cleared metrics for {} model(s)",
            "✓".green().bold(),
            cleared
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ola health
// ---------------------------------------------------------------------------

/// Check config files, Ollama reachability, and the metrics store.
pub fn run_health(cfg: &OlaConfig) -> Result<()> {
    println!("{}", "ola Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.ola/config.toml found"
        } else {
            "not found (run `ola config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".ola.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = OllamaClient::from_config(&cfg.backend);
    let ollama_ok = client.is_healthy();
    let ollama_detail = if ollama_ok {
        format!("reachable at {}", client.base_url())
    } else {
        format!("not reachable at {} (is Ollama running?)", client.base_url())
    };
    print_health_item("Ollama", ollama_ok, &ollama_detail);

    let metrics = open_metrics(cfg);
    let store = metrics.store();
    let store_detail = match store.path() {
        Some(path) if store.is_degraded() => format!("{} (unreadable)", path.display()),
        Some(path) => format!(
            "{} ({} model(s) tracked)",
            path.display(),
            metrics.catalog().len()
        ),
        None => "no home directory, in-memory only".to_string(),
    };
    print_health_item("Metrics store", !store.is_degraded(), &store_detail);
    print_health_item(
        "Metrics window",
        true,
        &format!("last {} turn(s)", metrics.window()),
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// ola config show | init
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective ola Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.ola/config.toml", global_exists);
    print_source(".ola.toml", project_exists);
    println!("  {} {}", "·".dimmed(), "OLA_* environment variables".dimmed());

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.ola/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to customize ola.".dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn print_summary_line(model: &str, s: &DisplayStats) {
    println!(
        "  {} | Size: {} | Avg Latency: {} | Tokens/sec: {} | Rating: {}",
        model.bold(),
        s.size,
        s.avg_latency,
        s.avg_throughput,
        s.rating
    );
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// Quote a CSV field when it contains a separator, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("llamä3:70b", 6), "llamä…");
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("llama3:8b"), "llama3:8b");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }
}
