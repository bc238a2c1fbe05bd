/// Integration tests for the layered configuration.
///
/// Layers are resolved through `config::load_from` with files in a temp
/// directory and an in-memory env map, so nothing reads the real home
/// directory, working directory, or process environment.
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use ola::config::{self, OlaConfig};

struct Layers {
    _dir: tempfile::TempDir,
    global: PathBuf,
    project: PathBuf,
}

fn layers(global: &str, project: &str) -> Layers {
    let dir = tempfile::tempdir().unwrap();
    let global_path = dir.path().join("home").join(".ola").join("config.toml");
    fs::create_dir_all(global_path.parent().unwrap()).unwrap();
    fs::write(&global_path, global).unwrap();
    let project_path = dir.path().join(".ola.toml");
    fs::write(&project_path, project).unwrap();
    Layers {
        _dir: dir,
        global: global_path,
        project: project_path,
    }
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn no_env(_: &str) -> Option<String> {
    None
}

// ---------------------------------------------------------------------------
// File layering
// ---------------------------------------------------------------------------

#[test]
fn project_file_merges_over_global() {
    let l = layers(
        "[backend]\nollama_url = \"http://gpu-box:11434\"\n\n[metrics]\nwindow = 20\n",
        "[metrics]\nwindow = 3\n",
    );
    let cfg = config::load_from(Some(l.global.as_path()), Some(l.project.as_path()), no_env);

    assert_eq!(cfg.backend.ollama_url, "http://gpu-box:11434");
    assert_eq!(cfg.metrics.window, 3);
    assert_eq!(cfg.backend.timeout_ms, 120_000);
    assert_eq!(cfg.server.addr, "127.0.0.1:3000");
}

#[test]
fn missing_files_yield_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config::load_from(
        Some(dir.path().join("absent.toml").as_path()),
        Some(dir.path().join(".ola.toml").as_path()),
        no_env,
    );
    assert_eq!(cfg, OlaConfig::default());
}

#[test]
fn malformed_project_file_is_skipped() {
    let l = layers(
        "[server]\naddr = \"0.0.0.0:4000\"\n",
        "[metrics]\nwindow = \"ten\"\n",
    );
    let cfg = config::load_from(Some(l.global.as_path()), Some(l.project.as_path()), no_env);
    assert_eq!(cfg.server.addr, "0.0.0.0:4000");
    assert_eq!(cfg.metrics.window, 10);
}

// ---------------------------------------------------------------------------
// Environment layer
// ---------------------------------------------------------------------------

#[test]
fn env_vars_override_every_file() {
    let l = layers(
        "[backend]\nollama_url = \"http://gpu-box:11434\"\n",
        "[server]\naddr = \"127.0.0.1:9000\"\nopen_browser = true\n",
    );
    let env = env_from(&[
        ("OLA_ADDR", "0.0.0.0:8080"),
        ("OLA_OPEN_BROWSER", "0"),
        ("OLA_OLLAMA_URL", "http://other:11434"),
        ("OLA_TIMEOUT_MS", "5000"),
        ("OLA_METRICS_WINDOW", "25"),
        ("OLA_METRICS_PATH", "/tmp/ola-metrics.json"),
        ("OLA_LOG", "debug"),
    ]);
    let cfg = config::load_from(Some(l.global.as_path()), Some(l.project.as_path()), env);

    assert_eq!(cfg.server.addr, "0.0.0.0:8080");
    assert!(!cfg.server.open_browser);
    assert_eq!(cfg.backend.ollama_url, "http://other:11434");
    assert_eq!(cfg.backend.timeout_ms, 5000);
    assert_eq!(cfg.metrics.window, 25);
    assert_eq!(cfg.metrics.store_path, "/tmp/ola-metrics.json");
    assert_eq!(cfg.logging.level, "debug");
}

#[test]
fn invalid_env_values_keep_file_values() {
    let l = layers(
        "[backend]\ntimeout_ms = 30000\n",
        "[metrics]\nwindow = 7\n",
    );
    let env = env_from(&[
        ("OLA_METRICS_WINDOW", "0"),
        ("OLA_TIMEOUT_MS", "soon"),
        ("OLA_OLLAMA_URL", ""),
    ]);
    let cfg = config::load_from(Some(l.global.as_path()), Some(l.project.as_path()), env);

    assert_eq!(cfg.metrics.window, 7);
    assert_eq!(cfg.backend.timeout_ms, 30_000);
    assert_eq!(cfg.backend.ollama_url, "http://127.0.0.1:11434");
}

// ---------------------------------------------------------------------------
// Default file
// ---------------------------------------------------------------------------

#[test]
fn default_toml_parses_back_to_defaults() {
    let parsed: OlaConfig = toml::from_str(&OlaConfig::default_toml()).unwrap();
    assert_eq!(parsed.server.addr, "127.0.0.1:3000");
    assert_eq!(parsed.backend.ollama_url, "http://127.0.0.1:11434");
    assert_eq!(parsed.backend.timeout_ms, 120_000);
    assert_eq!(parsed.metrics.window, 10);
    assert!(parsed.metrics.store_path.is_empty());
}

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let parsed: OlaConfig = toml::from_str("[metrics]\nwindow = 4\n").unwrap();
    assert_eq!(parsed.metrics.window, 4);
    assert_eq!(parsed.server.addr, "127.0.0.1:3000");
    assert_eq!(parsed.logging.level, "info");
}
