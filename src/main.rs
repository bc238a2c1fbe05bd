use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ola::cli;
use ola::config;

#[derive(Debug, Parser)]
#[command(name = "ola")]
#[command(about = "Chat with local Ollama models and compare how they perform")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the chat UI and JSON API
    Serve {
        /// Listen address (default from config: 127.0.0.1:3000)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open the browser on start
        #[arg(long)]
        no_browser: bool,
    },
    /// List the models installed in Ollama
    Models,
    /// Send a single prompt to a model and record its metrics
    Chat {
        /// Model to talk to
        #[arg(long, short)]
        model: String,
        /// The prompt text
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },
    /// Rate a model (thumbs up unless --bad)
    Vote {
        model: String,
        #[arg(long)]
        bad: bool,
    },
    /// Show per-model metrics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Clear all recorded metrics
    Reset,
    /// Check config, Ollama reachability, and the metrics store
    Health,
    /// Inspect or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.ola/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();
    init_tracing(&cfg.logging.level);

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(&cfg, addr, no_browser),
        Commands::Models => cli::run_models(&cfg),
        Commands::Chat { model, prompt } => cli::run_chat(&cfg, &model, &prompt.join(" ")),
        Commands::Vote { model, bad } => cli::run_vote(&cfg, &model, bad),
        Commands::Stats { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&cfg, fmt)
        }
        Commands::Reset => cli::run_reset(&cfg),
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}

/// `RUST_LOG` wins; otherwise the configured level. Logs go to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
