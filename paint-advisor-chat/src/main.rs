//! Paint Advisor Chat
//!
//! Interactive terminal conversation with the paint advisor dialogue engine.
//! Lines starting with `/` are commands: `/reset`, `/slots`, `/quit`.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::*;
use tracing::info;

use paint_advisor::catalog::InMemoryCatalog;
use paint_advisor::config::AdvisorConfig;
use paint_advisor::dialogue::{new_session_id, DialogueEngine, InMemorySessionStore, SessionStore};
use paint_advisor::llm::{get_default_llm_provider, LlmProvider, LlmProviderFactory};

#[derive(Parser, Debug)]
#[command(name = "paint-advisor-chat")]
#[command(about = "Chat with the paint catalog advisor")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "PAINT_ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// JSON catalog of products
    #[arg(long, env = "PAINT_ADVISOR_CATALOG", default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Session to talk in (random when omitted)
    #[arg(long)]
    session_id: Option<String>,

    /// Never call a text generation provider
    #[arg(long, default_value = "false")]
    offline: bool,

    /// Print the full turn result as JSON after each reply
    #[arg(long, default_value = "false")]
    json: bool,
}

fn load_config(args: &Args) -> anyhow::Result<AdvisorConfig> {
    let config = match &args.config {
        Some(path) => {
            let mut config = AdvisorConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            config.apply_env_overrides()?;
            config
        }
        None => AdvisorConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn build_llm(config: &AdvisorConfig, offline: bool) -> anyhow::Result<Option<Arc<dyn LlmProvider>>> {
    if offline {
        return Ok(None);
    }
    match &config.llm {
        Some(llm_config) => Ok(Some(LlmProviderFactory::create_provider(llm_config.clone())?)),
        None => Ok(get_default_llm_provider()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paint_advisor=info".parse()?),
        )
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let catalog = InMemoryCatalog::from_json_file(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    info!("Loaded {} products from {}", catalog.len(), args.catalog.display());

    let llm = build_llm(&config, args.offline)?;
    match &llm {
        Some(provider) => {
            let provider_info = provider.get_info();
            info!("Text generation: {} ({})", provider_info.name, provider_info.model);
        }
        None => info!("Text generation disabled, using keyword rules and templates"),
    }

    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::new(config.dialogue.history_capacity));
    let engine = DialogueEngine::new(config, Arc::new(catalog), sessions.clone(), llm);
    let session_id = args
        .session_id
        .clone()
        .unwrap_or_else(new_session_id);

    println!("{}", "=========================================".blue());
    println!("{}", "            Paint Advisor Chat           ".blue().bold());
    println!("{}", "=========================================".blue());
    println!("Session: {}", session_id.green());
    println!("{}", "Commands: /reset, /slots, /quit".dimmed());
    println!("{}", "=========================================".blue());

    loop {
        print!("{} ", "You:".yellow().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                engine.reset(&session_id).await;
                println!("{}", "Conversation cleared.".dimmed());
                continue;
            }
            "/slots" => {
                let session = sessions.session(&session_id).await;
                let summary = session.lock().await.summary();
                println!("{}", summary.dimmed());
                continue;
            }
            _ => {}
        }

        match engine.handle_turn(&session_id, input).await {
            Ok(turn) => {
                println!("{} {}", "Advisor:".cyan().bold(), turn.reply);
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&turn)?.dimmed());
                }
            }
            Err(e) => println!("{} {}", "!".red(), e),
        }
    }

    Ok(())
}
