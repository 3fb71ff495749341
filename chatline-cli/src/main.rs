//! CLI entry point for chatline

mod chat;
mod render;

use anyhow::Result;
use chatline_core::config::validate::validate_config;
use chatline_core::config::{Config, ConfigLoader, MAX_QUICK_ACTIONS};
use chatline_core::logging::init_logging;
use chatline_core::utils::{ensure_dir, expand_tilde};
use chatline_core::{ConversationSession, MemoryStore, SessionOptions};
use chatline_core::{HttpResponder, KeyValueStore, Responder};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chatline")]
#[command(about = "A terminal chat widget backed by a remote responder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Keep the conversation in memory only
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a chatline configuration interactively
    Onboard,
    /// Open the interactive chat widget
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message to send
        #[arg(short, long)]
        message: String,
    },
    /// Clear the conversation
    New {
        /// Also start a fresh session id
        #[arg(short, long)]
        rotate: bool,
    },
    /// Export the conversation as JSON
    Export {
        /// Output file or directory; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the stored conversation
    History,
    /// Show status information
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    if let Commands::Onboard = cli.command {
        return run_onboard(&config_loader).await;
    }

    let config = config_loader.load()?;
    let _log_guard = init_logging(&config.logging);
    let session = open_session(&config, cli.ephemeral)?;
    let brand = config.widget.brand_name.as_str();

    match cli.command {
        Commands::Onboard => {}
        Commands::Chat => {
            info!("Starting chat");
            chat::run(&session, &config).await?;
        }
        Commands::Send { message } => {
            info!("Sending one-shot message");
            if message.trim().is_empty() {
                warn!("No message provided");
                println!("Use --message to provide a message");
                println!("Example: chatline send --message 'Hello!'");
            } else {
                chat::exchange(&session, &message, brand).await;
            }
        }
        Commands::New { rotate } => {
            info!("Starting new conversation (rotate: {})", rotate);
            session.start_new_session(rotate);
            println!("{}", style("Conversation cleared").green());
            if rotate {
                println!("Session: {}", session.session_id());
            }
        }
        Commands::Export { output } => {
            info!("Exporting conversation");
            match output {
                Some(target) => {
                    let path = chat::export_to(&session, brand, Some(&target))?;
                    println!("{} {}", style("Exported to").green(), path.display());
                }
                None => println!("{}", session.export_session().to_json_pretty()?),
            }
        }
        Commands::History => {
            render::print_thread(&session.messages(), brand);
        }
        Commands::Status => {
            run_status(&config_loader, &config, &session, cli.ephemeral);
        }
    }

    Ok(())
}

fn open_session(config: &Config, ephemeral: bool) -> Result<ConversationSession> {
    if !ephemeral {
        return Ok(ConversationSession::from_config(config)?);
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let responder: Arc<dyn Responder> = Arc::new(HttpResponder::from_config(&config.responder)?);
    Ok(ConversationSession::initialize(
        store,
        responder,
        SessionOptions::from_config(config),
    ))
}

/// Run the onboard wizard
async fn run_onboard(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to chatline!").bold().cyan());
    println!("Let's set up your chat widget.\n");

    let config_path = loader.config_path();
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Onboard cancelled.");
            return Ok(());
        }
    }

    let mut config = Config::default();

    config.responder.endpoint = Input::new()
        .with_prompt("Responder endpoint")
        .default(config.responder.endpoint.clone())
        .interact_text()?;

    config.widget.brand_name = Input::new()
        .with_prompt("Brand name")
        .default(config.widget.brand_name.clone())
        .interact_text()?;

    config.widget.welcome_message = Input::new()
        .with_prompt("Welcome message")
        .default(config.widget.welcome_message.clone())
        .interact_text()?;

    let actions: String = Input::new()
        .with_prompt(format!(
            "Quick actions (comma separated, up to {})",
            MAX_QUICK_ACTIONS
        ))
        .default(config.widget.quick_actions.join(", "))
        .interact_text()?;
    config.widget.quick_actions = parse_quick_actions(&actions);

    config.session.typing_indicator = Confirm::new()
        .with_prompt("Show a typing indicator while waiting?")
        .default(true)
        .interact()?;

    validate_config(&config)?;
    loader.save(&config)?;
    ensure_dir(expand_tilde(&config.storage.dir))?;

    println!(
        "\n{} Configuration saved to {}",
        style("✓").green(),
        config_path.display()
    );
    println!("Start chatting with: {}", style("chatline chat").cyan());
    Ok(())
}

fn parse_quick_actions(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn run_status(loader: &ConfigLoader, config: &Config, session: &ConversationSession, ephemeral: bool) {
    println!("{}", style("chatline status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    let config_state = if loader.config_path().exists() {
        style("found").green()
    } else {
        style("defaults").dim()
    };
    println!(
        "  Config file: {} ({})",
        loader.config_path().display(),
        config_state
    );
    println!("  Endpoint: {}", config.responder.endpoint);
    match config.responder.timeout_secs {
        Some(secs) => println!("  Timeout: {}s", secs),
        None => println!("  Timeout: none"),
    }
    println!();

    println!("{}", style("Storage:").bold());
    if ephemeral {
        println!("  Store: {}", style("in memory").yellow());
    } else {
        println!("  Store: {}", expand_tilde(&config.storage.dir).display());
    }
    println!();

    println!("{}", style("Session:").bold());
    println!("  Id: {}", session.session_id());
    println!("  Messages: {}", session.regular_messages().len());
    println!("  Widget: {}", config.widget.brand_name);
}
