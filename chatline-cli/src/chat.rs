//! Interactive chat loop

use crate::render;
use anyhow::Result;
use chatline_core::config::Config;
use chatline_core::{ConversationSession, Sender, SessionEvent};
use console::style;
use dialoguer::{Input, Select};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

/// Which screen the widget is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Chatting,
    Quit,
}

/// A line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Say(String),
    New,
    Rotate,
    Export(Option<PathBuf>),
    History,
    Home,
    Quit,
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        // "//text" sends "/text" verbatim.
        if let Some(literal) = trimmed.strip_prefix("//") {
            return ChatCommand::Say(format!("/{}", literal));
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return ChatCommand::Say(line.to_string());
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match name {
            "new" | "clear" => ChatCommand::New,
            "rotate" => ChatCommand::Rotate,
            "export" => ChatCommand::Export(arg.map(PathBuf::from)),
            "history" => ChatCommand::History,
            "home" | "back" => ChatCommand::Home,
            "quit" | "exit" | "q" => ChatCommand::Quit,
            other => ChatCommand::Unknown(other.to_string()),
        }
    }
}

/// Run the widget until the user quits
pub async fn run(session: &ConversationSession, config: &Config) -> Result<()> {
    let brand = config.widget.brand_name.as_str();
    let mut screen = if session.regular_messages().is_empty() {
        Screen::Welcome
    } else {
        render::print_header(brand, &session.session_id());
        render::print_thread(&session.messages(), brand);
        Screen::Chatting
    };

    while screen != Screen::Quit {
        screen = match screen {
            Screen::Welcome => welcome(session, config).await?,
            Screen::Chatting => chatting(session, config).await?,
            Screen::Quit => Screen::Quit,
        };
    }

    info!("Chat closed for session {}", session.session_id());
    Ok(())
}

async fn welcome(session: &ConversationSession, config: &Config) -> Result<Screen> {
    let brand = config.widget.brand_name.as_str();
    render::print_welcome(&config.widget);

    let mut items: Vec<String> = config.widget.quick_actions.clone();
    let type_own = items.len();
    items.push("Type a message".to_string());
    items.push("Quit".to_string());

    let choice = Select::new()
        .with_prompt("How can we help?")
        .items(&items)
        .default(0)
        .interact()?;

    if choice == type_own {
        render::print_header(brand, &session.session_id());
        render::print_thread(&session.messages(), brand);
        return Ok(Screen::Chatting);
    }
    if choice > type_own {
        return Ok(Screen::Quit);
    }

    render::print_header(brand, &session.session_id());
    exchange(session, &items[choice], brand).await;
    Ok(Screen::Chatting)
}

async fn chatting(session: &ConversationSession, config: &Config) -> Result<Screen> {
    let brand = config.widget.brand_name.as_str();
    let line: String = Input::new()
        .with_prompt(style("You").cyan().to_string())
        .allow_empty(true)
        .interact_text()?;

    let next = match ChatCommand::parse(&line) {
        ChatCommand::Say(text) => {
            exchange(session, &text, brand).await;
            Screen::Chatting
        }
        ChatCommand::New => {
            session.start_new_session(false);
            println!("{}", style("Conversation cleared").dim());
            Screen::Welcome
        }
        ChatCommand::Rotate => {
            session.start_new_session(true);
            println!(
                "{} {}",
                style("New session:").dim(),
                style(session.session_id()).dim()
            );
            Screen::Welcome
        }
        ChatCommand::Export(path) => {
            match export_to(session, brand, path.as_deref()) {
                Ok(written) => println!("{} {}", style("Exported to").green(), written.display()),
                Err(e) => println!("{} {}", style("Export failed:").red(), e),
            }
            Screen::Chatting
        }
        ChatCommand::History => {
            render::print_thread(&session.messages(), brand);
            Screen::Chatting
        }
        ChatCommand::Home => Screen::Welcome,
        ChatCommand::Quit => Screen::Quit,
        ChatCommand::Unknown(name) => {
            println!("{} /{}", style("Unknown command:").yellow(), name);
            Screen::Chatting
        }
    };
    Ok(next)
}

/// Send one message and print the reply when it lands
pub async fn exchange(session: &ConversationSession, text: &str, brand: &str) {
    let mut events = session.subscribe();
    let Some(handle) = session.send_message(text) else {
        debug!("Ignoring blank input");
        return;
    };

    let spinner = render::typing_spinner(brand);
    if let Err(e) = handle.await {
        warn!("Exchange task failed: {}", e);
    }
    spinner.finish_and_clear();

    loop {
        match events.try_recv() {
            Ok(SessionEvent::MessageAppended(message)) if message.sender == Sender::Bot => {
                render::print_message(&message, brand);
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("Missed {} session events", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

/// Write the session snapshot as pretty JSON
///
/// A directory target (or none) gets the default `<brand>-chat-<id>.json`
/// file name.
pub fn export_to(
    session: &ConversationSession,
    brand: &str,
    target: Option<&Path>,
) -> Result<PathBuf> {
    let snapshot = session.export_session();
    let path = match target {
        Some(p) if p.is_dir() => p.join(snapshot.file_name(brand)),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(snapshot.file_name(brand)),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, snapshot.to_json_pretty()?)?;
    info!("Exported {} messages to {}", snapshot.messages.len(), path.display());
    Ok(path)
}
