//! Terminal rendering for the welcome screen and message thread

use chatline_core::config::WidgetConfig;
use chatline_core::{Message, RegularMessage, Sender};
use chrono::Local;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn print_welcome(widget: &WidgetConfig) {
    println!();
    println!("{}", style(&widget.brand_name).bold().green());
    println!("{}", widget.welcome_message);
    println!();
}

/// Thread header: brand, presence and the session in use
pub fn print_header(brand: &str, session_id: &str) {
    println!(
        "\n{} {}  {}",
        style(brand).bold(),
        style("Online").green(),
        style(session_id).dim()
    );
    println!(
        "{}",
        style("/new  /rotate  /export [path]  /history  /home  /quit  (//text sends /text)").dim()
    );
}

pub fn print_message(message: &RegularMessage, brand: &str) {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    let author = match message.sender {
        Sender::User => style("You".to_string()).bold().cyan(),
        Sender::Bot => style(brand.to_string()).bold().green(),
    };
    println!("{} {}: {}", style(time).dim(), author, message.content);
}

pub fn print_thread(messages: &[Message], brand: &str) {
    if !messages.iter().any(|m| m.as_regular().is_some()) {
        println!(
            "{}",
            style("Start a conversation by typing a message below").dim()
        );
        return;
    }

    for message in messages {
        match message {
            Message::Regular(msg) => print_message(msg, brand),
            Message::Typing(_) => println!("{}", style(format!("{} is typing...", brand)).dim()),
        }
    }
}

/// Spinner standing in for the typing indicator while a reply is pending
pub fn typing_spinner(brand: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(spinner_style);
    spinner.set_message(format!("{} is typing...", brand));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
