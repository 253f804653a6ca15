use colored::Colorize;
use std::io::Write;
use std::path::Path;

use crate::core::session::{Role, Turn};

/// Prints the mascot ASCII art when the file is readable; a missing or
/// unreadable banner is skipped silently. Decoration only.
pub fn mascot_banner(path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(art) => {
            for line in art.lines() {
                println!("{}", line.bright_yellow());
            }
            println!();
        }
        Err(err) => log::debug!("no mascot banner at {}: {err}", path.display()),
    }
}

pub fn title() {
    println!("{}", "=== corebot ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask about the documents in your data folder. Type /help for commands.".bright_black()
    );
    println!();
}

pub fn greeting(name: &str) {
    println!(
        "{}",
        format!("Hello, {name}! What would you like to know?").bright_green()
    );
    println!();
}

pub fn info(message: &str) {
    println!("{}", message.bright_black());
}

pub fn help() {
    info("/history  replay the conversation so far");
    info("/reload   rescan the document folder before the next question");
    info("/help     show this list");
    info("/quit     end the session");
}

pub fn error_line(message: &str) {
    eprintln!("{}", format!("error: {message}").red());
}

pub fn user_bubble(content: &str) {
    println!("{}", "[you]".bright_magenta());
    for line in content.lines() {
        println!("{}", line.green());
    }
    println!();
}

pub fn assistant_bubble(content: &str) {
    assistant_prefix();
    for line in content.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

pub fn replay(history: &[Turn]) {
    if history.is_empty() {
        info("Nothing said yet.");
        return;
    }
    for turn in history {
        match turn.role {
            Role::User => user_bubble(&turn.content),
            Role::Assistant => assistant_bubble(&turn.content),
        }
    }
}

pub fn assistant_prefix() {
    println!("{}", "[corebot]".bright_magenta());
}

pub fn stream_chunk(text: &str) {
    print!("{}", text.bright_blue());
    let _ = std::io::stdout().flush();
}

pub fn end_stream() {
    println!();
    println!();
}

pub fn chart(series: &[f64]) {
    println!("{}", crate::adapters::chart::render(series));
    println!();
}

pub fn goodbye() {
    println!("{}", "Goodbye!".bright_green());
}
