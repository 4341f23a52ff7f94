//! Terminal display utilities for the demo

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use parley_sync::{DirectorySnapshot, DisplayMessage};

/// Print the application banner
pub fn print_banner() {
    println!();
    println!(
        "{}",
        "╔═══════════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║        Parley - Real-time Room Sync Demo          ║".cyan()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════════╝".cyan()
    );
    println!();
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg.dimmed());
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg.red());
}

/// Print a section header
pub fn print_header(title: &str) {
    println!();
    println!("{}", "═".repeat(50).cyan());
    println!("  {}", title.cyan().bold());
    println!("{}", "═".repeat(50).cyan());
}

/// Format a millisecond timestamp as local wall-clock time
pub fn format_time(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(at) => {
            let local: DateTime<Local> = at.into();
            local.format("%H:%M:%S").to_string()
        }
        None => "--:--:--".to_string(),
    }
}

/// Print a chat message, highlighting the viewer's own
pub fn print_message(message: &DisplayMessage) {
    let sender = format!("{}:", message.author_name);
    let sender = if message.is_own_message {
        sender.cyan().bold()
    } else {
        sender.magenta().bold()
    };
    println!(
        "{} {} {}",
        format_time(message.sent_at).dimmed(),
        sender,
        message.body
    );
}

/// Print the room directory
pub fn print_directory(directory: &DirectorySnapshot) {
    if directory.is_empty() {
        println!("{}", "No rooms yet.".dimmed());
        return;
    }

    println!();
    println!("{}", "Rooms:".yellow().bold());
    println!("{}", "───────────────────────────────────────".dimmed());
    for (i, room) in directory.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).dimmed(), room.cyan().bold());
    }
    println!();
}
