//! Operator-facing status lines.
//!
//! Everything the operator must read goes through here; diagnostics go
//! through `tracing` on stderr instead. Colour is dropped when `NO_COLOR`
//! is set.

use crate::utils::colors::{BLUE, GREEN, RED, RESET, YELLOW};
use std::fmt;
use std::sync::LazyLock;

const BOLD: &str = "\x1b[1m";

static PLAIN: LazyLock<bool> = LazyLock::new(|| std::env::var_os("NO_COLOR").is_some());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn icon(self) -> &'static str {
        match self {
            Level::Info => "ℹ️",
            Level::Success => "✅",
            Level::Warning => "⚠️",
            Level::Error => "❌",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Level::Info => BLUE,
            Level::Success => GREEN,
            Level::Warning => YELLOW,
            Level::Error => RED,
        }
    }
}

fn line(level: Level, msg: &dyn fmt::Display) -> String {
    if *PLAIN {
        format!("{} {}", level.icon(), msg)
    } else {
        format!("{}{BOLD}{}{RESET} {}", level.color(), level.icon(), msg)
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", line(Level::Info, &msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", line(Level::Success, &msg));
}

/// Warnings stay on stdout: confirmation prompts are warnings too.
pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", line(Level::Warning, &msg));
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", line(Level::Error, &msg));
}

pub fn header<T: fmt::Display>(msg: T) {
    if *PLAIN {
        println!("==== {msg}\n");
    } else {
        println!("{BLUE}{BOLD}==== {msg}{RESET}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_text_survives_decoration() {
        let out = line(Level::Warning, &"Offline: events will be queued.");
        assert!(out.contains("⚠️"));
        assert!(out.ends_with("Offline: events will be queued."));
    }
}
