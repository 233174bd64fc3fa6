//! Colored step logging on stderr.
//!
//! Status lines always go to stderr so stdout stays reserved for the JSON
//! response. ANSI colors are only emitted when stderr is a terminal.

use std::fmt;
use std::io::{self, IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Info => "\x1b[36m",
            Tone::Success => "\x1b[32m",
            Tone::Warning => "\x1b[33m",
            Tone::Error => "\x1b[31m",
        }
    }
}

const RESET: &str = "\x1b[0m";

pub fn format_line(tone: Tone, prefix: &str, message: fmt::Arguments<'_>, color: bool) -> String {
    if color {
        format!("{}[{}] {}{}", tone.ansi(), prefix, message, RESET)
    } else {
        format!("[{}] {}", prefix, message)
    }
}

pub fn emit(tone: Tone, prefix: &str, message: fmt::Arguments<'_>) {
    let stderr = io::stderr();
    let color = stderr.is_terminal();
    let line = format_line(tone, prefix, message, color);
    let _ = writeln!(stderr.lock(), "{}", line);
}

/// Horizontal rule printed between sections of a long-running command.
pub fn rule() {
    let _ = writeln!(io::stderr().lock(), "{}", "━".repeat(39));
}
