//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and user prompting.

use std::io::{self, BufRead, IsTerminal, Write};

use toolchain::{Error, Result};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

pub fn is_stderr_tty() -> bool {
    io::stderr().is_terminal()
}

pub fn require_tty_for_interactive() -> bool {
    is_stdin_tty() && is_stderr_tty()
}

pub fn prompt(message: &str) -> Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|e| Error::internal_io(format!("Failed to read input: {}", e), None))?;

    Ok(line.trim().to_string())
}

/// Numbered choice list on stderr. Accepts the number or the key itself.
///
/// `choices` are `(key, label)` pairs; the selected key is returned.
pub fn select(message: &str, choices: &[(String, String)], field: &str) -> Result<String> {
    if choices.is_empty() {
        return Err(Error::validation_invalid_argument(
            field,
            "Nothing to select from",
            None,
            None,
        ));
    }

    if !require_tty_for_interactive() {
        return Err(Error::validation_missing_argument(vec![field.to_string()])
            .with_hint("Pass it as an argument when not running in a terminal"));
    }

    eprintln!("{}", message);
    for (index, (key, label)) in choices.iter().enumerate() {
        eprintln!("  {}) {} ({})", index + 1, label, key);
    }

    let answer = prompt("> ")?;
    resolve_choice(&answer, choices).ok_or_else(|| {
        Error::validation_invalid_argument(
            field,
            format!("'{}' is not one of the listed choices", answer),
            Some(answer.clone()),
            Some(choices.iter().map(|(key, _)| key.clone()).collect()),
        )
    })
}

fn resolve_choice(answer: &str, choices: &[(String, String)]) -> Option<String> {
    if let Ok(number) = answer.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .map(|(key, _)| key.clone());
    }
    choices
        .iter()
        .find(|(key, _)| key == answer)
        .map(|(key, _)| key.clone())
}
