//! External process seam.
//!
//! Every `psql`, `pg_dump`, `pg_restore`, `npm` and browser call goes through
//! [`CommandRunner`] so operation sequences can be exercised with a fake.

use std::path::PathBuf;

use crate::error::{CommandFailedDetails, Error, Result};
use crate::utils::{command, shell};

/// A single external process call. Secrets belong in `env`, which is never
/// included in [`Invocation::display`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Shell-quoted command line without environment values.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            shell::quote_arg(&self.program)
        } else {
            format!(
                "{} {}",
                shell::quote_arg(&self.program),
                shell::quote_args(&self.args)
            )
        }
    }
}

pub trait CommandRunner {
    /// Run to completion and return trimmed stdout. Non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<String>;
}

/// Runs processes directly with `std::process`, never through a shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<String> {
        let output = command::capture(
            &invocation.program,
            &invocation.args,
            &invocation.env,
            invocation.current_dir.as_deref(),
        )?;

        if output.status.success() {
            return Ok(command::stdout_text(&output));
        }

        Err(Error::command_failed(CommandFailedDetails {
            command: invocation.program.clone(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: command::error_text(&output),
        })
        .with_hint(format!("Command: {}", invocation.display())))
    }
}
