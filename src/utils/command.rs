//! Process execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Spawn a process and wait for it, capturing stdout and stderr.
///
/// Only spawn failures are errors here; a non-zero exit is returned as-is so
/// callers can decide how to report it.
pub fn capture(
    program: &str,
    args: &[String],
    env: &[(String, String)],
    current_dir: Option<&Path>,
) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }

    cmd.output().map_err(|e| {
        let err = Error::internal_io(format!("Failed to run {}: {}", program, e), Some(program.to_string()));
        if e.kind() == std::io::ErrorKind::NotFound {
            err.with_hint(format!("Make sure '{}' is installed and on your PATH", program))
        } else {
            err
        }
    })
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

/// Trimmed, lossily decoded stdout.
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_returns_stdout_of_successful_command() {
        let output = capture("echo", &["hello".to_string()], &[], None).unwrap();
        assert!(output.status.success());
        assert_eq!(stdout_text(&output), "hello");
    }

    #[test]
    fn capture_passes_environment_to_child() {
        let output = capture(
            "sh",
            &["-c".to_string(), "printf %s \"$PROBE\"".to_string()],
            &[("PROBE".to_string(), "value".to_string())],
            None,
        )
        .unwrap();
        assert_eq!(stdout_text(&output), "value");
    }

    #[test]
    fn capture_fails_for_missing_program() {
        let err = capture("nonexistent_command_xyz", &[], &[], None).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = Output {
            status: std::process::ExitStatus::default(),
            stdout: b"stdout content".to_vec(),
            stderr: b"stderr content".to_vec(),
        };
        assert_eq!(error_text(&output), "stderr content");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = Output {
            status: std::process::ExitStatus::default(),
            stdout: b"stdout content".to_vec(),
            stderr: b"".to_vec(),
        };
        assert_eq!(error_text(&output), "stdout content");
    }
}
