//! Sequential step execution with logging and abort-on-first-failure.

use serde::Serialize;

use crate::error::Result;
use crate::runner::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs named steps in order against a [`CommandRunner`].
///
/// Logs `▸ step` before each step and `✓ step` or `✗ step: error` after it.
/// A failing step's error is returned with `failedStep` added to its details
/// so the caller can stop the sequence with `?`.
pub struct StepRunner<'a> {
    prefix: &'static str,
    runner: &'a dyn CommandRunner,
    outcomes: Vec<StepOutcome>,
}

impl<'a> StepRunner<'a> {
    pub fn new(prefix: &'static str, runner: &'a dyn CommandRunner) -> Self {
        Self {
            prefix,
            runner,
            outcomes: Vec::new(),
        }
    }

    pub fn step<T, F>(&mut self, name: impl Into<String>, f: F) -> Result<T>
    where
        F: FnOnce(&dyn CommandRunner) -> Result<T>,
    {
        let name = name.into();
        crate::log_info!(self.prefix, "▸ {}", name);

        match f(self.runner) {
            Ok(value) => {
                crate::log_success!(self.prefix, "✓ {}", name);
                self.outcomes.push(StepOutcome {
                    step: name,
                    status: StepStatus::Completed,
                    error: None,
                });
                Ok(value)
            }
            Err(mut err) => {
                crate::log_error!(self.prefix, "✗ {}: {}", name, err.message);
                if let Some(details) = err.details.as_object_mut() {
                    details.insert("failedStep".to_string(), serde_json::json!(name));
                }
                self.outcomes.push(StepOutcome {
                    step: name,
                    status: StepStatus::Failed,
                    error: Some(err.message.clone()),
                });
                Err(err)
            }
        }
    }

    /// Record a step that was intentionally not run.
    pub fn skip(&mut self, name: impl Into<String>, reason: &str) {
        let name = name.into();
        crate::log_warning!(self.prefix, "- {} skipped: {}", name, reason);
        self.outcomes.push(StepOutcome {
            step: name,
            status: StepStatus::Skipped,
            error: Some(reason.to_string()),
        });
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<StepOutcome> {
        self.outcomes
    }
}
