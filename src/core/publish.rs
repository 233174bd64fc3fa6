//! npm publishing.

use serde::Serialize;
use std::path::Path;

use crate::error::{Error, ErrorCode, Result};
use crate::runner::{CommandRunner, Invocation};
use crate::steps::{StepOutcome, StepRunner};
use crate::version;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub npm_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub steps: Vec<StepOutcome>,
}

/// `npm whoami`, then `npm publish --access public` in `root`.
pub fn publish(root: &Path, runner: &dyn CommandRunner) -> Result<PublishResult> {
    let mut steps = StepRunner::new("publish", runner);

    let npm_user = steps
        .step("Check npm authentication", |r| {
            r.run(&Invocation::new("npm").arg("whoami").current_dir(root))
        })
        .map_err(|err| {
            Error::new(
                ErrorCode::CommandFailed,
                "Please login to npm first using 'npm login'",
                err.details,
            )
        })?;

    steps.step("Publish to npm", |r| {
        r.run(
            &Invocation::new("npm")
                .args(["publish", "--access", "public"])
                .current_dir(root),
        )
        .map(|_| ())
    })?;

    let version = version::read_version(root).ok().map(|info| info.version);
    crate::log_success!("publish", "Successfully published to npm");

    Ok(PublishResult {
        npm_user,
        version,
        steps: steps.into_outcomes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::RecordingRunner;
    use tempfile::TempDir;

    #[test]
    fn publishes_after_whoami() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new().respond("whoami", "acme-bot");

        let result = publish(dir.path(), &runner).unwrap();

        assert_eq!(result.npm_user, "acme-bot");
        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["whoami"]);
        assert_eq!(calls[1].args, vec!["publish", "--access", "public"]);
        assert_eq!(calls[1].current_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn not_logged_in_stops_before_publish() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_on("whoami", "ENEEDAUTH");

        let err = publish(dir.path(), &runner).unwrap_err();

        assert_eq!(err.message, "Please login to npm first using 'npm login'");
        assert_eq!(runner.calls().len(), 1);
    }
}
