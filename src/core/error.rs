use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    PairNotFound,
    ProjectNotFound,

    CommandFailed,
    ConnectionsRemaining,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::PairNotFound => "db.pair_not_found",
            ErrorCode::ProjectNotFound => "env.project_not_found",

            ErrorCode::CommandFailed => "command.failed",
            ErrorCode::ConnectionsRemaining => "db.connections_remaining",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Captured failure of an external process (psql, pg_dump, npm, ...).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        let message = format!("Missing required argument: {}", args.join(", "));
        Self::new(
            ErrorCode::ValidationMissingArgument,
            message,
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let message = format!("Invalid argument: {}", problem);
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            message,
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem,
                id,
                tried,
            }),
        )
    }

    pub fn validation_invalid_json(
        err: serde_json::Error,
        context: Option<String>,
        input_preview: Option<String>,
    ) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
            "inputPreview": input_preview,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn pair_not_found(id: impl Into<String>, available: Vec<String>) -> Self {
        let id = id.into();
        Self::new(
            ErrorCode::PairNotFound,
            format!("Database pair '{}' not found", id),
            to_details(NotFoundDetails { id, available }),
        )
        .with_hint("Run 'next-toolchain db pairs' to see configured database pairs")
    }

    pub fn project_not_found(id: impl Into<String>, available: Vec<String>) -> Self {
        let id = id.into();
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project '{}' not found", id),
            to_details(NotFoundDetails { id, available }),
        )
        .with_hint("Run 'next-toolchain env list' to see configured projects")
    }

    pub fn command_failed(details: CommandFailedDetails) -> Self {
        let reason = if details.stderr.trim().is_empty() {
            details.stdout.trim().to_string()
        } else {
            details.stderr.trim().to_string()
        };
        let message = if reason.is_empty() {
            format!("{} exited with code {}", details.command, details.exit_code)
        } else {
            format!("{} failed: {}", details.command, reason)
        };

        Self::new(ErrorCode::CommandFailed, message, to_details(details))
    }

    pub fn connections_remaining(database: impl Into<String>, remaining: u32) -> Self {
        let database = database.into();
        Self::new(
            ErrorCode::ConnectionsRemaining,
            format!(
                "Some connections could not be closed ({} remaining)",
                remaining
            ),
            serde_json::json!({ "database": database, "remaining": remaining }),
        )
        .with_hint(format!(
            "Connection limit on '{}' is still 0; rerun close-connections or restore it manually",
            database
        ))
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::ConfigMissingKey,
            format!("Missing required configuration key {}", key),
            to_details(ConfigMissingKeyDetails { key, path }),
        )
        .with_hint("Run 'next-toolchain db config' to generate the database environment file")
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let problem = problem.into();
        let message = format!("Invalid configuration value: {}", problem);
        Self::new(
            ErrorCode::ConfigInvalidValue,
            message,
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem,
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        let message = match &context {
            Some(context) => format!("IO error ({}): {}", context, error),
            None => format!("IO error: {}", error),
        };
        Self::new(
            ErrorCode::InternalIoError,
            message,
            to_details(InternalIoErrorDetails { error, context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            error.clone(),
            serde_json::json!({ "error": error }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_message_prefers_stderr() {
        let err = Error::command_failed(CommandFailedDetails {
            command: "psql".to_string(),
            exit_code: 2,
            stdout: "ignored".to_string(),
            stderr: "could not connect to server\n".to_string(),
        });

        assert_eq!(err.code.as_str(), "command.failed");
        assert_eq!(err.message, "psql failed: could not connect to server");
        assert_eq!(err.details["exitCode"], 2);
    }

    #[test]
    fn command_failed_message_without_output_uses_exit_code() {
        let err = Error::command_failed(CommandFailedDetails {
            command: "npm".to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
        });

        assert_eq!(err.message, "npm exited with code 1");
    }

    #[test]
    fn missing_key_carries_path_and_hint() {
        let err = Error::config_missing_key("CLOUD_DB_NAME", Some("/tmp/db.conf".to_string()));

        assert_eq!(err.details["key"], "CLOUD_DB_NAME");
        assert_eq!(err.details["path"], "/tmp/db.conf");
        assert_eq!(err.hints.len(), 1);
    }
}
