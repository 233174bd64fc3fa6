//! JSON configuration files: load with bootstrap, save atomically.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io;

/// How a configuration file was obtained by [`load_or_bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// File existed and parsed.
    Loaded,
    /// File was missing and has been written from defaults.
    Created,
    /// File was unparsable and has been overwritten with defaults.
    Recreated,
}

/// Parse JSON, mapping failures to `config.invalid_json` for `path`.
pub fn from_str<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T> {
    serde_json::from_str(content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

pub fn to_string_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize config".to_string())))
}

/// Load a JSON file if it exists. Missing files yield `None`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = io::read_file(path, &format!("read {}", path.display()))?;
    from_str(&content, path).map(Some)
}

/// Write a value as pretty JSON, creating parent directories as needed.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = to_string_pretty(value)?;
    io::write_file_atomic(path, &content, &format!("write {}", path.display()))
}

/// Load a configuration file, creating or repairing it from `defaults`.
///
/// Missing files are created (logged as info). Files that fail to parse are
/// overwritten with defaults after a warning.
pub fn load_or_bootstrap<T, F>(path: &Path, defaults: F) -> Result<(T, Bootstrap)>
where
    T: DeserializeOwned + Serialize,
    F: FnOnce() -> T,
{
    match load::<T>(path) {
        Ok(Some(value)) => Ok((value, Bootstrap::Loaded)),
        Ok(None) => {
            let value = defaults();
            save(path, &value)?;
            crate::log_info!("config", "Created {} with defaults", path.display());
            Ok((value, Bootstrap::Created))
        }
        Err(err) if err.code == crate::ErrorCode::ConfigInvalidJson => {
            crate::log_warning!(
                "config",
                "Could not parse {} ({}); recreating it with defaults",
                path.display(),
                err.details["error"].as_str().unwrap_or("invalid JSON")
            );
            let value = defaults();
            save(path, &value)?;
            Ok((value, Bootstrap::Recreated))
        }
        Err(err) => Err(err),
    }
}

/// Read a JSON spec from an inline string, a file (`@path`) or stdin (`-`).
pub fn read_json_spec_to_string(spec: &str) -> Result<String> {
    use std::io::{IsTerminal, Read};

    if spec.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(Error::validation_invalid_argument(
                "spec",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
                None,
            ));
        }
        stdin
            .read_to_string(&mut buf)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;
        return Ok(buf);
    }

    if let Some(path) = spec.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(Error::validation_invalid_argument(
                "spec",
                "Invalid JSON spec '@' (missing file path)",
                None,
                None,
            ));
        }
        return io::read_file(Path::new(path), &format!("read {}", path));
    }

    Ok(spec.to_string())
}

/// Resolve and parse a JSON spec into `T`.
pub fn parse_json_spec<T: DeserializeOwned>(spec: &str, context: &str) -> Result<T> {
    let raw = read_json_spec_to_string(spec)?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::validation_invalid_json(
            e,
            Some(context.to_string()),
            Some(raw.chars().take(200).collect::<String>()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default = "default_count")]
        count: u32,
    }

    fn default_count() -> u32 {
        7
    }

    fn sample() -> Sample {
        Sample {
            name: "fallback".to_string(),
            count: default_count(),
        }
    }

    #[test]
    fn missing_file_is_created_from_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sample.json");

        let (value, state) = load_or_bootstrap(&path, sample).unwrap();

        assert_eq!(state, Bootstrap::Created);
        assert_eq!(value, sample());
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_recreated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, "{ not json").unwrap();

        let (value, state) = load_or_bootstrap(&path, sample).unwrap();

        assert_eq!(state, Bootstrap::Recreated);
        assert_eq!(value.name, "fallback");
        let reparsed: Sample = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reparsed, sample());
    }

    #[test]
    fn existing_file_keeps_values_and_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, r#"{"name": "mine"}"#).unwrap();

        let (value, state) = load_or_bootstrap(&path, sample).unwrap();

        assert_eq!(state, Bootstrap::Loaded);
        assert_eq!(value.name, "mine");
        assert_eq!(value.count, 7);
    }

    #[test]
    fn json_spec_reads_from_file_reference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, r#"{"name": "from-file", "count": 2}"#).unwrap();

        let spec = format!("@{}", path.display());
        let parsed: Sample = parse_json_spec(&spec, "parse sample").unwrap();

        assert_eq!(parsed.name, "from-file");
        assert_eq!(parsed.count, 2);
    }

    #[test]
    fn json_spec_rejects_bare_at_sign() {
        let err = read_json_spec_to_string("@").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn invalid_inline_spec_reports_preview() {
        let err = parse_json_spec::<Sample>("{oops", "parse sample").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_json");
        assert_eq!(err.details["inputPreview"], "{oops");
    }
}
