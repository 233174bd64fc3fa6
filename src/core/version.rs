use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::paths;
use crate::utils::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpType {
    Patch,
    Minor,
    Major,
}

impl BumpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
        }
    }
}

impl FromStr for BumpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "patch" => Ok(BumpType::Patch),
            "minor" => Ok(BumpType::Minor),
            "major" => Ok(BumpType::Major),
            other => Err(Error::validation_invalid_argument(
                "bump_type",
                format!("Invalid bump type '{}'", other),
                None,
                Some(vec![
                    "patch".to_string(),
                    "minor".to_string(),
                    "major".to_string(),
                ]),
            )),
        }
    }
}

fn parse_semver(version: &str, field: &str) -> Result<semver::Version> {
    semver::Version::parse(version.trim()).map_err(|e| {
        Error::validation_invalid_argument(
            field,
            format!("'{}' is not a semantic version: {}", version, e),
            None,
            None,
        )
    })
}

/// Increment a semantic version. Pre-release and build metadata are dropped.
pub fn increment_version(version: &str, bump: BumpType) -> Result<String> {
    let mut v = parse_semver(version, "version")?;

    match bump {
        BumpType::Patch => v.patch += 1,
        BumpType::Minor => {
            v.minor += 1;
            v.patch = 0;
        }
        BumpType::Major => {
            v.major += 1;
            v.minor = 0;
            v.patch = 0;
        }
    }
    v.pre = semver::Prerelease::EMPTY;
    v.build = semver::BuildMetadata::EMPTY;

    Ok(v.to_string())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionChange {
    pub old_version: String,
    pub new_version: String,
    pub file: PathBuf,
}

/// Top-level `version` of `package.json` under `root`.
pub fn read_version(root: &Path) -> Result<VersionInfo> {
    let path = paths::package_json(root);
    let content = io::read_file(&path, "read package.json")?;
    let version = version_from_content(&content, &path)?;
    Ok(VersionInfo {
        version,
        file: path,
    })
}

fn version_from_content(content: &str, path: &Path) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

    json.get("version")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| {
            Error::config_missing_key("version", Some(path.display().to_string()))
                .with_hint("Add a \"version\" field to package.json")
        })
}

/// Replace the top-level `version` value in place, leaving the rest of the
/// file as is. Nested objects with their own `version` key are skipped.
pub fn replace_version(content: &str, old_version: &str, new_version: &str) -> Option<String> {
    let pattern = format!(r#""version"\s*:\s*"({})""#, regex::escape(old_version));
    let re = Regex::new(&pattern).ok()?;
    let value = re
        .captures_iter(content)
        .filter(|caps| {
            caps.get(0)
                .is_some_and(|m| nesting_depth(content, m.start()) == Some(1))
        })
        .find_map(|caps| caps.get(1))?;

    Some(format!(
        "{}{}{}",
        &content[..value.start()],
        new_version,
        &content[value.end()..]
    ))
}

/// Bracket depth at byte `pos`; `None` when `pos` falls inside a string.
fn nesting_depth(content: &str, pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in &content.as_bytes()[..pos] {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match byte {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    (!in_string).then_some(depth)
}

fn write_version(root: &Path, new_version: &str) -> Result<VersionChange> {
    let path = paths::package_json(root);
    let content = io::read_file(&path, "read package.json")?;
    let old_version = version_from_content(&content, &path)?;

    let updated = replace_version(&content, &old_version, new_version).ok_or_else(|| {
        Error::internal_unexpected(format!(
            "Could not locate version \"{}\" in {}",
            old_version,
            path.display()
        ))
    })?;
    io::write_file_atomic(&path, &updated, "write package.json")?;

    crate::log_success!("version", "Updated version to {}", new_version);

    Ok(VersionChange {
        old_version,
        new_version: new_version.to_string(),
        file: path,
    })
}

pub fn bump(root: &Path, bump: BumpType) -> Result<VersionChange> {
    let current = read_version(root)?;
    let new_version = increment_version(&current.version, bump)?;
    write_version(root, &new_version)
}

/// Set an explicit version; it must be a valid semantic version.
pub fn set(root: &Path, version: &str) -> Result<VersionChange> {
    let parsed = parse_semver(version, "version")?;
    write_version(root, &parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PACKAGE: &str = r#"{
  "name": "@acme/toolchain",
  "version": "1.2.3",
  "dependencies": {
    "left-pad": "1.2.3"
  }
}
"#;

    #[test]
    fn increments_each_component() {
        assert_eq!(increment_version("1.2.3", BumpType::Patch).unwrap(), "1.2.4");
        assert_eq!(increment_version("1.2.3", BumpType::Minor).unwrap(), "1.3.0");
        assert_eq!(increment_version("1.2.3", BumpType::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn drops_prerelease_on_bump() {
        assert_eq!(
            increment_version("1.2.3-beta.1", BumpType::Patch).unwrap(),
            "1.2.4"
        );
    }

    #[test]
    fn rejects_non_semver_input() {
        let err = increment_version("1.2", BumpType::Patch).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn bump_type_parses_known_names_only() {
        assert_eq!("minor".parse::<BumpType>().unwrap(), BumpType::Minor);
        assert!("huge".parse::<BumpType>().is_err());
    }

    #[test]
    fn replace_version_skips_nested_version_keys() {
        let content = r#"{
  "name": "@acme/toolchain",
  "publishConfig": { "version": "1.2.3", "note": "{\"a\": [1]}" },
  "version": "1.2.3"
}
"#;

        let updated = replace_version(content, "1.2.3", "1.3.0").unwrap();

        assert!(updated.contains(r#""publishConfig": { "version": "1.2.3""#));
        assert!(updated.contains("\n  \"version\": \"1.3.0\"\n"));
    }

    #[test]
    fn replace_version_without_top_level_key_is_none() {
        let content = r#"{ "engines": { "version": "1.2.3" } }"#;

        assert!(replace_version(content, "1.2.3", "1.2.4").is_none());
    }

    #[test]
    fn replace_version_touches_only_version_field() {
        let updated = replace_version(PACKAGE, "1.2.3", "1.2.4").unwrap();
        assert!(updated.contains(r#""version": "1.2.4""#));
        assert!(updated.contains(r#""left-pad": "1.2.3""#));
        assert!(updated.ends_with("}\n"));
    }

    #[test]
    fn bump_rewrites_package_json_in_place() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), PACKAGE).unwrap();

        let change = bump(dir.path(), BumpType::Minor).unwrap();

        assert_eq!(change.old_version, "1.2.3");
        assert_eq!(change.new_version, "1.3.0");
        assert_eq!(read_version(dir.path()).unwrap().version, "1.3.0");
        let content = fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert_eq!(content, PACKAGE.replace(r#""version": "1.2.3""#, r#""version": "1.3.0""#));
    }

    #[test]
    fn set_validates_version() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), PACKAGE).unwrap();

        assert!(set(dir.path(), "next").is_err());
        let change = set(dir.path(), "3.0.0-rc.1").unwrap();
        assert_eq!(change.new_version, "3.0.0-rc.1");
    }

    #[test]
    fn missing_version_field_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "x"}"#).unwrap();

        let err = read_version(dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_key");
        assert_eq!(err.details["key"], "version");
    }
}
