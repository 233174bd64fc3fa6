//! Locations of the per-project working files.
//!
//! Everything lives under `.next-toolchain-temp/` relative to the project
//! root, which is the current working directory for the CLI.

use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const TEMP_DIR: &str = ".next-toolchain-temp";

/// Project root (current working directory).
pub fn project_root() -> Result<PathBuf> {
    env::current_dir().map_err(|e| {
        Error::internal_io(e.to_string(), Some("resolve current directory".to_string()))
    })
}

pub fn temp_dir(root: &Path) -> PathBuf {
    root.join(TEMP_DIR)
}

/// Database pair registry (`db.config.json`).
pub fn db_config_json(root: &Path) -> PathBuf {
    temp_dir(root).join("db.config.json")
}

/// Rendered database environment file consumed by every `db` operation.
pub fn db_conf(root: &Path) -> PathBuf {
    temp_dir(root).join("db.conf")
}

/// Project environment registry (`env.config.json`).
pub fn env_config_json(root: &Path) -> PathBuf {
    temp_dir(root).join("env.config.json")
}

pub fn screenshot_config(root: &Path) -> PathBuf {
    temp_dir(root).join("screenshot.config.conf")
}

pub fn screenshots_dir(root: &Path) -> PathBuf {
    temp_dir(root).join("screenshots")
}

/// Scratch directory for `pg_dump -Fd` output during clone operations.
pub fn dump_dir(root: &Path) -> PathBuf {
    temp_dir(root).join("dump")
}

pub fn dot_env(root: &Path) -> PathBuf {
    root.join(".env")
}

pub fn package_json(root: &Path) -> PathBuf {
    root.join("package.json")
}
