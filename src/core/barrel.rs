//! `index.ts` barrel generation.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

const INDEX_FILES: [&str; 2] = ["index.ts", "index.tsx"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BarrelOutcome {
    Written {
        dir: PathBuf,
        index: PathBuf,
        exports: Vec<String>,
    },
    Missing {
        dir: PathBuf,
    },
    Empty {
        dir: PathBuf,
    },
    NoExports {
        dir: PathBuf,
    },
    Failed {
        dir: PathBuf,
        error: String,
    },
}

/// Module names to re-export from `dir`, sorted.
///
/// Sub-directories count when they contain their own index file; `.ts` and
/// `.tsx` files count unless they are the index itself.
pub fn exportable_items(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", dir.display()))))?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", dir.display())))
        })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if path.is_dir() {
            if INDEX_FILES.iter().any(|index| path.join(index).is_file()) {
                items.push(name);
            }
        } else if path.is_file() && !INDEX_FILES.contains(&name.as_str()) {
            let is_module = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("ts") | Some("tsx")
            );
            if is_module {
                if let Some(stem) = path.file_stem() {
                    items.push(stem.to_string_lossy().to_string());
                }
            }
        }
    }

    items.sort();
    Ok(items)
}

pub fn render_index(items: &[String]) -> String {
    let mut content = items
        .iter()
        .map(|item| format!("export * from './{}';", item))
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    content
}

/// Write `dir/index.ts`. Problems with a single directory are logged and
/// reported in the outcome rather than returned as errors.
pub fn build_index(dir: &Path) -> BarrelOutcome {
    let dir_buf = dir.to_path_buf();

    if !dir.is_dir() {
        crate::log_error!("index", "Path {} does not exist", dir.display());
        return BarrelOutcome::Missing { dir: dir_buf };
    }

    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        crate::log_warning!("index", "Directory {} is empty", dir.display());
        return BarrelOutcome::Empty { dir: dir_buf };
    }

    crate::log_info!("index", "Building index file for {}...", dir.display());

    let written = exportable_items(dir).and_then(|items| {
        if items.is_empty() {
            return Ok(None);
        }
        let index = dir.join("index.ts");
        io::write_file(&index, &render_index(&items), &format!("write {}", index.display()))?;
        Ok(Some((index, items)))
    });

    match written {
        Ok(Some((index, exports))) => {
            crate::log_success!(
                "index",
                "Generated index file for {} with {} exports",
                dir.display(),
                exports.len()
            );
            crate::log_info!("index", "Exports: {}", exports.join(", "));
            BarrelOutcome::Written {
                dir: dir_buf,
                index,
                exports,
            }
        }
        Ok(None) => {
            crate::log_warning!("index", "No exportable items found in {}", dir.display());
            BarrelOutcome::NoExports { dir: dir_buf }
        }
        Err(err) => {
            crate::log_error!(
                "index",
                "Failed to build index file for {}: {}",
                dir.display(),
                err
            );
            BarrelOutcome::Failed {
                dir: dir_buf,
                error: err.message,
            }
        }
    }
}

pub fn build_all(dirs: &[PathBuf]) -> Result<Vec<BarrelOutcome>> {
    crate::utils::validation::require_non_empty_vec(dirs, "dirs")?;
    Ok(dirs.iter().map(|dir| build_index(dir)).collect())
}
